use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Read, Write};
use std::path::Path;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use crate::exit::{io_error, CliResult};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Open `path` for reading, or stdin when absent.
pub fn open_input(path: Option<&Path>) -> CliResult<Box<dyn Read + Send>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdin())),
    }
}

/// Create `path` for writing, or lock stdout when absent.
pub fn open_output(path: Option<&Path>) -> CliResult<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .map_err(|err| io_error(&format!("failed creating {}", path.display()), err))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

#[derive(Serialize)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

#[derive(Serialize)]
pub struct EnvelopeReport {
    pub schema_id: &'static str,
    pub label: String,
    pub headers: Vec<HeaderEntry>,
    pub alphabet: String,
    pub payload_size: u64,
}

pub fn print_envelope(report: &EnvelopeReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["label".to_string(), report.label.clone()])
                .add_row(vec!["alphabet".to_string(), report.alphabet.clone()])
                .add_row(vec![
                    "payload_size".to_string(),
                    report.payload_size.to_string(),
                ]);
            for header in &report.headers {
                table.add_row(vec![format!("header {}", header.key), header.value.clone()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("Envelope:");
            println!("  Label:        {}", report.label);
            println!("  Alphabet:     {}", report.alphabet);
            println!("  Payload size: {} bytes", report.payload_size);
            if report.headers.is_empty() {
                println!("  Headers:      none");
            } else {
                println!("  Headers:");
                for header in &report.headers {
                    println!("    {}: {}", header.key, header.value);
                }
            }
        }
        OutputFormat::Raw => {
            println!("{}", report.label);
            for header in &report.headers {
                println!("{}: {}", header.key, header.value);
            }
        }
    }
}

#[derive(Serialize)]
pub struct FilterEntry {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Serialize)]
struct FilterList<'a> {
    schema_id: &'static str,
    filters: &'a [FilterEntry],
}

pub fn print_filters(filters: &[FilterEntry], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FilterList {
                schema_id: "https://schemas.3leaps.dev/filterprims/cli/v1/filter-list.schema.json",
                filters,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FILTER", "DESCRIPTION"]);
            for filter in filters {
                table.add_row(vec![filter.name, filter.description]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for filter in filters {
                println!("{:<14} {}", filter.name, filter.description);
            }
        }
        OutputFormat::Raw => {
            for filter in filters {
                println!("{}", filter.name);
            }
        }
    }
}
