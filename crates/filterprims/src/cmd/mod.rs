use clap::{Args, Subcommand};
use filterprims_envelope::DEFAULT_ENVELOPE_WIDTH;
use filterprims_filters::{Alphabet, FilterKind, DEFAULT_LINE_WIDTH};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod filters;
pub mod inspect;
pub mod run;
pub mod unwrap;
pub mod version;
pub mod wrap;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream input through a chain of named filters.
    Run(RunArgs),
    /// Wrap input in a labeled envelope.
    Wrap(WrapArgs),
    /// Extract the payload of an envelope.
    Unwrap(UnwrapArgs),
    /// Decode an envelope and report its label, headers and payload size.
    Inspect(InspectArgs),
    /// List the available filters.
    Filters(FiltersArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args),
        Command::Wrap(args) => wrap::run(args),
        Command::Unwrap(args) => unwrap::run(args),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Filters(args) => filters::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Filters to apply, in order (see `filterprims filters`).
    #[arg(required = true, value_name = "FILTER")]
    pub filters: Vec<FilterKind>,
    /// Read from file instead of stdin.
    #[arg(long, short = 'i', value_name = "PATH")]
    pub input: Option<PathBuf>,
    /// Write to file instead of stdout.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
    /// Line width for split-lines.
    #[arg(long, short = 'w', default_value_t = DEFAULT_LINE_WIDTH)]
    pub width: usize,
    /// Also copy the unfiltered input to this file.
    #[arg(long, value_name = "PATH")]
    pub tee: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct WrapArgs {
    /// Envelope label (e.g. "CERTIFICATE").
    #[arg(long, short = 'l')]
    pub label: String,
    /// Header field, repeatable. Later values replace earlier ones.
    #[arg(long = "header", short = 'H', value_name = "KEY=VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
    /// Payload alphabet.
    #[arg(long, short = 'a', default_value_t = Alphabet::Base64)]
    pub alphabet: Alphabet,
    /// Payload line width.
    #[arg(long, short = 'w', default_value_t = DEFAULT_ENVELOPE_WIDTH)]
    pub width: usize,
    /// Read from file instead of stdin.
    #[arg(long, short = 'i', value_name = "PATH")]
    pub input: Option<PathBuf>,
    /// Write to file instead of stdout.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct UnwrapArgs {
    /// Payload alphabet.
    #[arg(long, short = 'a', default_value_t = Alphabet::Base64)]
    pub alphabet: Alphabet,
    /// Read from file instead of stdin.
    #[arg(long, short = 'i', value_name = "PATH")]
    pub input: Option<PathBuf>,
    /// Write to file instead of stdout.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Payload alphabet.
    #[arg(long, short = 'a', default_value_t = Alphabet::Base64)]
    pub alphabet: Alphabet,
    /// Read from file instead of stdin.
    #[arg(long, short = 'i', value_name = "PATH")]
    pub input: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct FiltersArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
