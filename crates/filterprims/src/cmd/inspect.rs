use std::io;

use filterprims_envelope::{decode, EnvelopeConfig};

use crate::cmd::InspectArgs;
use crate::exit::{envelope_error, io_error, CliResult, SUCCESS};
use crate::output::{open_input, print_envelope, EnvelopeReport, HeaderEntry, OutputFormat};

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let config = EnvelopeConfig::default().with_alphabet(args.alphabet);
    let input = open_input(args.input.as_deref())?;
    let (block, mut payload) = decode(input, &config)
        .map_err(|err| envelope_error("inspect failed", err))?
        .into_parts();

    // The whole payload is decoded so a corrupt envelope is reported here too.
    let payload_size = io::copy(&mut payload, &mut io::sink())
        .map_err(|err| io_error("inspect failed", err))?;

    let report = EnvelopeReport {
        schema_id: "https://schemas.3leaps.dev/filterprims/cli/v1/envelope-info.schema.json",
        headers: block
            .headers
            .iter()
            .map(|(key, value)| HeaderEntry {
                key: key.to_string(),
                value: value.to_string(),
            })
            .collect(),
        label: block.label,
        alphabet: config.alphabet.to_string(),
        payload_size,
    };

    print_envelope(&report, format);
    Ok(SUCCESS)
}
