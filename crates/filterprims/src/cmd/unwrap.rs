use std::io::{self, Write};

use filterprims_envelope::{decode, EnvelopeConfig};
use tracing::info;

use crate::cmd::UnwrapArgs;
use crate::exit::{envelope_error, io_error, CliResult, SUCCESS};
use crate::output::{open_input, open_output};

pub fn run(args: UnwrapArgs) -> CliResult<i32> {
    let config = EnvelopeConfig::default().with_alphabet(args.alphabet);
    let input = open_input(args.input.as_deref())?;
    let (block, mut payload) = decode(input, &config)
        .map_err(|err| envelope_error("unwrap failed", err))?
        .into_parts();

    let mut output = open_output(args.output.as_deref())?;
    let bytes =
        io::copy(&mut payload, &mut output).map_err(|err| io_error("unwrap failed", err))?;
    output
        .flush()
        .map_err(|err| io_error("failed flushing output", err))?;

    info!(label = %block.label, headers = block.headers.len(), bytes, "envelope unwrapped");
    Ok(SUCCESS)
}
