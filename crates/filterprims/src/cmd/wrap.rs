use std::io::{self, Write};

use filterprims_envelope::{encode, Block, EnvelopeConfig};
use tracing::info;

use crate::cmd::WrapArgs;
use crate::exit::{envelope_error, io_error, CliResult, SUCCESS};
use crate::output::{open_input, open_output};

pub fn run(args: WrapArgs) -> CliResult<i32> {
    let block = Block {
        label: args.label,
        headers: args.headers.into_iter().collect(),
    };
    let config = EnvelopeConfig {
        line_width: args.width,
        alphabet: args.alphabet,
    };

    let input = open_input(args.input.as_deref())?;
    let mut text =
        encode(input, &block, &config).map_err(|err| envelope_error("wrap failed", err))?;

    let mut output = open_output(args.output.as_deref())?;
    let bytes = io::copy(&mut text, &mut output).map_err(|err| io_error("wrap failed", err))?;
    output
        .flush()
        .map_err(|err| io_error("failed flushing output", err))?;

    info!(label = %block.label, bytes, "envelope written");
    Ok(SUCCESS)
}
