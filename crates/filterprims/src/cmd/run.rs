use std::io::Write;

use filterprims_filters::Tee;
use filterprims_pipe::Pipeline;
use tracing::{debug, info};

use crate::cmd::RunArgs;
use crate::exit::{filter_error, io_error, CliResult, SUCCESS};
use crate::output::{open_input, open_output};

pub fn run(args: RunArgs) -> CliResult<i32> {
    let input = open_input(args.input.as_deref())?;
    let mut pipeline = Pipeline::new(input);

    if let Some(path) = &args.tee {
        let tee = Tee::to_file(path)
            .map_err(|err| io_error(&format!("failed creating {}", path.display()), err))?;
        pipeline = pipeline.then(tee);
    }
    for kind in &args.filters {
        let stage = kind
            .build(args.width)
            .map_err(|err| filter_error(&format!("cannot build {kind}"), err))?;
        pipeline = pipeline.then(stage);
    }
    debug!(stages = ?pipeline.stages(), "pipeline started");

    let mut output = open_output(args.output.as_deref())?;
    let bytes = pipeline
        .copy_to(&mut output)
        .map_err(|err| io_error("pipeline failed", err))?;
    output
        .flush()
        .map_err(|err| io_error("failed flushing output", err))?;

    info!(bytes, "pipeline finished");
    Ok(SUCCESS)
}
