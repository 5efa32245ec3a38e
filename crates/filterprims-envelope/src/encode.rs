use std::io::{self, Read, Write};

use filterprims_filters::SplitLines;
use filterprims_pipe::{connect, produce, PipeReader};
use tracing::debug;

use crate::block::{begin_marker, end_marker, Block, HEADER_DELIMITER};
use crate::config::EnvelopeConfig;
use crate::error::Result;

/// Wrap `payload` in an envelope described by `block`.
///
/// The block and line width are validated before any thread starts; the
/// returned reader yields the envelope text as the payload is encoded.
/// Failures reading the payload surface on that reader.
pub fn encode<R>(payload: R, block: &Block, config: &EnvelopeConfig) -> Result<PipeReader>
where
    R: Read + Send + 'static,
{
    block.validate()?;
    let splitter = SplitLines::new(config.line_width)?;

    let mut head = begin_marker(&block.label);
    for (key, value) in block.headers.iter() {
        head.push_str(key);
        head.push_str(HEADER_DELIMITER);
        head.push_str(value);
        head.push('\n');
    }
    head.push('\n');
    let tail = end_marker(&block.label);

    debug!(
        label = %block.label,
        headers = block.headers.len(),
        alphabet = %config.alphabet,
        width = config.line_width,
        "encoding envelope"
    );

    let mut body = connect(connect(payload, config.alphabet.encoder()), splitter);
    Ok(produce("envelope-encode", move |output: &mut dyn Write| {
        output.write_all(head.as_bytes())?;
        io::copy(&mut body, output)?;
        output.write_all(tail.as_bytes())
    }))
}
