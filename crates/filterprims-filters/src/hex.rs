use std::io::{self, Read, Write};

use filterprims_pipe::{read_some, Stage};

use crate::error::FilterError;
use crate::CHUNK_SIZE;

/// Encodes a byte stream as lowercase hexadecimal.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexEncode;

impl Stage for HexEncode {
    fn name(&self) -> &'static str {
        "to-hex"
    }

    fn run(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<()> {
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            let n = read_some(input, &mut chunk)?;
            if n == 0 {
                return Ok(());
            }
            output.write_all(::hex::encode(&chunk[..n]).as_bytes())?;
        }
    }
}

/// Decodes hexadecimal of either case, ignoring line breaks.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexDecode;

impl Stage for HexDecode {
    fn name(&self) -> &'static str {
        "from-hex"
    }

    fn run(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<()> {
        let mut chunk = vec![0u8; CHUNK_SIZE];
        let mut pending: Vec<u8> = Vec::with_capacity(CHUNK_SIZE + 1);
        loop {
            let n = read_some(input, &mut chunk)?;
            if n == 0 {
                break;
            }
            pending.extend(chunk[..n].iter().copied().filter(|b| !matches!(b, b'\r' | b'\n')));

            let even = pending.len() & !1;
            if even == 0 {
                continue;
            }
            let bytes = ::hex::decode(&pending[..even])
                .map_err(|err| FilterError::invalid("hex", err.to_string()))?;
            pending.drain(..even);
            output.write_all(&bytes)?;
        }

        if !pending.is_empty() {
            return Err(FilterError::Truncated { filter: "hex" }.into());
        }
        Ok(())
    }
}
