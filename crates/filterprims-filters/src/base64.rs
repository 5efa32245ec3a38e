use std::io::{self, Read, Write};

use ::base64::engine::general_purpose::STANDARD;
use ::base64::Engine;
use filterprims_pipe::{read_block, read_some, Stage};

use crate::error::FilterError;
use crate::CHUNK_SIZE;

/// Encodes a byte stream as padded standard base64 (RFC 4648).
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Encode;

impl Stage for Base64Encode {
    fn name(&self) -> &'static str {
        "to-base64"
    }

    fn run(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<()> {
        // CHUNK_SIZE is a multiple of 3, so padding only appears after the last block.
        let mut block = vec![0u8; CHUNK_SIZE];
        let mut text = String::with_capacity(CHUNK_SIZE / 3 * 4);
        loop {
            let n = read_block(input, &mut block)?;
            if n == 0 {
                return Ok(());
            }
            text.clear();
            STANDARD.encode_string(&block[..n], &mut text);
            output.write_all(text.as_bytes())?;
            if n < block.len() {
                return Ok(());
            }
        }
    }
}

/// Decodes padded standard base64, ignoring line breaks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Decode;

impl Stage for Base64Decode {
    fn name(&self) -> &'static str {
        "from-base64"
    }

    fn run(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<()> {
        let mut chunk = vec![0u8; CHUNK_SIZE];
        let mut pending: Vec<u8> = Vec::with_capacity(CHUNK_SIZE + 4);
        let mut decoded = Vec::with_capacity(CHUNK_SIZE);
        let mut padded = false;

        loop {
            let n = read_some(input, &mut chunk)?;
            if n == 0 {
                break;
            }
            pending.extend(chunk[..n].iter().copied().filter(|b| !matches!(b, b'\r' | b'\n')));

            let whole = pending.len() / 4 * 4;
            if whole == 0 {
                continue;
            }
            if padded {
                return Err(FilterError::invalid("base64", "data after padding").into());
            }

            decoded.clear();
            STANDARD
                .decode_vec(&pending[..whole], &mut decoded)
                .map_err(|err| FilterError::invalid("base64", err.to_string()))?;
            padded = pending[whole - 1] == b'=';
            pending.drain(..whole);
            output.write_all(&decoded)?;
        }

        if !pending.is_empty() {
            return Err(FilterError::Truncated { filter: "base64" }.into());
        }
        Ok(())
    }
}
