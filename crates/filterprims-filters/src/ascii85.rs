//! Ascii85 (btoa / Adobe alphabet) without `<~ ~>` delimiters.
//!
//! Every 4 input bytes become 5 characters in `!`..=`u`; an all-zero group is
//! written as `z`. A final group of `n` bytes is zero-padded and written as its
//! first `n + 1` characters.

use std::io::{self, Read, Write};

use filterprims_pipe::{read_block, read_some, Stage};

use crate::error::FilterError;
use crate::CHUNK_SIZE;

const FIRST: u8 = b'!';
const LAST: u8 = b'u';

fn encode_group(group: [u8; 4], len: usize, out: &mut Vec<u8>) {
    let mut value = u32::from_be_bytes(group);
    if value == 0 && len == 4 {
        out.push(b'z');
        return;
    }
    let mut digits = [0u8; 5];
    for digit in digits.iter_mut().rev() {
        *digit = FIRST + (value % 85) as u8;
        value /= 85;
    }
    out.extend_from_slice(&digits[..len + 1]);
}

/// Encodes a byte stream as Ascii85.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ascii85Encode;

impl Stage for Ascii85Encode {
    fn name(&self) -> &'static str {
        "to-ascii85"
    }

    fn run(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<()> {
        let mut block = vec![0u8; CHUNK_SIZE];
        let mut text = Vec::with_capacity(CHUNK_SIZE / 4 * 5);
        loop {
            let n = read_block(input, &mut block)?;
            if n == 0 {
                return Ok(());
            }
            text.clear();
            for group in block[..n].chunks(4) {
                let mut padded = [0u8; 4];
                padded[..group.len()].copy_from_slice(group);
                encode_group(padded, group.len(), &mut text);
            }
            output.write_all(&text)?;
            if n < block.len() {
                return Ok(());
            }
        }
    }
}

/// Decodes Ascii85, ignoring whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ascii85Decode;

impl Stage for Ascii85Decode {
    fn name(&self) -> &'static str {
        "from-ascii85"
    }

    fn run(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<()> {
        let mut chunk = vec![0u8; CHUNK_SIZE];
        let mut decoded = Vec::with_capacity(CHUNK_SIZE);
        let mut value: u64 = 0;
        let mut count = 0usize;

        loop {
            let n = read_some(input, &mut chunk)?;
            if n == 0 {
                break;
            }
            decoded.clear();
            for &c in &chunk[..n] {
                match c {
                    b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' => {}
                    b'z' if count == 0 => decoded.extend_from_slice(&[0; 4]),
                    b'z' => {
                        return Err(FilterError::invalid("ascii85", "'z' inside a group").into())
                    }
                    FIRST..=LAST => {
                        value = value * 85 + u64::from(c - FIRST);
                        count += 1;
                        if count == 5 {
                            push_group(value, 4, &mut decoded)?;
                            value = 0;
                            count = 0;
                        }
                    }
                    other => {
                        return Err(FilterError::invalid(
                            "ascii85",
                            format!("illegal character {:?}", other as char),
                        )
                        .into())
                    }
                }
            }
            output.write_all(&decoded)?;
        }

        match count {
            0 => Ok(()),
            1 => Err(FilterError::Truncated { filter: "ascii85" }.into()),
            _ => {
                for _ in count..5 {
                    value = value * 85 + u64::from(LAST - FIRST);
                }
                decoded.clear();
                push_group(value, count - 1, &mut decoded)?;
                output.write_all(&decoded)
            }
        }
    }
}

fn push_group(value: u64, len: usize, out: &mut Vec<u8>) -> io::Result<()> {
    let value = u32::try_from(value)
        .map_err(|_| FilterError::invalid("ascii85", "group value overflows 32 bits"))?;
    out.extend_from_slice(&value.to_be_bytes()[..len]);
    Ok(())
}
