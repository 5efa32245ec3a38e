use std::io::{self, Read, Write};

use filterprims_pipe::{read_some, Stage};

use crate::error::FilterError;

const CHUNK: usize = 1024;

/// Writes each input bit as `'0'` or `'1'`, least significant bit first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToBinary;

impl Stage for ToBinary {
    fn name(&self) -> &'static str {
        "to-binary"
    }

    fn run(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<()> {
        let mut chunk = [0u8; CHUNK];
        let mut bits = Vec::with_capacity(CHUNK * 8);
        loop {
            let n = read_some(input, &mut chunk)?;
            if n == 0 {
                return Ok(());
            }
            bits.clear();
            for byte in &chunk[..n] {
                bits.extend((0..8).map(|bit| if (byte >> bit) & 1 == 1 { b'1' } else { b'0' }));
            }
            output.write_all(&bits)?;
        }
    }
}

/// Packs a `'0'`/`'1'` string produced by [`ToBinary`] back into bytes.
///
/// Line breaks are ignored; any other character, or a final group shorter
/// than eight bits, is invalid input.
#[derive(Debug, Clone, Copy, Default)]
pub struct FromBinary;

impl Stage for FromBinary {
    fn name(&self) -> &'static str {
        "from-binary"
    }

    fn run(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<()> {
        let mut chunk = [0u8; CHUNK * 8];
        let mut bytes = Vec::with_capacity(CHUNK);
        let mut current = 0u8;
        let mut filled = 0u32;

        loop {
            let n = read_some(input, &mut chunk)?;
            if n == 0 {
                break;
            }
            bytes.clear();
            for &c in &chunk[..n] {
                let bit = match c {
                    b'0' => 0,
                    b'1' => 1,
                    b'\r' | b'\n' => continue,
                    other => {
                        return Err(FilterError::invalid(
                            "binary",
                            format!("illegal character {:?}", other as char),
                        )
                        .into())
                    }
                };
                current |= bit << filled;
                filled += 1;
                if filled == 8 {
                    bytes.push(current);
                    current = 0;
                    filled = 0;
                }
            }
            output.write_all(&bytes)?;
        }

        if filled != 0 {
            return Err(FilterError::Truncated { filter: "binary" }.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn run(stage: &mut dyn Stage, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        stage.run(&mut Cursor::new(data.to_vec()), &mut out)?;
        Ok(out)
    }

    #[test]
    fn least_significant_bit_first() {
        assert_eq!(run(&mut ToBinary, &[0x01, 0x80]).unwrap(), b"1000000000000001");
    }

    #[test]
    fn roundtrip_all_byte_values() {
        let data: Vec<u8> = (0..=255u8).collect();
        let bits = run(&mut ToBinary, &data).unwrap();
        assert_eq!(bits.len(), data.len() * 8);
        assert_eq!(run(&mut FromBinary, &bits).unwrap(), data);
    }

    #[test]
    fn rejects_other_characters() {
        let err = run(&mut FromBinary, b"0101x101").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn rejects_partial_byte() {
        let err = run(&mut FromBinary, b"0101").unwrap_err();
        assert!(matches!(
            FilterError::from_io(&err),
            Some(FilterError::Truncated { filter: "binary" })
        ));
    }
}
