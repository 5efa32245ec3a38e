use std::io::{self, Read, Write};

use filterprims_pipe::{read_some, Stage};
use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::{Compression, FlushDecompress, Status};

use crate::error::FilterError;
use crate::CHUNK_SIZE;

/// Container format of a compressed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Raw DEFLATE (RFC 1951).
    Deflate,
    /// DEFLATE with a zlib header and Adler-32 trailer (RFC 1950).
    Zlib,
}

impl Format {
    fn label(self) -> &'static str {
        match self {
            Format::Deflate => "deflate",
            Format::Zlib => "zlib",
        }
    }
}

/// Compresses a stream at maximum compression level.
#[derive(Debug, Clone, Copy)]
pub struct Compress {
    format: Format,
    level: Compression,
}

impl Compress {
    /// Raw DEFLATE output.
    pub fn deflate() -> Self {
        Self {
            format: Format::Deflate,
            level: Compression::best(),
        }
    }

    /// zlib-wrapped output.
    pub fn zlib() -> Self {
        Self {
            format: Format::Zlib,
            level: Compression::best(),
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }
}

impl Stage for Compress {
    fn name(&self) -> &'static str {
        self.format.label()
    }

    fn run(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<()> {
        match self.format {
            Format::Deflate => {
                let mut encoder = DeflateEncoder::new(output, self.level);
                io::copy(input, &mut encoder)?;
                encoder.finish()?;
            }
            Format::Zlib => {
                let mut encoder = ZlibEncoder::new(output, self.level);
                io::copy(input, &mut encoder)?;
                encoder.finish()?;
            }
        }
        Ok(())
    }
}

/// Decompresses a stream produced by [`Compress`].
///
/// A corrupt stream, or one that ends before its final block, is invalid
/// input rather than a short but successful read.
#[derive(Debug, Clone, Copy)]
pub struct Decompress {
    format: Format,
}

impl Decompress {
    /// Raw DEFLATE input.
    pub fn deflate() -> Self {
        Self {
            format: Format::Deflate,
        }
    }

    /// zlib-wrapped input.
    pub fn zlib() -> Self {
        Self {
            format: Format::Zlib,
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }
}

impl Stage for Decompress {
    fn name(&self) -> &'static str {
        match self.format {
            Format::Deflate => "inflate",
            Format::Zlib => "unzlib",
        }
    }

    fn run(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<()> {
        let label = self.format.label();
        let mut inflater = flate2::Decompress::new(self.format == Format::Zlib);
        let mut inbuf = vec![0u8; CHUNK_SIZE];
        let mut outbuf = vec![0u8; CHUNK_SIZE];

        loop {
            let n = read_some(input, &mut inbuf)?;
            if n == 0 {
                return Err(FilterError::Truncated { filter: label }.into());
            }

            let mut data = &inbuf[..n];
            loop {
                let before_in = inflater.total_in();
                let before_out = inflater.total_out();
                let status = inflater
                    .decompress(data, &mut outbuf, FlushDecompress::None)
                    .map_err(|err| FilterError::invalid(label, err.to_string()))?;
                let consumed = (inflater.total_in() - before_in) as usize;
                let produced = (inflater.total_out() - before_out) as usize;

                output.write_all(&outbuf[..produced])?;
                data = &data[consumed..];

                if status == Status::StreamEnd {
                    return Ok(());
                }
                let stalled = consumed == 0 && produced == 0;
                let output_full = produced == outbuf.len();
                if stalled || (data.is_empty() && !output_full) {
                    break;
                }
            }
        }
    }
}
