use std::io::{self, BufRead, BufReader, Read, Write};

use filterprims_pipe::{read_block, Stage};

use crate::error::{FilterError, Result};
use crate::CHUNK_SIZE;

/// Default width of a split line, in bytes.
pub const DEFAULT_LINE_WIDTH: usize = 72;

/// Splits a stream into `width`-byte lines, each terminated by `\n`.
///
/// The final line may be short. Input whose length is a multiple of the width
/// produces no trailing empty line, and empty input produces no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitLines {
    width: usize,
}

impl SplitLines {
    /// Create a splitter producing lines of `width` bytes.
    pub fn new(width: usize) -> Result<Self> {
        if width == 0 {
            return Err(FilterError::InvalidWidth);
        }
        Ok(Self { width })
    }

    /// Line width in bytes, excluding the newline.
    pub fn width(&self) -> usize {
        self.width
    }
}

impl Default for SplitLines {
    fn default() -> Self {
        Self {
            width: DEFAULT_LINE_WIDTH,
        }
    }
}

impl Stage for SplitLines {
    fn name(&self) -> &'static str {
        "split-lines"
    }

    fn run(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<()> {
        // A line wider than one chunk is written in pieces; the last piece
        // carries the newline.
        let piece = self.width.min(CHUNK_SIZE);
        let mut buf = vec![0u8; piece + 1];
        loop {
            let mut column = 0;
            loop {
                let want = (self.width - column).min(piece);
                let n = read_block(input, &mut buf[..want])?;
                column += n;
                let line_done = column == self.width || n < want;
                if line_done && column > 0 {
                    buf[n] = b'\n';
                    output.write_all(&buf[..=n])?;
                } else if n > 0 {
                    output.write_all(&buf[..n])?;
                }
                if line_done {
                    break;
                }
            }
            if column < self.width {
                return Ok(());
            }
        }
    }
}

/// Joins newline-terminated lines back into one stream.
///
/// `\n` and `\r\n` terminators are removed and nothing is inserted between
/// lines; a final line without a terminator is passed through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombineLines;

impl Stage for CombineLines {
    fn name(&self) -> &'static str {
        "combine-lines"
    }

    fn run(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<()> {
        let mut reader = BufReader::with_capacity(CHUNK_SIZE, input);
        while copy_line(&mut reader, output)? {}
        Ok(())
    }
}

/// Copy the rest of the current line from `input` to `output`, dropping its
/// `\n` or `\r\n` terminator.
///
/// Returns `false` if the input ended before a `\n`. The line is never held
/// whole: memory use is bounded by the reader's buffer.
pub fn copy_line(input: &mut dyn BufRead, output: &mut dyn Write) -> io::Result<bool> {
    // A `\r` at the end of one buffer is held until the next byte is known.
    let mut pending_cr = false;
    loop {
        let buf = match input.fill_buf() {
            Ok(buf) => buf,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        if buf.is_empty() {
            if pending_cr {
                output.write_all(b"\r")?;
            }
            return Ok(false);
        }

        let (mut body, newline) = match buf.iter().position(|&b| b == b'\n') {
            Some(end) => (&buf[..end], true),
            None => (buf, false),
        };
        let used = body.len() + usize::from(newline);
        if pending_cr && !(newline && body.is_empty()) {
            output.write_all(b"\r")?;
        }
        pending_cr = false;
        if let Some(stripped) = body.strip_suffix(b"\r") {
            body = stripped;
            pending_cr = !newline;
        }
        output.write_all(body)?;
        input.consume(used);
        if newline {
            return Ok(true);
        }
    }
}

/// Strip a trailing `\n` or `\r\n` from `line`.
pub fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
