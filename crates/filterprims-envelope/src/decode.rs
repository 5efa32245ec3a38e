use std::io::{self, BufRead, BufReader, Read, Write};

use filterprims_filters::lines::{copy_line, strip_line_ending};
use filterprims_pipe::{connect, produce, PipeReader};
use tracing::debug;

use crate::block::{parse_begin, parse_end, parse_header, Block, Headers, END_PREFIX};
use crate::config::EnvelopeConfig;
use crate::error::{EnvelopeError, Result};

/// Longest BEGIN, header or END line accepted, terminator excluded.
///
/// Payload lines are streamed and have no limit.
pub const MAX_LINE_LEN: usize = 8 * 1024;

/// A decoded envelope: the complete descriptor and the payload stream.
///
/// The payload is decoded while it is read. Format errors found after the
/// headers (a missing or mismatched END marker) and invalid payload characters
/// are reported by the payload's terminal read, never as a short success.
#[derive(Debug)]
pub struct Decoded {
    pub block: Block,
    pub payload: PipeReader,
}

impl Decoded {
    pub fn into_parts(self) -> (Block, PipeReader) {
        (self.block, self.payload)
    }
}

impl Read for Decoded {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.payload.read(buf)
    }
}

/// Parse an envelope from `input`.
///
/// The BEGIN marker and headers are read on the calling thread, so their
/// errors are returned here. The rest of the input is scanned by a separate
/// thread feeding the alphabet decoder of `config`.
pub fn decode<R>(input: R, config: &EnvelopeConfig) -> Result<Decoded>
where
    R: Read + Send + 'static,
{
    let mut input = BufReader::new(input);
    let mut line = Vec::new();

    if !read_line(&mut input, &mut line)? {
        return Err(EnvelopeError::MissingBegin);
    }
    let label = std::str::from_utf8(&line)
        .ok()
        .and_then(parse_begin)
        .ok_or(EnvelopeError::MissingBegin)?
        .to_string();
    debug!(%label, "envelope BEGIN marker");

    let mut headers = Headers::new();
    let separator = loop {
        line.clear();
        if !read_line(&mut input, &mut line)? {
            return Err(EnvelopeError::Incomplete);
        }
        match std::str::from_utf8(&line).ok().and_then(parse_header) {
            Some((key, value)) => {
                headers.insert(key, value);
            }
            None => break std::mem::take(&mut line),
        }
    };
    debug!(%label, headers = headers.len(), "envelope headers parsed");

    // A separator that is itself an END marker means an empty payload.
    let end_line = separator.starts_with(END_PREFIX.as_bytes()).then_some(separator);
    let scan_label = label.clone();
    let scanner = produce("envelope-scan", move |output: &mut dyn Write| {
        scan_payload(&mut input, end_line, &scan_label, output)
    });

    Ok(Decoded {
        block: Block { label, headers },
        payload: connect(scanner, config.alphabet.decoder()),
    })
}

/// Append one line to `line` without its terminator. Returns `false` if the
/// input is already at EOF.
fn read_line(input: &mut dyn BufRead, line: &mut Vec<u8>) -> Result<bool> {
    let start = line.len();
    loop {
        let buf = match input.fill_buf() {
            Ok(buf) => buf,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if buf.is_empty() {
            break;
        }
        let (used, newline) = match buf.iter().position(|&b| b == b'\n') {
            Some(end) => (end + 1, true),
            None => (buf.len(), false),
        };
        // Room for a `\r\n` terminator past the limit.
        if line.len() - start + used > MAX_LINE_LEN + 2 {
            return Err(EnvelopeError::LineTooLong {
                limit: MAX_LINE_LEN,
            });
        }
        line.extend_from_slice(&buf[..used]);
        input.consume(used);
        if newline {
            break;
        }
    }
    if line.len() == start {
        return Ok(false);
    }
    let len = start + strip_line_ending(&line[start..]).len();
    line.truncate(len);
    Ok(true)
}

/// Consume the longest prefix of an END marker at the start of a line into
/// `head`. Returns `false` if the input is already at EOF.
fn read_end_prefix(input: &mut dyn BufRead, head: &mut Vec<u8>) -> io::Result<bool> {
    let prefix = END_PREFIX.as_bytes();
    head.clear();
    while head.len() < prefix.len() {
        let byte = match input.fill_buf() {
            Ok(buf) => match buf.first() {
                Some(&byte) => byte,
                None => return Ok(!head.is_empty()),
            },
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        if byte != prefix[head.len()] {
            break;
        }
        input.consume(1);
        head.push(byte);
    }
    Ok(true)
}

fn scan_payload(
    input: &mut dyn BufRead,
    end_line: Option<Vec<u8>>,
    label: &str,
    output: &mut dyn Write,
) -> io::Result<()> {
    if let Some(end_line) = end_line {
        return check_end(&end_line, label);
    }

    // Payload lines go to the decoder in pieces as they arrive; only a line
    // opening with the END prefix is collected whole.
    let mut head = Vec::with_capacity(END_PREFIX.len());
    let mut lines = 0usize;
    loop {
        if !read_end_prefix(input, &mut head)? {
            return Err(EnvelopeError::Incomplete.into());
        }
        if head == END_PREFIX.as_bytes() {
            read_line(input, &mut head)?;
            debug!(%label, lines, "envelope END marker");
            return check_end(&head, label);
        }
        output.write_all(&head)?;
        if !copy_line(input, output)? {
            return Err(EnvelopeError::Incomplete.into());
        }
        lines += 1;
    }
}

fn check_end(line: &[u8], label: &str) -> io::Result<()> {
    let end = std::str::from_utf8(line)
        .ok()
        .and_then(parse_end)
        .ok_or_else(|| EnvelopeError::MalformedEnd(String::from_utf8_lossy(line).into_owned()))?;
    if end != label {
        return Err(EnvelopeError::LabelMismatch {
            begin: label.to_string(),
            end: end.to_string(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use filterprims_filters::{Alphabet, FilterError};
    use proptest::prelude::*;

    use super::*;
    use crate::encode::encode;

    const TEST_ONE: &str =
        "-----BEGIN Test One-----\nCOUNT: 100\n\nVGhpcyBpcyBvbmx5IGEgdGVzdA==\n-----END Test One-----\n";

    fn decode_str(text: &str) -> Result<Decoded> {
        decode(Cursor::new(text.as_bytes().to_vec()), &EnvelopeConfig::default())
    }

    fn read_payload(decoded: &mut Decoded) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        decoded.read_to_end(&mut out)?;
        Ok(out)
    }

    fn payload_error(text: &str) -> io::Error {
        let mut decoded = decode_str(text).unwrap();
        read_payload(&mut decoded).unwrap_err()
    }

    #[test]
    fn decodes_test_one() {
        let mut decoded = decode_str(TEST_ONE).unwrap();
        assert_eq!(decoded.block.label, "Test One");
        assert_eq!(
            decoded.block.headers.iter().collect::<Vec<_>>(),
            [("COUNT", "100")]
        );
        assert_eq!(read_payload(&mut decoded).unwrap(), b"This is only a test");
    }

    #[test]
    fn decodes_test_two() {
        let text = "-----BEGIN Test Two-----\n\
                    COUNT: 200\n\
                    \n\
                    VGhlIHF1aWNrIGJyb3duIGZveCBqdW1wZWQgb3ZlciB0aGUgbGF6eSBkb2cuICBU\n\
                    aGUgcXVpY2sgYnJvd24gZm94IGp1bXBlZCBvdmVyIHRoZSBsYXp5IGRvZy4=\n\
                    -----END Test Two-----\n";
        let mut decoded = decode_str(text).unwrap();
        assert_eq!(decoded.block.headers.get("COUNT"), Some("200"));
        assert_eq!(
            read_payload(&mut decoded).unwrap(),
            b"The quick brown fox jumped over the lazy dog.  The quick brown fox jumped over the lazy dog."
        );
    }

    #[test]
    fn accepts_crlf_line_endings() {
        let text = TEST_ONE.replace('\n', "\r\n");
        let mut decoded = decode_str(&text).unwrap();
        assert_eq!(decoded.block.headers.get("COUNT"), Some("100"));
        assert_eq!(read_payload(&mut decoded).unwrap(), b"This is only a test");
    }

    #[test]
    fn empty_payload() {
        let mut decoded = decode_str("-----BEGIN X-----\n\n-----END X-----\n").unwrap();
        assert!(decoded.block.headers.is_empty());
        assert!(read_payload(&mut decoded).unwrap().is_empty());
    }

    #[test]
    fn end_marker_as_separator_is_validated() {
        let mut decoded = decode_str("-----BEGIN X-----\nA: 1\n-----END X-----\n").unwrap();
        assert_eq!(decoded.block.headers.get("A"), Some("1"));
        assert!(read_payload(&mut decoded).unwrap().is_empty());

        let err = payload_error("-----BEGIN X-----\n-----END Y-----\n");
        assert!(matches!(
            EnvelopeError::from_io(&err),
            Some(EnvelopeError::LabelMismatch { .. })
        ));
    }

    #[test]
    fn missing_begin_is_a_format_error() {
        assert!(matches!(
            decode_str("COUNT: 100\n\nVGVzdA==\n-----END X-----\n"),
            Err(EnvelopeError::MissingBegin)
        ));
        assert!(matches!(decode_str(""), Err(EnvelopeError::MissingBegin)));
        assert!(matches!(
            decode_str("-----BEGIN -----\n\n-----END -----\n"),
            Err(EnvelopeError::MissingBegin)
        ));
    }

    #[test]
    fn label_mismatch() {
        let err = payload_error("-----BEGIN Alpha-----\n\nVGVzdA==\n-----END Beta-----\n");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(matches!(
            EnvelopeError::from_io(&err),
            Some(EnvelopeError::LabelMismatch { begin, end }) if begin == "Alpha" && end == "Beta"
        ));
    }

    #[test]
    fn eof_in_headers_is_incomplete() {
        assert!(matches!(
            decode_str("-----BEGIN X-----\nA: 1\n"),
            Err(EnvelopeError::Incomplete)
        ));
    }

    #[test]
    fn eof_in_payload_is_incomplete() {
        let err = payload_error("-----BEGIN X-----\n\nVGVzdA==\n");
        assert!(matches!(
            EnvelopeError::from_io(&err),
            Some(EnvelopeError::Incomplete)
        ));
    }

    #[test]
    fn garbled_end_is_malformed() {
        let err = payload_error("-----BEGIN X-----\n\nVGVzdA==\n-----END X----\n");
        assert!(matches!(
            EnvelopeError::from_io(&err),
            Some(EnvelopeError::MalformedEnd(line)) if line == "-----END X----"
        ));
    }

    #[test]
    fn invalid_payload_character_is_a_filter_error() {
        let err = payload_error("-----BEGIN X-----\n\nVGV*dA==\n-----END X-----\n");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(matches!(
            FilterError::from_io(&err),
            Some(FilterError::InvalidInput { .. })
        ));
        assert!(EnvelopeError::from_io(&err).is_none());
    }

    #[test]
    fn duplicate_header_keeps_last_value() {
        let text = "-----BEGIN X-----\nA: 1\nB: 2\nA: 3\n\n-----END X-----\n";
        let decoded = decode_str(text).unwrap();
        assert_eq!(
            decoded.block.headers.iter().collect::<Vec<_>>(),
            [("A", "3"), ("B", "2")]
        );
    }

    #[test]
    fn width_multiple_payload() {
        let text = "-----BEGIN X-----\n\nYWJj\nZGVm\n-----END X-----\n";
        let mut decoded = decode_str(text).unwrap();
        assert_eq!(read_payload(&mut decoded).unwrap(), b"abcdef");
    }

    fn roundtrip(payload: Vec<u8>, block: &Block, config: &EnvelopeConfig) -> (Block, Vec<u8>) {
        let text = encode(Cursor::new(payload), block, config).unwrap();
        let (block, mut reader) = decode(text, config).unwrap().into_parts();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        (block, out)
    }

    #[test]
    fn every_alphabet_roundtrips() {
        let data: Vec<u8> = (0..=255u8).cycle().take(3000).collect();
        let block = Block::new("DATA").with_header("Kind", "bytes");
        for alphabet in Alphabet::ALL {
            let config = EnvelopeConfig::default().with_alphabet(alphabet);
            let (decoded, out) = roundtrip(data.clone(), &block, &config);
            assert_eq!(decoded, block, "alphabet {alphabet}");
            assert_eq!(out, data, "alphabet {alphabet}");
        }
    }

    /// Yields `fill` bytes up to `limit`, counting what has been handed out.
    struct Counting {
        fill: u8,
        produced: Arc<AtomicUsize>,
        limit: usize,
    }

    impl Counting {
        fn new(fill: u8, limit: usize) -> (Self, Arc<AtomicUsize>) {
            let produced = Arc::new(AtomicUsize::new(0));
            let source = Self {
                fill,
                produced: Arc::clone(&produced),
                limit,
            };
            (source, produced)
        }
    }

    impl Read for Counting {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let produced = self.produced.load(Ordering::SeqCst);
            let n = buf.len().min(4096).min(self.limit - produced);
            buf[..n].fill(self.fill);
            self.produced.fetch_add(n, Ordering::SeqCst);
            Ok(n)
        }
    }

    #[test]
    fn dropping_payload_stops_the_scanner() {
        let (source, produced) = Counting::new(7, usize::MAX);
        let config = EnvelopeConfig::default();
        let text = encode(source, &Block::new("BIG"), &config).unwrap();
        let mut decoded = decode(text, &config).unwrap();
        let mut first = [0u8; 16];
        decoded.read_exact(&mut first).unwrap();
        assert_eq!(first, [7u8; 16]);
        drop(decoded);

        std::thread::sleep(Duration::from_millis(100));
        let settled = produced.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(produced.load(Ordering::SeqCst), settled, "source kept producing");
    }

    #[test]
    fn unbroken_payload_line_is_streamed() {
        let (body, produced) = Counting::new(b'A', 64 << 20);
        let text = Cursor::new(b"-----BEGIN X-----\n\n".to_vec()).chain(body);
        let mut decoded = decode(text, &EnvelopeConfig::default()).unwrap();

        let mut first = [0u8; 3];
        decoded.read_exact(&mut first).unwrap();
        assert_eq!(first, [0u8; 3]);

        std::thread::sleep(Duration::from_millis(50));
        let buffered = produced.load(Ordering::SeqCst);
        assert!(buffered < 1 << 20, "read {buffered} bytes ahead");
    }

    #[test]
    fn overlong_header_line_is_rejected() {
        let (body, produced) = Counting::new(b'k', 64 << 20);
        let text = Cursor::new(b"-----BEGIN X-----\n".to_vec()).chain(body);
        assert!(matches!(
            decode(text, &EnvelopeConfig::default()),
            Err(EnvelopeError::LineTooLong { limit: MAX_LINE_LEN })
        ));
        assert!(produced.load(Ordering::SeqCst) < 1 << 20);

        let header = format!("-----BEGIN X-----\nK: {}\n\n-----END X-----\n", "v".repeat(100));
        assert_eq!(decode_str(&header).unwrap().block.headers.len(), 1);
    }

    #[test]
    fn overlong_end_line_is_rejected() {
        let text = format!("-----BEGIN X-----\n\n-----END {}\n", "x".repeat(2 * MAX_LINE_LEN));
        let err = payload_error(&text);
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(matches!(
            EnvelopeError::from_io(&err),
            Some(EnvelopeError::LineTooLong { .. })
        ));
    }

    #[test]
    fn payload_line_sharing_the_end_prefix_is_data() {
        let text = "-----BEGIN X-----\n\n-----ENDXX\n-----END X-----\n";
        let config = EnvelopeConfig::default().with_alphabet(Alphabet::Ascii85);
        let mut decoded = decode(Cursor::new(text.as_bytes().to_vec()), &config).unwrap();
        assert_eq!(
            read_payload(&mut decoded).unwrap(),
            [37, 200, 2, 28, 113, 172, 70, 210]
        );
    }

    proptest! {
        #[test]
        fn envelope_roundtrip(
            payload in proptest::collection::vec(any::<u8>(), 0..2048),
            label in "[ -~]{1,24}".prop_filter("label holds a dash run", |l| !l.contains("-----")),
            fields in proptest::collection::vec(("[!-~]{1,12}", "[ -~]{0,24}"), 0..6),
            width in 1usize..100,
            alphabet in proptest::sample::select(Alphabet::ALL.to_vec()),
        ) {
            let block = Block { label, headers: fields.into_iter().collect() };
            let config = EnvelopeConfig { line_width: width, alphabet };
            let (decoded, out) = roundtrip(payload.clone(), &block, &config);
            prop_assert_eq!(decoded, block);
            prop_assert_eq!(out, payload);
        }
    }
}
