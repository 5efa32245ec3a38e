use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};

use bytes::{Buf, Bytes};
use crossbeam_channel::{bounded, Receiver, Sender};

use crate::error::PipeError;

/// Largest chunk handed over in a single write.
///
/// Larger writes are split; `Write::write_all` loops over the remainder.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024;

/// Close reasons recorded by each end before its channel half is dropped.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    write_error: Mutex<Option<io::Error>>,
    read_error: Mutex<Option<io::Error>>,
}

impl Shared {
    pub(crate) fn set_write_error(&self, err: io::Error) {
        let mut slot = self.write_error.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    fn take_write_error(&self) -> Option<io::Error> {
        self.write_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn set_read_error(&self, err: io::Error) {
        let mut slot = self.read_error.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    fn take_read_error(&self) -> Option<io::Error> {
        self.read_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Create a connected pipe.
///
/// The handoff is a zero-capacity channel: [`PipeWriter::write`] returns only
/// once the [`PipeReader`] has taken the chunk, so at most one chunk per pipe
/// is ever held outside the producer.
pub fn pipe() -> (PipeReader, PipeWriter) {
    let (tx, rx) = bounded(0);
    let shared = Arc::new(Shared::default());
    let reader = PipeReader {
        rx,
        pending: Bytes::new(),
        shared: Arc::clone(&shared),
        state: ReadState::Open,
    };
    let writer = PipeWriter {
        tx: Some(tx),
        shared,
    };
    (reader, writer)
}

#[derive(Debug)]
enum ReadState {
    Open,
    Eof,
    Failed { kind: io::ErrorKind, message: String },
}

/// The read end of a [`pipe`].
///
/// Reads block until the writer hands over a chunk or closes its end. A close
/// with an error is returned as that original `io::Error` on the first read
/// that observes it; every later read fails with an error of the same kind.
#[derive(Debug)]
pub struct PipeReader {
    rx: Receiver<Bytes>,
    pending: Bytes,
    shared: Arc<Shared>,
    state: ReadState,
}

impl PipeReader {
    /// Close the read end. A blocked or later write fails with `BrokenPipe`.
    pub fn close(self) {}

    /// Close the read end, handing `err` to the producer's next write.
    pub fn close_with_error(self, err: impl Into<io::Error>) {
        self.shared.set_read_error(err.into());
    }

    fn finish(&mut self) -> io::Result<usize> {
        match self.shared.take_write_error() {
            Some(err) => {
                self.state = ReadState::Failed {
                    kind: err.kind(),
                    message: err.to_string(),
                };
                Err(err)
            }
            None => {
                self.state = ReadState::Eof;
                Ok(0)
            }
        }
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if self.pending.is_empty() {
            match &self.state {
                ReadState::Eof => return Ok(0),
                ReadState::Failed { kind, message } => {
                    return Err(PipeError::ClosedWithError {
                        kind: *kind,
                        message: message.clone(),
                    }
                    .into())
                }
                ReadState::Open => {}
            }

            match self.rx.recv() {
                Ok(chunk) => self.pending = chunk,
                Err(_) => return self.finish(),
            }
        }

        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.advance(n);
        Ok(n)
    }
}

/// The write end of a [`pipe`].
///
/// Dropping the writer is an ordinary close (end of stream) unless the thread
/// is unwinding from a panic, in which case the reader sees an error instead
/// of a truncated stream.
#[derive(Debug)]
pub struct PipeWriter {
    tx: Option<Sender<Bytes>>,
    shared: Arc<Shared>,
}

impl PipeWriter {
    /// Close the write end; the reader sees end of stream once drained.
    pub fn close(self) {}

    /// Close the write end with `err`; the reader's next read returns it.
    pub fn close_with_error(self, err: impl Into<io::Error>) {
        self.shared.set_write_error(err.into());
    }

    pub(crate) fn shared(&self) -> Arc<Shared> {
        Arc::clone(&self.shared)
    }

    fn read_closed(&self) -> io::Error {
        self.shared
            .take_read_error()
            .unwrap_or_else(|| PipeError::ReadClosed.into())
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let Some(tx) = &self.tx else {
            return Err(PipeError::ReadClosed.into());
        };

        let n = buf.len().min(MAX_CHUNK_SIZE);
        if tx.send(Bytes::copy_from_slice(&buf[..n])).is_err() {
            self.tx = None;
            return Err(self.read_closed());
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let name = std::thread::current()
                .name()
                .unwrap_or("unnamed")
                .to_string();
            self.shared.set_write_error(PipeError::StagePanicked(name).into());
        }
        // The error slot must be filled before the reader can observe the disconnect.
        self.tx.take();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn write_then_read_in_order() {
        let (mut reader, mut writer) = pipe();
        let producer = thread::spawn(move || {
            writer.write_all(b"first ").unwrap();
            writer.write_all(b"second").unwrap();
            writer.close();
        });

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        producer.join().unwrap();

        assert_eq!(out, b"first second");
    }

    #[test]
    fn small_reads_drain_a_chunk() {
        let (mut reader, mut writer) = pipe();
        let producer = thread::spawn(move || {
            writer.write_all(b"abcdef").unwrap();
        });

        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(reader.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
        producer.join().unwrap();
    }

    #[test]
    fn write_blocks_until_reader_takes_chunk() {
        let (mut reader, mut writer) = pipe();
        let written = Arc::new(AtomicBool::new(false));

        let producer = {
            let written = Arc::clone(&written);
            thread::spawn(move || {
                writer.write_all(b"hold").unwrap();
                written.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!written.load(Ordering::SeqCst), "write returned before any read");

        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).unwrap();
        producer.join().unwrap();
        assert!(written.load(Ordering::SeqCst));
    }

    #[test]
    fn large_write_is_split_into_chunks() {
        let (mut reader, mut writer) = pipe();
        let payload = vec![0x5Au8; MAX_CHUNK_SIZE * 2 + 17];
        let expected = payload.clone();

        let producer = thread::spawn(move || {
            let first = writer.write(&payload).unwrap();
            assert_eq!(first, MAX_CHUNK_SIZE);
            writer.write_all(&payload[first..]).unwrap();
        });

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        producer.join().unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn close_with_error_surfaces_once_then_keeps_kind() {
        let (mut reader, mut writer) = pipe();
        let producer = thread::spawn(move || {
            writer.write_all(b"partial").unwrap();
            writer.close_with_error(io::Error::new(io::ErrorKind::InvalidData, "bad input"));
        });

        let mut buf = [0u8; 16];
        assert_eq!(reader.read(&mut buf).unwrap(), 7);

        let err = reader.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(err.to_string(), "bad input");

        let again = reader.read(&mut buf).unwrap_err();
        assert_eq!(again.kind(), io::ErrorKind::InvalidData);
        let inner = again.get_ref().and_then(|e| e.downcast_ref::<PipeError>());
        assert!(matches!(inner, Some(PipeError::ClosedWithError { .. })));

        producer.join().unwrap();
    }

    #[test]
    fn dropped_reader_fails_blocked_writer() {
        let (reader, mut writer) = pipe();
        let producer = thread::spawn(move || writer.write_all(b"nobody listens"));

        thread::sleep(Duration::from_millis(20));
        reader.close();

        let err = producer.join().unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn reader_close_reason_reaches_writer() {
        let (reader, mut writer) = pipe();
        reader.close_with_error(io::Error::new(io::ErrorKind::Interrupted, "cancelled"));

        let err = writer.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
        assert_eq!(err.to_string(), "cancelled");

        let err = writer.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn panicking_producer_is_not_a_clean_eof() {
        let (mut reader, writer) = pipe();
        let producer = thread::Builder::new()
            .name("filter-boom".to_string())
            .spawn(move || {
                let _writer = writer;
                panic!("boom");
            })
            .unwrap();
        assert!(producer.join().is_err());

        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).unwrap_err();
        let inner = err.get_ref().and_then(|e| e.downcast_ref::<PipeError>());
        assert!(matches!(inner, Some(PipeError::StagePanicked(name)) if name == "filter-boom"));
    }

    #[test]
    fn empty_write_does_not_block() {
        let (_reader, mut writer) = pipe();
        assert_eq!(writer.write(&[]).unwrap(), 0);
    }
}
