use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use filterprims_pipe::{read_some, Stage};
use tracing::debug;

use crate::CHUNK_SIZE;

/// Passes its input through unchanged while copying it to a second sink.
///
/// A failure writing to the sink is terminal for the stage, like any other
/// write failure.
#[derive(Debug)]
pub struct Tee<W> {
    sink: W,
}

impl<W: Write + Send + 'static> Tee<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    /// Consume the stage and return the sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl Tee<BufWriter<File>> {
    /// Tee into a newly created (or truncated) file at `path`.
    pub fn to_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)?;
        debug!(?path, "tee writing to file");
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send + 'static> Stage for Tee<W> {
    fn name(&self) -> &'static str {
        "tee"
    }

    fn run(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<()> {
        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            let n = read_some(input, &mut chunk)?;
            if n == 0 {
                return self.sink.flush();
            }
            self.sink.write_all(&chunk[..n])?;
            output.write_all(&chunk[..n])?;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use filterprims_pipe::connect;

    use super::*;

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::StorageFull, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn copies_to_sink_and_output() {
        let sink = SharedSink::default();
        let mut out = Vec::new();
        connect(Cursor::new(b"duplicate me".to_vec()), Tee::new(sink.clone()))
            .read_to_end(&mut out)
            .unwrap();

        assert_eq!(out, b"duplicate me");
        assert_eq!(sink.0.lock().unwrap().as_slice(), b"duplicate me");
    }

    #[test]
    fn sink_failure_is_terminal() {
        let mut out = Vec::new();
        let err = connect(Cursor::new(b"data".to_vec()), Tee::new(BrokenSink))
            .read_to_end(&mut out)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::StorageFull);
        assert!(out.is_empty());
    }

    #[test]
    fn to_file_writes_a_copy() {
        let dir = std::env::temp_dir().join(format!("filterprims-tee-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("copy.bin");

        let tee = Tee::to_file(&path).unwrap();
        let mut out = Vec::new();
        connect(Cursor::new(b"to disk".to_vec()), tee)
            .read_to_end(&mut out)
            .unwrap();

        assert_eq!(out, b"to disk");
        assert_eq!(std::fs::read(&path).unwrap(), b"to disk");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
