use std::io::{self, ErrorKind, Read, Write};
use std::thread;

use tracing::{debug, warn};

use crate::error::PipeError;
use crate::pipe::{pipe, PipeReader};

/// A streaming transformation with one input and one output.
///
/// `run` is called once, on a dedicated thread, by [`connect`]. Returning
/// `Ok(())` closes the output with end of stream; returning `Err` closes it
/// with that error so the consumer observes it on its next read.
pub trait Stage: Send + 'static {
    /// Short name used for the thread name and in logs.
    fn name(&self) -> &'static str;

    /// Consume `input` and write the transformed stream to `output`.
    fn run(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<()>;
}

impl<S: Stage + ?Sized> Stage for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn run(&mut self, input: &mut dyn Read, output: &mut dyn Write) -> io::Result<()> {
        (**self).run(input, output)
    }
}

/// Run `stage` over `input` on its own thread and return its output stream.
///
/// The input moves into the stage thread and is dropped when the stage
/// finishes. When the input is itself a [`PipeReader`], that drop closes the
/// upstream pipe, so a failure anywhere in a chain unwinds every stage above it.
pub fn connect<R, S>(input: R, stage: S) -> PipeReader
where
    R: Read + Send + 'static,
    S: Stage,
{
    let name = stage.name();
    let mut input = input;
    let mut stage = stage;
    produce(name, move |output| stage.run(&mut input, output))
}

/// Run a source `body` on its own thread and return the stream it writes.
pub fn produce<F>(name: &'static str, body: F) -> PipeReader
where
    F: FnOnce(&mut dyn Write) -> io::Result<()> + Send + 'static,
{
    let (reader, mut writer) = pipe();
    let shared = writer.shared();

    let spawned = thread::Builder::new()
        .name(format!("filter-{name}"))
        .spawn(move || {
            debug!(stage = name, "stage started");
            match body(&mut writer) {
                Ok(()) => {
                    debug!(stage = name, "stage finished");
                    writer.close();
                }
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                    debug!(stage = name, "downstream closed; stage stopping");
                    writer.close_with_error(err);
                }
                Err(err) => {
                    warn!(stage = name, error = %err, "stage failed");
                    writer.close_with_error(err);
                }
            }
        });

    if let Err(source) = spawned {
        warn!(stage = name, error = %source, "failed to spawn stage thread");
        shared.set_write_error(
            PipeError::Spawn {
                name: name.to_string(),
                source,
            }
            .into(),
        );
    }

    reader
}

/// Fill `buf` from `input`, stopping early only at end of stream.
///
/// Returns the number of bytes read; a short count means the input is
/// exhausted.
pub fn read_block(input: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

/// Read whatever `input` has available, retrying on `Interrupted`.
pub fn read_some(input: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match input.read(buf) {
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// A chain of stages built by repeated [`connect`] calls.
///
/// ```no_run
/// # use std::io::Read;
/// # use filterprims_pipe::{Pipeline, Stage};
/// # fn demo(a: impl Stage, b: impl Stage) -> std::io::Result<()> {
/// let mut out = Vec::new();
/// Pipeline::new(std::io::stdin())
///     .then(a)
///     .then(b)
///     .read_to_end(&mut out)?;
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    head: Box<dyn Read + Send>,
    stages: Vec<&'static str>,
}

impl Pipeline {
    /// Start a pipeline reading from `input`.
    pub fn new(input: impl Read + Send + 'static) -> Self {
        Self {
            head: Box::new(input),
            stages: Vec::new(),
        }
    }

    /// Append a stage; its input is the current end of the chain.
    pub fn then(self, stage: impl Stage) -> Self {
        let mut stages = self.stages;
        stages.push(stage.name());
        Self {
            head: Box::new(connect(self.head, stage)),
            stages,
        }
    }

    /// Names of the connected stages, first to last.
    pub fn stages(&self) -> &[&'static str] {
        &self.stages
    }

    /// Copy the whole output of the chain into `output`.
    pub fn copy_to(mut self, output: &mut dyn Write) -> io::Result<u64> {
        io::copy(&mut self.head, output)
    }

    /// The output stream of the last stage.
    pub fn into_reader(self) -> Box<dyn Read + Send> {
        self.head
    }
}

impl Read for Pipeline {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.head.read(buf)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages)
            .finish()
    }
}
