use std::io;

/// Errors raised by pipe handles and stage wiring.
#[derive(Debug, thiserror::Error)]
pub enum PipeError {
    /// The read end was closed while the producer was still writing.
    #[error("write on closed pipe")]
    ReadClosed,

    /// The stage feeding this pipe panicked before closing it.
    #[error("stage '{0}' panicked")]
    StagePanicked(String),

    /// The stage thread could not be started.
    #[error("failed to spawn stage '{name}': {source}")]
    Spawn { name: String, source: io::Error },

    /// The pipe was closed with an error that has already been reported.
    #[error("pipe closed with error: {message}")]
    ClosedWithError { kind: io::ErrorKind, message: String },
}

impl PipeError {
    /// The `io::ErrorKind` this error maps to at a stream boundary.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            PipeError::ReadClosed => io::ErrorKind::BrokenPipe,
            PipeError::StagePanicked(_) | PipeError::Spawn { .. } => io::ErrorKind::Other,
            PipeError::ClosedWithError { kind, .. } => *kind,
        }
    }
}

impl From<PipeError> for io::Error {
    fn from(err: PipeError) -> Self {
        io::Error::new(err.kind(), err)
    }
}

pub type Result<T> = std::result::Result<T, PipeError>;
