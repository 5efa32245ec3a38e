use std::io;

use filterprims_filters::FilterError;

/// Errors that can occur while encoding or decoding an envelope.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The first line is not a `-----BEGIN <label>-----` marker.
    #[error("missing or garbled BEGIN marker")]
    MissingBegin,

    /// The END marker names a different label than the BEGIN marker.
    #[error("BEGIN/END label mismatch (began '{begin}', ended '{end}')")]
    LabelMismatch { begin: String, end: String },

    /// The input ended before the END marker.
    #[error("incomplete envelope (input ended before the END marker)")]
    Incomplete,

    /// A line starts like an END marker but is not one.
    #[error("malformed END marker: {0:?}")]
    MalformedEnd(String),

    /// A BEGIN, header or END line exceeds the length limit.
    #[error("envelope line longer than {limit} bytes")]
    LineTooLong { limit: usize },

    /// The label cannot be written into a marker line.
    #[error("invalid label {label:?}: {reason}")]
    InvalidLabel { label: String, reason: &'static str },

    /// A header cannot be written as a `key: value` line.
    #[error("invalid header {key:?}: {reason}")]
    InvalidHeader { key: String, reason: &'static str },

    /// The payload stages could not be configured.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// An I/O error occurred while reading the markers or headers.
    #[error("envelope I/O error: {0}")]
    Io(#[from] io::Error),
}

impl EnvelopeError {
    /// Recover the envelope error carried by an `io::Error`, if any.
    pub fn from_io(err: &io::Error) -> Option<&EnvelopeError> {
        err.get_ref().and_then(|inner| inner.downcast_ref())
    }
}

impl From<EnvelopeError> for io::Error {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Io(err) => err,
            EnvelopeError::Filter(err) => err.into(),
            EnvelopeError::InvalidLabel { .. } | EnvelopeError::InvalidHeader { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, err)
            }
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

pub type Result<T> = std::result::Result<T, EnvelopeError>;
