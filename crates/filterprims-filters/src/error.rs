use std::io;

/// Errors raised by filter stages and their constructors.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// The input contains data outside the stage's alphabet or format.
    #[error("invalid {filter} input: {reason}")]
    InvalidInput { filter: &'static str, reason: String },

    /// The input ended in the middle of an encoded unit.
    #[error("truncated {filter} input")]
    Truncated { filter: &'static str },

    /// A line framer was configured with a zero width.
    #[error("line width must be at least 1")]
    InvalidWidth,

    /// No filter is known by this name.
    #[error("unknown filter '{0}'")]
    UnknownFilter(String),

    /// No binary-to-text alphabet is known by this name.
    #[error("unknown alphabet '{0}'")]
    UnknownAlphabet(String),
}

impl FilterError {
    pub(crate) fn invalid(filter: &'static str, reason: impl Into<String>) -> Self {
        FilterError::InvalidInput {
            filter,
            reason: reason.into(),
        }
    }

    /// Recover the filter error carried by an `io::Error`, if any.
    pub fn from_io(err: &io::Error) -> Option<&FilterError> {
        err.get_ref().and_then(|inner| inner.downcast_ref())
    }
}

impl From<FilterError> for io::Error {
    fn from(err: FilterError) -> Self {
        let kind = match err {
            FilterError::InvalidInput { .. } | FilterError::Truncated { .. } => {
                io::ErrorKind::InvalidData
            }
            FilterError::InvalidWidth
            | FilterError::UnknownFilter(_)
            | FilterError::UnknownAlphabet(_) => io::ErrorKind::InvalidInput,
        };
        io::Error::new(kind, err)
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
