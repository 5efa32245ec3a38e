use std::fmt;
use std::io;

use filterprims_envelope::EnvelopeError;
use filterprims_filters::FilterError;

// Exit codes follow the rsfulmen/DDR-0002 conventions.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Map a stream error to an exit code, looking through to the typed filter or
/// envelope error a stage attached to it.
pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = if let Some(inner) = EnvelopeError::from_io(&err) {
        envelope_code(inner)
    } else if let Some(inner) = FilterError::from_io(&err) {
        filter_code(inner)
    } else {
        match err.kind() {
            io::ErrorKind::InvalidData => DATA_INVALID,
            io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
            io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => FAILURE,
            _ => INTERNAL,
        }
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn filter_error(context: &str, err: FilterError) -> CliError {
    CliError::new(filter_code(&err), format!("{context}: {err}"))
}

pub fn envelope_error(context: &str, err: EnvelopeError) -> CliError {
    match err {
        EnvelopeError::Io(source) => io_error(context, source),
        other => CliError::new(envelope_code(&other), format!("{context}: {other}")),
    }
}

fn filter_code(err: &FilterError) -> i32 {
    match err {
        FilterError::InvalidInput { .. } | FilterError::Truncated { .. } => DATA_INVALID,
        FilterError::InvalidWidth
        | FilterError::UnknownFilter(_)
        | FilterError::UnknownAlphabet(_) => USAGE,
    }
}

fn envelope_code(err: &EnvelopeError) -> i32 {
    match err {
        EnvelopeError::MissingBegin
        | EnvelopeError::LabelMismatch { .. }
        | EnvelopeError::Incomplete
        | EnvelopeError::MalformedEnd(_)
        | EnvelopeError::LineTooLong { .. } => DATA_INVALID,
        EnvelopeError::InvalidLabel { .. } | EnvelopeError::InvalidHeader { .. } => USAGE,
        EnvelopeError::Filter(err) => filter_code(err),
        EnvelopeError::Io(_) => INTERNAL,
    }
}
