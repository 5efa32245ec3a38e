//! PEM-style envelopes: a labeled, line-wrapped text block carrying a binary
//! payload plus optional key/value headers.
//!
//! ```text
//! -----BEGIN <label>-----
//! <key>: <value>
//!
//! <width>-character lines of encoded payload
//! -----END <label>-----
//! ```
//!
//! Encoding and decoding are both streaming: the payload flows through the
//! alphabet and line-framing stages of `filterprims-filters` on their own
//! threads, so neither direction holds the whole payload in memory.

pub mod block;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;

pub use block::{Block, Headers};
pub use config::{EnvelopeConfig, DEFAULT_ENVELOPE_WIDTH};
pub use decode::{decode, Decoded, MAX_LINE_LEN};
pub use encode::encode;
pub use error::{EnvelopeError, Result};
