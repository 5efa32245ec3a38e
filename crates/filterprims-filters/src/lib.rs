//! Streaming stages for filterprims pipelines.
//!
//! Every type here implements [`filterprims_pipe::Stage`] and can be chained
//! with [`filterprims_pipe::connect`]:
//! - binary-to-text alphabets: base64, hex, ascii85 and a `0`/`1` bit string
//! - deflate and zlib compression at maximum level
//! - the line framer ([`SplitLines`] / [`CombineLines`])
//! - [`Tee`], which copies a stream to a second sink
//!
//! Decoders reject characters outside their alphabet with
//! `io::ErrorKind::InvalidData` carrying a [`FilterError`], so corrupt input
//! can be told apart from a broken transport.

pub mod alphabet;
pub mod ascii85;
pub mod base64;
pub mod binary;
pub mod error;
pub mod flate;
pub mod hex;
pub mod kind;
pub mod lines;
pub mod tee;

pub use self::alphabet::Alphabet;
pub use self::ascii85::{Ascii85Decode, Ascii85Encode};
pub use self::base64::{Base64Decode, Base64Encode};
pub use self::binary::{FromBinary, ToBinary};
pub use self::error::{FilterError, Result};
pub use self::flate::{Compress, Decompress, Format};
pub use self::hex::{HexDecode, HexEncode};
pub use self::kind::FilterKind;
pub use self::lines::{CombineLines, SplitLines, DEFAULT_LINE_WIDTH};
pub use self::tee::Tee;

/// Chunk size used by stages that read their input in blocks.
pub(crate) const CHUNK_SIZE: usize = 12 * 1024;
