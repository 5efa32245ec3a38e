//! Unbuffered blocking pipes and thread-per-stage wiring.
//!
//! This is the lowest layer of filterprims. A [`Stage`] runs on its own thread
//! and talks to its neighbours only through a [`pipe`]:
//! - a write blocks until the reader has taken the chunk (backpressure)
//! - closing the write end with an error surfaces that error on the next read
//! - dropping the read end makes the producer's next write fail
//!
//! Everything else in the workspace is built from [`connect`] and [`produce`].

pub mod error;
pub mod pipe;
pub mod stage;

pub use error::{PipeError, Result};
pub use pipe::{pipe, PipeReader, PipeWriter, MAX_CHUNK_SIZE};
pub use stage::{connect, produce, read_block, read_some, Pipeline, Stage};
