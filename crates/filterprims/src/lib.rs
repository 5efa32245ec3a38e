//! Composable streaming filters and PEM-style envelopes.
//!
//! Each filter stage runs on its own thread and hands data to the next stage
//! through an unbuffered pipe, so a chain streams with bounded memory and a
//! slow consumer holds back every producer above it.
//!
//! # Crate Structure
//!
//! - [`pipe`]: Blocking pipes, the `Stage` trait and `Pipeline` wiring
//! - [`filters`]: Encoding, compression, line framing and tee stages
//! - [`envelope`]: Labeled text envelopes with key/value headers

/// Re-export pipe types.
pub mod pipe {
    pub use filterprims_pipe::*;
}

/// Re-export filter stages.
pub mod filters {
    pub use filterprims_filters::*;
}

/// Re-export envelope types.
pub mod envelope {
    pub use filterprims_envelope::*;
}
