use filterprims_filters::Alphabet;

/// Default width of an envelope payload line, in characters.
pub const DEFAULT_ENVELOPE_WIDTH: usize = 64;

/// Configuration for envelope encoding and decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeConfig {
    /// Width of each encoded payload line. Default: 64. Ignored when decoding.
    pub line_width: usize,
    /// Binary-to-text alphabet of the payload. Default: base64.
    pub alphabet: Alphabet,
}

impl EnvelopeConfig {
    pub fn with_line_width(mut self, line_width: usize) -> Self {
        self.line_width = line_width;
        self
    }

    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = alphabet;
        self
    }
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            line_width: DEFAULT_ENVELOPE_WIDTH,
            alphabet: Alphabet::default(),
        }
    }
}
