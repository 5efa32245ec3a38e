use std::fmt;
use std::str::FromStr;

use filterprims_pipe::Stage;

use crate::error::FilterError;
use crate::{Ascii85Decode, Ascii85Encode, Base64Decode, Base64Encode, HexDecode, HexEncode};

/// A binary-to-text encoding usable as an envelope payload alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Alphabet {
    #[default]
    Base64,
    Hex,
    Ascii85,
}

impl Alphabet {
    pub const ALL: [Alphabet; 3] = [Alphabet::Base64, Alphabet::Hex, Alphabet::Ascii85];

    pub fn name(self) -> &'static str {
        match self {
            Alphabet::Base64 => "base64",
            Alphabet::Hex => "hex",
            Alphabet::Ascii85 => "ascii85",
        }
    }

    /// Stage turning raw bytes into this alphabet.
    pub fn encoder(self) -> Box<dyn Stage> {
        match self {
            Alphabet::Base64 => Box::new(Base64Encode),
            Alphabet::Hex => Box::new(HexEncode),
            Alphabet::Ascii85 => Box::new(Ascii85Encode),
        }
    }

    /// Stage turning this alphabet back into raw bytes.
    pub fn decoder(self) -> Box<dyn Stage> {
        match self {
            Alphabet::Base64 => Box::new(Base64Decode),
            Alphabet::Hex => Box::new(HexDecode),
            Alphabet::Ascii85 => Box::new(Ascii85Decode),
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Alphabet {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Alphabet::ALL
            .into_iter()
            .find(|alphabet| alphabet.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| FilterError::UnknownAlphabet(s.to_string()))
    }
}
