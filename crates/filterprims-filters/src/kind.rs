use std::fmt;
use std::str::FromStr;

use filterprims_pipe::Stage;

use crate::error::{FilterError, Result};
use crate::{
    Ascii85Decode, Ascii85Encode, Base64Decode, Base64Encode, CombineLines, Compress, Decompress,
    FromBinary, HexDecode, HexEncode, SplitLines, ToBinary,
};

/// Every stage that can be selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    ToBase64,
    FromBase64,
    ToHex,
    FromHex,
    ToAscii85,
    FromAscii85,
    ToBinary,
    FromBinary,
    Deflate,
    Inflate,
    Zlib,
    Unzlib,
    SplitLines,
    CombineLines,
}

impl FilterKind {
    pub const ALL: [FilterKind; 14] = [
        FilterKind::ToBase64,
        FilterKind::FromBase64,
        FilterKind::ToHex,
        FilterKind::FromHex,
        FilterKind::ToAscii85,
        FilterKind::FromAscii85,
        FilterKind::ToBinary,
        FilterKind::FromBinary,
        FilterKind::Deflate,
        FilterKind::Inflate,
        FilterKind::Zlib,
        FilterKind::Unzlib,
        FilterKind::SplitLines,
        FilterKind::CombineLines,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterKind::ToBase64 => "to-base64",
            FilterKind::FromBase64 => "from-base64",
            FilterKind::ToHex => "to-hex",
            FilterKind::FromHex => "from-hex",
            FilterKind::ToAscii85 => "to-ascii85",
            FilterKind::FromAscii85 => "from-ascii85",
            FilterKind::ToBinary => "to-binary",
            FilterKind::FromBinary => "from-binary",
            FilterKind::Deflate => "deflate",
            FilterKind::Inflate => "inflate",
            FilterKind::Zlib => "zlib",
            FilterKind::Unzlib => "unzlib",
            FilterKind::SplitLines => "split-lines",
            FilterKind::CombineLines => "combine-lines",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            FilterKind::ToBase64 => "encode bytes as standard base64",
            FilterKind::FromBase64 => "decode standard base64",
            FilterKind::ToHex => "encode bytes as lowercase hex",
            FilterKind::FromHex => "decode hex",
            FilterKind::ToAscii85 => "encode bytes as ascii85",
            FilterKind::FromAscii85 => "decode ascii85",
            FilterKind::ToBinary => "write each bit as 0 or 1, low bit first",
            FilterKind::FromBinary => "pack a 0/1 bit string into bytes",
            FilterKind::Deflate => "raw deflate at best compression",
            FilterKind::Inflate => "decompress raw deflate",
            FilterKind::Zlib => "zlib-wrapped deflate at best compression",
            FilterKind::Unzlib => "decompress zlib",
            FilterKind::SplitLines => "break the stream into fixed-width lines",
            FilterKind::CombineLines => "join lines, dropping line terminators",
        }
    }

    /// Construct the stage. `line_width` is only used by `split-lines`.
    pub fn build(self, line_width: usize) -> Result<Box<dyn Stage>> {
        let stage: Box<dyn Stage> = match self {
            FilterKind::ToBase64 => Box::new(Base64Encode),
            FilterKind::FromBase64 => Box::new(Base64Decode),
            FilterKind::ToHex => Box::new(HexEncode),
            FilterKind::FromHex => Box::new(HexDecode),
            FilterKind::ToAscii85 => Box::new(Ascii85Encode),
            FilterKind::FromAscii85 => Box::new(Ascii85Decode),
            FilterKind::ToBinary => Box::new(ToBinary),
            FilterKind::FromBinary => Box::new(FromBinary),
            FilterKind::Deflate => Box::new(Compress::deflate()),
            FilterKind::Inflate => Box::new(Decompress::deflate()),
            FilterKind::Zlib => Box::new(Compress::zlib()),
            FilterKind::Unzlib => Box::new(Decompress::zlib()),
            FilterKind::SplitLines => Box::new(SplitLines::new(line_width)?),
            FilterKind::CombineLines => Box::new(CombineLines),
        };
        Ok(stage)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = FilterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FilterKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| FilterError::UnknownFilter(s.to_string()))
    }
}
