//! Module for the marker-delimited WSQ byte stream
// 2.2 Structure of compressed data
//     Compressed image data is described by a uniform structure and a set of parameters. The various parts
//     of the compressed image data are identified by special two-byte codes called markers. Some markers are
//     followed by particular sequences of parameters such as table specifications and headers. Others are used
//     without parameters for functions such as marking the start-of-image and end-of-image.
// 2.3 Interchange format
//     In addition to certain required marker segments and the entropy-coded segments, the interchange
//     format shall include the marker segments for all filter coefficient, quantization, and entropy-coding tables
//     needed by the decoding process.
//
// Stream layout: SOI, tables and comments, SOF, then three blocks. Each block
// may be preceded by more tables and comments and is opened by SOB, whose
// payload names the Huffman table of the coded bytes that follow. Coded bytes
// run until the next marker. EOI closes the stream. Lengths count themselves,
// integers are big-endian and reals are stored as mantissa / 10^exponent.
use std::fmt;

pub mod reader;
pub mod scaled;
pub mod segments;
pub mod stream;
pub mod writer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    Soi,
    Eoi,
    Sof,
    Sob,
    Dtt,
    Dqt,
    Dht,
    Drt,
    Com,
}

impl Marker {
    pub const ALL: [Marker; 9] = [
        Marker::Soi,
        Marker::Eoi,
        Marker::Sof,
        Marker::Sob,
        Marker::Dtt,
        Marker::Dqt,
        Marker::Dht,
        Marker::Drt,
        Marker::Com,
    ];

    pub fn code(self) -> u16 {
        match self {
            Marker::Soi => 0xFFA0,
            Marker::Eoi => 0xFFA1,
            Marker::Sof => 0xFFA2,
            Marker::Sob => 0xFFA3,
            Marker::Dtt => 0xFFA4,
            Marker::Dqt => 0xFFA5,
            Marker::Dht => 0xFFA6,
            Marker::Drt => 0xFFA7,
            Marker::Com => 0xFFA8,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|marker| marker.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Marker::Soi => "SOI",
            Marker::Eoi => "EOI",
            Marker::Sof => "SOF",
            Marker::Sob => "SOB",
            Marker::Dtt => "DTT",
            Marker::Dqt => "DQT",
            Marker::Dht => "DHT",
            Marker::Drt => "DRT",
            Marker::Com => "COM",
        }
    }

    /// Whether a length field follows the marker.
    pub fn has_length(self) -> bool {
        !matches!(self, Marker::Soi | Marker::Eoi)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04X})", self.name(), self.code())
    }
}

/// The markers a parser accepts at some point of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    Soi,
    TablesOrSof,
    TablesOrSob,
    CommentOrEoi,
    Any,
}

impl Expect {
    pub fn accepts(self, marker: Marker) -> bool {
        let table = matches!(marker, Marker::Dtt | Marker::Dqt | Marker::Dht | Marker::Com);
        match self {
            Expect::Soi => marker == Marker::Soi,
            Expect::TablesOrSof => table || marker == Marker::Sof,
            Expect::TablesOrSob => table || marker == Marker::Sob,
            Expect::CommentOrEoi => matches!(marker, Marker::Com | Marker::Eoi),
            Expect::Any => true,
        }
    }
}

impl fmt::Display for Expect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Expect::Soi => "SOI",
            Expect::TablesOrSof => "a table or SOF",
            Expect::TablesOrSob => "a table or SOB",
            Expect::CommentOrEoi => "COM or EOI",
            Expect::Any => "a marker",
        };
        f.write_str(text)
    }
}
