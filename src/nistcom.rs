//! NISTCOM attribute blocks carried in comment segments.
//!
//! A NISTCOM block is plain text, one `NAME value` pair per line, whose
//! first line is `NIST_COM <number of pairs>`. The codec only reads the
//! scan resolution from it and writes the attributes of the encoded image.
use std::fmt;

use crate::error::{Error, Result};

pub const HEADER: &str = "NIST_COM";
pub const PIX_WIDTH: &str = "PIX_WIDTH";
pub const PIX_HEIGHT: &str = "PIX_HEIGHT";
pub const PIX_DEPTH: &str = "PIX_DEPTH";
pub const PPI: &str = "PPI";
pub const LOSSY: &str = "LOSSY";
pub const COLORSPACE: &str = "COLORSPACE";
pub const COMPRESSION: &str = "COMPRESSION";
pub const WSQ_BITRATE: &str = "WSQ_BITRATE";

/// Text metadata stored alongside an image.
pub trait MetadataStore: Sized {
    fn parse(text: &str) -> Result<Self>;

    fn format(&self) -> String;

    /// Scan resolution in pixels per inch, if known.
    fn ppi(&self) -> Option<i32>;
}

/// Attributes the encoder records about an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageAttributes {
    pub width: usize,
    pub height: usize,
    pub depth: u8,
    pub ppi: Option<i32>,
    pub lossy: bool,
    pub bitrate: f32,
}

/// Ordered `NAME value` pairs. A name may have no value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NistCom {
    entries: Vec<(String, Option<String>)>,
}

impl NistCom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a comment payload holds a NISTCOM block.
    pub fn is_nistcom(comment: &[u8]) -> bool {
        comment.starts_with(HEADER.as_bytes())
    }

    /// Parses a comment payload. Trailing NUL bytes are ignored.
    pub fn from_comment(comment: &[u8]) -> Result<Self> {
        let end = comment
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |last| last + 1);
        let text = std::str::from_utf8(&comment[..end])
            .map_err(|e| Error::InvalidComment(format!("not UTF-8: {e}")))?;
        Self::parse(text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Replaces the value of `name` in place, or appends the pair.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = Some(value.into());
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Option<String>> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Merges the attributes of a WSQ image into `existing`, or into a new
    /// block, and updates the pair count in the header.
    pub fn for_wsq(existing: Option<NistCom>, attributes: &ImageAttributes) -> Self {
        let mut nistcom = existing.unwrap_or_default();
        if !nistcom.contains(HEADER) {
            nistcom.entries.insert(0, (HEADER.to_string(), None));
        }
        nistcom.set(PIX_WIDTH, attributes.width.to_string());
        nistcom.set(PIX_HEIGHT, attributes.height.to_string());
        nistcom.set(PIX_DEPTH, attributes.depth.to_string());
        nistcom.set(PPI, attributes.ppi.unwrap_or(-1).to_string());
        nistcom.set(LOSSY, u8::from(attributes.lossy).to_string());
        if attributes.depth == 8 {
            nistcom.set(COLORSPACE, "GRAY");
        }
        nistcom.set(COMPRESSION, "WSQ");
        nistcom.set(WSQ_BITRATE, format!("{:.6}", attributes.bitrate));
        let count = nistcom.len();
        nistcom.set(HEADER, count.to_string());
        nistcom
    }
}

impl MetadataStore for NistCom {
    fn parse(text: &str) -> Result<Self> {
        let mut entries = vec![];
        for line in text.split('\n') {
            if line.is_empty() {
                continue;
            }
            let name_end = line.find([' ', '\t']).unwrap_or(line.len());
            let name = &line[..name_end];
            if name.is_empty() {
                return Err(Error::InvalidComment(format!("line without a name: {line:?}")));
            }
            let value = line[name_end..].trim_start_matches([' ', '\t']);
            let value = (!value.is_empty()).then(|| value.to_string());
            entries.push((name.to_string(), value));
        }
        Ok(Self { entries })
    }

    fn format(&self) -> String {
        self.to_string()
    }

    fn ppi(&self) -> Option<i32> {
        let value = self.get(PPI)?;
        match value.trim().parse::<i32>() {
            Ok(ppi) if ppi >= 0 => Some(ppi),
            Ok(_) => None,
            Err(_) => {
                log::warn!("ignoring unreadable PPI value {value:?}");
                None
            }
        }
    }
}

impl fmt::Display for NistCom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            match value {
                Some(value) => write!(f, "{name} {value}")?,
                None => f.write_str(name)?,
            }
        }
        Ok(())
    }
}
