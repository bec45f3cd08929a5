use fxhash::FxHashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::constants::{HEADER_PREFIX, SENTINEL_LINE, WORD_DIGITS};

/// Names of the packet fields, as used in the field map view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketField {
    Header,
    Error,
    HitMap,
    Parity,
    ArtData,
}

impl fmt::Display for PacketField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Header => "Header",
            Self::Error => "Error",
            Self::HitMap => "Hit Map",
            Self::Parity => "Parity",
            Self::ArtData => "ART data",
        };
        write!(f, "{name}")
    }
}

/// A GBT test packet.
///
/// The payload is 32 hex digits laid out as
///
/// ```text
/// | header (8) | error (2) | hitmap (8) | parity (2) | artdata (12) |
/// ```
///
/// and is written as four 8 digit words, each tagged with the region number.
/// Fields are stored as uppercase hex text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: String,
    pub error: String,
    pub hitmap: String,
    pub parity: String,
    pub artdata: String,
    pub region: u32,
}

impl Packet {
    /// All fields concatenated into the 32 digit payload
    pub fn payload(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.header, self.error, self.hitmap, self.parity, self.artdata
        )
    }

    /// The BCID carried in the header, if the header has the standard prefix
    pub fn bcid(&self) -> Option<u32> {
        let digits = self.header.strip_prefix(HEADER_PREFIX)?;
        u32::from_str_radix(digits, 16).ok()
    }

    /// The payload split into words, each followed by the region tag
    pub fn lines(&self) -> Vec<String> {
        let payload = self.payload();
        payload
            .as_bytes()
            .chunks(WORD_DIGITS)
            .map(|word| format!("{} {}", String::from_utf8_lossy(word), self.region))
            .collect()
    }

    /// The packet as newline-delimited text
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for line in self.lines() {
            text.push_str(&line);
            text.push('\n');
        }
        text
    }

    /// The named field view: Header, Error, Hit Map, Parity, ART data
    pub fn fields(&self) -> FxHashMap<PacketField, String> {
        let mut map = FxHashMap::default();
        map.insert(PacketField::Header, self.header.clone());
        map.insert(PacketField::Error, self.error.clone());
        map.insert(PacketField::HitMap, self.hitmap.clone());
        map.insert(PacketField::Parity, self.parity.clone());
        map.insert(PacketField::ArtData, self.artdata.clone());
        map
    }

    /// Write the packet lines to a sink.
    ///
    /// If append_sentinel is set the stream is closed with the finish line,
    /// which is what a simulator expects at the end of a single packet file.
    pub fn write_to<W: Write>(&self, sink: &mut W, append_sentinel: bool) -> std::io::Result<()> {
        sink.write_all(self.to_text().as_bytes())?;
        if append_sentinel {
            sink.write_all(SENTINEL_LINE.as_bytes())?;
        }
        Ok(())
    }

    /// Write the packet to a file, creating the parent directory if needed
    pub fn write_file(&self, path: &Path, append_sentinel: bool) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer, append_sentinel)?;
        writer.flush()
    }
}
