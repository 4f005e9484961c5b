//! Storage Unit Label location and parsing.

use log::warn;

use super::error::{DlisError, Result};
use super::types::decode_text;

/// Size of the storage unit label in bytes.
pub const SUL_SIZE: usize = 80;

/// How far into the file the SUL is searched for. If it does not show up
/// by then it is probably not there, or requires manual intervention.
const SEARCH_LIMIT: usize = 200;

/// Offset of the structure field ("RECORD") within the label: 4 bytes of
/// sequence number plus 5 bytes of version precede it.
const STRUCTURE_OFFSET: usize = 9;

/// The storage-set layout declared by the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageUnitLayout {
    Record,
    Unknown,
}

impl std::fmt::Display for StorageUnitLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageUnitLayout::Record => write!(f, "record"),
            StorageUnitLayout::Unknown => write!(f, "unknown"),
        }
    }
}

/// The parsed 80-byte storage unit label that prefixes every DLIS file.
#[derive(Debug, Clone)]
pub struct StorageUnitLabel {
    pub sequence: u32,
    pub major: u32,
    pub minor: u32,
    pub layout: StorageUnitLayout,
    pub max_record_length: u32,
    pub id: String,
}

/// Locate the storage unit label.
///
/// Searches the first 200 bytes for the literal `RECORD` (the label's
/// structure field) and backtracks to the label start. In a conforming
/// file the returned offset is 0.
pub fn find_sul(bytes: &[u8]) -> Result<usize> {
    let window = &bytes[..bytes.len().min(SEARCH_LIMIT)];
    let pos = window
        .windows(6)
        .position(|w| w == b"RECORD")
        .ok_or(DlisError::NotFound {
            target: "storage unit label",
            searched: window.len(),
        })?;

    if pos < STRUCTURE_OFFSET {
        return Err(DlisError::Inconsistent {
            offset: pos as u64,
            reason: format!(
                "found 'RECORD' at pos = {}, but expected pos >= {}",
                pos, STRUCTURE_OFFSET
            ),
        });
    }

    Ok(pos - STRUCTURE_OFFSET)
}

impl StorageUnitLabel {
    /// Parse the 80-byte label.
    ///
    /// Structural oddities that still admit a sensible version 1
    /// interpretation (blank sequence number, non-`RECORD` layout,
    /// unparseable maximum record length) are logged and tolerated.
    /// A version other than 1 is refused.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < SUL_SIZE {
            return Err(DlisError::Truncated {
                offset: 0,
                needed: SUL_SIZE,
                available: bytes.len() as u64,
            });
        }

        let sequence = match parse_ascii_field(&bytes[0..4]) {
            Some(n) => n,
            None => {
                warn!("storage label carries no parseable sequence number, assuming 0");
                0
            }
        };

        let (major, minor) = parse_version(&bytes[4..9])?;
        if major != 1 {
            return Err(DlisError::NotImplemented("DLIS version 2 storage unit"));
        }

        let layout = if &bytes[9..15] == b"RECORD" {
            StorageUnitLayout::Record
        } else {
            warn!("storage label inconsistent with specification - falling back to assuming DLIS v1");
            StorageUnitLayout::Unknown
        };

        let max_record_length = match parse_ascii_field(&bytes[15..20]) {
            Some(n) => n,
            None => {
                warn!("storage label carries no parseable maximum record length, assuming 0");
                0
            }
        };

        let id = decode_text(trim_field(&bytes[20..SUL_SIZE]));

        Ok(Self {
            sequence,
            major,
            minor,
            layout,
            max_record_length,
            id,
        })
    }
}

/// Parse a space-padded ASCII integer field.
fn parse_ascii_field(bytes: &[u8]) -> Option<u32> {
    let text = std::str::from_utf8(trim_field(bytes)).ok()?;
    text.trim().parse().ok()
}

fn trim_field(bytes: &[u8]) -> &[u8] {
    let pad = |b: u8| b == b' ' || b == 0;
    match bytes.iter().position(|&b| !pad(b)) {
        Some(start) => {
            let end = bytes.iter().rposition(|&b| !pad(b)).unwrap_or(start);
            &bytes[start..=end]
        }
        None => &[],
    }
}

/// Parse the 5-byte version field, "VN.nn".
fn parse_version(bytes: &[u8]) -> Result<(u32, u32)> {
    let ok = bytes[0] == b'V'
        && bytes[1].is_ascii_digit()
        && bytes[2] == b'.'
        && bytes[3].is_ascii_digit()
        && bytes[4].is_ascii_digit();
    if !ok {
        return Err(DlisError::UnexpectedValue {
            offset: 4,
            reason: format!("cannot parse version field {:?}", decode_text(bytes)),
        });
    }
    let major = u32::from(bytes[1] - b'0');
    let minor = u32::from(bytes[3] - b'0') * 10 + u32::from(bytes[4] - b'0');
    Ok((major, minor))
}
