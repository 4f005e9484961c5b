//! Visible-record and logical-record-segment envelope decoding.
//!
//! A DLIS file frames its payload twice: fixed 4-byte visible record
//! headers (VRL) slice the file into I/O units, and 4-byte logical
//! record segment headers (LRSH) subdivide each visible record. Segments
//! chain across visible-record boundaries into logical records; this
//! module locates the first VRL and scans the chain into an index of
//! logical-record start positions.

use byteorder::{BigEndian, ByteOrder};

use super::error::{DlisError, Result};
use super::source::ByteSource;

/// Size of a visible record header in bytes.
pub const VRL_SIZE: usize = 4;

/// Size of a logical record segment header in bytes.
pub const LRSH_SIZE: usize = 4;

const SEARCH_LIMIT: usize = 200;

/// The 4-byte visible record header.
#[derive(Debug, Clone, Copy)]
pub struct VisibleRecordHeader {
    /// Total length of the visible record, header included.
    pub length: u16,
    /// Always 0xFF.
    pub pad_byte: u8,
    /// Format version, must be 1.
    pub version: u8,
}

impl VisibleRecordHeader {
    pub fn parse(bytes: &[u8; VRL_SIZE], offset: u64) -> Result<Self> {
        let length = BigEndian::read_u16(&bytes[..2]);
        let pad_byte = bytes[2];
        let version = bytes[3];

        if pad_byte != 0xFF {
            return Err(DlisError::Inconsistent {
                offset,
                reason: format!("VRL pad byte {:#04x}, expected 0xff", pad_byte),
            });
        }
        if version != 1 {
            return Err(DlisError::Inconsistent {
                offset,
                reason: format!("VRL version {} unsupported", version),
            });
        }
        if usize::from(length) < VRL_SIZE + LRSH_SIZE {
            return Err(DlisError::UnexpectedValue {
                offset,
                reason: format!("visible record length {} too small", length),
            });
        }

        Ok(Self {
            length,
            pad_byte,
            version,
        })
    }
}

/// Attribute flags of a logical record segment header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentAttributes {
    pub explicit_format: bool,
    pub has_predecessor: bool,
    pub has_successor: bool,
    pub encrypted: bool,
    pub has_encryption_packet: bool,
    pub has_checksum: bool,
    pub has_trailing_length: bool,
    pub has_padding: bool,
}

impl SegmentAttributes {
    pub const EXPLICIT_FORMAT: u8 = 1 << 7;
    pub const HAS_PREDECESSOR: u8 = 1 << 6;
    pub const HAS_SUCCESSOR: u8 = 1 << 5;
    pub const ENCRYPTED: u8 = 1 << 4;
    pub const ENCRYPTION_PACKET: u8 = 1 << 3;
    pub const HAS_CHECKSUM: u8 = 1 << 2;
    pub const HAS_TRAILING_LENGTH: u8 = 1 << 1;
    pub const HAS_PADDING: u8 = 1 << 0;

    pub fn from_byte(attrs: u8) -> Self {
        Self {
            explicit_format: attrs & Self::EXPLICIT_FORMAT != 0,
            has_predecessor: attrs & Self::HAS_PREDECESSOR != 0,
            has_successor: attrs & Self::HAS_SUCCESSOR != 0,
            encrypted: attrs & Self::ENCRYPTED != 0,
            has_encryption_packet: attrs & Self::ENCRYPTION_PACKET != 0,
            has_checksum: attrs & Self::HAS_CHECKSUM != 0,
            has_trailing_length: attrs & Self::HAS_TRAILING_LENGTH != 0,
            has_padding: attrs & Self::HAS_PADDING != 0,
        }
    }
}

/// The 4-byte logical record segment header.
#[derive(Debug, Clone, Copy)]
pub struct SegmentHeader {
    /// Total length of the segment, header included.
    pub length: u16,
    pub attributes: SegmentAttributes,
    pub raw_attributes: u8,
    pub segment_type: u8,
}

impl SegmentHeader {
    pub fn parse(bytes: &[u8; LRSH_SIZE], offset: u64) -> Result<Self> {
        let length = BigEndian::read_u16(&bytes[..2]);
        if usize::from(length) < LRSH_SIZE {
            return Err(DlisError::UnexpectedValue {
                offset,
                reason: format!("segment length {} too small", length),
            });
        }
        Ok(Self {
            length,
            attributes: SegmentAttributes::from_byte(bytes[2]),
            raw_attributes: bytes[2],
            segment_type: bytes[3],
        })
    }
}

/// An entry of the logical-record index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Absolute offset of the segment header beginning the record.
    pub tell: u64,
    /// Bytes remaining in the enclosing visible record at `tell`.
    pub residual: u32,
    /// Mirror of the first segment's explicit-format flag.
    pub explicit: bool,
}

/// Locate the first visible record header at or after `from`.
///
/// The first VRL does not always immediately follow the SUL. Its second
/// half is the fixed pair 0xFF 0x01, so search up to 200 bytes for that
/// pattern and backtrack over the 2-byte length field. If that fails the
/// file is likely too corrupted to read without manual intervention.
pub fn find_vrl(bytes: &[u8], from: usize) -> Result<usize> {
    if from > bytes.len() {
        return Err(DlisError::UnexpectedValue {
            offset: from as u64,
            reason: format!(
                "expected from (which is {}) <= len (which is {})",
                from,
                bytes.len()
            ),
        });
    }

    let limit = (bytes.len() - from).min(SEARCH_LIMIT);
    let window = &bytes[from..from + limit];
    let pos = window
        .windows(2)
        .position(|w| w == [0xFF, 0x01])
        .ok_or(DlisError::NotFound {
            target: "visible record envelope pattern (0xFF 0x01)",
            searched: limit,
        })?;

    if pos < 2 {
        return Err(DlisError::Inconsistent {
            offset: (from + pos) as u64,
            reason: format!(
                "found 0xFF 0x01 at pos = {}, but expected pos >= {}",
                from + pos,
                from + 2
            ),
        });
    }

    Ok(from + pos - 2)
}

/// Scan the source from `start` (the first VRL) to the end, producing an
/// index entry for every segment that begins a logical record.
///
/// The scan is streaming: only the 4-byte headers are read, through the
/// byte source, so indexing never buffers record payloads.
pub fn index_records<S: ByteSource>(source: &mut S, start: u64) -> Result<Vec<IndexEntry>> {
    let end = source.size();

    // assume ~4K per segment on average; fairly few reallocations
    // without overshooting too much
    let mut entries: Vec<IndexEntry> = Vec::with_capacity(((end / 4096) as usize).max(16));

    let mut header = [0u8; 4];
    let mut cursor = start;
    let mut residual: u32 = 0;

    while cursor < end {
        if residual == 0 {
            source.read_at(&mut header, cursor)?;
            let vrl = VisibleRecordHeader::parse(&header, cursor)?;
            residual = u32::from(vrl.length) - VRL_SIZE as u32;
            cursor += VRL_SIZE as u64;

            if cursor + u64::from(residual) > end {
                return Err(DlisError::Truncated {
                    offset: cursor,
                    needed: residual as usize,
                    available: end - cursor,
                });
            }
        }

        source.read_at(&mut header, cursor)?;
        let lrsh = SegmentHeader::parse(&header, cursor)?;
        let length = u32::from(lrsh.length);
        if length > residual {
            return Err(DlisError::Inconsistent {
                offset: cursor,
                reason: format!(
                    "segment length {} exceeds visible record residual {}",
                    length, residual
                ),
            });
        }

        if !lrsh.attributes.has_predecessor {
            if entries.len() == entries.capacity() {
                entries.reserve_exact(entries.capacity() / 2);
            }
            entries.push(IndexEntry {
                tell: cursor,
                residual,
                explicit: lrsh.attributes.explicit_format,
            });
        }

        cursor += u64::from(length);
        residual -= length;
    }

    Ok(entries)
}
