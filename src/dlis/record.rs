//! Logical record reassembly.

use super::envelope::{
    IndexEntry, SegmentAttributes, SegmentHeader, VisibleRecordHeader, LRSH_SIZE, VRL_SIZE,
};
use super::error::{DlisError, Result};
use super::source::ByteSource;

/// A reassembled logical record.
///
/// `data` holds the concatenated segment bodies with padding, checksums
/// and trailing lengths stripped. Only the explicit-format and
/// encryption attribute bits are retained; the rest describe how to read
/// individual segments and are of no interest once reassembly is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub attributes: u8,
    pub record_type: u8,
    pub data: Vec<u8>,
    /// True iff every segment agreed on type and attribute discipline.
    pub consistent: bool,
}

impl Record {
    pub fn is_explicit(&self) -> bool {
        self.attributes & SegmentAttributes::EXPLICIT_FORMAT != 0
    }

    pub fn is_encrypted(&self) -> bool {
        self.attributes & SegmentAttributes::ENCRYPTED != 0
    }
}

fn chop(data: &mut Vec<u8>, bytes: usize) {
    let new_len = data.len().saturating_sub(bytes);
    data.truncate(new_len);
}

/// First segment has no predecessor, last no successor, interior both;
/// and all segments agree on explicit-format and encryption.
fn attr_consistent(attrs: &[u8]) -> bool {
    let n = attrs.len();
    for (i, &a) in attrs.iter().enumerate() {
        let pred = a & SegmentAttributes::HAS_PREDECESSOR != 0;
        let succ = a & SegmentAttributes::HAS_SUCCESSOR != 0;
        if pred != (i > 0) || succ != (i < n - 1) {
            return false;
        }
    }

    const FMTENC: u8 = SegmentAttributes::EXPLICIT_FORMAT | SegmentAttributes::ENCRYPTED;
    let first = attrs[0] & FMTENC;
    attrs.iter().all(|&a| a & FMTENC == first)
}

/// Should be all-equal.
fn type_consistent(types: &[u8]) -> bool {
    types.windows(2).all(|pair| pair[0] == pair[1])
}

/// Materialize the logical record at index entry `i`.
///
/// Seeks to the entry's tell and follows the successor chain, crossing
/// visible-record boundaries as the enclosing residual runs out.
/// Encrypted records are reassembled faithfully (trailers are still
/// stripped); no decryption occurs.
pub(crate) fn read_record<S: ByteSource>(
    source: &mut S,
    index: &[IndexEntry],
    i: usize,
) -> Result<Record> {
    let entry = index[i];
    let mut cursor = entry.tell;
    let mut remaining = i64::from(entry.residual);

    let mut data: Vec<u8> = Vec::with_capacity(8192);
    let mut attrs_seen: Vec<u8> = Vec::new();
    let mut types_seen: Vec<u8> = Vec::new();
    let mut header = [0u8; 4];

    loop {
        while remaining > 0 {
            source.read_at(&mut header, cursor)?;
            let lrsh = SegmentHeader::parse(&header, cursor)?;

            remaining -= i64::from(lrsh.length);
            if remaining < 0 {
                // mismatch between the visible record length and the
                // segment length; no principled way to pick which one
                // to believe, so give up
                return Err(DlisError::Inconsistent {
                    offset: cursor,
                    reason: format!(
                        "segment (which is {}) >= visible (which is {}) in record {}",
                        lrsh.length,
                        remaining + i64::from(lrsh.length),
                        i
                    ),
                });
            }

            cursor += LRSH_SIZE as u64;
            let body = usize::from(lrsh.length) - LRSH_SIZE;

            let prev = data.len();
            data.resize(prev + body, 0);
            source.read_at(&mut data[prev..], cursor)?;
            cursor += body as u64;

            attrs_seen.push(lrsh.raw_attributes);
            types_seen.push(lrsh.segment_type);

            let attrs = lrsh.attributes;
            if attrs.has_trailing_length {
                chop(&mut data, 2);
            }
            if attrs.has_checksum {
                chop(&mut data, 2);
            }
            if attrs.has_padding {
                let pad_count = data.last().copied().unwrap_or(0);
                chop(&mut data, usize::from(pad_count));
            }

            if attrs.has_successor {
                continue;
            }

            // last segment read - check contiguity and wrap up. Every
            // record must start just where the previous one ended; when
            // the visible record was exhausted exactly, the successor
            // sits past an intervening VRL header.
            if let Some(next) = index.get(i + 1) {
                let at_boundary = remaining == 0 && cursor + VRL_SIZE as u64 == next.tell;
                if cursor != next.tell && !at_boundary {
                    return Err(DlisError::NonContiguous {
                        index: i,
                        tell: entry.tell,
                        actual: cursor,
                        expected: next.tell,
                    });
                }
            }

            let consistent = attr_consistent(&attrs_seen) && type_consistent(&types_seen);

            const FMTENC: u8 = SegmentAttributes::EXPLICIT_FORMAT | SegmentAttributes::ENCRYPTED;
            return Ok(Record {
                attributes: attrs_seen[0] & FMTENC,
                record_type: types_seen[0],
                data,
                consistent,
            });
        }

        source.read_at(&mut header, cursor)?;
        let vrl = VisibleRecordHeader::parse(&header, cursor)?;
        cursor += VRL_SIZE as u64;
        remaining = i64::from(vrl.length) - VRL_SIZE as i64;
    }
}
