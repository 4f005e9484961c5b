//! Custom error types for the dlis-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum DlisError {
    /// An error originating from the underlying byte source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A structural marker (SUL or VRL) was not found within its search window.
    #[error("{target} not found: searched {searched} bytes")]
    NotFound {
        target: &'static str,
        searched: usize,
    },

    /// The byte source ended before a header or payload could be read in full.
    #[error("truncated at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: u64,
        needed: usize,
        available: u64,
    },

    /// A structural mismatch between layers of the envelope, such as a bad
    /// visible-record header or a segment claiming more bytes than its
    /// enclosing visible record has left.
    #[error("inconsistent structure at offset {offset}: {reason}")]
    Inconsistent { offset: u64, reason: String },

    /// A decoded field is outside its permitted range.
    #[error("unexpected value at offset {offset}: {reason}")]
    UnexpectedValue { offset: u64, reason: String },

    /// A reassembled logical record did not end where the next index entry
    /// begins. Usually the result of consistent, but lying, length fields.
    #[error(
        "non-contiguous record {index} (at tell {tell}): ends at {actual}, expected {expected}"
    )]
    NonContiguous {
        index: usize,
        tell: u64,
        actual: u64,
        expected: u64,
    },

    /// The input is valid DLIS but outside what this reader supports.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

/// A convenience `Result` type alias using the crate's `DlisError` type.
pub type Result<T> = std::result::Result<T, DlisError>;
