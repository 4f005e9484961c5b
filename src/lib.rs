//! Reader for DLIS (RP66 v1) well-log interchange files.
//!
//! DLIS wraps its payload in a layered envelope: an 80-byte storage unit
//! label identifies the file, fixed-format visible records frame the raw
//! bytes, and logical record segments chain across visible-record
//! boundaries into logical records. Explicitly formatted records carry
//! serialized object sets - templates plus typed object attributes.
//!
//! This crate decodes that envelope: it indexes a file once at open,
//! reassembles individual logical records on demand, and parses
//! explicit-format payloads into a typed object-set model. Writing,
//! decryption and DLIS version 2 are out of scope; encrypted records are
//! detected and surfaced, never decoded.
//!
//! # Example
//! ```no_run
//! use dlis_reader::{parse_objects, DlisReader};
//!
//! # fn main() -> dlis_reader::Result<()> {
//! let mut reader = DlisReader::open("well.dlis")?;
//! println!("{} logical records", reader.len());
//!
//! let indices: Vec<usize> = (0..reader.len()).collect();
//! let records = reader.extract(&indices)?;
//! let explicit: Vec<_> = records.into_iter().filter(|r| r.is_explicit()).collect();
//! for set in parse_objects(&explicit)? {
//!     println!("{}: {} objects", set.kind, set.objects.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod dlis;

pub use dlis::{
    parse_object_set, parse_objects, Attref, ByteSource, Complex, DateTime, DlisError, DlisReader,
    FileSource, IndexEntry, Object, ObjectAttribute, ObjectSet, Obname, Objref, Record, RecordIter,
    RepresentationCode, Result, SegmentAttributes, StorageUnitLabel, StorageUnitLayout, TimeZone,
    Value,
};
