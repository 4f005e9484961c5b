//! Core DLIS reader module.

pub mod codec;
pub mod envelope;
pub mod error;
pub mod objects;
pub mod record;
pub mod source;
pub mod sul;
pub mod types;

mod iter;
mod reader;

pub use envelope::{IndexEntry, SegmentAttributes, SegmentHeader, VisibleRecordHeader};
pub use error::{DlisError, Result};
pub use iter::RecordIter;
pub use objects::{parse_object_set, parse_objects, Object, ObjectAttribute, ObjectSet};
pub use reader::DlisReader;
pub use record::Record;
pub use source::{ByteSource, FileSource};
pub use sul::{StorageUnitLabel, StorageUnitLayout};
pub use types::{
    Attref, Complex, DateTime, Obname, Objref, RepresentationCode, TimeZone, Value,
};
