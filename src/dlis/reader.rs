//! The public reader over a DLIS byte source.

use std::path::Path;

use log::{debug, info, trace};

use super::envelope::{self, IndexEntry, SegmentHeader, LRSH_SIZE};
use super::error::{DlisError, Result};
use super::iter::RecordIter;
use super::record::{self, Record};
use super::source::{ByteSource, FileSource};
use super::sul::{self, StorageUnitLabel, SUL_SIZE};

/// The main reader for DLIS v1 files.
///
/// Opening a reader locates the storage unit label and the first visible
/// record, then scans the whole source into an index of logical-record
/// start positions. Records are materialized on demand and owned by the
/// caller; the index is immutable after construction except through
/// [`reindex`](Self::reindex).
///
/// # Thread Safety
/// The reader keeps an internal read cursor, so record access takes
/// `&mut self`; callers that want parallel decoding open one reader per
/// source. Returned [`Record`]s own their payload and can be moved
/// across threads freely.
#[derive(Debug)]
pub struct DlisReader<S: ByteSource> {
    source: S,
    label: StorageUnitLabel,
    index: Vec<IndexEntry>,
}

impl DlisReader<FileSource> {
    /// Open a DLIS file from a path.
    ///
    /// # Errors
    /// Returns [`DlisError`] if:
    /// - the file cannot be opened, is empty, or ends mid-structure
    /// - no storage unit label or visible record is found
    /// - the envelope is structurally inconsistent
    /// - the file declares DLIS version 2
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_source(FileSource::open(path)?)
    }
}

impl<S: ByteSource> DlisReader<S> {
    /// Open a reader over an arbitrary byte source.
    pub fn from_source(mut source: S) -> Result<Self> {
        debug!("locating storage unit label");
        let mut prefix = vec![0u8; source.size().min(200) as usize];
        source.read_at(&mut prefix, 0)?;
        let sul_tell = sul::find_sul(&prefix)?;
        if sul_tell != 0 {
            debug!("{} garbage bytes before storage unit label", sul_tell);
        }

        let mut label_bytes = [0u8; SUL_SIZE];
        source.read_at(&mut label_bytes, sul_tell as u64)?;
        let label = StorageUnitLabel::parse(&label_bytes)?;

        debug!("locating first visible record");
        let after_label = (sul_tell + SUL_SIZE) as u64;
        let window_len = source.size().saturating_sub(after_label).min(200);
        let mut window = vec![0u8; window_len as usize];
        source.read_at(&mut window, after_label)?;
        let vrl_offset = envelope::find_vrl(&window, 0)?;
        if vrl_offset != 0 {
            debug!(
                "{} garbage bytes between storage unit label and first visible record",
                vrl_offset
            );
        }

        debug!("indexing logical records");
        let index = envelope::index_records(&mut source, after_label + vrl_offset as u64)?;

        info!(
            "opened DLIS source: {} logical records, sequence {}, id '{}'",
            index.len(),
            label.sequence,
            label.id
        );

        Ok(Self {
            source,
            label,
            index,
        })
    }

    /// The parsed storage unit label.
    pub fn storage_label(&self) -> &StorageUnitLabel {
        &self.label
    }

    /// Number of logical records in the index.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The current logical-record index.
    pub fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    /// Materialize the logical record at position `i`.
    pub fn at(&mut self, i: usize) -> Result<Record> {
        if i >= self.index.len() {
            return Err(DlisError::UnexpectedValue {
                offset: 0,
                reason: format!(
                    "record index {} out of range ({} records)",
                    i,
                    self.index.len()
                ),
            });
        }
        trace!("reading record {} at tell {}", i, self.index[i].tell);
        record::read_record(&mut self.source, &self.index, i)
    }

    /// Lazy iterator over all logical records, in index order.
    pub fn iter(&mut self) -> RecordIter<'_, S> {
        RecordIter::new(self)
    }

    /// Materialize a batch of records, dropping encrypted ones.
    pub fn extract(&mut self, indices: &[usize]) -> Result<Vec<Record>> {
        let mut records = Vec::with_capacity(indices.len());
        for &i in indices {
            let record = self.at(i)?;
            if record.is_encrypted() {
                trace!("extract: skipping encrypted record {}", i);
                continue;
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Replace the in-memory index with caller-supplied tells and
    /// residuals, e.g. recovered out-of-band for a damaged file.
    ///
    /// Both vectors must be non-empty and of equal length. Each tell is
    /// validated by reading the segment header it points at, which also
    /// restores the entry's explicit-format flag.
    pub fn reindex(&mut self, tells: Vec<u64>, residuals: Vec<u32>) -> Result<()> {
        if tells.is_empty() || residuals.is_empty() {
            return Err(DlisError::UnexpectedValue {
                offset: 0,
                reason: "reindex requires non-empty tells and residuals".to_string(),
            });
        }
        if tells.len() != residuals.len() {
            return Err(DlisError::UnexpectedValue {
                offset: 0,
                reason: format!(
                    "reindex requires tells.len() (which is {}) == residuals.len() (which is {})",
                    tells.len(),
                    residuals.len()
                ),
            });
        }

        let mut header = [0u8; LRSH_SIZE];
        let mut index = Vec::with_capacity(tells.len());
        for (&tell, &residual) in tells.iter().zip(&residuals) {
            self.source.read_at(&mut header, tell)?;
            let lrsh = SegmentHeader::parse(&header, tell)?;
            index.push(IndexEntry {
                tell,
                residual,
                explicit: lrsh.attributes.explicit_format,
            });
        }

        debug!("reindexed: {} entries", index.len());
        self.index = index;
        Ok(())
    }

    /// Raw access to `n` bytes at `offset` of the underlying source.
    pub fn get(&mut self, offset: u64, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.source.read_at(&mut buf, offset)?;
        Ok(buf)
    }

    /// Consume the reader, releasing the underlying byte source.
    pub fn close(self) {}
}
