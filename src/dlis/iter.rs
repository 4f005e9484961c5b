//! Lazy iteration over logical records.

use super::error::Result;
use super::reader::DlisReader;
use super::record::Record;
use super::source::ByteSource;

/// Iterator over the logical records of a reader, from index 0.
///
/// Created by [`DlisReader::iter()`](crate::dlis::DlisReader::iter).
/// Each step materializes one record; a decode failure yields the error
/// for that record and iteration can continue past it.
pub struct RecordIter<'a, S: ByteSource> {
    reader: &'a mut DlisReader<S>,
    next: usize,
}

impl<'a, S: ByteSource> RecordIter<'a, S> {
    pub(super) fn new(reader: &'a mut DlisReader<S>) -> Self {
        Self { reader, next: 0 }
    }
}

impl<'a, S: ByteSource> Iterator for RecordIter<'a, S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.reader.len() {
            return None;
        }
        let i = self.next;
        self.next += 1;
        Some(self.reader.at(i))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.reader.len() - self.next;
        (left, Some(left))
    }
}
