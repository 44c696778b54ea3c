//! Lazy record decoding.

use std::io::Cursor;
use std::sync::Arc;

use log::trace;
use wow_data::schema::{Layout, Record};

use crate::Result;
use crate::file::DbcFile;

/// Iterator decoding one record per step.
pub struct Records<'a> {
    file: &'a DbcFile,
    cursor: Cursor<&'a [u8]>,
    layout: Arc<Layout>,
    index: usize,
}

impl<'a> Records<'a> {
    pub(crate) fn new(file: &'a DbcFile, rows: &'a [u8], layout: Arc<Layout>) -> Self {
        Self {
            file,
            cursor: Cursor::new(rows),
            layout,
            index: 0,
        }
    }
}

impl Iterator for Records<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.file.record_count() {
            return None;
        }
        trace!("{} record {}", self.layout.name(), self.index);
        self.index += 1;
        let file = self.file;
        Some(
            self.layout
                .read_record(&mut self.cursor, &mut |offset| file.resolve(offset))
                .map_err(Into::into),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.file.record_count() - self.index;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Records<'_> {}
