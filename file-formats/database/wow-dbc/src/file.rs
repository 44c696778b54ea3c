//! Raw DBC files: header, row bytes and string block exactly as stored.

use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use std::sync::Arc;

use binrw::{BinRead, BinWrite};
use log::{debug, info, warn};
use wow_data::error::WowDataError;
use wow_data::schema::Layout;
use wow_data::string_block::{StringBlock, StringPadding};
use wow_data::types::stream_len;

use crate::header::{DbcHeader, column_count};
use crate::lazy::Records;
use crate::{DbcError, Result};

/// A DBC file with its rows kept as bytes.
///
/// Writing a `DbcFile` back reproduces the string block byte for byte, so a
/// file read and written without edits is identical to the input. Typed
/// access goes through [`DbcFile::records`].
#[derive(Debug, Clone, PartialEq)]
pub struct DbcFile {
    header: DbcHeader,
    rows: Vec<u8>,
    strings: StringBlock,
}

impl DbcFile {
    pub(crate) fn from_parts(header: DbcHeader, rows: Vec<u8>, strings: StringBlock) -> Self {
        Self {
            header,
            rows,
            strings,
        }
    }

    /// Read a DBC file starting at the reader's position.
    ///
    /// The header must describe exactly the bytes that follow it. A stream
    /// shorter than that fails with [`WowDataError::ShortRead`]; bytes past
    /// the string block are logged and ignored.
    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let start = reader.stream_position()?;
        let end = stream_len(reader)?;
        let header = DbcHeader::read(reader)?;

        let available = end - start;
        let expected = header.total_size();
        if expected > available {
            return Err(WowDataError::ShortRead { offset: Some(end) }.into());
        }
        if expected < available {
            warn!(
                "{} bytes after the string block ignored",
                available - expected
            );
        }

        let mut rows = vec![0; (header.string_block_offset() - DbcHeader::SIZE as u64) as usize];
        reader.read_exact(&mut rows)?;
        let mut block = vec![0; header.string_block_size as usize];
        reader.read_exact(&mut block)?;
        debug!(
            "DBC with {} records of {} bytes, {} byte string block",
            header.record_count, header.record_size, header.string_block_size
        );

        Ok(Self {
            header,
            rows,
            strings: StringBlock::from_bytes(block, StringPadding::None),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read(&mut Cursor::new(bytes))
    }

    /// Read a table from disk; failures carry the path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DbcError::from(e).in_file(path))?;
        let dbc = Self::read(&mut BufReader::new(file)).map_err(|e| e.in_file(path))?;
        info!("loaded {} with {} records", path.display(), dbc.header.record_count);
        Ok(dbc)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes().map_err(|e| e.in_file(path))?;
        fs::write(path, bytes).map_err(|e| DbcError::from(e).in_file(path))?;
        Ok(())
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::with_capacity(self.header.total_size() as usize));
        self.header.write(&mut out)?;
        out.write_all(&self.rows)?;
        out.write_all(self.strings.as_bytes())?;
        Ok(out.into_inner())
    }

    pub fn header(&self) -> &DbcHeader {
        &self.header
    }

    pub fn record_count(&self) -> usize {
        self.header.record_count as usize
    }

    pub fn strings(&self) -> &StringBlock {
        &self.strings
    }

    /// Bytes of row `index`.
    pub fn row(&self, index: usize) -> Option<&[u8]> {
        let size = self.header.record_size as usize;
        if index >= self.record_count() {
            return None;
        }
        self.rows.get(index * size..(index + 1) * size)
    }

    /// The string at `offset` in the string block. Offset 0 is the empty
    /// string even when the block is empty.
    pub fn string(&self, offset: u32) -> Result<String> {
        Ok(self.resolve(offset)?)
    }

    pub(crate) fn resolve(&self, offset: u32) -> wow_data::error::Result<String> {
        if offset == 0 && self.strings.is_empty() {
            return Ok(String::new());
        }
        let bytes = self.strings.get_bytes(offset)?;
        if !self.strings.is_string_start(offset) {
            return Err(WowDataError::lookup(
                "string block (string start)",
                offset,
                self.strings.len(),
            ));
        }
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Check that rows of this file are rows of `layout`.
    pub fn check_layout(&self, layout: &Layout) -> Result<()> {
        let columns = column_count(layout);
        if layout.size() != self.header.record_size as usize || columns != self.header.field_count {
            return Err(WowDataError::version_mismatch(
                format!(
                    "{} ({} fields, {} bytes, {:?})",
                    layout.name(),
                    columns,
                    layout.size(),
                    layout.context().version
                ),
                format!(
                    "{} fields, {} bytes",
                    self.header.field_count, self.header.record_size
                ),
            )
            .into());
        }
        Ok(())
    }

    /// Decode rows lazily as records of `layout`.
    pub fn records(&self, layout: &Arc<Layout>) -> Result<Records<'_>> {
        self.check_layout(layout)?;
        Ok(Records::new(self, &self.rows, Arc::clone(layout)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(block: &[u8]) -> DbcFile {
        let header = DbcHeader {
            record_count: 1,
            field_count: 1,
            record_size: 4,
            string_block_size: block.len() as u32,
        };
        let strings = StringBlock::from_bytes(block.to_vec(), StringPadding::None);
        DbcFile::from_parts(header, 1u32.to_le_bytes().to_vec(), strings)
    }

    #[test]
    fn empty_block_resolves_offset_zero() {
        assert_eq!(file(&[]).string(0).unwrap(), "");
    }

    #[test]
    fn offsets_must_start_a_string() {
        let dbc = file(b"\0Alpha\0");
        assert_eq!(dbc.string(1).unwrap(), "Alpha");
        assert!(matches!(
            dbc.string(3).unwrap_err().kind(),
            WowDataError::LookupOutOfRange { index: 3, .. }
        ));
        assert!(matches!(
            dbc.string(40).unwrap_err().kind(),
            WowDataError::OffsetOutOfBounds { offset: 40, .. }
        ));
    }

    #[test]
    fn unterminated_string() {
        let dbc = file(b"\0Alp");
        assert!(matches!(
            dbc.string(1).unwrap_err().kind(),
            WowDataError::StringNotTerminated { offset: 1 }
        ));
    }

    #[test]
    fn rows_are_sliced_by_record_size() {
        let dbc = file(b"\0");
        assert_eq!(dbc.row(0), Some(&[1, 0, 0, 0][..]));
        assert_eq!(dbc.row(1), None);
    }
}
