//! Typed tables: rows decoded through a schema layout.

use std::fs;
use std::io::{Read, Seek, Write};
use std::path::Path;
use std::sync::Arc;

use wow_data::error::WowDataError;
use wow_data::schema::{Bindings, Context, Layout, Record, Schema, Value, layout};
use wow_data::string_block::{StringBlock, StringPadding};
use wow_data::version::ClientVersion;

use crate::file::DbcFile;
use crate::header::DbcHeader;
use crate::{DbcError, Result};

/// A DBC table with every row decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct DbcTable {
    layout: Arc<Layout>,
    records: Vec<Record>,
}

impl DbcTable {
    pub fn new(layout: Arc<Layout>) -> Self {
        Self {
            layout,
            records: Vec::new(),
        }
    }

    /// Empty table of `schema` rows as laid out for `version`.
    pub fn for_schema(schema: &Schema, version: ClientVersion) -> Result<Self> {
        Ok(Self::new(layout(schema, &Bindings::new(), Context::new(version))?))
    }

    /// Decode every row of `file`.
    pub fn from_file(file: &DbcFile, layout: Arc<Layout>) -> Result<Self> {
        let records = file.records(&layout)?.collect::<Result<Vec<_>>>()?;
        Ok(Self { layout, records })
    }

    pub fn read<R: Read + Seek>(reader: &mut R, layout: Arc<Layout>) -> Result<Self> {
        Self::from_file(&DbcFile::read(reader)?, layout)
    }

    pub fn from_bytes(bytes: &[u8], layout: Arc<Layout>) -> Result<Self> {
        Self::from_file(&DbcFile::from_bytes(bytes)?, layout)
    }

    pub fn open(path: impl AsRef<Path>, layout: Arc<Layout>) -> Result<Self> {
        let path = path.as_ref();
        let file = DbcFile::open(path)?;
        Self::from_file(&file, layout).map_err(|e| e.in_file(path))
    }

    pub fn layout(&self) -> &Arc<Layout> {
        &self.layout
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// A blank row of this table's layout, not yet added.
    pub fn new_record(&self) -> Record {
        self.layout.new_record()
    }

    /// Append a row. Rows of another layout are rejected.
    pub fn push(&mut self, record: Record) -> Result<()> {
        if **record.layout() != *self.layout {
            return Err(WowDataError::version_mismatch(
                format!("{} ({:?})", self.layout.name(), self.layout.context().version),
                format!(
                    "{} ({:?})",
                    record.layout().name(),
                    record.layout().context().version
                ),
            )
            .into());
        }
        self.records.push(record);
        Ok(())
    }

    /// Append a row built from values in field order.
    pub fn push_values(&mut self, values: impl IntoIterator<Item = Value>) -> Result<()> {
        let mut record = self.new_record();
        for (field, value) in self.layout.fields().iter().zip(values) {
            record.set(&field.name, value);
        }
        self.push(record)
    }

    /// The first row whose leading integer column equals `id`.
    pub fn find_by_id(&self, id: i64) -> Option<&Record> {
        self.records
            .iter()
            .find(|r| r.values().first().and_then(Value::as_i64) == Some(id))
    }

    /// Encode the rows. Strings go into a deduplicated block that starts
    /// with a NUL, so offset 0 is always the empty string.
    pub fn to_file(&self) -> Result<DbcFile> {
        let mut strings = StringBlock::new(StringPadding::None).with_dedup();
        strings.add("");

        let mut rows = Vec::with_capacity(self.records.len() * self.layout.size());
        for record in &self.records {
            self.layout
                .write_record(&mut rows, record, &mut |s| strings.add(s))?;
        }

        let header = DbcHeader::for_layout(
            &self.layout,
            self.records.len() as u32,
            strings.len() as u32,
        );
        Ok(DbcFile::from_parts(header, rows, strings))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_file()?.to_bytes()
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes().map_err(|e| e.in_file(path))?;
        fs::write(path, bytes).map_err(|e| DbcError::from(e).in_file(path))?;
        Ok(())
    }
}
