//! Write-time layout of array-reference payloads.
//!
//! A file with array references is emitted in a single pass: the primary
//! header goes first with every reference still unknown, and the payloads
//! are laid out behind it by a [`DataSection`], whose [`OffsetManager`]
//! hands out non-overlapping, strictly increasing offsets.

use std::io::Cursor;

use crate::error::Result;
use crate::types::{Seek, SeekFrom, WowArray, WowHeaderW, Write};

/// Payload alignment requested at one array-reference site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment(u32);

impl Alignment {
    pub const NONE: Self = Self(1);
    pub const WORD: Self = Self(4);
    /// Alignment used for M2 payloads.
    pub const PARAGRAPH: Self = Self(16);

    pub const fn new(bytes: u32) -> Self {
        if bytes == 0 { Self(1) } else { Self(bytes) }
    }

    pub const fn apply(self, offset: u64) -> u64 {
        let align = self.0 as u64;
        offset.div_ceil(align) * align
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::NONE
    }
}

/// A single monotonic cursor over the auxiliary area of one file.
#[derive(Debug, Clone)]
pub struct OffsetManager {
    cursor: u64,
}

impl OffsetManager {
    /// `header_end` is the size of the primary record including all its
    /// fixed-layout members.
    pub const fn new(header_end: u64) -> Self {
        Self { cursor: header_end }
    }

    pub const fn position(&self) -> u64 {
        self.cursor
    }

    /// Reserve `size` bytes and return their start offset.
    pub fn request(&mut self, size: u64, align: Alignment) -> u64 {
        let start = align.apply(self.cursor);
        self.cursor = start + size;
        start
    }
}

/// Buffer for the payloads that follow a primary header.
#[derive(Debug, Clone)]
pub struct DataSection {
    base: u64,
    buf: Vec<u8>,
    offsets: OffsetManager,
}

impl DataSection {
    pub fn new(header_end: u64) -> Self {
        Self {
            base: header_end,
            buf: Vec::new(),
            offsets: OffsetManager::new(header_end),
        }
    }

    /// Absolute offset of the next free byte.
    pub fn position(&self) -> u64 {
        self.offsets.position()
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    fn claim(&mut self, size: usize, align: Alignment) -> u64 {
        let start = self.offsets.request(size as u64, align);
        let local = (start - self.base) as usize;
        self.buf.resize(local + size, 0);
        start
    }

    /// Copy raw bytes in and return their offset.
    pub fn push_bytes(&mut self, bytes: &[u8], align: Alignment) -> u64 {
        let start = self.claim(bytes.len(), align);
        let local = (start - self.base) as usize;
        self.buf[local..local + bytes.len()].copy_from_slice(bytes);
        start
    }

    /// Emit `items` contiguously and return the reference to them.
    ///
    /// An empty slice emits nothing and yields `(0, 0)`.
    pub fn push_array<T: WowHeaderW>(
        &mut self,
        items: &[T],
        align: Alignment,
    ) -> Result<WowArray<T>> {
        if items.is_empty() {
            return Ok(WowArray::empty());
        }
        let mut bytes = Vec::with_capacity(crate::types::slice_size(items));
        for item in items {
            item.wow_write(&mut bytes)?;
        }
        let offset = self.push_bytes(&bytes, align);
        Ok(WowArray::new(items.len() as u32, offset as u32))
    }

    /// Emit a string plus NUL terminator as a character array.
    pub fn push_str(&mut self, s: &str, align: Alignment) -> WowArray<u8> {
        if s.is_empty() {
            return WowArray::empty();
        }
        let mut bytes = Vec::with_capacity(s.len() + 1);
        bytes.extend_from_slice(s.as_bytes());
        bytes.push(0);
        let offset = self.push_bytes(&bytes, align);
        WowArray::new(bytes.len() as u32, offset as u32)
    }

    /// Emit an array of arrays: the block of child references is reserved
    /// first, then each child payload is emitted and its reference patched.
    pub fn push_nested<T: WowHeaderW>(
        &mut self,
        children: &[Vec<T>],
        align: Alignment,
    ) -> Result<WowArray<WowArray<T>>> {
        self.push_nested_with(children, align, |section, child| {
            section.push_array(child, align)
        })
    }

    /// Like [`DataSection::push_nested`] with a caller supplied child writer,
    /// for children whose elements have payloads of their own.
    pub fn push_nested_with<C, T, F>(
        &mut self,
        children: &[C],
        align: Alignment,
        mut write_child: F,
    ) -> Result<WowArray<WowArray<T>>>
    where
        F: FnMut(&mut Self, &C) -> Result<WowArray<T>>,
    {
        if children.is_empty() {
            return Ok(WowArray::empty());
        }
        let table = self.reserve(children.len() * 8, align);
        for (i, child) in children.iter().enumerate() {
            let reference = write_child(self, child)?;
            self.patch(table + (i as u64) * 8, &reference)?;
        }
        Ok(WowArray::new(children.len() as u32, table as u32))
    }

    /// Zero-filled placeholder of `size` bytes.
    pub fn reserve(&mut self, size: usize, align: Alignment) -> u64 {
        self.claim(size, align)
    }

    /// Overwrite already reserved bytes at absolute `offset`.
    pub fn patch<T: WowHeaderW>(&mut self, offset: u64, value: &T) -> Result<()> {
        let local = (offset - self.base) as usize;
        let mut cursor = Cursor::new(&mut self.buf);
        cursor.seek(SeekFrom::Start(local as u64))?;
        value.wow_write(&mut cursor)?;
        Ok(())
    }

    /// Pad the tail so the section ends on `align`.
    pub fn align_end(&mut self, align: Alignment) {
        self.claim(0, align);
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Append the section to `writer`, which must be positioned at the end
    /// of the primary header.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.buf)?;
        Ok(())
    }
}
