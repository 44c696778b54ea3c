use std::fmt;
use std::marker::PhantomData;

pub use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{Result, WowDataError};

pub type MagicStr = [u8; 4];

/// A fixed-layout value that can be read without outside context.
pub trait WowHeaderR: Sized {
    fn wow_read<R: Read + Seek>(reader: &mut R) -> Result<Self>;
}

/// A fixed-layout value that can be written and knows its encoded size.
pub trait WowHeaderW {
    fn wow_write<W: Write>(&self, writer: &mut W) -> Result<()>;
    fn wow_size(&self) -> usize;
}

pub trait DataVersion: Copy {}

/// A value whose layout depends on a version selected before reading.
pub trait VWowHeaderR<V: DataVersion>: Sized {
    fn wow_read<R: Read + Seek>(reader: &mut R, version: V) -> Result<Self>;
}

/// Data resolved by following the array references of a header `H`.
pub trait WowDataR<H>: Sized {
    fn new_from_header<R: Read + Seek>(reader: &mut R, header: &H) -> Result<Self>;
}

/// Like [`WowDataR`], for data whose layout is version dependent.
pub trait VWowDataR<V: DataVersion, H>: Sized {
    fn new_from_header<R: Read + Seek>(reader: &mut R, header: &H, version: V) -> Result<Self>;
}

pub trait WowReaderForHeader: Read + Seek + Sized {
    fn wow_read<T: WowHeaderR>(&mut self) -> Result<T> {
        let at = self.stream_position()?;
        T::wow_read(self).map_err(|e| e.at_offset(at))
    }

    fn wow_read_versioned<V: DataVersion, T: VWowHeaderR<V>>(&mut self, version: V) -> Result<T> {
        let at = self.stream_position()?;
        T::wow_read(self, version).map_err(|e| e.at_offset(at))
    }
}
impl<R: Read + Seek> WowReaderForHeader for R {}

pub trait WowReaderForData: Read + Seek + Sized {
    fn new_from_header<H, T: WowDataR<H>>(&mut self, header: &H) -> Result<T> {
        T::new_from_header(self, header)
    }

    fn v_new_from_header<V: DataVersion, H, T: VWowDataR<V, H>>(
        &mut self,
        header: &H,
        version: V,
    ) -> Result<T> {
        T::new_from_header(self, header, version)
    }
}
impl<R: Read + Seek> WowReaderForData for R {}

pub trait WowWriterForHeader: Write + Sized {
    fn wow_write<T: WowHeaderW>(&mut self, value: &T) -> Result<()> {
        value.wow_write(self)
    }
}
impl<W: Write> WowWriterForHeader for W {}

/// Length of a seekable stream; the current position is preserved.
pub fn stream_len<S: Seek>(stream: &mut S) -> Result<u64> {
    let here = stream.stream_position()?;
    let len = stream.seek(SeekFrom::End(0))?;
    if here != len {
        stream.seek(SeekFrom::Start(here))?;
    }
    Ok(len)
}

/// Read and check a four byte magic.
pub fn expect_magic<R: Read + Seek>(reader: &mut R, expected: &MagicStr) -> Result<()> {
    let at = reader.stream_position()?;
    let found: MagicStr = reader.wow_read()?;
    if &found == expected {
        Ok(())
    } else {
        Err(WowDataError::bad_magic(expected, &found, at))
    }
}

/// An array reference: `count` elements stored at `offset` elsewhere in the
/// same file.
pub struct WowArray<T> {
    pub count: u32,
    pub offset: u32,
    _phantom: PhantomData<T>,
}

impl<T> WowArray<T> {
    pub const fn new(count: u32, offset: u32) -> Self {
        Self {
            count,
            offset,
            _phantom: PhantomData,
        }
    }

    pub const fn empty() -> Self {
        Self::new(0, 0)
    }

    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn add_offset(&mut self, offset: usize) {
        if !self.is_empty() {
            self.offset += offset as u32;
        }
    }

    /// Reinterpret the element type while keeping count and offset.
    pub const fn cast<U>(&self) -> WowArray<U> {
        WowArray::new(self.count, self.offset)
    }

    /// Read every element with `read_one`, restoring the stream position
    /// afterwards.
    ///
    /// An empty reference yields an empty vector whatever its offset. A
    /// payload that would start or end outside the stream is reported as
    /// [`WowDataError::OffsetOutOfBounds`].
    pub fn read_each<R, U, F>(&self, reader: &mut R, mut read_one: F) -> Result<Vec<U>>
    where
        R: Read + Seek,
        F: FnMut(&mut R) -> Result<U>,
    {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let file_size = stream_len(reader)?;
        let offset = u64::from(self.offset);
        if offset >= file_size {
            return Err(WowDataError::OffsetOutOfBounds {
                offset,
                size: u64::from(self.count),
                file_size,
            });
        }

        let return_to = reader.stream_position()?;
        reader.seek(SeekFrom::Start(offset))?;

        let mut items = Vec::with_capacity((self.count as usize).min(0x10000));
        for _ in 0..self.count {
            match read_one(reader) {
                Ok(item) => items.push(item),
                Err(e) if e.is_short_read() => {
                    let reached = reader.stream_position().unwrap_or(file_size);
                    return Err(WowDataError::OffsetOutOfBounds {
                        offset,
                        size: reached.saturating_sub(offset).max(1),
                        file_size,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        reader.seek(SeekFrom::Start(return_to))?;
        Ok(items)
    }
}

impl<T: WowHeaderR> WowArray<T> {
    pub fn wow_read_to_vec<R: Read + Seek>(&self, reader: &mut R) -> Result<Vec<T>> {
        self.read_each(reader, |r| r.wow_read())
    }
}

impl<T> WowArray<T> {
    pub fn v_wow_read_to_vec<V, R>(&self, reader: &mut R, version: V) -> Result<Vec<T>>
    where
        V: DataVersion,
        T: VWowHeaderR<V>,
        R: Read + Seek,
    {
        self.read_each(reader, |r| r.wow_read_versioned(version))
    }
}

impl<T: WowHeaderR> WowArray<WowArray<T>> {
    /// Resolve an array of arrays, one inner vector per outer element.
    pub fn wow_read_nested<R: Read + Seek>(&self, reader: &mut R) -> Result<Vec<Vec<T>>> {
        let inner = self.wow_read_to_vec(reader)?;
        inner.iter().map(|a| a.wow_read_to_vec(reader)).collect()
    }
}

impl<T> Clone for WowArray<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for WowArray<T> {}

impl<T> Default for WowArray<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> PartialEq for WowArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.offset == other.offset
    }
}
impl<T> Eq for WowArray<T> {}

impl<T> fmt::Debug for WowArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WowArray")
            .field("count", &self.count)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<T> WowHeaderR for WowArray<T> {
    fn wow_read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        Ok(Self::new(reader.wow_read()?, reader.wow_read()?))
    }
}

impl<T> WowHeaderW for WowArray<T> {
    fn wow_write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.wow_write(&self.count)?;
        writer.wow_write(&self.offset)?;
        Ok(())
    }

    fn wow_size(&self) -> usize {
        8
    }
}

impl<T: WowHeaderR> WowDataR<WowArray<T>> for Vec<T> {
    fn new_from_header<R: Read + Seek>(reader: &mut R, header: &WowArray<T>) -> Result<Self> {
        header.wow_read_to_vec(reader)
    }
}

/// Array reference to raw characters, usually NUL terminated.
pub type WowCharArray = WowArray<u8>;

impl WowDataR<WowCharArray> for String {
    fn new_from_header<R: Read + Seek>(reader: &mut R, header: &WowCharArray) -> Result<Self> {
        let bytes = header.wow_read_to_vec(reader)?;
        let end = memchr::memchr(0, &bytes).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

/// Encoded size of a slice of fixed-layout values.
pub fn slice_size<T: WowHeaderW>(items: &[T]) -> usize {
    items.iter().map(WowHeaderW::wow_size).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn u32_read_write() {
        let mut cursor = Cursor::new([0x05, 0x20, 0x00, 0x00]);
        let value: u32 = cursor.wow_read().unwrap();
        assert_eq!(value, 0x2005);

        let mut data = Vec::new();
        data.wow_write(&0x3000_2100_u32).unwrap();
        assert_eq!(data, [0x00, 0x21, 0x00, 0x30]);
    }

    #[test]
    fn short_read_reports_offset() {
        let mut cursor = Cursor::new([1_u8, 0, 0, 0, 9]);
        let _: u32 = cursor.wow_read().unwrap();
        let err = cursor.wow_read::<u32>().unwrap_err();
        assert!(matches!(err, WowDataError::ShortRead { offset: Some(4) }));
    }

    #[test]
    fn array_reads_payload_and_restores_position() {
        // header: count=2, offset=8; payload: two u16
        let bytes = [2, 0, 0, 0, 8, 0, 0, 0, 0x34, 0x12, 0x78, 0x56];
        let mut cursor = Cursor::new(bytes);
        let header: WowArray<u16> = cursor.wow_read().unwrap();
        let values = header.wow_read_to_vec(&mut cursor).unwrap();
        assert_eq!(values, vec![0x1234, 0x5678]);
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn empty_array_ignores_offset() {
        let mut cursor = Cursor::new([0_u8; 4]);
        let header = WowArray::<u32>::new(0, 0xdead_beef);
        assert!(header.wow_read_to_vec(&mut cursor).unwrap().is_empty());
    }

    #[test]
    fn array_outside_file_is_rejected() {
        let mut cursor = Cursor::new([0_u8; 16]);
        let header = WowArray::<u32>::new(1, 64);
        assert!(matches!(
            header.wow_read_to_vec(&mut cursor),
            Err(WowDataError::OffsetOutOfBounds { offset: 64, .. })
        ));

        let overrun = WowArray::<u32>::new(4, 8);
        assert!(matches!(
            overrun.wow_read_to_vec(&mut cursor),
            Err(WowDataError::OffsetOutOfBounds { offset: 8, .. })
        ));
    }

    #[test]
    fn char_array_stops_at_nul() {
        let bytes = b"\x06\0\0\0\x08\0\0\0hello\0";
        let mut cursor = Cursor::new(bytes.to_vec());
        let header: WowCharArray = cursor.wow_read().unwrap();
        let name: String = cursor.new_from_header(&header).unwrap();
        assert_eq!(name, "hello");
    }

    #[test]
    fn magic_mismatch() {
        let mut cursor = Cursor::new(*b"MD21");
        assert!(matches!(
            expect_magic(&mut cursor, b"MD20"),
            Err(WowDataError::BadMagic { offset: 0, .. })
        ));
    }
}
