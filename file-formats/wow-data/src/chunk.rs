use std::fmt;
use std::io::Cursor;

use binrw::{BinRead, BinWrite};

use crate::error::{Result, WowDataError};
use crate::types::{
    MagicStr, Read, Seek, SeekFrom, Write, WowHeaderR, WowReaderForHeader, WowWriterForHeader,
    stream_len,
};

/// A chunk tag in its logical spelling, e.g. `MVER`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkTag(pub MagicStr);

impl ChunkTag {
    pub const fn new(tag: &MagicStr) -> Self {
        Self(*tag)
    }

    /// Bytes as they appear in the file for the given tag order.
    pub const fn to_wire(self, order: TagOrder) -> MagicStr {
        match order {
            TagOrder::Forward => self.0,
            TagOrder::Reversed => [self.0[3], self.0[2], self.0[1], self.0[0]],
        }
    }

    pub const fn from_wire(bytes: MagicStr, order: TagOrder) -> Self {
        match order {
            TagOrder::Forward => Self(bytes),
            TagOrder::Reversed => Self([bytes[3], bytes[2], bytes[1], bytes[0]]),
        }
    }

    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl fmt::Debug for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkTag({})", self.as_str())
    }
}

/// How a format stores its tags on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOrder {
    /// Tag bytes stored right to left (WMO, ADT).
    Reversed,
    /// Tag bytes stored as spelled (M2 chunked files).
    Forward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub tag: ChunkTag,
    pub size: u32,
}

impl ChunkHeader {
    pub const SIZE: u64 = 8;

    pub fn read<R: Read + Seek>(reader: &mut R, order: TagOrder) -> Result<Self> {
        let wire: MagicStr = reader.wow_read()?;
        Ok(Self {
            tag: ChunkTag::from_wire(wire, order),
            size: reader.wow_read()?,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W, order: TagOrder) -> Result<()> {
        writer.wow_write(&self.tag.to_wire(order))?;
        writer.wow_write(&self.size)
    }
}

/// One chunk with its payload.
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    pub tag: ChunkTag,
    /// Offset of the chunk header in the enclosing stream.
    pub offset: u64,
    pub data: Vec<u8>,
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("tag", &self.tag)
            .field("offset", &self.offset)
            .field("size", &self.data.len())
            .finish()
    }
}

impl Chunk {
    pub fn new(tag: ChunkTag, data: Vec<u8>) -> Self {
        Self {
            tag,
            offset: 0,
            data,
        }
    }

    pub fn payload_offset(&self) -> u64 {
        self.offset + ChunkHeader::SIZE
    }

    pub fn cursor(&self) -> Cursor<&[u8]> {
        Cursor::new(self.data.as_slice())
    }

    /// Fail with [`WowDataError::BadMagic`] unless this chunk carries `tag`.
    pub fn expect(&self, tag: ChunkTag) -> Result<&Self> {
        if self.tag == tag {
            Ok(self)
        } else {
            Err(WowDataError::bad_magic(&tag.0, &self.tag.0, self.offset))
        }
    }

    /// Decode the payload as a packed array of fixed-layout records.
    ///
    /// The payload length must be a multiple of `stride`.
    pub fn read_records<T: WowHeaderR>(&self, stride: usize) -> Result<Vec<T>> {
        if stride == 0 || self.data.len() % stride != 0 {
            return Err(WowDataError::OffsetOutOfBounds {
                offset: self.payload_offset(),
                size: stride as u64,
                file_size: self.data.len() as u64,
            });
        }
        let mut cursor = self.cursor();
        (0..self.data.len() / stride)
            .map(|_| cursor.wow_read())
            .collect::<Result<Vec<T>>>()
            .map_err(|e| e.at_offset(self.payload_offset()))
    }

    /// Like [`Chunk::read_records`] for records declared with `binrw`.
    pub fn read_brw<T>(&self, stride: usize) -> Result<Vec<T>>
    where
        T: BinRead,
        for<'a> T::Args<'a>: Default,
    {
        if stride == 0 || self.data.len() % stride != 0 {
            return Err(WowDataError::OffsetOutOfBounds {
                offset: self.payload_offset(),
                size: stride as u64,
                file_size: self.data.len() as u64,
            });
        }
        let mut cursor = self.cursor();
        (0..self.data.len() / stride)
            .map(|_| T::read_le_args(&mut cursor, Default::default()).map_err(WowDataError::from))
            .collect::<Result<Vec<T>>>()
            .map_err(|e| e.at_offset(self.payload_offset()))
    }

    /// A single `binrw` record filling the start of the payload.
    pub fn read_brw_one<T>(&self) -> Result<T>
    where
        T: BinRead,
        for<'a> T::Args<'a>: Default,
    {
        T::read_le_args(&mut self.cursor(), Default::default())
            .map_err(|e| WowDataError::from(e).at_offset(self.payload_offset()))
    }

    pub fn write<W: Write>(&self, writer: &mut W, order: TagOrder) -> Result<()> {
        ChunkHeader {
            tag: self.tag,
            size: self.data.len() as u32,
        }
        .write(writer, order)?;
        writer.write_all(&self.data)?;
        Ok(())
    }
}

/// Iterates the top level chunks of a stream.
///
/// Each chunk's payload is read in full and the stream is left at
/// `start + 8 + size`, so unknown chunks are skipped by construction.
pub struct ChunkReader<R> {
    reader: R,
    order: TagOrder,
    end: u64,
}

impl<R: Read + Seek> ChunkReader<R> {
    pub fn new(mut reader: R, order: TagOrder) -> Result<Self> {
        let end = stream_len(&mut reader)?;
        Ok(Self { reader, order, end })
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.reader.stream_position()?)
    }

    pub fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        let offset = self.reader.stream_position()?;
        if offset >= self.end {
            return Ok(None);
        }
        if self.end - offset < ChunkHeader::SIZE {
            return Err(WowDataError::ShortRead {
                offset: Some(offset),
            });
        }

        let header = ChunkHeader::read(&mut self.reader, self.order)?;
        let payload_end = offset + ChunkHeader::SIZE + u64::from(header.size);
        if payload_end > self.end {
            return Err(WowDataError::ShortRead {
                offset: Some(offset),
            });
        }

        let mut data = vec![0_u8; header.size as usize];
        self.reader.read_exact(&mut data)?;
        self.reader.seek(SeekFrom::Start(payload_end))?;

        log::trace!("chunk {} at {offset:#x}, {} bytes", header.tag, header.size);
        Ok(Some(Chunk {
            tag: header.tag,
            offset,
            data,
        }))
    }

    /// The next chunk, which must carry `tag`.
    pub fn expect(&mut self, tag: ChunkTag) -> Result<Chunk> {
        let offset = self.reader.stream_position()?;
        match self.next_chunk()? {
            Some(chunk) if chunk.tag == tag => Ok(chunk),
            Some(chunk) => Err(WowDataError::bad_magic(&tag.0, &chunk.tag.0, chunk.offset)),
            None => Err(WowDataError::ShortRead {
                offset: Some(offset),
            }),
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Seek> Iterator for ChunkReader<R> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

/// Split a byte buffer into its chunks. Offsets are relative to `bytes`.
pub fn read_chunks(bytes: &[u8], order: TagOrder) -> Result<Vec<Chunk>> {
    ChunkReader::new(Cursor::new(bytes), order)?.collect()
}

/// Writes chunks, back-patching sizes of chunks opened with
/// [`ChunkWriter::begin`] once they are closed. Chunks may nest.
pub struct ChunkWriter<W> {
    writer: W,
    order: TagOrder,
    open: Vec<u64>,
}

impl<W: Write + Seek> ChunkWriter<W> {
    pub fn new(writer: W, order: TagOrder) -> Self {
        Self {
            writer,
            order,
            open: Vec::new(),
        }
    }

    pub fn write_chunk(&mut self, tag: ChunkTag, payload: &[u8]) -> Result<()> {
        ChunkHeader {
            tag,
            size: payload.len() as u32,
        }
        .write(&mut self.writer, self.order)?;
        self.writer.write_all(payload)?;
        Ok(())
    }

    /// Open a chunk whose size is not known yet.
    pub fn begin(&mut self, tag: ChunkTag) -> Result<()> {
        let at = self.writer.stream_position()?;
        ChunkHeader { tag, size: 0 }.write(&mut self.writer, self.order)?;
        self.open.push(at);
        Ok(())
    }

    /// Write raw bytes into the innermost open chunk.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        Ok(())
    }

    /// Close the innermost open chunk and patch its size.
    pub fn finish(&mut self) -> Result<()> {
        let Some(start) = self.open.pop() else {
            return Ok(());
        };
        let end = self.writer.stream_position()?;
        let size = (end - start - ChunkHeader::SIZE) as u32;
        self.writer.seek(SeekFrom::Start(start + 4))?;
        self.writer.wow_write(&size)?;
        self.writer.seek(SeekFrom::Start(end))?;
        Ok(())
    }

    pub fn into_inner(mut self) -> Result<W> {
        while !self.open.is_empty() {
            self.finish()?;
        }
        Ok(self.writer)
    }
}

/// Encode `binrw` records back to back.
pub fn brw_payload<T>(records: &[T]) -> Result<Vec<u8>>
where
    T: BinWrite,
    for<'a> T::Args<'a>: Default,
{
    let mut cursor = Cursor::new(Vec::new());
    for record in records {
        record.write_le_args(&mut cursor, Default::default())?;
    }
    Ok(cursor.into_inner())
}

/// Builder for chunk payloads kept in memory.
pub fn chunk_bytes(tag: ChunkTag, payload: &[u8], order: TagOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 8);
    out.extend_from_slice(&tag.to_wire(order));
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MVER: ChunkTag = ChunkTag::new(b"MVER");
    const MOHD: ChunkTag = ChunkTag::new(b"MOHD");

    #[test]
    fn reversed_tags_on_the_wire() {
        let bytes = chunk_bytes(MVER, &17_u32.to_le_bytes(), TagOrder::Reversed);
        assert_eq!(&bytes[..], b"REVM\x04\0\0\0\x11\0\0\0");

        let chunks = read_chunks(&bytes, TagOrder::Reversed).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].tag, MVER);
        assert_eq!(chunks[0].data, 17_u32.to_le_bytes());
    }

    #[test]
    fn forward_tags_on_the_wire() {
        let bytes = chunk_bytes(ChunkTag::new(b"SFID"), &[], TagOrder::Forward);
        assert_eq!(&bytes[..4], b"SFID");
    }

    #[test]
    fn truncated_payload_is_short_read() {
        let mut bytes = chunk_bytes(MVER, &[1, 2, 3, 4], TagOrder::Reversed);
        bytes.truncate(10);
        assert!(matches!(
            read_chunks(&bytes, TagOrder::Reversed),
            Err(WowDataError::ShortRead { offset: Some(0) })
        ));
    }

    #[test]
    fn expect_wrong_tag_is_bad_magic() {
        let bytes = chunk_bytes(MOHD, &[], TagOrder::Reversed);
        let mut reader = ChunkReader::new(Cursor::new(bytes), TagOrder::Reversed).unwrap();
        assert!(matches!(
            reader.expect(MVER),
            Err(WowDataError::BadMagic { offset: 0, .. })
        ));
    }

    #[test]
    fn nested_chunks_are_back_patched() {
        let mut writer = ChunkWriter::new(Cursor::new(Vec::new()), TagOrder::Reversed);
        writer.begin(ChunkTag::new(b"MOGP")).unwrap();
        writer.write_raw(&[0xaa; 4]).unwrap();
        writer.write_chunk(ChunkTag::new(b"MOVI"), &[1, 0, 2, 0]).unwrap();
        writer.finish().unwrap();
        let bytes = writer.into_inner().unwrap().into_inner();

        assert_eq!(&bytes[..4], b"PGOM");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 16);
        let outer = read_chunks(&bytes, TagOrder::Reversed).unwrap();
        let inner = read_chunks(&outer[0].data[4..], TagOrder::Reversed).unwrap();
        assert_eq!(inner[0].tag, ChunkTag::new(b"MOVI"));
    }

    #[test]
    fn records_need_whole_strides() {
        let chunk = Chunk::new(MOHD, vec![0; 6]);
        assert!(chunk.read_records::<u32>(4).is_err());
        let chunk = Chunk::new(MOHD, vec![1, 0, 0, 0, 2, 0, 0, 0]);
        assert_eq!(chunk.read_records::<u32>(4).unwrap(), vec![1, 2]);
    }
}
