use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Result, WowDataError};

use super::types::*;

macro_rules! le_primitive {
    ($ty:ty, $read:ident, $write:ident) => {
        impl WowHeaderR for $ty {
            fn wow_read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
                Ok(reader.$read::<LittleEndian>()?)
            }
        }
        impl WowHeaderW for $ty {
            fn wow_write<W: Write>(&self, writer: &mut W) -> Result<()> {
                writer.$write::<LittleEndian>(*self)?;
                Ok(())
            }

            fn wow_size(&self) -> usize {
                ::std::mem::size_of::<$ty>()
            }
        }
    };
}

le_primitive!(u16, read_u16, write_u16);
le_primitive!(i16, read_i16, write_i16);
le_primitive!(u32, read_u32, write_u32);
le_primitive!(i32, read_i32, write_i32);
le_primitive!(u64, read_u64, write_u64);
le_primitive!(i64, read_i64, write_i64);
le_primitive!(f32, read_f32, write_f32);
le_primitive!(f64, read_f64, write_f64);

impl WowHeaderR for u8 {
    fn wow_read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        Ok(reader.read_u8()?)
    }
}
impl WowHeaderW for u8 {
    fn wow_write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(*self)?;
        Ok(())
    }

    fn wow_size(&self) -> usize {
        1
    }
}

impl WowHeaderR for i8 {
    fn wow_read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        Ok(reader.read_i8()?)
    }
}
impl WowHeaderW for i8 {
    fn wow_write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_i8(*self)?;
        Ok(())
    }

    fn wow_size(&self) -> usize {
        1
    }
}

impl<T: WowHeaderR, const N: usize> WowHeaderR for [T; N] {
    fn wow_read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::wow_read(reader)?);
        }
        items
            .try_into()
            .map_err(|_| WowDataError::ShortRead { offset: None })
    }
}
impl<T: WowHeaderW, const N: usize> WowHeaderW for [T; N] {
    fn wow_write<W: Write>(&self, writer: &mut W) -> Result<()> {
        for item in self {
            item.wow_write(writer)?;
        }
        Ok(())
    }

    fn wow_size(&self) -> usize {
        self.iter().map(WowHeaderW::wow_size).sum()
    }
}

impl<A: WowHeaderR, B: WowHeaderR> WowHeaderR for (A, B) {
    fn wow_read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        Ok((A::wow_read(reader)?, B::wow_read(reader)?))
    }
}
impl<A: WowHeaderW, B: WowHeaderW> WowHeaderW for (A, B) {
    fn wow_write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.0.wow_write(writer)?;
        self.1.wow_write(writer)
    }

    fn wow_size(&self) -> usize {
        self.0.wow_size() + self.1.wow_size()
    }
}

/// Strings are written with their NUL terminator.
impl WowHeaderW for String {
    fn wow_write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.as_bytes())?;
        writer.write_u8(0)?;
        Ok(())
    }

    fn wow_size(&self) -> usize {
        self.len() + 1
    }
}
