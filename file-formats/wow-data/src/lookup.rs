//! Index checks for lookup tables.
//!
//! A lookup value is either an index into a peer array or a sentinel with
//! every bit set, meaning "no entry". Sentinels are never range checked.

use crate::error::{Result, WowDataError};

pub const NO_ENTRY_U8: u8 = 0xFF;
pub const NO_ENTRY_U16: u16 = 0xFFFF;
pub const NO_ENTRY_I16: i16 = -1;

/// Check a 16-bit index; `Ok(None)` for the sentinel.
pub fn check_u16(table: &str, index: u16, len: usize) -> Result<Option<usize>> {
    if index == NO_ENTRY_U16 {
        return Ok(None);
    }
    check_index(table, u32::from(index), len).map(Some)
}

/// Check an 8-bit index; `Ok(None)` for the sentinel.
pub fn check_u8(table: &str, index: u8, len: usize) -> Result<Option<usize>> {
    if index == NO_ENTRY_U8 {
        return Ok(None);
    }
    check_index(table, u32::from(index), len).map(Some)
}

/// Signed 16-bit tables use `-1` as their sentinel.
pub fn check_i16(table: &str, index: i16, len: usize) -> Result<Option<usize>> {
    if index < 0 {
        return if index == NO_ENTRY_I16 {
            Ok(None)
        } else {
            Err(WowDataError::lookup(table, index as u16 as u32, len))
        };
    }
    check_index(table, index as u32, len).map(Some)
}

/// Check an index that has no sentinel.
pub fn check_index(table: &str, index: u32, len: usize) -> Result<usize> {
    let at = index as usize;
    if at < len {
        Ok(at)
    } else {
        Err(WowDataError::lookup(table, index, len))
    }
}

/// Check every entry of a 16-bit lookup table against `len`.
pub fn check_all_u16(table: &str, indices: &[u16], len: usize) -> Result<()> {
    for &index in indices {
        check_u16(table, index, len)?;
    }
    Ok(())
}
