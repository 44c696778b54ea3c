use std::collections::HashMap;

use crate::error::{Result, WowDataError};

/// What happens before each string is appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringPadding {
    /// Strings follow each other directly.
    #[default]
    None,
    /// NUL bytes are inserted until the block length is a multiple of four.
    Align4,
}

/// A run of NUL terminated strings addressed by byte offset.
///
/// The block only ever grows, so an offset handed out by [`StringBlock::add`]
/// keeps resolving to the same string.
#[derive(Debug, Clone, Default)]
pub struct StringBlock {
    data: Vec<u8>,
    padding: StringPadding,
    dedup: Option<HashMap<Vec<u8>, u32>>,
}

impl StringBlock {
    pub fn new(padding: StringPadding) -> Self {
        Self {
            data: Vec::new(),
            padding,
            dedup: None,
        }
    }

    /// Re-adding a string already present returns its first offset.
    #[must_use]
    pub fn with_dedup(mut self) -> Self {
        let mut seen = HashMap::new();
        for (offset, bytes) in raw_strings(&self.data) {
            seen.entry(bytes.to_vec()).or_insert(offset);
        }
        self.dedup = Some(seen);
        self
    }

    /// Wrap bytes read from a file; they are kept verbatim.
    pub fn from_bytes(data: Vec<u8>, padding: StringPadding) -> Self {
        Self {
            data,
            padding,
            dedup: None,
        }
    }

    pub fn padding(&self) -> StringPadding {
        self.padding
    }

    /// Append `s` and its terminator, returning the offset of its first byte.
    pub fn add(&mut self, s: &str) -> u32 {
        if let Some(seen) = &self.dedup {
            if let Some(&offset) = seen.get(s.as_bytes()) {
                return offset;
            }
        }

        if self.padding == StringPadding::Align4 {
            self.pad_to(4);
        }

        let offset = self.data.len() as u32;
        self.data.extend_from_slice(s.as_bytes());
        self.data.push(0);

        if let Some(seen) = &mut self.dedup {
            seen.insert(s.as_bytes().to_vec(), offset);
        }
        offset
    }

    /// Append raw NUL bytes until the block length is a multiple of `align`.
    pub fn pad_to(&mut self, align: usize) {
        let rem = self.data.len() % align;
        if rem != 0 {
            self.data.resize(self.data.len() + align - rem, 0);
        }
    }

    /// The string starting at `offset`.
    pub fn get(&self, offset: u32) -> Result<String> {
        self.get_bytes(offset)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Raw bytes of the string starting at `offset`, without terminator.
    pub fn get_bytes(&self, offset: u32) -> Result<&[u8]> {
        let start = offset as usize;
        if start > self.data.len() {
            return Err(WowDataError::OffsetOutOfBounds {
                offset: u64::from(offset),
                size: 1,
                file_size: self.data.len() as u64,
            });
        }
        let tail = &self.data[start..];
        memchr::memchr(0, tail)
            .map(|end| &tail[..end])
            .ok_or(WowDataError::StringNotTerminated {
                offset: u64::from(offset),
            })
    }

    /// Whether `offset` addresses the first byte of a string rather than a
    /// suffix of one.
    pub fn is_string_start(&self, offset: u32) -> bool {
        let offset = offset as usize;
        offset == 0 || (offset <= self.data.len() && self.data[offset - 1] == 0)
    }

    /// Every non-empty string with its offset, skipping padding.
    pub fn iter(&self) -> impl Iterator<Item = (u32, String)> + '_ {
        raw_strings(&self.data)
            .filter(|(_, bytes)| !bytes.is_empty())
            .map(|(offset, bytes)| (offset, String::from_utf8_lossy(bytes).into_owned()))
    }

    /// Offset of the first string equal to `s`.
    pub fn find(&self, s: &str) -> Option<u32> {
        if let Some(seen) = &self.dedup {
            return seen.get(s.as_bytes()).copied();
        }
        raw_strings(&self.data)
            .find(|(_, bytes)| *bytes == s.as_bytes())
            .map(|(offset, _)| offset)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl PartialEq for StringBlock {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

fn raw_strings(data: &[u8]) -> impl Iterator<Item = (u32, &[u8])> {
    let mut start = 0_usize;
    std::iter::from_fn(move || {
        if start >= data.len() {
            return None;
        }
        let tail = &data[start..];
        let len = memchr::memchr(0, tail).unwrap_or(tail.len());
        let item = (start as u32, &tail[..len]);
        start += len + 1;
        Some(item)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_and_resolve() {
        let mut block = StringBlock::new(StringPadding::None);
        let a = block.add("world\\a.blp");
        let b = block.add("b.blp");
        assert_eq!(a, 0);
        assert_eq!(b, 12);
        assert_eq!(block.get(b).unwrap(), "b.blp");
        assert_eq!(block.get(a).unwrap(), "world\\a.blp");
    }

    #[test]
    fn align4_pads_before_each_add() {
        let mut block = StringBlock::new(StringPadding::Align4);
        assert_eq!(block.add("ab"), 0);
        assert_eq!(block.add("c"), 4);
        assert_eq!(block.as_bytes(), b"ab\0\0c\0");
    }

    #[test]
    fn dedup_reuses_offsets() {
        let mut block = StringBlock::new(StringPadding::None).with_dedup();
        assert_eq!(block.add(""), 0);
        let alpha = block.add("Alpha");
        let beta = block.add("Beta");
        assert_eq!(block.add("Alpha"), alpha);
        assert_eq!((alpha, beta), (1, 7));
        assert_eq!(block.as_bytes(), b"\0Alpha\0Beta\0");
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut block = StringBlock::new(StringPadding::None);
        let first = block.add("first");
        let before = block.get(first).unwrap();
        block.add("second");
        assert_eq!(block.get(first).unwrap(), before);
    }

    #[test]
    fn suffix_offsets_resolve_but_are_not_starts() {
        let block = StringBlock::from_bytes(b"hello\0".to_vec(), StringPadding::None);
        assert_eq!(block.get(2).unwrap(), "llo");
        assert!(!block.is_string_start(2));
        assert!(block.is_string_start(0));
        assert!(block.is_string_start(6));
    }

    #[test]
    fn unterminated() {
        let block = StringBlock::from_bytes(b"abc".to_vec(), StringPadding::None);
        assert!(matches!(
            block.get(0),
            Err(WowDataError::StringNotTerminated { offset: 0 })
        ));
        assert!(matches!(
            block.get(9),
            Err(WowDataError::OffsetOutOfBounds { .. })
        ));
    }

    #[test]
    fn iter_skips_padding() {
        let block = StringBlock::from_bytes(b"ab\0\0c\0".to_vec(), StringPadding::Align4);
        let all: Vec<_> = block.iter().collect();
        assert_eq!(all, vec![(0, "ab".to_string()), (4, "c".to_string())]);
        assert_eq!(block.find("c"), Some(4));
    }
}
