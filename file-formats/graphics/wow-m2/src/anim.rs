//! `.anim` side-files holding the keys of externally stored sequences.
//!
//! The track references kept in the root point into the key data of this
//! file. Before Legion the file is nothing but that data; from Legion on it
//! is chunked, with the data in `AFM2` and the skeleton parts in `AFSA` and
//! `AFSB`.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use wow_data::chunk::{Chunk, ChunkTag, TagOrder, chunk_bytes, read_chunks};
use wow_data::error::Result as WDResult;
use wow_data::prelude::*;

use crate::chunks::M2Sequence;

pub const AFM2: ChunkTag = ChunkTag::new(b"AFM2");
pub const AFSA: ChunkTag = ChunkTag::new(b"AFSA");
pub const AFSB: ChunkTag = ChunkTag::new(b"AFSB");

#[derive(Debug, Clone, PartialEq)]
pub enum M2AnimFile {
    Raw(Vec<u8>),
    Chunked {
        data: Vec<u8>,
        /// `AFSA`, `AFSB` and anything unknown, in file order
        others: Vec<Chunk>,
    },
}

impl M2AnimFile {
    pub fn from_bytes(bytes: &[u8], version: ClientVersion) -> WDResult<Self> {
        if version < ClientVersion::Legion || !bytes.starts_with(&AFM2.0) {
            return Ok(Self::Raw(bytes.to_vec()));
        }
        let mut data = None;
        let mut others = Vec::new();
        for chunk in read_chunks(bytes, TagOrder::Forward)? {
            match chunk.tag {
                AFM2 if data.is_none() => data = Some(chunk.data),
                AFSA | AFSB => others.push(chunk),
                _ => {
                    warn!("unexpected chunk {} in .anim file", chunk.tag);
                    others.push(chunk);
                }
            }
        }
        Ok(Self::Chunked {
            data: data.unwrap_or_default(),
            others,
        })
    }

    /// The bytes track references are relative to.
    pub fn data(&self) -> &[u8] {
        match self {
            Self::Raw(data) | Self::Chunked { data, .. } => data,
        }
    }

    pub fn cursor(&self) -> Cursor<&[u8]> {
        Cursor::new(self.data())
    }

    pub fn to_bytes(&self) -> WDResult<Vec<u8>> {
        match self {
            Self::Raw(data) => Ok(data.clone()),
            Self::Chunked { data, others } => {
                let mut out = chunk_bytes(AFM2, data, TagOrder::Forward);
                for chunk in others {
                    out.extend(chunk_bytes(chunk.tag, &chunk.data, TagOrder::Forward));
                }
                Ok(out)
            }
        }
    }
}

/// `<root without extension><animId:04>-<subAnimId:02>.anim`
pub fn anim_path(root: &Path, sequence: &M2Sequence) -> PathBuf {
    let stem = root.with_extension("");
    let mut name = stem.into_os_string();
    name.push(sequence.anim_suffix());
    let path = PathBuf::from(name);
    debug!("anim file for sequence {}: {}", sequence.animation_id, path.display());
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn path_pads_ids() {
        let sequence = M2Sequence {
            animation_id: 4,
            sub_animation_id: 0,
            ..M2Sequence::default()
        };
        assert_eq!(
            anim_path(Path::new("creature/wolf/wolf.m2"), &sequence),
            PathBuf::from("creature/wolf/wolf0004-00.anim")
        );
    }

    #[test]
    fn pre_legion_files_are_raw() {
        let anim = M2AnimFile::from_bytes(b"AFM2\x04\0\0\0abcd", ClientVersion::WotLK).unwrap();
        assert_eq!(anim.data().len(), 12);
    }

    #[test]
    fn legion_data_comes_from_afm2() {
        let mut bytes = b"AFM2\x04\0\0\0abcd".to_vec();
        bytes.extend_from_slice(b"AFSB\x02\0\0\0xy");
        let anim = M2AnimFile::from_bytes(&bytes, ClientVersion::Legion).unwrap();
        assert_eq!(anim.data(), b"abcd");
        assert_eq!(anim.to_bytes().unwrap(), bytes);
    }
}
