//! File data id chunks following `MD21` in Legion+ roots.

use log::{debug, warn};
use wow_data::chunk::{Chunk, ChunkTag};
use wow_data::error::Result as WDResult;
use wow_data::prelude::*;
use wow_data_derive::{WowHeaderR, WowHeaderW};

pub const PFID: ChunkTag = ChunkTag::new(b"PFID");
pub const SFID: ChunkTag = ChunkTag::new(b"SFID");
pub const AFID: ChunkTag = ChunkTag::new(b"AFID");
pub const BFID: ChunkTag = ChunkTag::new(b"BFID");
pub const SKID: ChunkTag = ChunkTag::new(b"SKID");

pub type FileId = u32;

/// One `.anim` file of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, WowHeaderR, WowHeaderW)]
pub struct AnimationFileId {
    pub anim_id: u16,
    pub sub_anim_id: u16,
    pub file_id: FileId,
}

/// `SFID`: one id per skin profile, then the LOD skins.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SkinFileIds {
    pub file_ids: Vec<FileId>,
    pub lod_file_ids: Vec<FileId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum M2Sidecar {
    Physics(FileId),
    Skins(SkinFileIds),
    Animations(Vec<AnimationFileId>),
    Bones(Vec<FileId>),
    Skeleton(FileId),
    /// Any other chunk, kept verbatim
    Other(Chunk),
}

fn single_id(chunk: &Chunk) -> WDResult<FileId> {
    if chunk.data.len() != 4 {
        warn!(
            "{} chunk has {} bytes, expected 4",
            chunk.tag.as_str(),
            chunk.data.len()
        );
    }
    chunk.cursor().wow_read()
}

impl M2Sidecar {
    /// Decode a chunk found after `MD21`. `skin_count` comes from the
    /// MD20 header and splits `SFID` into skins and LOD skins.
    pub fn from_chunk(chunk: Chunk, skin_count: u32) -> WDResult<Self> {
        let sidecar = match chunk.tag {
            PFID => Self::Physics(single_id(&chunk)?),
            SKID => Self::Skeleton(single_id(&chunk)?),
            SFID => {
                let mut ids: Vec<FileId> = chunk.read_records(4)?;
                let split = (skin_count as usize).min(ids.len());
                let lod_file_ids = ids.split_off(split);
                Self::Skins(SkinFileIds {
                    file_ids: ids,
                    lod_file_ids,
                })
            }
            AFID => Self::Animations(chunk.read_records(8)?),
            BFID => Self::Bones(chunk.read_records(4)?),
            _ => {
                debug!("keeping unknown M2 chunk {}", chunk.tag.as_str());
                Self::Other(chunk)
            }
        };
        Ok(sidecar)
    }

    pub fn tag(&self) -> ChunkTag {
        match self {
            Self::Physics(_) => PFID,
            Self::Skins(_) => SFID,
            Self::Animations(_) => AFID,
            Self::Bones(_) => BFID,
            Self::Skeleton(_) => SKID,
            Self::Other(chunk) => chunk.tag,
        }
    }

    pub fn payload(&self) -> WDResult<Vec<u8>> {
        let mut out = Vec::new();
        match self {
            Self::Physics(id) | Self::Skeleton(id) => out.wow_write(id)?,
            Self::Skins(skins) => {
                for id in skins.file_ids.iter().chain(&skins.lod_file_ids) {
                    out.wow_write(id)?;
                }
            }
            Self::Animations(anims) => {
                for anim in anims {
                    out.wow_write(anim)?;
                }
            }
            Self::Bones(ids) => {
                for id in ids {
                    out.wow_write(id)?;
                }
            }
            Self::Other(chunk) => out.extend_from_slice(&chunk.data),
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn skin_ids_split_at_profile_count() {
        let mut data = Vec::new();
        for id in [100_u32, 101, 200] {
            data.extend_from_slice(&id.to_le_bytes());
        }
        let sidecar = M2Sidecar::from_chunk(Chunk::new(SFID, data.clone()), 2).unwrap();
        assert_eq!(
            sidecar,
            M2Sidecar::Skins(SkinFileIds {
                file_ids: vec![100, 101],
                lod_file_ids: vec![200],
            })
        );
        assert_eq!(sidecar.payload().unwrap(), data);
    }

    #[test]
    fn animation_ids_are_triples() {
        let data = [1_u16.to_le_bytes(), 2_u16.to_le_bytes()].concat();
        let data = [data, 5000_u32.to_le_bytes().to_vec()].concat();
        let sidecar = M2Sidecar::from_chunk(Chunk::new(AFID, data), 0).unwrap();
        assert_eq!(
            sidecar,
            M2Sidecar::Animations(vec![AnimationFileId {
                anim_id: 1,
                sub_anim_id: 2,
                file_id: 5000,
            }])
        );
    }

    #[test]
    fn unknown_chunks_are_kept() {
        let chunk = Chunk::new(ChunkTag::new(b"TXID"), vec![1, 2, 3, 4]);
        let sidecar = M2Sidecar::from_chunk(chunk.clone(), 0).unwrap();
        assert_eq!(sidecar.tag(), ChunkTag::new(b"TXID"));
        assert_eq!(sidecar.payload().unwrap(), vec![1, 2, 3, 4]);
    }
}
