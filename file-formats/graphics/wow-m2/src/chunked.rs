//! Root files as stored on disk: a bare MD20 payload, or (Legion+) an
//! `MD21` chunk wrapping it followed by the file id chunks.

use std::io::Cursor;

use log::debug;
use wow_data::chunk::{ChunkReader, ChunkTag, TagOrder, chunk_bytes};
use wow_data::error::Result as WDResult;
use wow_data::prelude::*;

use crate::chunks::file_id::FileId;
use crate::chunks::{AnimationFileId, M2Sidecar, SkinFileIds};
use crate::header::MD20_MAGIC;
use crate::model::M2Model;

pub const MD21: ChunkTag = ChunkTag::new(b"MD21");

#[derive(Debug, Clone, PartialEq)]
pub struct M2Root {
    pub model: M2Model,
    /// Whether the payload is wrapped in `MD21`
    pub chunked: bool,
    /// Chunks after `MD21`, in file order
    pub sidecars: Vec<M2Sidecar>,
}

impl M2Root {
    pub fn new(model: M2Model) -> Self {
        Self {
            chunked: model.version >= ClientVersion::Legion,
            model,
            sidecars: Vec::new(),
        }
    }

    pub fn read<R: Read + Seek>(reader: &mut R, version: ClientVersion) -> WDResult<Self> {
        let start = reader.stream_position()?;
        let magic: MagicStr = reader.wow_read()?;
        reader.seek(SeekFrom::Start(start))?;

        if magic == MD20_MAGIC {
            return Ok(Self {
                model: M2Model::read(reader, version)?,
                chunked: false,
                sidecars: Vec::new(),
            });
        }
        if ChunkTag::from_wire(magic, TagOrder::Forward) != MD21 {
            return Err(WowDataError::bad_magic(b"MD20 or MD21", &magic, start));
        }

        let mut chunks = ChunkReader::new(reader, TagOrder::Forward)?;
        let md21 = chunks.expect(MD21)?;
        // MD20 offsets count from the start of the MD21 payload
        let model = M2Model::read(&mut md21.cursor(), version).map_err(|e| match e {
            WowDataError::ShortRead { offset: Some(at) } => WowDataError::ShortRead {
                offset: Some(at + md21.payload_offset()),
            },
            other => other,
        })?;

        let mut sidecars = Vec::new();
        for chunk in chunks {
            let sidecar = M2Sidecar::from_chunk(chunk?, model.skin_count)?;
            debug!("M2 sidecar {}", sidecar.tag());
            sidecars.push(sidecar);
        }
        Ok(Self {
            model,
            chunked: true,
            sidecars,
        })
    }

    pub fn from_bytes(bytes: &[u8], version: ClientVersion) -> WDResult<Self> {
        Self::read(&mut Cursor::new(bytes), version)
    }

    pub fn write<W: Write>(&self, writer: &mut W, version: ClientVersion) -> WDResult<()> {
        if !self.chunked {
            return self.model.write(writer, version);
        }
        let payload = self.model.to_bytes(version)?;
        writer.write_all(&chunk_bytes(MD21, &payload, TagOrder::Forward))?;
        for sidecar in &self.sidecars {
            writer.write_all(&chunk_bytes(sidecar.tag(), &sidecar.payload()?, TagOrder::Forward))?;
        }
        Ok(())
    }

    pub fn to_bytes(&self, version: ClientVersion) -> WDResult<Vec<u8>> {
        let mut out = Vec::new();
        self.write(&mut out, version)?;
        Ok(out)
    }

    pub fn physics_file_id(&self) -> Option<FileId> {
        self.sidecars.iter().find_map(|s| match s {
            M2Sidecar::Physics(id) => Some(*id),
            _ => None,
        })
    }

    pub fn skeleton_file_id(&self) -> Option<FileId> {
        self.sidecars.iter().find_map(|s| match s {
            M2Sidecar::Skeleton(id) => Some(*id),
            _ => None,
        })
    }

    pub fn skin_file_ids(&self) -> Option<&SkinFileIds> {
        self.sidecars.iter().find_map(|s| match s {
            M2Sidecar::Skins(ids) => Some(ids),
            _ => None,
        })
    }

    /// The `.anim` files of the model, for loads initiated by the caller.
    pub fn animation_file_ids(&self) -> &[AnimationFileId] {
        self.sidecars
            .iter()
            .find_map(|s| match s {
                M2Sidecar::Animations(ids) => Some(ids.as_slice()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn bone_file_ids(&self) -> &[FileId] {
        self.sidecars
            .iter()
            .find_map(|s| match s {
                M2Sidecar::Bones(ids) => Some(ids.as_slice()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Replace the sidecar with the same tag, or append it.
    pub fn set_sidecar(&mut self, sidecar: M2Sidecar) {
        match self.sidecars.iter_mut().find(|s| s.tag() == sidecar.tag()) {
            Some(slot) => *slot = sidecar,
            None => self.sidecars.push(sidecar),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn legion_root() -> M2Root {
        let mut model = M2Model::new(ClientVersion::Legion, "Chunked");
        model.skin_count = 2;
        let mut root = M2Root::new(model);
        root.set_sidecar(M2Sidecar::Skins(SkinFileIds {
            file_ids: vec![1000, 1001],
            lod_file_ids: vec![1002],
        }));
        root.set_sidecar(M2Sidecar::Animations(vec![AnimationFileId {
            anim_id: 4,
            sub_anim_id: 0,
            file_id: 2000,
        }]));
        root.set_sidecar(M2Sidecar::Physics(3000));
        root
    }

    #[test]
    fn md21_starts_with_a_forward_tag() {
        let bytes = legion_root().to_bytes(ClientVersion::Legion).unwrap();
        assert_eq!(&bytes[0..4], b"MD21");
        assert_eq!(&bytes[8..12], b"MD20");
    }

    #[test]
    fn sidecars_survive_a_write() {
        let root = legion_root();
        let bytes = root.to_bytes(ClientVersion::Legion).unwrap();
        let back = M2Root::from_bytes(&bytes, ClientVersion::Legion).unwrap();
        assert_eq!(back, root);
        assert_eq!(back.physics_file_id(), Some(3000));
        assert_eq!(back.skin_file_ids().unwrap().lod_file_ids, vec![1002]);
        assert_eq!(back.animation_file_ids()[0].file_id, 2000);
        assert!(back.bone_file_ids().is_empty());
    }

    #[test]
    fn plain_md20_is_not_chunked() {
        let root = M2Root::new(M2Model::new(ClientVersion::WotLK, "Plain"));
        let bytes = root.to_bytes(ClientVersion::WotLK).unwrap();
        assert_eq!(&bytes[0..4], b"MD20");
        assert!(!M2Root::from_bytes(&bytes, ClientVersion::WotLK).unwrap().chunked);
    }

    #[test]
    fn unknown_magic() {
        let err = M2Root::from_bytes(b"MDX0\0\0\0\0", ClientVersion::Legion).unwrap_err();
        assert!(matches!(err, WowDataError::BadMagic { offset: 0, .. }));
    }
}
