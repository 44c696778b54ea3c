use std::io::Cursor;

use wow_data::error::Result as WDResult;
use wow_data::prelude::*;
use wow_data_derive::{VWowHeaderR, WowHeaderR, WowHeaderW};

use super::M2Record;
use super::track::{M2Track, M2TrackHeader, TrackContext};

bitflags::bitflags! {
    /// Bone flags as defined in the M2 format
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, WowHeaderR, WowHeaderW)]
    #[wow_data(bitflags = u32)]
    pub struct M2BoneFlags: u32 {
        const IGNORE_PARENT_TRANSLATE = 0x1;
        const IGNORE_PARENT_SCALE = 0x2;
        const IGNORE_PARENT_ROTATION = 0x4;
        const SPHERICAL_BILLBOARD = 0x8;
        const CYLINDRICAL_BILLBOARD_LOCK_X = 0x10;
        const CYLINDRICAL_BILLBOARD_LOCK_Y = 0x20;
        const CYLINDRICAL_BILLBOARD_LOCK_Z = 0x40;
        const TRANSFORMED = 0x200;
        /// Kinematic bone (requires physics)
        const KINEMATIC_BONE = 0x400;
        const HELMET_ANIM_SCALED = 0x1000;
        const SEQUENCE_ID = 0x2000;
    }
}

/// Hash of the bone name. Absent before TBC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub enum M2BoneCrc {
    #[default]
    None,

    #[wow_data(read_if = version >= ClientVersion::TBC)]
    Crc(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub enum M2BoneRotationHeader {
    Full(#[wow_data(versioned)] M2TrackHeader<Quaternion>),

    #[wow_data(read_if = version >= ClientVersion::TBC)]
    Compressed(#[wow_data(versioned)] M2TrackHeader<CompQuat>),
}

/// Classic stores full quaternions, later clients 16-bit packed ones.
#[derive(Debug, Clone, PartialEq)]
pub enum M2BoneRotation {
    Full(M2Track<Quaternion>),
    Compressed(M2Track<CompQuat>),
}

impl M2BoneRotation {
    pub fn new(version: ClientVersion) -> Self {
        if version >= ClientVersion::TBC {
            Self::Compressed(M2Track::new(version))
        } else {
            Self::Full(M2Track::new(version))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub struct M2BoneHeader {
    pub key_bone_id: i32,
    pub flags: M2BoneFlags,
    pub parent_bone: i16,
    pub submesh_id: u16,
    #[wow_data(versioned)]
    pub crc: M2BoneCrc,
    #[wow_data(versioned)]
    pub translation: M2TrackHeader<C3Vector>,
    #[wow_data(versioned)]
    pub rotation: M2BoneRotationHeader,
    #[wow_data(versioned)]
    pub scale: M2TrackHeader<C3Vector>,
    pub pivot: C3Vector,
}

/// A bone in an M2 model
#[derive(Debug, Clone, PartialEq)]
pub struct M2Bone {
    /// Index into the key bone table, `-1` when not a key bone
    pub key_bone_id: i32,
    pub flags: M2BoneFlags,
    /// `-1` for root bones
    pub parent_bone: i16,
    pub submesh_id: u16,
    pub crc: M2BoneCrc,
    pub translation: M2Track<C3Vector>,
    pub rotation: M2BoneRotation,
    pub scale: M2Track<C3Vector>,
    pub pivot: C3Vector,
}

impl M2Bone {
    /// A static root bone at `pivot`.
    pub fn new(version: ClientVersion, pivot: C3Vector) -> Self {
        Self {
            key_bone_id: -1,
            flags: M2BoneFlags::empty(),
            parent_bone: -1,
            submesh_id: 0,
            crc: if version >= ClientVersion::TBC {
                M2BoneCrc::Crc(0)
            } else {
                M2BoneCrc::None
            },
            translation: M2Track::new(version),
            rotation: M2BoneRotation::new(version),
            scale: M2Track::new(version),
            pivot,
        }
    }
}

impl M2Record for M2Bone {
    type Header = M2BoneHeader;

    fn read_from_header<R: Read + Seek>(
        reader: &mut R,
        header: &M2BoneHeader,
        ctx: &TrackContext,
    ) -> WDResult<Self> {
        Ok(Self {
            key_bone_id: header.key_bone_id,
            flags: header.flags,
            parent_bone: header.parent_bone,
            submesh_id: header.submesh_id,
            crc: header.crc,
            translation: M2Track::read_from_header(reader, &header.translation, ctx)?,
            rotation: match &header.rotation {
                M2BoneRotationHeader::Full(track) => {
                    M2BoneRotation::Full(M2Track::read_from_header(reader, track, ctx)?)
                }
                M2BoneRotationHeader::Compressed(track) => {
                    M2BoneRotation::Compressed(M2Track::read_from_header(reader, track, ctx)?)
                }
            },
            scale: M2Track::read_from_header(reader, &header.scale, ctx)?,
            pivot: header.pivot,
        })
    }

    fn write_header(
        &self,
        section: &mut DataSection,
        version: ClientVersion,
    ) -> WDResult<M2BoneHeader> {
        let crc = match (self.crc, version >= ClientVersion::TBC) {
            (M2BoneCrc::None, false) => M2BoneCrc::None,
            (M2BoneCrc::Crc(crc), true) => M2BoneCrc::Crc(crc),
            // the name hash cannot be recovered, so a missing one is zero
            (M2BoneCrc::None, true) => M2BoneCrc::Crc(0),
            (M2BoneCrc::Crc(_), false) => M2BoneCrc::None,
        };
        let rotation = match (&self.rotation, version >= ClientVersion::TBC) {
            (M2BoneRotation::Full(track), false) => {
                M2BoneRotationHeader::Full(track.write_header(section, version)?)
            }
            (M2BoneRotation::Compressed(track), true) => {
                M2BoneRotationHeader::Compressed(track.write_header(section, version)?)
            }
            (M2BoneRotation::Full(_), true) => {
                return Err(WowDataError::version_mismatch(
                    format!("compressed bone rotations for {version}"),
                    "full quaternion rotations",
                ));
            }
            (M2BoneRotation::Compressed(_), false) => {
                return Err(WowDataError::version_mismatch(
                    format!("full quaternion rotations for {version}"),
                    "compressed bone rotations",
                ));
            }
        };
        Ok(M2BoneHeader {
            key_bone_id: self.key_bone_id,
            flags: self.flags,
            parent_bone: self.parent_bone,
            submesh_id: self.submesh_id,
            crc,
            translation: self.translation.write_header(section, version)?,
            rotation,
            scale: self.scale.write_header(section, version)?,
            pivot: self.pivot,
        })
    }

    fn load_sequence(&mut self, sequence: usize, anim: &mut Cursor<&[u8]>) -> WDResult<()> {
        self.translation.load_sequence(sequence, anim)?;
        match &mut self.rotation {
            M2BoneRotation::Full(track) => track.load_sequence(sequence, anim)?,
            M2BoneRotation::Compressed(track) => track.load_sequence(sequence, anim)?,
        };
        self.scale.load_sequence(sequence, anim)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(ClientVersion::Classic, 108)]
    #[test_case(ClientVersion::TBC, 112)]
    #[test_case(ClientVersion::WotLK, 88)]
    fn header_size(version: ClientVersion, size: usize) {
        let bone = M2Bone::new(version, C3Vector::origin());
        let mut section = DataSection::new(0);
        let header = bone.write_header(&mut section, version).unwrap();
        assert_eq!(header.wow_size(), size);
    }

    #[test]
    fn classic_rotation_cannot_be_compressed() {
        let bone = M2Bone::new(ClientVersion::Classic, C3Vector::origin());
        let mut section = DataSection::new(0);
        assert!(matches!(
            bone.write_header(&mut section, ClientVersion::TBC),
            Err(WowDataError::VersionMismatch { .. })
        ));
    }
}
