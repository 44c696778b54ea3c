use wow_data::prelude::*;
use wow_data_derive::{VWowHeaderR, WowHeaderR, WowHeaderW};

bitflags::bitflags! {
    /// Sequence flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, WowHeaderR, WowHeaderW)]
    #[wow_data(bitflags = u32)]
    pub struct M2SequenceFlags: u32 {
        /// Sets 0x80 on bones when loaded
        const INIT_BLEND = 0x01;
        const UNKNOWN_0x02 = 0x02;
        const UNKNOWN_0x04 = 0x04;
        const UNKNOWN_0x08 = 0x08;
        /// Set on sequences loaded as low priority
        const LOW_PRIORITY = 0x10;
        /// Keys are in the model file; without it they are in a `.anim` file
        const STORED_IN_MODEL = 0x20;
        /// The sequence has no data of its own and plays `next_alias`
        const IS_ALIAS = 0x40;
        const BLENDED = 0x80;
        const UNKNOWN_0x100 = 0x100;
        const UNKNOWN_0x200 = 0x200;
        const UNKNOWN_0x400 = 0x400;
        const UNKNOWN_0x800 = 0x800;
    }
}

/// Playback timing. Up to TBC a sequence is a window into the model's
/// single timeline; from WotLK on each sequence starts at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub enum M2SequenceTiming {
    StartEnd(u32, u32),

    #[wow_data(read_if = version >= ClientVersion::WotLK)]
    Duration(u32),
}

impl M2SequenceTiming {
    pub fn for_version(version: ClientVersion, duration: u32) -> Self {
        if version.is_pre_wotlk() {
            Self::StartEnd(0, duration)
        } else {
            Self::Duration(duration)
        }
    }

    pub fn duration(&self) -> u32 {
        match *self {
            Self::StartEnd(start, end) => end.saturating_sub(start),
            Self::Duration(duration) => duration,
        }
    }

    pub fn fits(&self, version: ClientVersion) -> bool {
        matches!(
            (self, version.is_pre_wotlk()),
            (Self::StartEnd(..), true) | (Self::Duration(_), false)
        )
    }
}

impl Default for M2SequenceTiming {
    fn default() -> Self {
        Self::Duration(0)
    }
}

/// One animation sequence (`M2Sequence`, 64 bytes from WotLK, 68 before).
#[derive(Debug, Clone, PartialEq, Default, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub struct M2Sequence {
    /// Row in `AnimationData.dbc`
    pub animation_id: u16,
    pub sub_animation_id: u16,
    #[wow_data(versioned)]
    pub timing: M2SequenceTiming,
    pub movement_speed: f32,
    pub flags: M2SequenceFlags,
    pub frequency: i16,
    pub padding: u16,
    pub replay: Range,
    pub blend_time: u32,
    pub bounds: Bounds,
    /// Next variation of the same animation, `-1` for none
    pub next_variation: i16,
    pub next_alias: u16,
}

impl M2Sequence {
    pub fn duration(&self) -> u32 {
        self.timing.duration()
    }

    /// Name of the `.anim` file holding this sequence's keys, relative to
    /// the model path without extension.
    pub fn anim_suffix(&self) -> String {
        format!("{:04}-{:02}.anim", self.animation_id, self.sub_animation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use test_case::test_case;

    fn bytes(version: ClientVersion) -> Vec<u8> {
        let sequence = M2Sequence {
            animation_id: 4,
            timing: M2SequenceTiming::for_version(version, 1000),
            flags: M2SequenceFlags::STORED_IN_MODEL,
            next_variation: -1,
            ..M2Sequence::default()
        };
        let mut out = Vec::new();
        out.wow_write(&sequence).unwrap();
        out
    }

    #[test_case(ClientVersion::Classic, 68)]
    #[test_case(ClientVersion::TBC, 68)]
    #[test_case(ClientVersion::WotLK, 64)]
    #[test_case(ClientVersion::Legion, 64)]
    fn record_size(version: ClientVersion, size: usize) {
        assert_eq!(bytes(version).len(), size);
    }

    #[test]
    fn start_end_duration() {
        let mut cursor = Cursor::new(bytes(ClientVersion::TBC));
        let sequence: M2Sequence = cursor.wow_read_versioned(ClientVersion::TBC).unwrap();
        assert_eq!(sequence.timing, M2SequenceTiming::StartEnd(0, 1000));
        assert_eq!(sequence.duration(), 1000);
        assert!(!sequence.timing.fits(ClientVersion::WotLK));
    }

    #[test]
    fn anim_file_suffix() {
        let sequence = M2Sequence {
            animation_id: 5,
            sub_animation_id: 1,
            ..M2Sequence::default()
        };
        assert_eq!(sequence.anim_suffix(), "0005-01.anim");
    }
}
