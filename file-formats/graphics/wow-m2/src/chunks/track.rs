//! Animation tracks.
//!
//! A track is a template over its value type. Up to TBC the keys of all
//! sequences live in one pair of arrays, sliced by per-sequence ranges.
//! From WotLK on each sequence gets its own sub-array, and sequences whose
//! data was moved to a `.anim` file keep only their reference here.

use std::io::Cursor;

use wow_data::error::Result as WDResult;
use wow_data::prelude::*;
use wow_data_derive::{VWowHeaderR, WowHeaderR, WowHeaderW};

use crate::M2_ALIGN;
use crate::chunks::sequence::{M2Sequence, M2SequenceFlags};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum M2InterpolationType {
    #[default]
    None,
    Linear,
    Bezier,
    Hermite,
    Other(u16),
}

impl From<u16> for M2InterpolationType {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Linear,
            2 => Self::Bezier,
            3 => Self::Hermite,
            other => Self::Other(other),
        }
    }
}

impl From<M2InterpolationType> for u16 {
    fn from(value: M2InterpolationType) -> Self {
        match value {
            M2InterpolationType::None => 0,
            M2InterpolationType::Linear => 1,
            M2InterpolationType::Bezier => 2,
            M2InterpolationType::Hermite => 3,
            M2InterpolationType::Other(other) => other,
        }
    }
}

impl WowHeaderR for M2InterpolationType {
    fn wow_read<R: Read + Seek>(reader: &mut R) -> WDResult<Self> {
        Ok(reader.wow_read::<u16>()?.into())
    }
}

impl WowHeaderW for M2InterpolationType {
    fn wow_write<W: Write>(&self, writer: &mut W) -> WDResult<()> {
        writer.wow_write(&u16::from(*self))
    }

    fn wow_size(&self) -> usize {
        2
    }
}

/// Key storage as found in a track header.
#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub enum TrackArray<T> {
    Single(WowArray<T>),

    #[wow_data(read_if = version >= ClientVersion::WotLK)]
    Multiple(WowArray<WowArray<T>>),
}

/// Per-sequence `(start, end)` slices of the keys, up to TBC.
#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub enum M2InterpolationRangeHeader {
    None,

    #[wow_data(read_if = version <= ClientVersion::TBC)]
    Some(WowArray<(u32, u32)>),
}

/// An animation track header as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub struct M2TrackHeader<T> {
    pub interpolation_type: M2InterpolationType,
    pub global_sequence: i16,
    #[wow_data(versioned)]
    pub interpolation_ranges: M2InterpolationRangeHeader,
    #[wow_data(versioned)]
    pub timestamps: TrackArray<u32>,
    #[wow_data(versioned)]
    pub values: TrackArray<T>,
}

/// A track without values, used where only the timestamps matter
/// (event triggers).
#[derive(Debug, Clone, Copy, PartialEq, VWowHeaderR, WowHeaderW)]
#[wow_data(version = ClientVersion)]
pub struct M2TrackBaseHeader {
    pub interpolation_type: M2InterpolationType,
    pub global_sequence: i16,
    #[wow_data(versioned)]
    pub interpolation_ranges: M2InterpolationRangeHeader,
    #[wow_data(versioned)]
    pub timestamps: TrackArray<u32>,
}

/// Keys of one sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceKeys<T> {
    Loaded(Vec<T>),
    /// Stored in the sequence's `.anim` file. The reference is relative to
    /// that file and is written back unchanged.
    External {
        reference: WowArray<T>,
        keys: Option<Vec<T>>,
    },
}

impl<T> SequenceKeys<T> {
    /// Keys available in memory, if any.
    pub fn keys(&self) -> Option<&[T]> {
        match self {
            Self::Loaded(keys) => Some(keys),
            Self::External { keys, .. } => keys.as_deref(),
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::External { .. })
    }
}

/// Decoded keys of a track.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackKeys<T> {
    Single(Vec<T>),
    PerSequence(Vec<SequenceKeys<T>>),
}

impl<T> TrackKeys<T> {
    /// An empty set of keys laid out for `version`.
    pub fn empty(version: ClientVersion) -> Self {
        if version.is_pre_wotlk() {
            Self::Single(Vec::new())
        } else {
            Self::PerSequence(Vec::new())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(keys) => keys.is_empty(),
            Self::PerSequence(sequences) => sequences.iter().all(|s| match s {
                SequenceKeys::Loaded(keys) => keys.is_empty(),
                SequenceKeys::External { reference, .. } => reference.is_empty(),
            }),
        }
    }

    /// Number of keys for `sequence`, counting keys not yet loaded.
    pub fn len_for(&self, sequence: usize) -> usize {
        match self {
            Self::Single(keys) => keys.len(),
            Self::PerSequence(sequences) => match sequences.get(sequence) {
                Some(SequenceKeys::Loaded(keys)) => keys.len(),
                Some(SequenceKeys::External { reference, .. }) => reference.count as usize,
                None => 0,
            },
        }
    }
}

/// Which sequences keep their keys outside the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackContext {
    pub version: ClientVersion,
    external: Vec<bool>,
}

impl TrackContext {
    /// A context in which every key is read from the model file.
    pub fn new(version: ClientVersion) -> Self {
        Self {
            version,
            external: Vec::new(),
        }
    }

    /// From WotLK on, a sequence without [`M2SequenceFlags::STORED_IN_MODEL`]
    /// keeps its keys in a `.anim` file. Aliases are followed to the
    /// sequence that owns the data.
    pub fn with_sequences(version: ClientVersion, sequences: &[M2Sequence]) -> Self {
        if version.is_pre_wotlk() {
            return Self::new(version);
        }
        let external = (0..sequences.len())
            .map(|index| {
                let owner = resolve_alias(sequences, index);
                !sequences[owner]
                    .flags
                    .contains(M2SequenceFlags::STORED_IN_MODEL)
            })
            .collect();
        Self { version, external }
    }

    pub fn is_external(&self, sequence: usize) -> bool {
        self.external.get(sequence).copied().unwrap_or(false)
    }
}

/// Follow [`M2SequenceFlags::IS_ALIAS`] links; a chain that loops or leaves
/// the table stops where it is.
pub fn resolve_alias(sequences: &[M2Sequence], index: usize) -> usize {
    let mut current = index;
    if current >= sequences.len() {
        return current;
    }
    for _ in 0..sequences.len() {
        let sequence = &sequences[current];
        if !sequence.flags.contains(M2SequenceFlags::IS_ALIAS) {
            break;
        }
        let next = usize::from(sequence.next_alias);
        if next >= sequences.len() || next == current {
            break;
        }
        current = next;
    }
    current
}

fn read_keys<T, R>(
    reader: &mut R,
    header: &TrackArray<T>,
    ctx: &TrackContext,
    global: bool,
) -> WDResult<TrackKeys<T>>
where
    T: WowHeaderR,
    R: Read + Seek,
{
    Ok(match header {
        TrackArray::Single(array) => TrackKeys::Single(array.wow_read_to_vec(reader)?),
        TrackArray::Multiple(array) => {
            let per_sequence = array.wow_read_to_vec(reader)?;
            let mut sequences = Vec::with_capacity(per_sequence.len());
            for (index, reference) in per_sequence.into_iter().enumerate() {
                if !global && !reference.is_empty() && ctx.is_external(index) {
                    sequences.push(SequenceKeys::External {
                        reference,
                        keys: None,
                    });
                } else {
                    sequences.push(SequenceKeys::Loaded(reference.wow_read_to_vec(reader)?));
                }
            }
            TrackKeys::PerSequence(sequences)
        }
    })
}

fn write_keys<T: WowHeaderW>(
    keys: &TrackKeys<T>,
    section: &mut DataSection,
    version: ClientVersion,
) -> WDResult<TrackArray<T>> {
    match (keys, version.is_pre_wotlk()) {
        (TrackKeys::Single(keys), true) => {
            Ok(TrackArray::Single(section.push_array(keys, M2_ALIGN)?))
        }
        (TrackKeys::PerSequence(sequences), false) => {
            let array = section.push_nested_with(sequences, M2_ALIGN, |section, keys| match keys {
                SequenceKeys::Loaded(keys) => section.push_array(keys, M2_ALIGN),
                SequenceKeys::External { reference, .. } => Ok(*reference),
            })?;
            Ok(TrackArray::Multiple(array))
        }
        (TrackKeys::Single(_), false) => Err(WowDataError::version_mismatch(
            format!("per-sequence track keys for {version}"),
            "single track keys (pre-WotLK layout)",
        )),
        (TrackKeys::PerSequence(_), true) => Err(WowDataError::version_mismatch(
            format!("single track keys for {version}"),
            "per-sequence track keys (WotLK+ layout)",
        )),
    }
}

fn load_external<T: WowHeaderR>(
    keys: &mut TrackKeys<T>,
    sequence: usize,
    anim: &mut Cursor<&[u8]>,
) -> WDResult<bool> {
    let TrackKeys::PerSequence(sequences) = keys else {
        return Ok(false);
    };
    match sequences.get_mut(sequence) {
        Some(SequenceKeys::External { reference, keys }) => {
            *keys = Some(reference.wow_read_to_vec(anim)?);
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn read_ranges<R: Read + Seek>(
    reader: &mut R,
    header: &M2InterpolationRangeHeader,
) -> WDResult<Option<Vec<(u32, u32)>>> {
    match header {
        M2InterpolationRangeHeader::Some(array) => Ok(Some(array.wow_read_to_vec(reader)?)),
        M2InterpolationRangeHeader::None => Ok(None),
    }
}

fn write_ranges(
    ranges: Option<&[(u32, u32)]>,
    section: &mut DataSection,
    version: ClientVersion,
) -> WDResult<M2InterpolationRangeHeader> {
    match (ranges, version.is_pre_wotlk()) {
        (Some(ranges), true) => Ok(M2InterpolationRangeHeader::Some(
            section.push_array(ranges, M2_ALIGN)?,
        )),
        (None, true) => Ok(M2InterpolationRangeHeader::Some(WowArray::empty())),
        (None, false) => Ok(M2InterpolationRangeHeader::None),
        (Some(_), false) => Err(WowDataError::version_mismatch(
            format!("track without interpolation ranges for {version}"),
            "interpolation ranges (pre-WotLK layout)",
        )),
    }
}

/// A decoded animation track.
#[derive(Debug, Clone, PartialEq)]
pub struct M2Track<T> {
    pub interpolation_type: M2InterpolationType,
    /// Index into the global sequences, `-1` for none.
    pub global_sequence: i16,
    /// Present up to TBC only.
    pub interpolation_ranges: Option<Vec<(u32, u32)>>,
    pub timestamps: TrackKeys<u32>,
    pub values: TrackKeys<T>,
}

impl<T> M2Track<T> {
    /// An empty track laid out for `version`.
    pub fn new(version: ClientVersion) -> Self {
        Self {
            interpolation_type: M2InterpolationType::None,
            global_sequence: -1,
            interpolation_ranges: version.is_pre_wotlk().then(Vec::new),
            timestamps: TrackKeys::empty(version),
            values: TrackKeys::empty(version),
        }
    }

    /// A track holding a single key, as used for static values.
    pub fn constant(version: ClientVersion, value: T) -> Self {
        let mut track = Self::new(version);
        if version.is_pre_wotlk() {
            track.interpolation_ranges = Some(vec![(0, 0)]);
            track.timestamps = TrackKeys::Single(vec![0]);
            track.values = TrackKeys::Single(vec![value]);
        } else {
            track.timestamps = TrackKeys::PerSequence(vec![SequenceKeys::Loaded(vec![0])]);
            track.values = TrackKeys::PerSequence(vec![SequenceKeys::Loaded(vec![value])]);
        }
        track
    }

    pub fn uses_global_sequence(&self) -> bool {
        self.global_sequence >= 0
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty() && self.values.is_empty()
    }

    /// Timestamps and values of one sequence, when they are in memory.
    ///
    /// Up to TBC the keys of a sequence are the slice selected by its
    /// interpolation range.
    pub fn keys_for(&self, sequence: usize) -> Option<(&[u32], &[T])> {
        match (&self.timestamps, &self.values) {
            (TrackKeys::Single(times), TrackKeys::Single(values)) => {
                let (start, end) = match &self.interpolation_ranges {
                    Some(ranges) => {
                        let &(start, end) = ranges.get(sequence)?;
                        (start as usize, end as usize + 1)
                    }
                    None => (0, times.len()),
                };
                let end = end.min(times.len()).min(values.len());
                let start = start.min(end);
                Some((&times[start..end], &values[start..end]))
            }
            (TrackKeys::PerSequence(times), TrackKeys::PerSequence(values)) => {
                let sequence = if self.uses_global_sequence() { 0 } else { sequence };
                Some((times.get(sequence)?.keys()?, values.get(sequence)?.keys()?))
            }
            _ => None,
        }
    }
}

impl<T: WowHeaderR> M2Track<T> {
    pub fn read_from_header<R: Read + Seek>(
        reader: &mut R,
        header: &M2TrackHeader<T>,
        ctx: &TrackContext,
    ) -> WDResult<Self> {
        let global = header.global_sequence >= 0;
        Ok(Self {
            interpolation_type: header.interpolation_type,
            global_sequence: header.global_sequence,
            interpolation_ranges: read_ranges(reader, &header.interpolation_ranges)?,
            timestamps: read_keys(reader, &header.timestamps, ctx, global)?,
            values: read_keys(reader, &header.values, ctx, global)?,
        })
    }

    /// Fill in the keys of `sequence` from the contents of its `.anim`
    /// file. Returns whether anything was external.
    pub fn load_sequence(&mut self, sequence: usize, anim: &mut Cursor<&[u8]>) -> WDResult<bool> {
        let times = load_external(&mut self.timestamps, sequence, anim)?;
        let values = load_external(&mut self.values, sequence, anim)?;
        Ok(times || values)
    }
}

impl<T: WowHeaderW> M2Track<T> {
    /// Emit the keys into `section` and return the header that refers to
    /// them.
    ///
    /// Keys decoded with one layout cannot be written with the other: a
    /// WotLK+ track written for TBC fails with
    /// [`WowDataError::VersionMismatch`], and so does the reverse.
    pub fn write_header(
        &self,
        section: &mut DataSection,
        version: ClientVersion,
    ) -> WDResult<M2TrackHeader<T>> {
        Ok(M2TrackHeader {
            interpolation_type: self.interpolation_type,
            global_sequence: self.global_sequence,
            interpolation_ranges: write_ranges(
                self.interpolation_ranges.as_deref(),
                section,
                version,
            )?,
            timestamps: write_keys(&self.timestamps, section, version)?,
            values: write_keys(&self.values, section, version)?,
        })
    }
}

/// Timestamps without values.
#[derive(Debug, Clone, PartialEq)]
pub struct M2TrackBase {
    pub interpolation_type: M2InterpolationType,
    pub global_sequence: i16,
    pub interpolation_ranges: Option<Vec<(u32, u32)>>,
    pub timestamps: TrackKeys<u32>,
}

impl M2TrackBase {
    pub fn new(version: ClientVersion) -> Self {
        Self {
            interpolation_type: M2InterpolationType::None,
            global_sequence: -1,
            interpolation_ranges: version.is_pre_wotlk().then(Vec::new),
            timestamps: TrackKeys::empty(version),
        }
    }

    pub fn read_from_header<R: Read + Seek>(
        reader: &mut R,
        header: &M2TrackBaseHeader,
        ctx: &TrackContext,
    ) -> WDResult<Self> {
        Ok(Self {
            interpolation_type: header.interpolation_type,
            global_sequence: header.global_sequence,
            interpolation_ranges: read_ranges(reader, &header.interpolation_ranges)?,
            timestamps: read_keys(reader, &header.timestamps, ctx, header.global_sequence >= 0)?,
        })
    }

    pub fn write_header(
        &self,
        section: &mut DataSection,
        version: ClientVersion,
    ) -> WDResult<M2TrackBaseHeader> {
        Ok(M2TrackBaseHeader {
            interpolation_type: self.interpolation_type,
            global_sequence: self.global_sequence,
            interpolation_ranges: write_ranges(
                self.interpolation_ranges.as_deref(),
                section,
                version,
            )?,
            timestamps: write_keys(&self.timestamps, section, version)?,
        })
    }

    pub fn load_sequence(&mut self, sequence: usize, anim: &mut Cursor<&[u8]>) -> WDResult<bool> {
        load_external(&mut self.timestamps, sequence, anim)
    }
}

/// Value with in and out tangents, for spline tracks.
#[derive(Debug, Clone, Copy, PartialEq, Default, WowHeaderR, WowHeaderW)]
pub struct M2SplineKey<T: WowHeaderR + WowHeaderW> {
    pub value: T,
    pub in_tan: T,
    pub out_tan: T,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wow_data::primitives::C3Vector;

    fn roundtrip<T: WowHeaderR + WowHeaderW>(
        track: &M2Track<T>,
        version: ClientVersion,
    ) -> M2Track<T> {
        // 24 or 28 bytes of header space ahead of the payloads
        let mut section = DataSection::new(32);
        let header = track.write_header(&mut section, version).unwrap();
        let mut file = Vec::new();
        file.wow_write(&header).unwrap();
        file.resize(32, 0);
        file.extend_from_slice(section.bytes());

        let mut cursor = Cursor::new(file);
        let back: M2TrackHeader<T> = cursor.wow_read_versioned(version).unwrap();
        M2Track::read_from_header(&mut cursor, &back, &TrackContext::new(version)).unwrap()
    }

    #[test]
    fn header_sizes_follow_version() {
        let classic = M2Track::<f32>::new(ClientVersion::TBC);
        let wotlk = M2Track::<f32>::new(ClientVersion::WotLK);
        let mut section = DataSection::new(0);
        assert_eq!(
            classic
                .write_header(&mut section, ClientVersion::TBC)
                .unwrap()
                .wow_size(),
            28
        );
        assert_eq!(
            wotlk
                .write_header(&mut section, ClientVersion::WotLK)
                .unwrap()
                .wow_size(),
            20
        );
    }

    #[test]
    fn per_sequence_keys_survive() {
        let mut track = M2Track::<C3Vector>::new(ClientVersion::WotLK);
        track.interpolation_type = M2InterpolationType::Linear;
        track.timestamps = TrackKeys::PerSequence(vec![
            SequenceKeys::Loaded(vec![0, 500]),
            SequenceKeys::Loaded(vec![]),
        ]);
        track.values = TrackKeys::PerSequence(vec![
            SequenceKeys::Loaded(vec![C3Vector::origin(), C3Vector::new(1.0, 2.0, 3.0)]),
            SequenceKeys::Loaded(vec![]),
        ]);
        let back = roundtrip(&track, ClientVersion::WotLK);
        assert_eq!(back, track);
        assert_eq!(back.keys_for(0).unwrap().0, &[0, 500]);
    }

    #[test]
    fn ranges_slice_single_keys() {
        let mut track = M2Track::<f32>::new(ClientVersion::TBC);
        track.interpolation_ranges = Some(vec![(0, 1), (2, 2)]);
        track.timestamps = TrackKeys::Single(vec![0, 100, 0]);
        track.values = TrackKeys::Single(vec![1.0, 2.0, 3.0]);
        let back = roundtrip(&track, ClientVersion::TBC);
        assert_eq!(back, track);
        assert_eq!(back.keys_for(1), Some((&[0_u32][..], &[3.0_f32][..])));
    }

    #[test]
    fn wotlk_track_cannot_be_written_for_tbc() {
        let track = M2Track::constant(ClientVersion::WotLK, 1.0_f32);
        let mut section = DataSection::new(0);
        assert!(matches!(
            track.write_header(&mut section, ClientVersion::TBC),
            Err(WowDataError::VersionMismatch { .. })
        ));

        let old = M2Track::constant(ClientVersion::TBC, 1.0_f32);
        assert!(matches!(
            old.write_header(&mut section, ClientVersion::WotLK),
            Err(WowDataError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn external_sequences_keep_their_reference() {
        let flags = |bits| M2Sequence {
            flags: M2SequenceFlags::from_bits_retain(bits),
            ..M2Sequence::default()
        };
        // sequence 1 lives in a .anim file
        let sequences = vec![flags(0x20), flags(0)];
        let ctx = TrackContext::with_sequences(ClientVersion::WotLK, &sequences);
        assert!(!ctx.is_external(0));
        assert!(ctx.is_external(1));

        let header = M2TrackHeader::<u16> {
            interpolation_type: M2InterpolationType::None,
            global_sequence: -1,
            interpolation_ranges: M2InterpolationRangeHeader::None,
            timestamps: TrackArray::Multiple(WowArray::new(2, 20)),
            values: TrackArray::Multiple(WowArray::new(2, 36)),
        };
        let mut file = vec![0_u8; 20];
        for reference in [(1_u32, 52_u32), (1, 0x100)] {
            file.wow_write(&reference.0).unwrap();
            file.wow_write(&reference.1).unwrap();
        }
        for reference in [(1_u32, 56_u32), (1, 0x104)] {
            file.wow_write(&reference.0).unwrap();
            file.wow_write(&reference.1).unwrap();
        }
        file.wow_write(&7_u32).unwrap();
        file.wow_write(&9_u16).unwrap();

        let mut cursor = Cursor::new(file);
        let mut track = M2Track::read_from_header(&mut cursor, &header, &ctx).unwrap();
        assert_eq!(track.keys_for(0), Some((&[7_u32][..], &[9_u16][..])));
        assert!(track.keys_for(1).is_none());
        assert_eq!(track.values.len_for(1), 1);

        let mut anim = vec![0_u8; 0x106];
        anim[0x100..0x104].copy_from_slice(&250_u32.to_le_bytes());
        anim[0x104..0x106].copy_from_slice(&3_u16.to_le_bytes());
        assert!(track.load_sequence(1, &mut Cursor::new(&anim[..])).unwrap());
        assert_eq!(track.keys_for(1), Some((&[250_u32][..], &[3_u16][..])));

        let mut section = DataSection::new(20);
        let written = track.write_header(&mut section, ClientVersion::WotLK).unwrap();
        let TrackArray::Multiple(values) = written.values else {
            panic!("expected per-sequence values");
        };
        let mut out = vec![0_u8; 20];
        out.extend_from_slice(section.bytes());
        let refs = values.wow_read_to_vec(&mut Cursor::new(out)).unwrap();
        assert_eq!(refs[1], WowArray::new(1, 0x104));
    }

    #[test]
    fn aliases_resolve_to_owner() {
        let alias = M2Sequence {
            flags: M2SequenceFlags::IS_ALIAS,
            next_alias: 1,
            ..M2Sequence::default()
        };
        let owner = M2Sequence {
            flags: M2SequenceFlags::STORED_IN_MODEL,
            ..M2Sequence::default()
        };
        let sequences = vec![alias, owner];
        assert_eq!(resolve_alias(&sequences, 0), 1);
        let ctx = TrackContext::with_sequences(ClientVersion::WotLK, &sequences);
        assert!(!ctx.is_external(0));
    }
}
