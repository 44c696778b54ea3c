//! WMO root file: header, materials, group directory, portals, lights,
//! doodads and fog.

use std::io::{Cursor, Read, Seek, Write};

use tracing::{debug, trace, warn};
use wow_data::chunk::{ChunkReader, ChunkTag, ChunkWriter, TagOrder, brw_payload};
use wow_data::chunk_order::{AnchoredChunk, Anchors};
use wow_data::error::WowDataError;
use wow_data::lookup;
use wow_data::primitives::{C3Vector, Plane};
use wow_data::string_block::{StringBlock, StringPadding};
use wow_data::types::{WowHeaderW, WowWriterForHeader};

use crate::chunks::*;
use crate::error::Result;

/// A decoded WMO root file.
///
/// String blocks are kept as read, so offsets stored in materials, group
/// infos and doodads stay valid across a round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct WmoRoot {
    pub version: u32,
    pub header: Mohd,
    /// MOTX, texture paths
    pub textures: StringBlock,
    pub materials: Vec<MomtEntry>,
    /// MOGN, group names
    pub group_names: StringBlock,
    pub groups: Vec<MogiEntry>,
    /// MOSB payload
    pub skybox: StringBlock,
    pub portal_vertices: Vec<C3Vector>,
    pub portals: Vec<MoptEntry>,
    pub portal_relations: Vec<MoprEntry>,
    pub visible_vertices: Vec<C3Vector>,
    pub visible_blocks: Vec<MovbEntry>,
    pub lights: Vec<MoltEntry>,
    pub doodad_sets: Vec<ModsEntry>,
    /// MODN, doodad model paths
    pub doodad_names: StringBlock,
    pub doodads: Vec<ModdEntry>,
    pub fogs: Vec<MfogEntry>,
    /// MCVP, only written when present
    pub convex_volume_planes: Option<Vec<Plane>>,
    /// Chunks this crate does not decode, each written back after the known
    /// chunk it followed
    pub extra_chunks: Vec<AnchoredChunk>,
}

impl Default for WmoRoot {
    fn default() -> Self {
        Self::new()
    }
}

impl WmoRoot {
    /// An empty root with the string block conventions of the format.
    pub fn new() -> Self {
        Self {
            version: WMO_VERSION,
            header: Mohd::default(),
            textures: StringBlock::new(StringPadding::Align4),
            materials: Vec::new(),
            group_names: StringBlock::from_bytes(vec![0, 0], StringPadding::None),
            groups: Vec::new(),
            skybox: StringBlock::new(StringPadding::None),
            portal_vertices: Vec::new(),
            portals: Vec::new(),
            portal_relations: Vec::new(),
            visible_vertices: Vec::new(),
            visible_blocks: Vec::new(),
            lights: Vec::new(),
            doodad_sets: Vec::new(),
            doodad_names: StringBlock::new(StringPadding::Align4),
            doodads: Vec::new(),
            fogs: Vec::new(),
            convex_volume_planes: None,
            extra_chunks: Vec::new(),
        }
    }

    pub fn read<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let mut chunks = ChunkReader::new(reader, TagOrder::Reversed)?;
        let mut anchors = Anchors::default();

        let version: u32 = chunks.expect(MVER)?.read_brw_one()?;
        if version != WMO_VERSION {
            return Err(WowDataError::version_mismatch(WMO_VERSION, version).into());
        }
        anchors.known(MVER);
        let header: Mohd = chunks.expect(MOHD)?.read_brw_one()?;
        anchors.known(MOHD);
        debug!(
            "MOHD: {} materials, {} groups, {} portals",
            header.n_materials, header.n_groups, header.n_portals
        );

        let mut root = Self {
            version,
            header,
            textures: StringBlock::new(StringPadding::Align4),
            group_names: StringBlock::new(StringPadding::None),
            ..Self::new()
        };

        for chunk in chunks {
            let chunk = chunk?;
            trace!("{} at {:#x}, {} bytes", chunk.tag, chunk.offset, chunk.data.len());
            if !ROOT_CHUNKS.contains(&chunk.tag) {
                warn!("keeping unknown root chunk {} at {:#x}", chunk.tag, chunk.offset);
                root.extra_chunks.push(anchors.anchor(chunk));
                continue;
            }
            anchors.known(chunk.tag);
            match chunk.tag {
                MOTX => root.textures = StringBlock::from_bytes(chunk.data, StringPadding::Align4),
                MOMT => root.materials = chunk.read_brw(MomtEntry::SIZE)?,
                MOGN => root.group_names = StringBlock::from_bytes(chunk.data, StringPadding::None),
                MOGI => root.groups = chunk.read_brw(MogiEntry::SIZE)?,
                MOSB if chunk.data == [0; 4] => {}
                MOSB => root.skybox = StringBlock::from_bytes(chunk.data, StringPadding::None),
                MOPV => root.portal_vertices = chunk.read_records(12)?,
                MOPT => root.portals = chunk.read_brw(MoptEntry::SIZE)?,
                MOPR => root.portal_relations = chunk.read_brw(MoprEntry::SIZE)?,
                MOVV => root.visible_vertices = chunk.read_records(12)?,
                MOVB => root.visible_blocks = chunk.read_brw(4)?,
                MOLT => root.lights = chunk.read_brw(MoltEntry::SIZE)?,
                MODS => root.doodad_sets = chunk.read_brw(ModsEntry::SIZE)?,
                MODN => {
                    root.doodad_names = StringBlock::from_bytes(chunk.data, StringPadding::Align4);
                }
                MODD => root.doodads = chunk.read_brw(ModdEntry::SIZE)?,
                MFOG => root.fogs = chunk.read_brw(MfogEntry::SIZE)?,
                MCVP => root.convex_volume_planes = Some(chunk.read_records(16)?),
                other => warn!("ignoring repeated {other} chunk"),
            }
        }

        root.validate()?;
        Ok(root)
    }

    /// Decode a root file held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::read(&mut Cursor::new(bytes))
    }

    /// Check every index that stays within the root file.
    pub fn validate(&self) -> Result<()> {
        for relation in &self.portal_relations {
            let portal = relation.portal_index.into();
            lookup::check_index("MOPR.portal_index", portal, self.portals.len())?;
            let group = relation.group_index.into();
            lookup::check_index("MOPR.group_index", group, self.groups.len())?;
        }
        for portal in &self.portals {
            let end = u32::from(portal.start_vertex) + u32::from(portal.vertex_count);
            if end > 0 {
                lookup::check_index("MOPT.vertices", end - 1, self.portal_vertices.len())?;
            }
        }
        for doodad in &self.doodads {
            lookup::check_index("MODD.name_offset", doodad.name_offset(), self.doodad_names.len())?;
        }
        for set in &self.doodad_sets {
            let end = set.end_doodad(self.doodads.len())?;
            if end > 0 {
                lookup::check_index("MODS.doodads", end - 1, self.doodads.len())?;
            }
        }
        Ok(())
    }

    /// Header as it will be written: every count follows its array.
    pub fn synced_header(&self) -> Mohd {
        Mohd {
            n_materials: self.materials.len() as u32,
            n_groups: self.groups.len() as u32,
            n_portals: self.portals.len() as u32,
            n_lights: self.lights.len() as u32,
            n_models: self.doodad_names.iter().count() as u32,
            n_doodads: self.doodads.len() as u32,
            n_sets: self.doodad_sets.len() as u32,
            ..self.header
        }
    }

    pub fn write<W: Write + Seek>(&self, writer: &mut W) -> Result<()> {
        let mut out = ChunkWriter::new(writer, TagOrder::Reversed);
        let mut anchors = Anchors::default();
        let extras = &self.extra_chunks;

        let mut version = Vec::with_capacity(4);
        version.wow_write(&self.version)?;
        let skybox: &[u8] = if self.skybox.is_empty() {
            &[0; 4]
        } else {
            self.skybox.as_bytes()
        };
        let sections = [
            (MVER, version),
            (MOHD, brw_payload(&[self.synced_header()])?),
            (MOTX, self.textures.as_bytes().to_vec()),
            (MOMT, brw_payload(&self.materials)?),
            (MOGN, self.group_names.as_bytes().to_vec()),
            (MOGI, brw_payload(&self.groups)?),
            (MOSB, skybox.to_vec()),
            (MOPV, packed(&self.portal_vertices)?),
            (MOPT, brw_payload(&self.portals)?),
            (MOPR, brw_payload(&self.portal_relations)?),
            (MOVV, packed(&self.visible_vertices)?),
            (MOVB, brw_payload(&self.visible_blocks)?),
            (MOLT, brw_payload(&self.lights)?),
            (MODS, brw_payload(&self.doodad_sets)?),
            (MODN, self.doodad_names.as_bytes().to_vec()),
            (MODD, brw_payload(&self.doodads)?),
            (MFOG, brw_payload(&self.fogs)?),
        ];
        for (tag, payload) in &sections {
            write_anchored(&mut out, &mut anchors, extras, *tag, payload)?;
        }
        if let Some(planes) = &self.convex_volume_planes {
            write_anchored(&mut out, &mut anchors, extras, MCVP, &packed(planes)?)?;
        }
        write_unplaced(&mut out, &anchors, extras)?;

        out.into_inner()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Skybox model path, if one is set.
    pub fn skybox_name(&self) -> Option<String> {
        self.skybox.iter().next().map(|(_, name)| name)
    }

    pub fn set_skybox(&mut self, name: Option<&str>) {
        self.skybox = StringBlock::new(StringPadding::None);
        if let Some(name) = name {
            self.skybox.add(name);
        }
    }

    /// Name of the group at `index` in MOGI order.
    pub fn group_name(&self, index: usize) -> Result<Option<String>> {
        let info = self
            .groups
            .get(index)
            .ok_or_else(|| WowDataError::lookup("MOGI", index as u32, self.groups.len()))?;
        if info.name_offset < 0 {
            return Ok(None);
        }
        self.resolve_group_name(info.name_offset as u32).map(Some)
    }

    /// Resolve an offset into MOGN, as stored in MOGI and MOGP.
    pub fn resolve_group_name(&self, offset: u32) -> Result<String> {
        Ok(self.group_names.get(offset)?)
    }

    pub fn texture(&self, offset: u32) -> Result<String> {
        Ok(self.textures.get(offset)?)
    }

    pub fn doodad_name(&self, doodad: &ModdEntry) -> Result<String> {
        Ok(self.doodad_names.get(doodad.name_offset())?)
    }
}

fn packed<T: WowHeaderW>(items: &[T]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(wow_data::types::slice_size(items));
    for item in items {
        out.wow_write(item)?;
    }
    Ok(out)
}

/// Tag of a root chunk, for tools listing chunk contents.
pub fn describe(tag: ChunkTag) -> &'static str {
    match tag {
        MVER => "version",
        MOHD => "header",
        MOTX => "texture names",
        MOMT => "materials",
        MOGN => "group names",
        MOGI => "group info",
        MOSB => "skybox",
        MOPV => "portal vertices",
        MOPT => "portals",
        MOPR => "portal relations",
        MOVV => "visible vertices",
        MOVB => "visible blocks",
        MOLT => "lights",
        MODS => "doodad sets",
        MODN => "doodad names",
        MODD => "doodads",
        MFOG => "fog",
        MCVP => "convex volume planes",
        MOGP => "group",
        _ => "unknown",
    }
}
