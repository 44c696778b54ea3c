//! Editing helpers that keep the root's counts and cross references
//! consistent.

use tracing::debug;
use wow_data::error::WowDataError;

use crate::chunks::{ModdEntry, ModsEntry, MogiEntry, MogpHeader, MomtEntry};
use crate::container::WmoContainer;
use crate::error::Result;
use crate::group::WmoGroup;
use crate::root::WmoRoot;

impl WmoRoot {
    /// Add a texture path to MOTX, returning its offset. A path already
    /// present is reused.
    pub fn add_texture(&mut self, path: &str) -> u32 {
        match self.textures.find(path) {
            Some(offset) => offset,
            None => self.textures.add(path),
        }
    }

    /// Append a material and return its index.
    pub fn add_material(&mut self, material: MomtEntry) -> usize {
        self.materials.push(material);
        self.header = self.synced_header();
        self.materials.len() - 1
    }

    /// Append a group name to MOGN and its MOGI entry. Returns the MOGN
    /// offset and the new group index.
    pub fn add_group_info(&mut self, name: &str, mut info: MogiEntry) -> (u32, usize) {
        let offset = self.group_names.add(name);
        self.group_names.pad_to(4);
        info.name_offset = offset as i32;
        self.groups.push(info);
        self.header = self.synced_header();
        (offset, self.groups.len() - 1)
    }

    /// Drop a MOGI entry and every portal relation naming it; relations to
    /// later groups shift down by one.
    ///
    /// Returns, per old MOPR index, the relation's new index or `None` if it
    /// was dropped.
    pub fn remove_group_info(&mut self, index: usize) -> Result<Vec<Option<usize>>> {
        if index >= self.groups.len() {
            return Err(WowDataError::lookup("MOGI", index as u32, self.groups.len()).into());
        }
        self.groups.remove(index);

        let mut remap = Vec::with_capacity(self.portal_relations.len());
        let mut kept = Vec::with_capacity(self.portal_relations.len());
        for mut relation in self.portal_relations.drain(..) {
            let group = usize::from(relation.group_index);
            if group == index {
                remap.push(None);
                continue;
            }
            if group > index {
                relation.group_index -= 1;
            }
            remap.push(Some(kept.len()));
            kept.push(relation);
        }
        self.portal_relations = kept;
        self.header = self.synced_header();
        Ok(remap)
    }

    /// Add a doodad model path to MODN, returning its offset.
    pub fn add_doodad_name(&mut self, path: &str) -> u32 {
        match self.doodad_names.find(path) {
            Some(offset) => offset,
            None => self.doodad_names.add(path),
        }
    }

    /// Place an instance of `model`; returns the MODD index.
    pub fn add_doodad(&mut self, model: &str, mut doodad: ModdEntry) -> usize {
        let offset = self.add_doodad_name(model);
        doodad.set_name_offset(offset);
        self.doodads.push(doodad);
        self.header = self.synced_header();
        self.doodads.len() - 1
    }

    pub fn add_doodad_set(&mut self, set: ModsEntry) -> Result<usize> {
        let end = set.end_doodad(self.doodads.len())?;
        if end as usize > self.doodads.len() {
            return Err(WowDataError::lookup("MODS.doodads", end, self.doodads.len()).into());
        }
        self.doodad_sets.push(set);
        self.header = self.synced_header();
        Ok(self.doodad_sets.len() - 1)
    }
}

impl WmoContainer {
    pub fn add_material(&mut self, material: MomtEntry) -> usize {
        self.root.add_material(material)
    }

    /// Add a group under `name`. The group's MOGP name offset and the MOGI
    /// entry are filled in from the group itself.
    pub fn add_group(&mut self, name: &str, mut group: WmoGroup) -> usize {
        group.sync_flags();
        let info = MogiEntry {
            flags: group.header.flags,
            bounding_box: group.header.bounding_box,
            name_offset: 0,
        };
        let (offset, index) = self.root.add_group_info(name, info);
        group.header.group_name = offset;
        self.groups.push(group);
        debug!("added group {index} '{name}'");
        index
    }

    /// Remove a group and its portal relations. Other groups keep their
    /// portals, with MOPR ranges moved to the surviving relations.
    pub fn remove_group(&mut self, index: usize) -> Result<WmoGroup> {
        if index >= self.groups.len() {
            return Err(WowDataError::lookup("groups", index as u32, self.groups.len()).into());
        }
        let remap = self.root.remove_group_info(index)?;
        let removed = self.groups.remove(index);

        for group in &mut self.groups {
            remap_portal_range(&mut group.header, &remap);
        }
        Ok(removed)
    }
}

fn remap_portal_range(header: &mut MogpHeader, remap: &[Option<usize>]) {
    let start = usize::from(header.portal_start);
    let end = (start + usize::from(header.portal_count)).min(remap.len());
    let survivors: Vec<usize> = remap[start.min(end)..end].iter().flatten().copied().collect();

    let new_start = match survivors.first() {
        Some(&first) => first,
        None => remap[..start.min(remap.len())].iter().flatten().count(),
    };
    header.portal_start = new_start as u16;
    header.portal_count = survivors.len() as u16;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::MoprEntry;
    use pretty_assertions::assert_eq;

    fn relation(portal_index: u16, group_index: u16, side: i16) -> MoprEntry {
        MoprEntry {
            portal_index,
            group_index,
            side,
            padding: 0,
        }
    }

    fn three_rooms() -> WmoContainer {
        let mut container = WmoContainer::default();
        for name in ["hall", "cellar", "tower"] {
            container.add_group(name, WmoGroup::default());
        }
        // portal 0 joins hall and cellar, portal 1 joins cellar and tower
        container.root.portal_relations = vec![
            relation(0, 0, 1),
            relation(0, 1, -1),
            relation(1, 1, 1),
            relation(1, 2, -1),
        ];
        container.groups[0].header.portal_count = 1;
        container.groups[1].header.portal_start = 1;
        container.groups[1].header.portal_count = 2;
        container.groups[2].header.portal_start = 3;
        container.groups[2].header.portal_count = 1;
        container
    }

    #[test]
    fn material_count_follows_materials() {
        let mut root = WmoRoot::new();
        let texture = root.add_texture("textures\\stone.blp");
        let index = root.add_material(MomtEntry {
            texture_1: texture,
            ..MomtEntry::default()
        });
        assert_eq!(index, 0);
        assert_eq!(root.header.n_materials, 1);
        assert_eq!(root.add_texture("textures\\stone.blp"), texture);
    }

    #[test]
    fn group_names_are_padded() {
        let mut root = WmoRoot::new();
        let (first, _) = root.add_group_info("a", MogiEntry::default());
        let (second, _) = root.add_group_info("b", MogiEntry::default());
        assert_eq!(first, 2);
        assert_eq!(second, 4);
        assert_eq!(root.group_names.len() % 4, 0);
        assert_eq!(root.group_name(1).unwrap().as_deref(), Some("b"));
    }

    #[test]
    fn removing_a_group_remaps_relations() {
        let mut container = three_rooms();
        container.remove_group(0).unwrap();

        assert_eq!(
            container.root.portal_relations,
            vec![relation(0, 0, -1), relation(1, 0, 1), relation(1, 1, -1)]
        );
        assert_eq!(container.root.header.n_groups, 2);
        let cellar = &container.groups[0].header;
        assert_eq!((cellar.portal_start, cellar.portal_count), (0, 2));
        let tower = &container.groups[1].header;
        assert_eq!((tower.portal_start, tower.portal_count), (2, 1));
        assert!(container.validate().is_ok());
    }

    #[test]
    fn removing_the_middle_group_empties_ranges() {
        let mut container = three_rooms();
        container.remove_group(1).unwrap();

        assert_eq!(
            container.root.portal_relations,
            vec![relation(0, 0, 1), relation(1, 1, -1)]
        );
        let tower = &container.groups[1].header;
        assert_eq!((tower.portal_start, tower.portal_count), (1, 1));
    }

    #[test]
    fn remove_unknown_group() {
        assert!(three_rooms().remove_group(7).is_err());
    }

    #[test]
    fn doodad_sets_must_fit() {
        let mut root = WmoRoot::new();
        root.add_doodad("world\\chair.m2", ModdEntry::default());
        root.add_doodad("world\\chair.m2", ModdEntry::default());
        assert_eq!(root.doodads[0].name_offset(), root.doodads[1].name_offset());
        assert!(root.add_doodad_set(ModsEntry::new("Set_$DefaultGlobal", 0, 2)).is_ok());
        assert!(root.add_doodad_set(ModsEntry::new("Set_2", 1, 2)).is_err());
        assert!(matches!(
            root.add_doodad_set(ModsEntry::new("Set_3", u32::MAX, 2)).unwrap_err().kind(),
            WowDataError::LookupOutOfRange { .. }
        ));
        assert_eq!(root.synced_header().n_models, 1);
    }
}
