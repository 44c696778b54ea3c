//! A root file bound to its group files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use wow_data::error::WowDataError;
use wow_data::lookup;

use crate::error::{Result, WmoError};
use crate::group::WmoGroup;
use crate::portal::PortalSide;
use crate::root::WmoRoot;

/// Path of group `index` next to `root_path`: `<stem>_NNN.wmo`.
pub fn group_path(root_path: &Path, index: usize) -> PathBuf {
    let stem = root_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    root_path.with_file_name(format!("{stem}_{index:03}.wmo"))
}

/// A WMO root with every one of its groups, in MOGI order.
///
/// Containers are plain owned values with no internal locking. Two
/// concurrent [`WmoContainer::save`] calls targeting the same path are not
/// supported: each file is truncated and rewritten, so the result may mix
/// both trees or be cut short.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WmoContainer {
    pub root: WmoRoot,
    pub groups: Vec<WmoGroup>,
}

impl WmoContainer {
    pub fn new(root: WmoRoot, groups: Vec<WmoGroup>) -> Self {
        Self { root, groups }
    }

    /// Load a root file and every `_NNN.wmo` sibling it declares.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let root = open(path)
            .and_then(|mut reader| WmoRoot::read(&mut reader))
            .map_err(|e| e.in_file(path))?;

        let count = root.header.n_groups as usize;
        if count == 0 {
            return Err(WowDataError::MalformedSibling {
                path: path.to_path_buf(),
                reason: String::from("root declares no groups"),
            }
            .into());
        }
        if count != root.groups.len() {
            warn!("MOHD declares {count} groups, MOGI holds {}", root.groups.len());
        }

        let mut groups = Vec::with_capacity(count);
        for index in 0..count {
            let sibling = group_path(path, index);
            if !sibling.is_file() {
                return Err(WowDataError::MissingSibling { path: sibling }.into());
            }
            debug!("opening group {}", sibling.display());
            let group = open(&sibling)
                .and_then(|mut reader| WmoGroup::read(&mut reader))
                .map_err(|e| sibling_error(e, &sibling))?;
            groups.push(group);
        }

        let container = Self { root, groups };
        container.validate_groups(path)?;
        info!("loaded {} with {} groups", path.display(), container.groups.len());
        Ok(container)
    }

    /// Cross-file checks between the root and each group.
    pub fn validate(&self) -> Result<()> {
        for (index, group) in self.groups.iter().enumerate() {
            self.validate_group(index, group)?;
        }
        Ok(())
    }

    fn validate_groups(&self, root_path: &Path) -> Result<()> {
        for (index, group) in self.groups.iter().enumerate() {
            self.validate_group(index, group)
                .map_err(|e| e.in_file(&group_path(root_path, index)))?;
        }
        Ok(())
    }

    fn validate_group(&self, index: usize, group: &WmoGroup) -> Result<()> {
        let materials = self.root.materials.len();
        for batch in &group.batches {
            lookup::check_u8("MOBA.material_id", batch.material_id, materials)?;
        }
        for triangle in &group.triangle_materials {
            lookup::check_u8("MOPY.material_id", triangle.material_id, materials)?;
        }
        for &fog in &group.header.fog_ids {
            if fog != 0 {
                lookup::check_index("MOGP.fog_ids", fog.into(), self.root.fogs.len())?;
            }
        }
        let end = u32::from(group.header.portal_start) + u32::from(group.header.portal_count);
        if end as usize > self.root.portal_relations.len() {
            return Err(
                WowDataError::lookup("MOGP.portals", end, self.root.portal_relations.len()).into(),
            );
        }
        self.root.resolve_group_name(group.header.group_name)?;
        if let Some(refs) = &group.light_refs {
            lookup::check_all_u16("MOLR", refs, self.root.lights.len())?;
        }
        if let Some(refs) = &group.doodad_refs {
            lookup::check_all_u16("MODR", refs, self.root.doodads.len())?;
        }
        if let Some(bsp) = &group.bsp {
            if let Err(e) = bsp.verify_face_count(&group.triangle_materials) {
                warn!("group {index}: {e}");
            }
        }
        Ok(())
    }

    /// Write the root to `path`, then each group beside it.
    ///
    /// See the type docs on concurrent writers.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if self.groups.len() != self.root.groups.len() {
            let missing = self.groups.len().min(self.root.groups.len());
            return Err(WowDataError::MalformedSibling {
                path: group_path(path, missing),
                reason: format!(
                    "{} group files for {} MOGI entries",
                    self.groups.len(),
                    self.root.groups.len()
                ),
            }
            .into());
        }

        let mut writer = create(path)?;
        self.root.write(&mut writer).map_err(|e| e.in_file(path))?;
        writer.flush().map_err(|e| WmoError::from(e).in_file(path))?;

        for (index, group) in self.groups.iter().enumerate() {
            let sibling = group_path(path, index);
            let mut writer = create(&sibling)?;
            group.write(&mut writer).map_err(|e| e.in_file(&sibling))?;
            writer.flush().map_err(|e| WmoError::from(e).in_file(&sibling))?;
        }
        debug!("wrote {} and {} groups", path.display(), self.groups.len());
        Ok(())
    }

    /// The groups on each side of a portal.
    pub fn portal_groups(&self, portal_index: usize) -> Result<Vec<(&WmoGroup, PortalSide)>> {
        self.root
            .portal_neighbors(portal_index)?
            .into_iter()
            .map(|n| {
                let group = self.groups.get(n.group_index).ok_or_else(|| {
                    WowDataError::lookup("groups", n.group_index as u32, self.groups.len())
                })?;
                Ok((group, n.side))
            })
            .collect()
    }

    pub fn group_name(&self, group: &WmoGroup) -> Result<String> {
        self.root.resolve_group_name(group.header.group_name)
    }

    pub fn group_by_name(&self, name: &str) -> Option<&WmoGroup> {
        let offset = self.root.group_names.find(name)?;
        self.groups.iter().find(|g| g.header.group_name == offset)
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path).map_err(|e| WmoError::from(e).in_file(path))?))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path).map_err(|e| WmoError::from(e).in_file(path))?))
}

/// Header failures in a group file mean the file is not a group of this root.
fn sibling_error(err: WmoError, path: &Path) -> WmoError {
    let header_failure = matches!(
        err.kind(),
        WowDataError::BadMagic { .. } | WowDataError::VersionMismatch { .. }
    );
    if header_failure {
        WowDataError::MalformedSibling {
            path: path.to_path_buf(),
            reason: err.kind().to_string(),
        }
        .into()
    } else {
        err.in_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_names() {
        let root = Path::new("world/wmo/stormwind.wmo");
        assert_eq!(group_path(root, 0), Path::new("world/wmo/stormwind_000.wmo"));
        assert_eq!(group_path(root, 12), Path::new("world/wmo/stormwind_012.wmo"));
    }
}
