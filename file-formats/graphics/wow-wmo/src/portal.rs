//! Portal lookups across MOPV, MOPT and MOPR.

use wow_data::error::WowDataError;
use wow_data::lookup;
use wow_data::primitives::C3Vector;

use crate::chunks::MoptEntry;
use crate::error::Result;
use crate::root::WmoRoot;

/// Which side of the portal plane a group lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalSide {
    Front,
    Back,
    Unknown,
}

impl From<i16> for PortalSide {
    fn from(side: i16) -> Self {
        match side.signum() {
            1 => Self::Front,
            -1 => Self::Back,
            _ => Self::Unknown,
        }
    }
}

/// A group on one side of a portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalNeighbor {
    /// Index into MOGI, and into the container's groups
    pub group_index: usize,
    pub side: PortalSide,
}

impl WmoRoot {
    pub fn portal(&self, portal_index: usize) -> Result<&MoptEntry> {
        self.portals.get(portal_index).ok_or_else(|| {
            WowDataError::lookup("MOPT", portal_index as u32, self.portals.len()).into()
        })
    }

    /// The polygon of a portal, taken from MOPV.
    pub fn portal_polygon(&self, portal_index: usize) -> Result<&[C3Vector]> {
        let portal = self.portal(portal_index)?;
        let start = usize::from(portal.start_vertex);
        let end = start + usize::from(portal.vertex_count);
        self.portal_vertices.get(start..end).ok_or_else(|| {
            WowDataError::lookup("MOPV", end as u32, self.portal_vertices.len()).into()
        })
    }

    /// The groups a portal connects, in MOPR order. Usually two.
    pub fn portal_neighbors(&self, portal_index: usize) -> Result<Vec<PortalNeighbor>> {
        self.portal(portal_index)?;
        self.portal_relations
            .iter()
            .filter(|r| usize::from(r.portal_index) == portal_index)
            .map(|r| {
                let group_index = lookup::check_index(
                    "MOPR.group_index",
                    r.group_index.into(),
                    self.groups.len(),
                )?;
                Ok(PortalNeighbor {
                    group_index,
                    side: r.side.into(),
                })
            })
            .collect()
    }
}
