//! Collision BSP tree stored in MOBN and MOBR.

use wow_data::error::WowDataError;
use wow_data::lookup;

use crate::chunks::{MobnNode, MopyEntry};
use crate::error::Result;

/// Axis of a node's split plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BspPlane {
    YZ,
    XZ,
    XY,
    Leaf,
}

impl MobnNode {
    pub const LEAF: i16 = 4;
    pub const NO_CHILD: i16 = -1;

    pub fn plane(&self) -> Option<BspPlane> {
        match self.plane_type {
            0 => Some(BspPlane::YZ),
            1 => Some(BspPlane::XZ),
            2 => Some(BspPlane::XY),
            Self::LEAF => Some(BspPlane::Leaf),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.plane_type & Self::LEAF != 0
    }

    pub fn leaf(first_face: u32, face_count: u16) -> Self {
        Self {
            plane_type: Self::LEAF,
            children: [Self::NO_CHILD; 2],
            face_count,
            first_face,
            distance: 0.0,
        }
    }
}

/// MOBN nodes with the MOBR face list their leaves index into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BspTree {
    pub nodes: Vec<MobnNode>,
    /// Triangle indices, one per face reference
    pub faces: Vec<u16>,
}

impl BspTree {
    /// Sum of `face_count` over every leaf.
    pub fn leaf_face_total(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| usize::from(n.face_count))
            .sum()
    }

    /// Check child links, leaf face runs and face indices.
    pub fn validate(&self, triangle_count: usize) -> Result<()> {
        for node in &self.nodes {
            if node.is_leaf() {
                let end = node.first_face as usize + usize::from(node.face_count);
                if node.face_count > 0 {
                    lookup::check_index("MOBR", (end - 1) as u32, self.faces.len())?;
                }
            } else {
                for &child in &node.children {
                    lookup::check_i16("MOBN.children", child, self.nodes.len())?;
                }
            }
        }
        for &face in &self.faces {
            lookup::check_index("MOBR.face", u32::from(face), triangle_count)?;
        }
        Ok(())
    }

    /// Leaf faces must add up to the number of collidable triangles.
    pub fn verify_face_count(&self, triangles: &[MopyEntry]) -> Result<()> {
        let collidable = triangles.iter().filter(|t| t.is_collidable()).count();
        let total = self.leaf_face_total();
        if total == collidable {
            Ok(())
        } else {
            Err(WowDataError::lookup("BSP leaf faces", total as u32, collidable).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn split(children: [i16; 2]) -> MobnNode {
        MobnNode {
            plane_type: 2,
            children,
            face_count: 0,
            first_face: 0,
            distance: 1.5,
        }
    }

    fn tree() -> BspTree {
        BspTree {
            nodes: vec![split([1, 2]), MobnNode::leaf(0, 2), MobnNode::leaf(2, 1)],
            faces: vec![0, 1, 2],
        }
    }

    #[test]
    fn leaves_sum_faces() {
        let tree = tree();
        assert_eq!(tree.leaf_face_total(), 3);
        assert!(tree.validate(3).is_ok());
        assert_eq!(tree.nodes[0].plane(), Some(BspPlane::XY));
    }

    #[rstest]
    #[case::bad_child(BspTree { nodes: vec![split([1, 7]), MobnNode::leaf(0, 0)], faces: vec![] })]
    #[case::run_past_end(BspTree { nodes: vec![MobnNode::leaf(1, 4)], faces: vec![0, 0] })]
    fn broken_trees(#[case] tree: BspTree) {
        assert!(matches!(
            tree.validate(8),
            Err(crate::WmoError::Data(WowDataError::LookupOutOfRange { .. }))
        ));
    }

    #[test]
    fn face_outside_triangles() {
        assert!(tree().validate(2).is_err());
    }

    #[test]
    fn face_count_against_collision_triangles() {
        let solid = MopyEntry {
            flags: 0x08,
            material_id: 0,
        };
        let detail = MopyEntry {
            flags: 0x24,
            material_id: 0,
        };
        assert!(tree().verify_face_count(&[solid; 3]).is_ok());
        let err = tree().verify_face_count(&[solid, solid, detail]).unwrap_err();
        assert!(matches!(
            err.kind(),
            WowDataError::LookupOutOfRange { index: 3, len: 2, .. }
        ));
    }
}
