use wow_data::prelude::*;
use wow_data_derive::{WowHeaderR, WowHeaderW};

/// A skinned vertex, 48 bytes in every version.
#[derive(Debug, Clone, Copy, PartialEq, Default, WowHeaderR, WowHeaderW)]
pub struct M2Vertex {
    pub position: C3Vector,
    /// Weights of the four influencing bones, summing to 255
    pub bone_weights: [u8; 4],
    /// Indices into the bone lookup table
    pub bone_indices: [u8; 4],
    pub normal: C3Vector,
    pub tex_coords: [C2Vector; 2],
}

impl M2Vertex {
    pub const SIZE: usize = 48;

    /// A vertex bound entirely to bone lookup entry 0.
    pub fn rigid(position: C3Vector, normal: C3Vector, uv: C2Vector) -> Self {
        Self {
            position,
            bone_weights: [255, 0, 0, 0],
            bone_indices: [0; 4],
            normal,
            tex_coords: [uv, C2Vector::default()],
        }
    }

    /// Bone lookup entries with a non-zero weight.
    pub fn influences(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.bone_indices
            .iter()
            .copied()
            .zip(self.bone_weights.iter().copied())
            .filter(|&(_, weight)| weight > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn fixed_size() {
        let vertex = M2Vertex::rigid(
            C3Vector::new(1.0, 2.0, 3.0),
            C3Vector::new(0.0, 0.0, 1.0),
            C2Vector::new(0.5, 0.5),
        );
        let mut out = Vec::new();
        out.wow_write(&vertex).unwrap();
        assert_eq!(out.len(), M2Vertex::SIZE);

        let back: M2Vertex = Cursor::new(out).wow_read().unwrap();
        assert_eq!(back, vertex);
        assert_eq!(back.influences().collect::<Vec<_>>(), vec![(0, 255)]);
    }
}
