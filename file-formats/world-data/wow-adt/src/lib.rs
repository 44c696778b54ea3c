//! Reader and writer for World of Warcraft ADT (terrain) tiles.
//!
//! Covers the v18 root tile used from Classic through Wrath: the tile
//! header, texture and model name tables, object placements and the 16×16
//! grid of MCNK map chunks with their sub-chunks. Heights, normals, layers,
//! references and vertex colors are decoded; alpha maps, shadow maps,
//! sound emitters and both liquid formats are kept as raw bytes.
//!
//! ## Example
//!
//! ```no_run
//! use wow_adt::Adt;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let adt = Adt::open("World/Maps/Azeroth/Azeroth_32_48.adt")?;
//! for (i, name) in adt.texture_names().iter().enumerate() {
//!     println!("texture {i}: {name}");
//! }
//! if let Some(chunk) = adt.chunk_at(0, 0) {
//!     println!("area {} at {:?}", chunk.header.area_id, chunk.header.position);
//! }
//! adt.save("out/Azeroth_32_48.adt")?;
//! # Ok(())
//! # }
//! ```
//!
//! Every chunk and sub-chunk offset is recomputed when writing; chunks the
//! crate does not know are carried through in their original position.
//! Converting between map and tile coordinates, expanding alpha maps and
//! evaluating hole masks are left to the caller; the constants below give
//! the grid geometry.
//!
//! ## References
//!
//! - <https://wowdev.wiki/ADT/v18>

pub mod adt;
pub mod chunks;
pub mod error;

pub use adt::Adt;
pub use chunks::{ADT_VERSION, McnkChunk, McnkHeader};
pub use error::{AdtError, Result};

/// Width of one tile in world units.
pub const TILE_SIZE: f32 = 533.333_33;

/// Width of one map chunk in world units.
pub const CHUNK_SIZE: f32 = TILE_SIZE / 16.0;

/// Distance between two outer vertices of a map chunk.
pub const UNIT_SIZE: f32 = CHUNK_SIZE / 8.0;

/// Tiles along each side of a map.
pub const TILES_PER_MAP: u32 = 64;

/// Lowest world coordinate covered by a map.
pub const MAP_MIN: f32 = -17_066.666_56;

/// Highest world coordinate covered by a map.
pub const MAP_MAX: f32 = 17_066.666_57;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_geometry() {
        assert!((TILE_SIZE * TILES_PER_MAP as f32 - (MAP_MAX - MAP_MIN)).abs() < 0.1);
        assert!((CHUNK_SIZE - 33.333_332).abs() < 1e-4);
        assert!((UNIT_SIZE * 8.0 * 16.0 - TILE_SIZE).abs() < 1e-3);
    }
}
