//! # World of Warcraft WMO (World Map Object) codec
//!
//! Reads and writes WMO root files and their `_NNN.wmo` group files
//! (version 17, Classic through Wrath of the Lich King), and binds them
//! together in a [`WmoContainer`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use wow_wmo::WmoContainer;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let wmo = WmoContainer::load("world/wmo/dungeon/cave.wmo")?;
//! for (index, group) in wmo.groups.iter().enumerate() {
//!     println!("{index}: {} ({} vertices)", wmo.group_name(group)?, group.vertices.len());
//! }
//! wmo.save("out/cave.wmo")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`chunks`]: Fixed-layout chunk records and tags
//! - [`root`]: Root file
//! - [`group`]: Group files, including liquid
//! - [`bsp`]: Collision BSP trees
//! - [`portal`]: Portal to group lookups
//! - [`container`]: Root and groups loaded and saved together
//! - [`editor`]: Edits that keep counts and MOPR consistent
//!
//! Chunk tags are stored reversed on disk (`MVER` is written `REVM`); the
//! reversal is handled entirely by [`wow_data::chunk`].

pub mod bsp;
pub mod chunks;
pub mod container;
pub mod editor;
pub mod error;
pub mod flags;
pub mod group;
pub mod portal;
pub mod root;

pub use bsp::{BspPlane, BspTree};
pub use container::{WmoContainer, group_path};
pub use error::{Result, WmoError};
pub use flags::{WmoGroupFlags, WmoMaterialFlags, WmoRootFlags};
pub use group::{LiquidVertex, WmoGroup, WmoLiquid};
pub use portal::{PortalNeighbor, PortalSide};
pub use root::WmoRoot;

use std::io::{Read, Seek};

use wow_data::chunk::{ChunkReader, TagOrder};

/// Kind of WMO file, told apart by the chunk after MVER.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmoFileType {
    Root,
    Group,
}

/// Peek at the second chunk to tell a root file from a group file.
/// The stream is left wherever reading stopped.
pub fn detect_file_type<R: Read + Seek>(reader: &mut R) -> Result<WmoFileType> {
    let mut stream = ChunkReader::new(reader, TagOrder::Reversed)?;
    stream.expect(chunks::MVER)?;
    match stream.expect(chunks::MOHD) {
        Ok(_) => Ok(WmoFileType::Root),
        Err(wow_data::error::WowDataError::BadMagic { found, .. }) if found == "MOGP" => {
            Ok(WmoFileType::Group)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn tells_roots_from_groups() {
        let root = WmoRoot::new().to_bytes().unwrap();
        let group = WmoGroup::default().to_bytes().unwrap();
        assert_eq!(detect_file_type(&mut Cursor::new(root)).unwrap(), WmoFileType::Root);
        assert_eq!(detect_file_type(&mut Cursor::new(group)).unwrap(), WmoFileType::Group);
    }
}
