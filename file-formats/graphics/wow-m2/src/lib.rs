//! # World of Warcraft M2 model codec
//!
//! Reads and writes M2 models (MD20, and MD21 from Legion on), their skin
//! profiles, `.anim` side-files and the file id chunks that follow `MD21`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wow_data::prelude::ClientVersion;
//! use wow_m2::M2Container;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut m2 = M2Container::load("creature/wolf/wolf.m2", ClientVersion::WotLK)?;
//! for (index, sequence) in m2.root.model.sequences.iter().enumerate() {
//!     println!("{index}: animation {} lasts {}ms", sequence.animation_id, sequence.duration());
//! }
//! m2.load_anim("creature/wolf/wolf.m2", 1)?;
//! m2.save("out/wolf.m2")?;
//! # Ok(())
//! # }
//! ```
//!
//! Every record is decoded for one [`ClientVersion`](wow_data::prelude::ClientVersion)
//! and written back with the same layout. The version number in the
//! header must belong to that client, otherwise reading stops at the
//! header with [`WowDataError::VersionMismatch`](wow_data::error::WowDataError).

use wow_data::prelude::Alignment;

pub mod anim;
pub mod chunked;
pub mod chunks;
pub mod container;
pub mod error;
pub mod header;
pub mod model;
pub mod skin;

/// Payload alignment used when writing the MD20 data section.
pub(crate) const M2_ALIGN: Alignment = Alignment::PARAGRAPH;

pub use anim::{M2AnimFile, anim_path};
pub use chunked::{M2Root, MD21};
pub use container::{M2Container, skin_path};
pub use error::{M2Error, Result};
pub use header::{M2ModelFlags, MD20Header};
pub use model::M2Model;
pub use skin::{M2SkinFile, M2SkinProfile};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
