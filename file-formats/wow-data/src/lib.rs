//! Binary codec substrate shared by the World of Warcraft format crates.
//!
//! The crate is layered bottom-up:
//!
//! - [`std_impls`] and [`primitives`]: little-endian scalars and the small
//!   composite values (vectors, quaternions, colors, boxes, fixed point).
//! - [`types`]: the record traits, array references and their resolution.
//! - [`offset`]: the write-time offset manager that lays out array payloads.
//! - [`string_block`] and [`chunk`]: NUL-terminated string blocks and
//!   tag/length chunk framing.
//! - [`schema`]: records described at runtime, with version and flag gates
//!   and template slots.
//! - [`lookup`]: sentinel-aware index validation.
//! - [`version`]: the client version gate.
//!
//! Every failure is one of the kinds of [`error::WowDataError`].

extern crate self as wow_data;

pub mod chunk;
pub mod chunk_order;
pub mod error;
pub mod lookup;
pub mod offset;
pub mod primitives;
pub mod schema;
pub mod std_impls;
pub mod string_block;
pub mod types;
pub mod version;

pub use wow_data_derive::{VWowHeaderR, WowHeaderR, WowHeaderW};

pub mod prelude {
    pub use crate::error::{Result as WowResult, WowDataError};
    pub use crate::offset::{Alignment, DataSection};
    pub use crate::primitives::*;
    pub use crate::types::{
        DataVersion, MagicStr, Read, Seek, SeekFrom, VWowDataR, VWowHeaderR, WowArray,
        WowCharArray, WowDataR, WowHeaderR, WowHeaderW, WowReaderForData, WowReaderForHeader,
        WowWriterForHeader, Write,
    };
    pub use crate::version::ClientVersion;
}
