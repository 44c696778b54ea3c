//! Reader and writer for World of Warcraft client database (`.dbc`) files.
//!
//! A DBC file is a 20 byte header, a block of fixed-size rows and a string
//! block holding every string the rows refer to by offset. This crate reads
//! them two ways:
//!
//! - [`DbcFile`] keeps rows as bytes and the string block as stored, so an
//!   unedited file writes back byte for byte.
//! - [`DbcTable`] decodes every row through a [`Layout`] built from a row
//!   [`Schema`](wow_data::schema::Schema). Writing a table rebuilds the
//!   string block with each distinct string stored once.
//!
//! ```no_run
//! use wow_data::schema::{Bindings, Context, layout};
//! use wow_data::version::ClientVersion;
//! use wow_dbc::{DbcTable, schemas};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = schemas::animation_data()?;
//! let rows = layout(&schema, &Bindings::new(), Context::new(ClientVersion::WotLK))?;
//! let table = DbcTable::open("DBFilesClient/AnimationData.dbc", rows)?;
//! for record in table.records() {
//!     println!("{} {}", record.values()[0], record.values()[1]);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`Layout`]: wow_data::schema::Layout

mod error;
#[cfg(any(feature = "serde", feature = "csv_export"))]
pub mod export;
pub mod file;
pub mod header;
pub mod lazy;
pub mod schemas;
pub mod table;

pub use error::{DbcError, Result};
pub use file::DbcFile;
pub use header::{DBC_MAGIC, DbcHeader};
pub use lazy::Records;
pub use table::DbcTable;
pub use wow_data::schema::{Record, Value};
