//! Command implementations for each file format

#[cfg(feature = "dbc")]
pub mod dbc;

#[cfg(feature = "m2")]
pub mod m2;

#[cfg(feature = "wmo")]
pub mod wmo;

#[cfg(feature = "adt")]
pub mod adt;

pub mod roundtrip;
