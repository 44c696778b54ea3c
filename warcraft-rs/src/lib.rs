//! Warcraft-RS library
//!
//! Command implementations behind the `warcraft-rs` binary: inspection of
//! WMO, M2, ADT and DBC files and byte-level round-trip checks.

pub mod cli;
pub mod commands;
pub mod utils;
