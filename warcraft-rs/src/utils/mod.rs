//! Shared utilities for the warcraft-rs CLI

pub mod format;
pub mod progress;
pub mod table;

pub use format::*;
pub use progress::*;
pub use table::*;
