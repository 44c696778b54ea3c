//! Root CLI structure for warcraft-rs

use clap::{Parser, Subcommand};
use wow_data::version::ClientVersion;

#[derive(Parser)]
#[command(name = "warcraft-rs")]
#[command(about = "Command-line tools for World of Warcraft file formats", long_about = None)]
#[command(version)]
#[command(author)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Client version the files belong to (wotlk, 3.3.5a, 264, ...)
    #[arg(long, global = true, env = "WOW_CLIENT_VERSION")]
    pub client_version: Option<ClientVersion>,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// DBC database operations
    #[cfg(feature = "dbc")]
    Dbc {
        #[command(subcommand)]
        command: crate::commands::dbc::DbcCommands,
    },

    /// M2 model operations
    #[cfg(feature = "m2")]
    M2 {
        #[command(subcommand)]
        command: crate::commands::m2::M2Commands,
    },

    /// WMO object operations
    #[cfg(feature = "wmo")]
    Wmo {
        #[command(subcommand)]
        command: crate::commands::wmo::WmoCommands,
    },

    /// ADT terrain operations
    #[cfg(feature = "adt")]
    Adt {
        #[command(subcommand)]
        command: crate::commands::adt::AdtCommands,
    },

    /// Decode and re-encode files, reporting any byte that changes
    Roundtrip {
        /// Files or glob patterns
        #[arg(required = true)]
        files: Vec<String>,

        /// Write the re-encoded bytes next to each input as `<name>.out`
        #[arg(long)]
        keep: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
