//! DBC database command implementations

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use wow_data::schema::{Bindings, Context as LayoutContext, layout};
use wow_data::version::{self, ClientVersion};
use wow_dbc::export::{RecordView, write_csv};
use wow_dbc::{DbcFile, DbcTable, schemas};

use crate::utils::{add_table_row, create_table, format_bytes, summary_table};

#[derive(Subcommand)]
pub enum DbcCommands {
    /// Show information about a DBC file
    Info {
        /// Path to the DBC file
        file: PathBuf,
    },

    /// Decode and print the rows of a DBC file
    Dump {
        /// Path to the DBC file
        file: PathBuf,

        /// Built-in table schema (see `dbc schemas`)
        #[arg(short, long)]
        schema: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: DumpFormat,

        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the built-in table schemas
    Schemas,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum DumpFormat {
    Table,
    Json,
    Csv,
}

pub fn execute(command: DbcCommands) -> Result<()> {
    match command {
        DbcCommands::Info { file } => info_command(&file),
        DbcCommands::Dump {
            file,
            schema,
            format,
            limit,
            output,
        } => dump_command(&file, &schema, format, limit, output.as_deref()),
        DbcCommands::Schemas => {
            for name in schemas::BUILTIN {
                println!("{name}");
            }
            Ok(())
        }
    }
}

/// DBC files do not record their client; fall back to WotLK.
fn table_version() -> ClientVersion {
    version::configured().unwrap_or_else(|| {
        info!("no client version configured, reading DBC rows as WotLK");
        ClientVersion::WotLK
    })
}

/// Display information about a DBC file
fn info_command(file: &Path) -> Result<()> {
    let dbc = DbcFile::open(file)?;
    let header = dbc.header();

    println!("DBC: {}", file.display());
    println!();
    summary_table(&[
        ("Records", header.record_count.to_string()),
        ("Fields", header.field_count.to_string()),
        ("Record size", format!("{} bytes", header.record_size)),
        ("String block", format_bytes(u64::from(header.string_block_size))),
        ("String block offset", header.string_block_offset().to_string()),
        ("Strings", dbc.strings().iter().count().to_string()),
        ("Total size", format_bytes(header.total_size())),
    ])
    .printstd();
    Ok(())
}

fn dump_command(
    file: &Path,
    schema_name: &str,
    format: DumpFormat,
    limit: Option<usize>,
    output: Option<&Path>,
) -> Result<()> {
    let Some(schema) = schemas::builtin(schema_name)? else {
        bail!(
            "unknown schema {schema_name}; built-in schemas are {}",
            schemas::BUILTIN.join(", ")
        );
    };
    let rows = layout(&schema, &Bindings::new(), LayoutContext::new(table_version()))?;
    let table = DbcTable::open(file, rows)
        .with_context(|| format!("Failed to read {} as {}", file.display(), schema.name()))?;
    let records = &table.records()[..limit.unwrap_or(usize::MAX).min(table.len())];

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output file: {}", path.display())
        })?)),
        None => Box::new(io::stdout().lock()),
    };

    match format {
        DumpFormat::Table => {
            let names: Vec<&str> =
                table.layout().fields().iter().map(|f| f.name.as_str()).collect();
            let mut out = create_table(&names);
            for record in records {
                add_table_row(&mut out, record.values().iter().map(ToString::to_string).collect());
            }
            out.print(&mut writer)?;
            if records.len() < table.len() {
                writeln!(writer, "... {} more records", table.len() - records.len())?;
            }
        }
        DumpFormat::Json => {
            let views: Vec<RecordView<'_>> = records.iter().map(RecordView).collect();
            serde_json::to_writer_pretty(&mut writer, &views).context("Failed to export to JSON")?;
            writeln!(writer)?;
        }
        DumpFormat::Csv => write_csv(records, writer).context("Failed to export to CSV")?,
    }
    Ok(())
}
