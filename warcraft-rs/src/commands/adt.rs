//! ADT terrain tile command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};
use wow_adt::{Adt, McnkChunk};

use crate::utils::{add_table_row, create_table, format_offset, summary_table, yes_no};

#[derive(Subcommand)]
pub enum AdtCommands {
    /// Show information about an ADT terrain tile
    Info {
        /// Path to the ADT file
        file: PathBuf,

        /// List textures, models and every map chunk
        #[arg(short, long)]
        detailed: bool,
    },
}

pub fn execute(cmd: AdtCommands) -> Result<()> {
    match cmd {
        AdtCommands::Info { file, detailed } => handle_info(&file, detailed),
    }
}

fn handle_info(path: &Path, detailed: bool) -> Result<()> {
    let adt = Adt::open(path)?;
    adt.validate()
        .with_context(|| format!("{} failed validation", path.display()))?;

    let with_liquid = adt.chunks.iter().filter(|c| c.liquid.is_some()).count();
    let with_holes = adt
        .chunks
        .iter()
        .filter(|c| {
            c.header.holes_low_res != 0 || c.header.holes_high_res().is_some_and(|h| h != 0)
        })
        .count();
    let layers: usize = adt.chunks.iter().map(layer_count).sum();

    println!("ADT: {}", path.display());
    println!();
    summary_table(&[
        ("Version", adt.version.to_string()),
        ("Map chunks", adt.chunks.len().to_string()),
        ("Textures", adt.texture_names().len().to_string()),
        ("Doodad models", adt.doodad_name_offsets.len().to_string()),
        ("WMO models", adt.wmo_name_offsets.len().to_string()),
        ("Doodad placements", adt.doodads.len().to_string()),
        ("WMO placements", adt.wmos.len().to_string()),
        ("Texture layers", layers.to_string()),
        ("Chunks with MCLQ liquid", with_liquid.to_string()),
        ("Chunks with holes", with_holes.to_string()),
        ("MH2O water", yes_no(adt.water.is_some())),
        ("Flight bounds", yes_no(adt.flight_bounds.is_some())),
        ("Unknown chunks", adt.extra_chunks.len().to_string()),
    ])
    .printstd();

    if detailed {
        print_details(&adt)?;
    }
    Ok(())
}

fn layer_count(chunk: &McnkChunk) -> usize {
    chunk.layers.as_ref().map_or(0, Vec::len)
}

fn print_details(adt: &Adt) -> Result<()> {
    let textures = adt.texture_names();
    if !textures.is_empty() {
        println!("\nTextures:");
        let mut table = create_table(&["#", "File"]);
        for (i, name) in textures.into_iter().enumerate() {
            add_table_row(&mut table, vec![i.to_string(), name]);
        }
        table.printstd();
    }

    if !adt.doodads.is_empty() || !adt.wmos.is_empty() {
        println!("\nPlacements:");
        let mut table = create_table(&["Kind", "Unique id", "Model", "Scale"]);
        for doodad in &adt.doodads {
            add_table_row(
                &mut table,
                vec![
                    "M2".to_string(),
                    doodad.unique_id.to_string(),
                    adt.doodad_name(doodad)?,
                    format!("{:.2}", doodad.scale_factor()),
                ],
            );
        }
        for wmo in &adt.wmos {
            add_table_row(
                &mut table,
                vec![
                    "WMO".to_string(),
                    wmo.unique_id.to_string(),
                    adt.wmo_name(wmo)?,
                    String::new(),
                ],
            );
        }
        table.printstd();
    }

    println!("\nMap chunks:");
    let mut table =
        create_table(&["X", "Y", "Offset", "Area", "Layers", "Doodads", "WMOs", "Liquid"]);
    for (chunk, entry) in adt.chunks.iter().zip(&adt.chunk_index) {
        add_table_row(
            &mut table,
            vec![
                chunk.header.index_x.to_string(),
                chunk.header.index_y.to_string(),
                format_offset(u64::from(entry.offset)),
                chunk.header.area_id.to_string(),
                layer_count(chunk).to_string(),
                chunk.doodad_refs().len().to_string(),
                chunk.map_object_refs().len().to_string(),
                yes_no(chunk.liquid.is_some()),
            ],
        );
    }
    table.printstd();
    Ok(())
}
