//! WMO world map object command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::{Path, PathBuf};
use wow_data::chunk::{TagOrder, read_chunks};
use wow_wmo::chunks::MOGP;
use wow_wmo::{WmoContainer, WmoGroup, WmoRoot};

use crate::utils::{add_table_row, create_table, format_box, format_bytes, summary_table, yes_no};

#[derive(Subcommand)]
pub enum WmoCommands {
    /// Show information about a WMO root or group file
    Info {
        /// Path to the WMO file
        file: PathBuf,

        /// Show detailed information including materials and doodad sets
        #[arg(short, long)]
        detailed: bool,

        /// Read the root file only, without its group files
        #[arg(long)]
        no_groups: bool,
    },
}

pub fn execute(cmd: WmoCommands) -> Result<()> {
    match cmd {
        WmoCommands::Info {
            file,
            detailed,
            no_groups,
        } => handle_info(&file, detailed, no_groups),
    }
}

/// Whether `bytes` hold a group file rather than a root.
pub fn is_group(bytes: &[u8]) -> bool {
    read_chunks(bytes, TagOrder::Reversed)
        .map(|chunks| chunks.iter().any(|c| c.tag == MOGP))
        .unwrap_or(false)
}

fn handle_info(path: &Path, detailed: bool, no_groups: bool) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    println!("WMO: {}", path.display());
    println!("File size: {}", format_bytes(bytes.len() as u64));
    println!();

    if is_group(&bytes) {
        let group = WmoGroup::from_bytes(&bytes)
            .with_context(|| format!("Failed to parse group {}", path.display()))?;
        group_summary(&group).printstd();
        return Ok(());
    }

    let container = if no_groups {
        let root = WmoRoot::from_bytes(&bytes)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        WmoContainer::new(root, Vec::new())
    } else {
        WmoContainer::load(path)?
    };

    root_summary(&container.root).printstd();

    if !container.groups.is_empty() {
        println!("\nGroups:");
        let mut table = create_table(&[
            "#", "Name", "Vertices", "Triangles", "Batches", "BSP nodes", "Liquid",
        ]);
        for (i, group) in container.groups.iter().enumerate() {
            let name = container
                .group_name(group)
                .unwrap_or_else(|_| "<invalid>".to_string());
            add_table_row(
                &mut table,
                vec![
                    format!("{i:03}"),
                    name,
                    group.vertices.len().to_string(),
                    group.triangle_count().to_string(),
                    group.batches.len().to_string(),
                    group.bsp.as_ref().map_or(0, |b| b.nodes.len()).to_string(),
                    yes_no(group.liquid.is_some()),
                ],
            );
        }
        table.printstd();
    }

    if detailed {
        print_details(&container.root);
    }
    Ok(())
}

fn root_summary(root: &WmoRoot) -> prettytable::Table {
    let header = &root.header;
    let color = header.ambient_color;
    summary_table(&[
        ("Version", root.version.to_string()),
        ("Materials", root.materials.len().to_string()),
        ("Groups", header.n_groups.to_string()),
        ("Portals", root.portals.len().to_string()),
        ("Lights", root.lights.len().to_string()),
        ("Doodad models", root.doodad_names.iter().count().to_string()),
        ("Doodads", root.doodads.len().to_string()),
        ("Doodad sets", root.doodad_sets.len().to_string()),
        ("Fogs", root.fogs.len().to_string()),
        (
            "Ambient color",
            format!("({}, {}, {}, {})", color.r, color.g, color.b, color.a),
        ),
        ("Area table id", header.id.to_string()),
        ("Bounding box", format_box(&header.bounding_box)),
        ("Flags", format!("{:#06x}", header.flags)),
        ("Skybox", root.skybox_name().unwrap_or_default()),
    ])
}

fn group_summary(group: &WmoGroup) -> prettytable::Table {
    summary_table(&[
        ("Version", group.version.to_string()),
        ("Flags", format!("{:?}", group.flags())),
        ("Bounding box", format_box(&group.header.bounding_box)),
        ("Vertices", group.vertices.len().to_string()),
        ("Triangles", group.triangle_count().to_string()),
        ("Batches", group.batches.len().to_string()),
        ("Portals", group.header.portal_count.to_string()),
        (
            "Light refs",
            group.light_refs.as_ref().map_or(0, Vec::len).to_string(),
        ),
        (
            "Doodad refs",
            group.doodad_refs.as_ref().map_or(0, Vec::len).to_string(),
        ),
        (
            "BSP nodes",
            group.bsp.as_ref().map_or(0, |b| b.nodes.len()).to_string(),
        ),
        ("Vertex colors", yes_no(group.vertex_colors.is_some())),
        ("Liquid", yes_no(group.liquid.is_some())),
        (
            "Unknown chunks",
            (group.extra_chunks.len() + group.trailing_chunks.len()).to_string(),
        ),
    ])
}

fn print_details(root: &WmoRoot) {
    if !root.materials.is_empty() {
        println!("\nMaterials:");
        let mut table = create_table(&["#", "Shader", "Blend", "Texture"]);
        for (i, material) in root.materials.iter().enumerate() {
            let texture = root
                .texture(material.texture_1)
                .unwrap_or_else(|_| format!("<offset {}>", material.texture_1));
            add_table_row(
                &mut table,
                vec![
                    i.to_string(),
                    material.shader.to_string(),
                    material.blend_mode.to_string(),
                    texture,
                ],
            );
        }
        table.printstd();
    }

    if !root.doodad_sets.is_empty() {
        println!("\nDoodad sets:");
        let mut table = create_table(&["#", "Name", "First", "Count"]);
        for (i, set) in root.doodad_sets.iter().enumerate() {
            add_table_row(
                &mut table,
                vec![
                    i.to_string(),
                    set.name(),
                    set.start_doodad.to_string(),
                    set.doodad_count.to_string(),
                ],
            );
        }
        table.printstd();
    }
}
