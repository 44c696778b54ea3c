//! M2 model file command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::{Path, PathBuf};
use wow_data::version::{self, ClientVersion};
use wow_m2::{M2Container, M2Model, M2Root, M2SkinFile};

use crate::utils::{add_table_row, create_table, format_box, format_bytes, summary_table, yes_no};

#[derive(Subcommand)]
pub enum M2Commands {
    /// Display information about an M2 model file
    Info {
        /// Path to the M2 file
        file: PathBuf,

        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,

        /// Read the root file only, without its .skin siblings
        #[arg(long)]
        no_skins: bool,
    },
}

pub fn execute(cmd: M2Commands) -> Result<()> {
    match cmd {
        M2Commands::Info {
            file,
            detailed,
            no_skins,
        } => handle_info(&file, detailed, no_skins),
    }
}

/// The client version an M2 file was written for: the configured one, or
/// the one its header names.
pub fn model_version(bytes: &[u8]) -> Result<ClientVersion> {
    if let Some(configured) = version::configured() {
        return Ok(configured);
    }
    detect_version(bytes).context("unknown M2 header version, pass --client-version")
}

/// Client version from the header number of an `MD20` or `MD21` file.
pub fn detect_version(bytes: &[u8]) -> Option<ClientVersion> {
    let number = match bytes.get(..4)? {
        b"MD20" => bytes.get(4..8)?,
        b"MD21" => bytes.get(12..16)?,
        _ => return None,
    };
    ClientVersion::from_m2_version(u32::from_le_bytes(number.try_into().ok()?))
}

fn handle_info(path: &Path, detailed: bool, no_skins: bool) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let version = model_version(&bytes)?;

    let (root, skins) = if no_skins || version.is_pre_wotlk() {
        let root = M2Root::from_bytes(&bytes, version)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        (root, Vec::new())
    } else {
        let container = M2Container::load(path, version)?;
        (container.root, container.skins)
    };

    println!("M2 Model: {}", path.display());
    println!("File size: {}", format_bytes(bytes.len() as u64));
    println!();
    model_summary(&root, version).printstd();

    if !skins.is_empty() {
        println!("\nSkins:");
        skin_table(&skins).printstd();
    }

    if detailed {
        print_details(&root.model);
    }
    Ok(())
}

fn model_summary(root: &M2Root, version: ClientVersion) -> prettytable::Table {
    let model = &root.model;
    summary_table(&[
        ("Name", model.name.clone()),
        ("Client", version.to_string()),
        ("Header version", model.header_version.to_string()),
        ("Chunked (MD21)", yes_no(root.chunked)),
        ("Flags", format!("{:?}", model.flags)),
        ("Global sequences", model.global_sequences.len().to_string()),
        ("Sequences", model.sequences.len().to_string()),
        ("Bones", model.bones.len().to_string()),
        ("Vertices", model.vertices.len().to_string()),
        ("Skin profiles", skin_count(model).to_string()),
        ("Textures", model.textures.len().to_string()),
        ("Materials", model.materials.len().to_string()),
        ("Attachments", model.attachments.len().to_string()),
        ("Events", model.events.len().to_string()),
        ("Lights", model.lights.len().to_string()),
        ("Cameras", model.cameras.len().to_string()),
        ("Ribbon emitters", model.ribbon_emitters.len().to_string()),
        ("Particle emitters", model.particle_emitters.len().to_string()),
        ("Collision triangles", (model.collision_triangles.len() / 3).to_string()),
        ("Bounding box", format_box(&model.bounding_box)),
        ("Sidecar chunks", root.sidecars.len().to_string()),
    ])
}

fn skin_count(model: &M2Model) -> usize {
    if model.version.is_pre_wotlk() {
        model.embedded_skins.len()
    } else {
        model.skin_count as usize
    }
}

fn skin_table(skins: &[M2SkinFile]) -> prettytable::Table {
    let mut table = create_table(&["Skin", "Vertices", "Triangles", "Submeshes", "Batches"]);
    for (i, skin) in skins.iter().enumerate() {
        let profile = &skin.profile;
        add_table_row(
            &mut table,
            vec![
                format!("{i:02}"),
                profile.vertices.len().to_string(),
                (profile.indices.len() / 3).to_string(),
                profile.submeshes.len().to_string(),
                profile.batches.len().to_string(),
            ],
        );
    }
    table
}

fn print_details(model: &M2Model) {
    if !model.sequences.is_empty() {
        println!("\nSequences:");
        let mut table = create_table(&["#", "Animation", "Variation", "Duration", "Flags"]);
        for (i, sequence) in model.sequences.iter().enumerate() {
            add_table_row(
                &mut table,
                vec![
                    i.to_string(),
                    sequence.animation_id.to_string(),
                    sequence.sub_animation_id.to_string(),
                    format!("{} ms", sequence.duration()),
                    format!("{:?}", sequence.flags),
                ],
            );
        }
        table.printstd();
    }

    if !model.textures.is_empty() {
        println!("\nTextures:");
        let mut table = create_table(&["#", "Type", "File"]);
        for (i, texture) in model.textures.iter().enumerate() {
            add_table_row(
                &mut table,
                vec![
                    i.to_string(),
                    format!("{:?}", texture.texture_type),
                    texture.filename.clone(),
                ],
            );
        }
        table.printstd();
    }
}
