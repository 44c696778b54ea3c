//! Decode-then-encode checks over any supported file

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::{add_table_row, create_progress_bar, create_table, format_bytes, format_offset};

/// What re-encoding one file produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Identical,
    /// First differing byte and both lengths
    Differs {
        offset: u64,
        original: usize,
        encoded: usize,
    },
    Failed(String),
}

impl Outcome {
    fn describe(&self) -> String {
        match self {
            Self::Identical => "identical".to_string(),
            Self::Differs {
                offset,
                original,
                encoded,
            } => format!(
                "differs at {} ({original} -> {encoded} bytes)",
                format_offset(*offset)
            ),
            Self::Failed(reason) => format!("failed: {reason}"),
        }
    }
}

pub fn execute(patterns: &[String], keep: bool, quiet: bool) -> Result<()> {
    let files = expand(patterns)?;
    let progress =
        create_progress_bar(files.len() as u64, "round-tripping", quiet || files.len() < 2);

    let mut table = create_table(&["File", "Size", "Result"]);
    let mut bad = 0;
    for path in &files {
        progress.set_message(path.display().to_string());
        let original =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let outcome = match reencode(path, &original) {
            Ok(encoded) => {
                if keep {
                    let out = path.with_extension(format!("{}.out", extension(path)));
                    fs::write(&out, &encoded)
                        .with_context(|| format!("Failed to write {}", out.display()))?;
                }
                compare(&original, &encoded)
            }
            Err(e) => Outcome::Failed(format!("{e:#}")),
        };
        if outcome != Outcome::Identical {
            warn!("{}: {}", path.display(), outcome.describe());
            bad += 1;
        }
        add_table_row(
            &mut table,
            vec![
                path.display().to_string(),
                format_bytes(original.len() as u64),
                outcome.describe(),
            ],
        );
        progress.inc(1);
    }
    progress.finish_and_clear();

    if !quiet {
        table.printstd();
    }
    if bad > 0 {
        bail!("{bad} of {} files did not round-trip", files.len());
    }
    Ok(())
}

/// Paths named by `patterns`; a pattern matching nothing is kept as a path
/// so that the read reports it.
fn expand(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let before = files.len();
        for entry in glob::glob(pattern).with_context(|| format!("Invalid pattern {pattern}"))? {
            files.push(entry?);
        }
        if files.len() == before {
            files.push(PathBuf::from(pattern));
        }
    }
    Ok(files)
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

pub fn compare(original: &[u8], encoded: &[u8]) -> Outcome {
    if original == encoded {
        return Outcome::Identical;
    }
    let offset = original
        .iter()
        .zip(encoded)
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| original.len().min(encoded.len()));
    Outcome::Differs {
        offset: offset as u64,
        original: original.len(),
        encoded: encoded.len(),
    }
}

/// Decode `bytes` with the codec for `path`'s extension and encode again.
fn reencode(path: &Path, bytes: &[u8]) -> Result<Vec<u8>> {
    let kind = extension(path);
    debug!("{} as {kind}", path.display());
    match kind.as_str() {
        #[cfg(feature = "wmo")]
        "wmo" => {
            if crate::commands::wmo::is_group(bytes) {
                Ok(wow_wmo::WmoGroup::from_bytes(bytes)?.to_bytes()?)
            } else {
                Ok(wow_wmo::WmoRoot::from_bytes(bytes)?.to_bytes()?)
            }
        }
        #[cfg(feature = "m2")]
        "m2" => {
            let version = crate::commands::m2::model_version(bytes)?;
            Ok(wow_m2::M2Root::from_bytes(bytes, version)?.to_bytes(version)?)
        }
        #[cfg(feature = "m2")]
        "skin" => {
            let version =
                wow_data::version::resolve(None).context("skin files need --client-version")?;
            Ok(wow_m2::M2SkinFile::from_bytes(bytes, version)?.to_bytes(version)?)
        }
        #[cfg(feature = "m2")]
        "anim" => {
            let version =
                wow_data::version::resolve(None).context("anim files need --client-version")?;
            Ok(wow_m2::M2AnimFile::from_bytes(bytes, version)?.to_bytes()?)
        }
        #[cfg(feature = "adt")]
        "adt" => Ok(wow_adt::Adt::from_bytes(bytes)?.to_bytes()?),
        #[cfg(feature = "dbc")]
        "dbc" => Ok(wow_dbc::DbcFile::from_bytes(bytes)?.to_bytes()?),
        other => bail!("no codec for .{other} files"),
    }
}
