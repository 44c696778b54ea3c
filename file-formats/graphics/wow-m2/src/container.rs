//! A root file bound to its skin files.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use wow_data::error::WowDataError;
use wow_data::prelude::ClientVersion;

use crate::anim::{M2AnimFile, anim_path};
use crate::chunked::M2Root;
use crate::chunks::M2SequenceFlags;
use crate::chunks::track::resolve_alias;
use crate::error::{M2Error, Result};
use crate::skin::M2SkinFile;

/// Path of skin profile `index` next to `root_path`: `<stem>NN.skin`.
pub fn skin_path(root_path: &Path, index: usize) -> PathBuf {
    let stem = root_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    root_path.with_file_name(format!("{stem}{index:02}.skin"))
}

/// An M2 root with its external skin profiles (WotLK+).
///
/// Up to TBC the profiles live in the root and `skins` stays empty. `.anim`
/// files are never opened eagerly; see [`M2Container::load_anim`].
///
/// Containers are plain owned values with no internal locking. Two
/// concurrent [`M2Container::save`] calls targeting the same path are not
/// supported: each file is truncated and rewritten, so the result may mix
/// both trees or be cut short.
#[derive(Debug, Clone, PartialEq)]
pub struct M2Container {
    pub version: ClientVersion,
    pub root: M2Root,
    pub skins: Vec<M2SkinFile>,
}

impl M2Container {
    pub fn new(root: M2Root, skins: Vec<M2SkinFile>) -> Self {
        Self {
            version: root.model.version,
            root,
            skins,
        }
    }

    /// Load a root file and, from WotLK on, every `NN.skin` sibling it
    /// declares.
    pub fn load(path: impl AsRef<Path>, version: ClientVersion) -> Result<Self> {
        let path = path.as_ref();
        let root = open(path)
            .and_then(|mut reader| Ok(M2Root::read(&mut reader, version)?))
            .map_err(|e| e.in_file(path))?;
        root.model.validate().map_err(|e| M2Error::from(e).in_file(path))?;

        let mut skins = Vec::new();
        if !version.is_pre_wotlk() {
            let targets = root.model.skin_targets();
            for index in 0..root.model.skin_count as usize {
                let sibling = skin_path(path, index);
                if !sibling.is_file() {
                    return Err(WowDataError::MissingSibling { path: sibling }.into());
                }
                debug!("opening skin {}", sibling.display());
                let skin = open(&sibling)
                    .and_then(|mut reader| Ok(M2SkinFile::read(&mut reader, version)?))
                    .map_err(|e| sibling_error(e, &sibling))?;
                skin.profile
                    .validate(&targets)
                    .map_err(|e| M2Error::from(e).into_malformed(&sibling))?;
                skins.push(skin);
            }
        }

        let deferred = root.animation_file_ids().len();
        if deferred > 0 {
            debug!("{deferred} animation files left for later loads");
        }
        info!("loaded {} with {} skins", path.display(), skins.len());
        Ok(Self {
            version,
            root,
            skins,
        })
    }

    /// Read the `.anim` file of sequence `index` next to `root_path` and
    /// fill in the keys it holds.
    ///
    /// Sequences stored in the model need no file and return `Ok(false)`.
    /// A missing file is reported as [`WowDataError::MissingSibling`].
    pub fn load_anim(&mut self, root_path: impl AsRef<Path>, index: usize) -> Result<bool> {
        let model = &mut self.root.model;
        if index >= model.sequences.len() {
            let len = model.sequences.len();
            return Err(WowDataError::lookup("sequences", index as u32, len).into());
        }
        // aliases share the file of the sequence they point at
        let sequence = &model.sequences[resolve_alias(&model.sequences, index)];
        if self.version.is_pre_wotlk()
            || sequence.flags.contains(M2SequenceFlags::STORED_IN_MODEL)
        {
            return Ok(false);
        }
        let path = anim_path(root_path.as_ref(), sequence);
        if !path.is_file() {
            return Err(WowDataError::MissingSibling { path }.into());
        }
        let bytes = fs::read(&path).map_err(|e| M2Error::from(e).in_file(&path))?;
        let anim = M2AnimFile::from_bytes(&bytes, self.version)
            .map_err(|e| M2Error::from(e).in_file(&path))?;
        model
            .load_sequence(index, &anim)
            .map_err(|e| M2Error::from(e).in_file(&path))?;
        Ok(true)
    }

    /// Write the root to `path`, then each skin beside it.
    ///
    /// The root's skin count is taken from `skins`. See the type docs on
    /// concurrent writers.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut root = self.root.clone();
        if !self.version.is_pre_wotlk() {
            root.model.skin_count = self.skins.len() as u32;
        }

        let mut writer = create(path)?;
        root.write(&mut writer, self.version)
            .map_err(|e| M2Error::from(e).in_file(path))?;
        writer.flush().map_err(|e| M2Error::from(e).in_file(path))?;

        for (index, skin) in self.skins.iter().enumerate() {
            let sibling = skin_path(path, index);
            let mut writer = create(&sibling)?;
            skin.write(&mut writer, self.version)
                .map_err(|e| M2Error::from(e).in_file(&sibling))?;
            writer.flush().map_err(|e| M2Error::from(e).in_file(&sibling))?;
        }
        debug!("wrote {} and {} skins", path.display(), self.skins.len());
        Ok(())
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path).map_err(|e| M2Error::from(e).in_file(path))?))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path).map_err(|e| M2Error::from(e).in_file(path))?))
}

/// Header failures in a skin file mean the file is not a skin of this
/// root.
fn sibling_error(err: M2Error, path: &Path) -> M2Error {
    let header_failure = matches!(
        err.kind(),
        WowDataError::BadMagic { .. } | WowDataError::VersionMismatch { .. }
    );
    if header_failure {
        err.into_malformed(path)
    } else {
        err.in_file(path)
    }
}
