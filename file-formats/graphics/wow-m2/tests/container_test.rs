use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wow_data::error::WowDataError;
use wow_data::prelude::*;
use wow_m2::chunks::{
    M2Bone, M2Sequence, M2SequenceFlags, M2SequenceTiming, M2Texture, SequenceKeys, TrackKeys,
};
use wow_m2::skin::{M2SkinProfile, M2SkinSection, M2SkinSectionSort};
use wow_m2::{M2Container, M2Error, M2Model, M2Root, M2SkinFile, anim_path, skin_path};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn model(version: ClientVersion, duration: u32) -> M2Model {
    let mut model = M2Model::new(version, "Barrel");
    model.sequences.push(M2Sequence {
        timing: M2SequenceTiming::for_version(version, duration),
        flags: M2SequenceFlags::STORED_IN_MODEL,
        ..M2Sequence::default()
    });
    model.sequence_lookup = vec![0];
    model.bones.push(M2Bone::new(version, C3Vector::origin()));
    model.textures.push(M2Texture::new("world/goober/barrel.blp"));
    model.texture_lookup = vec![0];
    model
}

fn skin(vertex: u16) -> M2SkinFile {
    let mut profile = M2SkinProfile::new(ClientVersion::WotLK);
    profile.vertices = vec![vertex];
    profile.submeshes.push(M2SkinSection {
        sort: M2SkinSectionSort::Some {
            sort_center: C3Vector::origin(),
            sort_radius: 0.0,
        },
        ..M2SkinSection::default()
    });
    M2SkinFile::new(profile)
}

fn wotlk_container(skins: usize) -> M2Container {
    let mut model = model(ClientVersion::WotLK, 1000);
    model.vertices.push(wow_m2::chunks::M2Vertex::default());
    M2Container::new(M2Root::new(model), (0..skins).map(|_| skin(0)).collect())
}

fn save(container: &M2Container, dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("barrel.m2");
    container.save(&path).unwrap();
    path
}

#[test]
fn tbc_model_read_as_wotlk_fails_at_the_header() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("barrel.m2");
    let tbc = model(ClientVersion::TBC, 1000);
    assert_eq!(tbc.sequences[0].timing, M2SequenceTiming::StartEnd(0, 1000));
    fs::write(&path, tbc.to_bytes(ClientVersion::TBC).unwrap()).unwrap();

    let err = M2Container::load(&path, ClientVersion::WotLK).unwrap_err();
    assert!(matches!(err.kind(), WowDataError::VersionMismatch { .. }));
    assert!(matches!(&err, M2Error::InFile { path: p, .. } if p == &path));

    let loaded = M2Container::load(&path, ClientVersion::TBC).unwrap();
    assert_eq!(loaded.root.model.sequences[0].duration(), 1000);
    assert!(loaded.skins.is_empty());
}

#[test]
fn tbc_model_cannot_be_written_for_wotlk() {
    let tbc = model(ClientVersion::TBC, 1000);
    let err = tbc.to_bytes(ClientVersion::WotLK).unwrap_err();
    assert!(matches!(err, WowDataError::VersionMismatch { .. }));
}

#[test]
fn container_survives_save_and_load() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let container = wotlk_container(2);
    let path = save(&container, &dir);
    assert!(skin_path(&path, 1).is_file());

    let loaded = M2Container::load(&path, ClientVersion::WotLK).unwrap();
    assert_eq!(loaded.root.model.skin_count, 2);
    assert_eq!(loaded.skins, container.skins);
    assert_eq!(loaded.root.model.textures[0].filename, "world/goober/barrel.blp");
}

#[test]
fn missing_skin() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = save(&wotlk_container(2), &dir);
    fs::remove_file(skin_path(&path, 1)).unwrap();

    let err = M2Container::load(&path, ClientVersion::WotLK).unwrap_err();
    match err.kind() {
        WowDataError::MissingSibling { path: missing } => {
            assert_eq!(missing.file_name().unwrap(), "barrel01.skin");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn skin_with_bad_magic_is_malformed() {
    let dir = TempDir::new().unwrap();
    let path = save(&wotlk_container(1), &dir);
    let skin_file = skin_path(&path, 0);
    let mut bytes = fs::read(&skin_file).unwrap();
    bytes[0..4].copy_from_slice(b"NIKS");
    fs::write(&skin_file, bytes).unwrap();

    let err = M2Container::load(&path, ClientVersion::WotLK).unwrap_err();
    assert!(matches!(err.kind(), WowDataError::MalformedSibling { .. }));
}

#[test]
fn skin_pointing_past_the_vertices_is_malformed() {
    let dir = TempDir::new().unwrap();
    let mut container = wotlk_container(1);
    container.skins[0] = skin(7);
    let path = save(&container, &dir);

    let err = M2Container::load(&path, ClientVersion::WotLK).unwrap_err();
    match err.kind() {
        WowDataError::MalformedSibling { path: bad, reason } => {
            assert_eq!(bad, &skin_path(&path, 0));
            assert!(reason.contains("skin.vertices"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn external_keys_load_from_the_anim_file() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let mut container = wotlk_container(1);
    let model = &mut container.root.model;
    model.sequences[0].flags = M2SequenceFlags::empty();
    model.sequences[0].animation_id = 4;
    let translation = &mut model.bones[0].translation;
    translation.timestamps = TrackKeys::PerSequence(vec![SequenceKeys::External {
        reference: WowArray::new(1, 0),
        keys: None,
    }]);
    translation.values = TrackKeys::PerSequence(vec![SequenceKeys::External {
        reference: WowArray::new(1, 4),
        keys: None,
    }]);
    let path = save(&container, &dir);

    let mut anim = 500_u32.to_le_bytes().to_vec();
    for v in [1.0_f32, 2.0, 3.0] {
        anim.extend_from_slice(&v.to_le_bytes());
    }
    let sequence = container.root.model.sequences[0].clone();
    assert!(anim_path(&path, &sequence).ends_with("barrel0004-00.anim"));
    fs::write(anim_path(&path, &sequence), anim).unwrap();

    let mut loaded = M2Container::load(&path, ClientVersion::WotLK).unwrap();
    let bone = &loaded.root.model.bones[0];
    assert_eq!(bone.translation.keys_for(0), None);

    assert!(loaded.load_anim(&path, 0).unwrap());
    let (times, values) = loaded.root.model.bones[0].translation.keys_for(0).unwrap();
    assert_eq!(times, &[500]);
    assert_eq!(values, &[C3Vector::new(1.0, 2.0, 3.0)]);
}

#[test]
fn missing_anim_file() {
    let dir = TempDir::new().unwrap();
    let mut container = wotlk_container(1);
    container.root.model.sequences[0].flags = M2SequenceFlags::empty();
    let path = save(&container, &dir);

    let mut loaded = M2Container::load(&path, ClientVersion::WotLK).unwrap();
    let err = loaded.load_anim(&path, 0).unwrap_err();
    assert!(matches!(err.kind(), WowDataError::MissingSibling { .. }));
    assert!(matches!(
        loaded.load_anim(Path::new("unused.m2"), 3).unwrap_err().kind(),
        WowDataError::LookupOutOfRange { index: 3, .. }
    ));
}
