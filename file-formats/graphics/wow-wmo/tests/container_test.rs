use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wow_data::error::WowDataError;
use wow_data::primitives::{BoundingBox, C3Vector, Color};
use wow_data::string_block::{StringBlock, StringPadding};
use wow_wmo::chunks::{MfogEntry, MogiEntry, MogpHeader, MomtEntry, MoprEntry, MoptEntry};
use wow_wmo::{WmoContainer, WmoGroup, WmoRoot, group_path};

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// One material, one group named "main" at MOGN offset 0, one fog.
fn minimal() -> WmoContainer {
    let mut root = WmoRoot::new();
    root.group_names = StringBlock::from_bytes(b"main\0".to_vec(), StringPadding::None);
    root.add_material(MomtEntry {
        shader: 0,
        ..MomtEntry::default()
    });
    root.groups.push(MogiEntry {
        name_offset: 0,
        ..MogiEntry::default()
    });
    root.fogs.push(MfogEntry {
        flags: 0,
        ..MfogEntry::default()
    });
    root.header.ambient_color = Color::from_rgba(255, 255, 255, 255);
    root.header.id = 0;
    root.header.bounding_box = BoundingBox::new(C3Vector::origin(), C3Vector::new(1.0, 1.0, 1.0));
    root.header = root.synced_header();

    let group = WmoGroup {
        header: MogpHeader {
            group_name: 0,
            ..MogpHeader::default()
        },
        ..WmoGroup::default()
    };
    WmoContainer::new(root, vec![group])
}

fn with_groups(count: usize) -> WmoContainer {
    let mut container = WmoContainer::default();
    container.add_material(MomtEntry::default());
    for i in 0..count {
        container.add_group(&format!("room {i}"), WmoGroup::default());
    }
    container
}

#[test]
fn minimal_root_bytes_and_reload() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("minimal.wmo");
    let container = minimal();
    container.save(&path).unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..16], b"REVM\x04\x00\x00\x00\x11\x00\x00\x00DHOM");
    assert!(dir.path().join("minimal_000.wmo").is_file());

    let loaded = WmoContainer::load(&path).unwrap();
    assert_eq!(loaded, container);
    assert_eq!(loaded.group_name(&loaded.groups[0]).unwrap(), "main");
    assert!(loaded.group_by_name("main").is_some());
}

#[test]
fn missing_fourth_group() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keep.wmo");
    with_groups(4).save(&path).unwrap();
    fs::remove_file(group_path(&path, 3)).unwrap();

    let err = WmoContainer::load(&path).unwrap_err();
    match err.kind() {
        WowDataError::MissingSibling { path: missing } => {
            assert_eq!(missing, &dir.path().join("keep_003.wmo"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn portal_to_group_past_mogi() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("portals.wmo");

    let mut container = with_groups(4);
    container.root.portal_vertices = vec![C3Vector::origin(); 4];
    container.root.portals.push(MoptEntry {
        start_vertex: 0,
        vertex_count: 4,
        ..MoptEntry::default()
    });
    container.root.portal_relations.push(MoprEntry {
        portal_index: 0,
        group_index: 5,
        side: 1,
        padding: 0,
    });
    container.save(&path).unwrap();

    let err = WmoContainer::load(&path).unwrap_err();
    assert!(matches!(
        err.kind(),
        WowDataError::LookupOutOfRange { index: 5, len: 4, .. }
    ));
}

#[test]
fn root_without_groups_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.wmo");
    fs::write(&path, WmoRoot::new().to_bytes().unwrap()).unwrap();

    let err = WmoContainer::load(&path).unwrap_err();
    assert!(matches!(err.kind(), WowDataError::MalformedSibling { .. }));
}

#[test]
fn group_with_wrong_version_is_malformed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("old.wmo");
    with_groups(2).save(&path).unwrap();

    let stale = WmoGroup {
        version: 16,
        ..WmoGroup::default()
    };
    fs::write(group_path(&path, 1), stale.to_bytes().unwrap()).unwrap();

    match WmoContainer::load(&path).unwrap_err().kind() {
        WowDataError::MalformedSibling { path: bad, .. } => {
            assert_eq!(bad.file_name().unwrap(), "old_001.wmo");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn collision_only_batches_skip_material_check() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("collision.wmo");
    let mut container = with_groups(1);
    container.groups[0].batches.push(wow_wmo::chunks::MobaEntry {
        material_id: 0xFF,
        ..Default::default()
    });
    container.save(&path).unwrap();
    let loaded = WmoContainer::load(&path).unwrap();
    assert_eq!(loaded.groups[0].batches[0].material_id, 0xFF);
}

#[test]
fn batch_material_past_momt() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("materials.wmo");
    let mut container = with_groups(1);
    container.groups[0].batches.push(wow_wmo::chunks::MobaEntry {
        material_id: 3,
        ..Default::default()
    });
    container.save(&path).unwrap();

    let err = WmoContainer::load(&path).unwrap_err();
    assert!(matches!(err.kind(), WowDataError::LookupOutOfRange { index: 3, len: 1, .. }));
    assert!(err.to_string().contains("materials_000.wmo"));
}

#[test]
fn added_material_is_counted_on_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("count.wmo");
    let mut container = with_groups(1);
    container.add_material(MomtEntry::default());
    container.root.materials.push(MomtEntry::default());
    container.save(&path).unwrap();

    let loaded = WmoContainer::load(&path).unwrap();
    assert_eq!(loaded.root.header.n_materials, 3);
    assert_eq!(loaded.root.materials.len(), 3);
}

#[test]
fn saving_requires_a_group_per_mogi_entry() {
    let mut container = with_groups(2);
    container.groups.pop();
    let err = container.save(Path::new("unused.wmo")).unwrap_err();
    assert!(matches!(err.kind(), WowDataError::MalformedSibling { .. }));
}
