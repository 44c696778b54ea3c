use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use wow_data::primitives::{C2Vector, C3Vector};
use wow_wmo::chunks::{MobaEntry, MomtEntry, MopyEntry};
use wow_wmo::{WmoGroup, WmoRoot};

fn sample_root() -> WmoRoot {
    let mut root = WmoRoot::new();
    for i in 0..32 {
        let texture = root.add_texture(&format!("textures\\wall_{i:02}.blp"));
        root.add_material(MomtEntry {
            texture_1: texture,
            ..MomtEntry::default()
        });
    }
    root
}

fn sample_group(side: u16) -> WmoGroup {
    let mut group = WmoGroup::default();
    for y in 0..side {
        for x in 0..side {
            group.vertices.push(C3Vector::new(f32::from(x), f32::from(y), 0.0));
            group.normals.push(C3Vector::new(0.0, 0.0, 1.0));
            group.tex_coords.push(C2Vector::new(f32::from(x), f32::from(y)));
        }
    }
    for y in 0..side - 1 {
        for x in 0..side - 1 {
            let i = y * side + x;
            group.indices.extend([i, i + 1, i + side]);
            group.triangle_materials.push(MopyEntry {
                flags: 0x20,
                material_id: 0,
            });
        }
    }
    group.batches.push(MobaEntry {
        index_count: group.indices.len() as u16,
        max_index: (group.vertices.len() - 1) as u16,
        ..MobaEntry::default()
    });
    group
}

fn bench_root(c: &mut Criterion) {
    let bytes = sample_root().to_bytes().unwrap();
    c.bench_function("root_read", |b| {
        b.iter(|| WmoRoot::from_bytes(black_box(&bytes)).unwrap())
    });
}

fn bench_group(c: &mut Criterion) {
    let group = sample_group(100);
    let bytes = group.to_bytes().unwrap();
    c.bench_function("group_read", |b| {
        b.iter(|| WmoGroup::from_bytes(black_box(&bytes)).unwrap())
    });
    c.bench_function("group_write", |b| b.iter(|| black_box(&group).to_bytes().unwrap()));
}

criterion_group!(benches, bench_root, bench_group);
criterion_main!(benches);
