use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use wow_adt::Adt;
use wow_adt::chunks::{MclyFlags, MclyLayer};

fn create_test_tile() -> Vec<u8> {
    let mut adt = Adt::flat();
    let grass = adt.add_texture("terrain/grass.blp");
    let dirt = adt.add_texture("terrain/dirt.blp");
    for chunk in &mut adt.chunks {
        chunk.layers = Some(vec![
            MclyLayer {
                texture_id: grass,
                ..MclyLayer::default()
            },
            MclyLayer {
                texture_id: dirt,
                flags: MclyFlags {
                    value: MclyFlags::USE_ALPHA_MAP,
                },
                ..MclyLayer::default()
            },
        ]);
        chunk.alpha = Some(vec![0x80; 2048]);
    }
    adt.to_bytes().unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let data = create_test_tile();
    let mut group = c.benchmark_group("adt");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("parse_tile", |b| b.iter(|| Adt::from_bytes(black_box(&data)).unwrap()));

    let adt = Adt::from_bytes(&data).unwrap();
    group.bench_function("write_tile", |b| b.iter(|| black_box(&adt).to_bytes().unwrap()));
    group.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
