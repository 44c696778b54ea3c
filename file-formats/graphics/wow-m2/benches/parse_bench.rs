use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use wow_data::prelude::*;
use wow_m2::M2Model;
use wow_m2::chunks::{M2Bone, M2Sequence, M2SequenceTiming, M2Vertex};

fn create_test_model() -> M2Model {
    let version = ClientVersion::WotLK;
    let mut model = M2Model::new(version, "BenchModel");
    model.global_sequences = vec![0, 100, 200];
    for i in 0..16 {
        model.sequences.push(M2Sequence {
            animation_id: i,
            timing: M2SequenceTiming::for_version(version, 1000),
            ..M2Sequence::default()
        });
    }
    for i in 0..32 {
        model
            .bones
            .push(M2Bone::new(version, C3Vector::new(i as f32, 0.0, 0.0)));
    }
    model.vertices = (0..4096)
        .map(|i| {
            M2Vertex::rigid(
                C3Vector::new(i as f32, 0.0, 0.0),
                C3Vector::new(0.0, 0.0, 1.0),
                C2Vector::default(),
            )
        })
        .collect();
    model
}

fn bench_model_parse(c: &mut Criterion) {
    let data = create_test_model().to_bytes(ClientVersion::WotLK).unwrap();

    c.bench_function("parse_model", |b| {
        b.iter(|| M2Model::from_bytes(black_box(&data), ClientVersion::WotLK).unwrap())
    });
}

fn bench_model_write(c: &mut Criterion) {
    let model = create_test_model();

    c.bench_function("write_model", |b| {
        b.iter(|| black_box(&model).to_bytes(ClientVersion::WotLK).unwrap())
    });
}

criterion_group!(benches, bench_model_parse, bench_model_write);
criterion_main!(benches);
