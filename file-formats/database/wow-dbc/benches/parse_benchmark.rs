use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use wow_data::schema::{Bindings, Context, Value, layout};
use wow_data::version::ClientVersion;
use wow_dbc::{DbcTable, schemas};

fn animation_table() -> DbcTable {
    let schema = schemas::animation_data().unwrap();
    let rows = layout(&schema, &Bindings::new(), Context::new(ClientVersion::WotLK)).unwrap();
    let mut table = DbcTable::new(rows);
    for id in 0..512u32 {
        let mut values = vec![Value::U32(id), Value::String(format!("Anim{}", id % 64))];
        values.extend((0..6).map(|_| Value::U32(0)));
        table.push_values(values).unwrap();
    }
    table
}

fn bench_parse(c: &mut Criterion) {
    let table = animation_table();
    let bytes = table.to_bytes().unwrap();
    let rows = table.layout().clone();

    c.bench_function("parse_table", |b| {
        b.iter(|| DbcTable::from_bytes(black_box(&bytes), rows.clone()).unwrap())
    });
}

fn bench_write(c: &mut Criterion) {
    let table = animation_table();

    c.bench_function("write_table", |b| {
        b.iter(|| black_box(&table).to_bytes().unwrap())
    });
}

criterion_group!(benches, bench_parse, bench_write);
criterion_main!(benches);
