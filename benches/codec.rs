#![allow(clippy::unwrap_used)]

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

use inplace_cbor::{validate, Codec, DecodeLimits, Value};

fn sample_medium() -> Vec<u8> {
    let keys: Vec<String> = (0..64).map(|i| format!("k{i:03}")).collect();
    let entries = keys
        .iter()
        .enumerate()
        .map(|(i, k)| (Value::from(k.as_str()), Value::array([i as u64, 1, 2])));
    let mut codec = Codec::new(Vec::new());
    codec.push(Value::map(entries)).unwrap();
    codec.into_inner()
}

fn bench_read(c: &mut Criterion) {
    let medium = sample_medium();
    let limits = DecodeLimits::for_bytes(medium.len());

    c.bench_function("validate_medium", |b| {
        b.iter(|| {
            validate(black_box(&medium[..]), limits).unwrap();
        })
    });

    let codec = Codec::new(&medium[..]);
    c.bench_function("map_lookup_last_key", |b| {
        b.iter(|| {
            let map = codec.map(codec.begin()).unwrap();
            black_box(map.get(black_box("k063")).unwrap());
        })
    });
}

fn bench_edit(c: &mut Criterion) {
    c.bench_function("array_push_64", |b| {
        b.iter(|| {
            let mut codec = Codec::new(Vec::new());
            codec.push(Value::Array(Vec::new())).unwrap();
            let mut array = codec.array_mut(codec.begin()).unwrap();
            for i in 0..64u32 {
                array.push(i).unwrap();
            }
            black_box(codec.into_inner());
        })
    });

    let medium = sample_medium();
    c.bench_function("map_replace_value", |b| {
        b.iter(|| {
            let mut codec = Codec::new(medium.clone());
            let mut map = codec.map_mut(codec.begin()).unwrap();
            map.get_mut("k032").unwrap().unwrap().set("replaced").unwrap();
            black_box(codec.into_inner());
        })
    });
}

criterion_group!(benches, bench_read, bench_edit);
criterion_main!(benches);
