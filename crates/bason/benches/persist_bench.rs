//! Criterion benchmarks for encoding and merge-decoding configurations.
//!
//! Run with:
//! ```bash
//! cargo bench --package bason --bench persist_bench
//! ```

use std::collections::BTreeMap;

use bason::codec::merge_decode;
use bason::{Configuration, JsonCodec, Persist};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Persist)]
struct BenchConfig {
    enabled: bool,
    retries: u32,
    ratio: f64,
    name: String,
    tags: Vec<String>,
    limits: BTreeMap<String, u64>,
}

impl Configuration for BenchConfig {
    fn init(&mut self) {
        self.enabled = true;
        self.retries = 3;
        self.ratio = 0.75;
        self.name = "bench".to_string();
        self.tags = (0..16).map(|i| format!("tag-{i}")).collect();
        self.limits = (0..16).map(|i| (format!("limit-{i}"), i * 1000)).collect();
    }
}

fn make_config() -> BenchConfig {
    let mut config = BenchConfig::default();
    config.init();
    config
}

fn bench_encode(c: &mut Criterion) {
    let config = make_config();
    let mut group = c.benchmark_group("encode");
    for (label, codec) in [
        ("pretty", JsonCodec::default()),
        ("compact", JsonCodec::new().pretty(false)),
        ("html_safe", JsonCodec::new().escape_html(true)),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(label), &codec, |b, codec| {
            b.iter(|| codec.to_string(black_box(&config)).expect("encode"))
        });
    }
    group.finish();
}

fn bench_merge_decode(c: &mut Criterion) {
    let codec = JsonCodec::default();
    let document = codec.to_value(&make_config()).expect("encode");

    c.bench_function("merge_decode/full_document", |b| {
        b.iter(|| {
            let mut live = make_config();
            merge_decode(&mut live, black_box(document.clone())).expect("merge")
        })
    });

    let partial = serde_json::json!({ "retries": 9, "name": "partial" });
    c.bench_function("merge_decode/partial_document", |b| {
        b.iter(|| {
            let mut live = make_config();
            merge_decode(&mut live, black_box(partial.clone())).expect("merge")
        })
    });
}

criterion_group!(benches, bench_encode, bench_merge_decode);
criterion_main!(benches);
