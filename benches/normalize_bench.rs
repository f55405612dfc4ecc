// benches/normalize_bench.rs
//! Benchmarks for markdown body normalization.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use confluence2md::{flatten_inline, normalize_block};

/// Create a sample markdown body mixing prose, lists, links, and fences.
fn create_sample_body(sections: usize) -> String {
    let mut body = String::new();
    for i in 0..sections {
        body.push_str(&format!("# Section {i}\r\n\r\n"));
        body.push_str("Some prose with a [link] ( https://example.com ) inside.\n\n\n\n");
        body.push_str(" - item one\n   - nested item\n      - deeper item\n\n");
        body.push_str("```rust\n\nfn demo() {\n\n\n    todo()\n}\n\n```\n\n");
        body.push_str("Closing paragraph\twith a tab.\n\n");
    }
    body
}

fn bench_normalize_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_block");
    for sections in [1usize, 16, 128] {
        let body = create_sample_body(sections);
        group.bench_with_input(
            BenchmarkId::from_parameter(sections),
            &body,
            |b, body| b.iter(|| normalize_block(black_box(body))),
        );
    }
    group.finish();
}

fn bench_flatten_inline(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten_inline");
    for sections in [1usize, 16, 128] {
        let body = create_sample_body(sections);
        group.bench_with_input(
            BenchmarkId::from_parameter(sections),
            &body,
            |b, body| b.iter(|| flatten_inline(black_box(body))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_normalize_block, bench_flatten_inline);
criterion_main!(benches);
