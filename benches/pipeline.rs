//! Benchmarks for address classification and the line pipeline.

use cdnfilter::pipeline;
use cdnfilter::providers::builtin_providers;
use cdnfilter::{Classifier, RangeClassifier};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::net::{IpAddr, Ipv4Addr};

/// Spread addresses over the whole IPv4 space so some land in provider ranges
fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count as u32)
        .map(|i| IpAddr::V4(Ipv4Addr::from(i.wrapping_mul(2_654_435_761))))
        .collect()
}

/// Input text mixing addresses, blank lines and garbage
fn generate_input(count: usize) -> String {
    let mut input = String::new();
    for (i, ip) in generate_ips(count).into_iter().enumerate() {
        match i % 50 {
            0 => input.push_str("not-an-ip\n"),
            1 => input.push('\n'),
            _ => {
                input.push_str(&ip.to_string());
                input.push('\n');
            }
        }
    }
    input
}

fn bench_classify(c: &mut Criterion) {
    let classifier = RangeClassifier::from_snapshots(&builtin_providers()).unwrap();
    let ips = generate_ips(10_000);

    let mut group = c.benchmark_group("classify");
    group.throughput(Throughput::Elements(ips.len() as u64));
    group.bench_function("check_cdn", |b| {
        b.iter(|| {
            for ip in &ips {
                let _ = black_box(classifier.check_cdn(*ip));
            }
        })
    });
    group.bench_function("check_waf", |b| {
        b.iter(|| {
            for ip in &ips {
                let _ = black_box(classifier.check_waf(*ip));
            }
        })
    });
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let classifier = RangeClassifier::from_snapshots(&builtin_providers()).unwrap();

    let mut group = c.benchmark_group("pipeline");
    for size in [1_000, 10_000, 100_000] {
        let input = generate_input(size);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("run", size), &input, |b, input| {
            b.iter(|| {
                let mut out = Vec::with_capacity(input.len());
                pipeline::run(input.as_bytes(), &mut out, &classifier).unwrap();
                black_box(out)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_classify, bench_pipeline);
criterion_main!(benches);
