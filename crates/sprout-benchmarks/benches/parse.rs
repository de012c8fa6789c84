//! Catalog and version parsing performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sprout_benchmarks::{criterion_config, layered_catalog};
use sprout_config::catalog::parse_json;
use sprout_core::types::{Version, VersionReq};

fn bench_catalog_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_json");

    for size in [10, 100, 1000] {
        let content = serde_json::to_string(&layered_catalog(size)).unwrap();
        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::new("tools", size), &content, |b, content| {
            b.iter(|| black_box(parse_json(content, "bench.json").unwrap()));
        });
    }

    group.finish();
}

fn bench_version_parsing(c: &mut Criterion) {
    let versions = ["1.0.0", "18.19.0", "3.12.1", "2.0.0-rc.1", "0.9.14+build.7"];
    let requirements = [">=18", "16.x", "^3.8", "~1.2.3", ">=1.0.0, <2.0.0", "1.0.0 - 1.4.0", "*"];

    c.bench_function("version_parse", |b| {
        b.iter(|| {
            for version in versions {
                black_box(version.parse::<Version>().unwrap());
            }
        })
    });

    c.bench_function("version_req_parse", |b| {
        b.iter(|| {
            for requirement in requirements {
                black_box(VersionReq::parse(requirement).unwrap());
            }
        })
    });

    let parsed: Vec<VersionReq> = requirements.iter().map(|r| VersionReq::parse(r).unwrap()).collect();
    let candidate = Version::new(18, 19, 0);
    c.bench_function("version_req_matches", |b| {
        b.iter(|| parsed.iter().filter(|req| req.matches(black_box(&candidate))).count())
    });
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_catalog_json, bench_version_parsing
}
criterion_main!(benches);
