use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ip2loc::{
    CachedSource, Database, FieldKind, InstancePool, LookupSource, QueryMask, SerializedAccess,
};
use std::hint::black_box;
use std::sync::Arc;

#[path = "../tests/common/mod.rs"]
mod common;

use common::Fixture;

const ROWS: u32 = 50_000;

fn tag(i: u32) -> String {
    let hi = (b'A' + ((i / 26) % 26) as u8) as char;
    let lo = (b'A' + (i % 26) as u8) as char;
    format!("{}{}", hi, lo)
}

/// Schema 11 database with `ROWS` evenly spaced IPv4 ranges
fn build_db(index: bool) -> Vec<u8> {
    let step = u32::MAX / ROWS;
    let tags: Vec<String> = (0..ROWS).map(tag).collect();
    let rows: Vec<(u32, &str)> = (0..ROWS)
        .map(|i| (i * step, tags[i as usize].as_str()))
        .collect();
    Fixture::new(11).ipv4(&rows).with_index(index).build()
}

/// Deterministic spread of query addresses
fn queries(count: usize) -> Vec<String> {
    let mut state = 0x9E37_79B9u32;
    (0..count)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            std::net::Ipv4Addr::from(state).to_string()
        })
        .collect()
}

fn bench_direct(c: &mut Criterion) {
    let mut group = c.benchmark_group("direct_lookup");
    let ips = queries(1000);
    group.throughput(Throughput::Elements(ips.len() as u64));

    for index in [true, false] {
        let db = Database::open(build_db(index)).unwrap();
        let label = if index { "indexed" } else { "full_search" };

        group.bench_with_input(BenchmarkId::new("all_fields", label), &ips, |b, ips| {
            b.iter(|| {
                for ip in ips {
                    black_box(db.query(ip, QueryMask::ALL).unwrap());
                }
            });
        });

        let mask = QueryMask::of(FieldKind::CountryCode);
        group.bench_with_input(BenchmarkId::new("country_only", label), &ips, |b, ips| {
            b.iter(|| {
                for ip in ips {
                    black_box(db.query(ip, mask).unwrap());
                }
            });
        });
    }

    group.finish();
}

/// Cache overhead at different hit rates
fn bench_cached(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_lookup");
    let total = 10_000usize;
    let bytes = Arc::new(build_db(true));
    group.throughput(Throughput::Elements(total as u64));

    for hit_rate in [0usize, 50, 90, 99] {
        let unique = if hit_rate == 0 {
            total
        } else {
            (total * (100 - hit_rate)) / 100
        };
        let pool = queries(unique.max(1));
        let ips: Vec<&String> = (0..total).map(|i| &pool[i % pool.len()]).collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}%_hits", hit_rate)),
            &ips,
            |b, ips| {
                b.iter_batched(
                    || CachedSource::new(Database::open(Arc::clone(&bytes)).unwrap(), 10_000),
                    |cached| {
                        for ip in ips {
                            black_box(cached.query(ip, QueryMask::ALL).unwrap());
                        }
                    },
                    criterion::BatchSize::LargeInput,
                );
            },
        );
    }

    group.finish();
}

fn bench_concurrency_wrappers(c: &mut Criterion) {
    let mut group = c.benchmark_group("wrapped_lookup");
    let ips = queries(1000);
    group.throughput(Throughput::Elements(ips.len() as u64));

    let bytes = Arc::new(build_db(true));
    let pool_bytes = Arc::clone(&bytes);
    let pool = InstancePool::new(move || Database::open(Arc::clone(&pool_bytes)));
    group.bench_function("instance_pool", |b| {
        b.iter(|| {
            for ip in &ips {
                black_box(pool.query(ip, QueryMask::ALL).unwrap());
            }
        });
    });

    let serialized = SerializedAccess::new(Database::open(Arc::clone(&bytes)).unwrap()).unwrap();
    group.bench_function("serialized", |b| {
        b.iter(|| {
            for ip in &ips {
                black_box(serialized.query(ip, QueryMask::ALL).unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(benches, bench_direct, bench_cached, bench_concurrency_wrappers);
criterion_main!(benches);
