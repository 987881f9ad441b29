//! # Object Pool Benchmark
//!
//! ARCHITECT'S REQUIREMENTS:
//! - 10,000 pooled objects churning per frame
//! - Purge is one compaction pass, no per-object allocation
//!
//! Run with: `cargo bench --package basilisk_core`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use basilisk_core::{Pool, PoolHeader, Poolable};

const POOL_SIZE: usize = 10_000;

struct Body {
    header: PoolHeader,
    position: [f32; 3],
}

impl Body {
    fn new(i: usize) -> Self {
        Self {
            header: PoolHeader::new(),
            position: [i as f32, 0.0, 0.0],
        }
    }
}

impl Poolable for Body {
    fn header(&self) -> &PoolHeader {
        &self.header
    }
    fn header_mut(&mut self) -> &mut PoolHeader {
        &mut self.header
    }
}

/// Benchmark: stage and purge a full pool's worth of births.
fn bench_create_purge(c: &mut Criterion) {
    c.bench_function("pool_create_purge_10k", |b| {
        b.iter(|| {
            let mut pool: Pool<Body> = Pool::with_capacity(POOL_SIZE);
            for i in 0..POOL_SIZE {
                black_box(pool.create(Body::new(i)));
            }
            pool.purge();
            pool.len()
        });
    });
}

/// Benchmark: one frame of churn - release a third, respawn a third, purge.
fn bench_churn(c: &mut Criterion) {
    c.bench_function("pool_churn_third_10k", |b| {
        let mut pool: Pool<Body> = Pool::with_capacity(POOL_SIZE);
        let mut handles = Vec::with_capacity(POOL_SIZE);
        for i in 0..POOL_SIZE {
            handles.push(pool.create(Body::new(i)).unwrap());
        }
        pool.purge();

        b.iter(|| {
            let mut respawned = Vec::with_capacity(POOL_SIZE / 3);
            for (i, &handle) in handles.iter().enumerate() {
                if i % 3 == 0 {
                    pool.release(handle);
                }
            }
            pool.purge();
            for i in 0..POOL_SIZE / 3 {
                if let Some(h) = pool.create(Body::new(i)) {
                    respawned.push(h);
                }
            }
            pool.purge();

            let mut kept: Vec<_> = handles
                .iter()
                .enumerate()
                .filter(|(i, _)| i % 3 != 0)
                .map(|(_, &h)| h)
                .collect();
            kept.extend(respawned);
            handles = kept;
            pool.len()
        });
    });
}

/// Benchmark: dense iteration over a full pool.
fn bench_iterate(c: &mut Criterion) {
    let mut pool: Pool<Body> = Pool::with_capacity(POOL_SIZE);
    for i in 0..POOL_SIZE {
        pool.create(Body::new(i));
    }
    pool.purge();

    c.bench_function("pool_iterate_10k", |b| {
        b.iter(|| {
            let sum: f32 = pool.iter().map(|body| body.position[0]).sum();
            black_box(sum)
        });
    });
}

criterion_group!(benches, bench_create_purge, bench_churn, bench_iterate);
criterion_main!(benches);
