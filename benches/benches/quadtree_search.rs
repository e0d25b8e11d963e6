// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use understory_quadtree::{QuadTreeInts, QuadTreeXys, Rect};

fn gen_uniform_points(count: usize, extent: f32) -> Vec<(f32, f32)> {
    let mut rng = StdRng::seed_from_u64(0xCAFE_F00D_DEAD_BEEF);
    (0..count)
        .map(|_| (rng.random_range(0.0..extent), rng.random_range(0.0..extent)))
        .collect()
}

fn gen_clustered_points(n_clusters: usize, per_cluster: usize, spread: f32) -> Vec<(f32, f32)> {
    let mut rng = StdRng::seed_from_u64(0xC1A5_7E55_9999_ABCD);
    let mut out = Vec::with_capacity(n_clusters * per_cluster);
    for _ in 0..n_clusters {
        let cx: f32 = rng.random_range(0.0..2000.0);
        let cy: f32 = rng.random_range(0.0..2000.0);
        for _ in 0..per_cluster {
            let dx = (rng.random::<f32>() - 0.5) * spread;
            let dy = (rng.random::<f32>() - 0.5) * spread;
            out.push((cx + dx, cy + dy));
        }
    }
    out
}

/// Points snapped to a coarse lattice, so most coordinates are shared.
fn gen_lattice_points(count: usize, side: u16) -> Vec<(f32, f32)> {
    let mut rng = StdRng::seed_from_u64(0xBADC_F00D_1234_5678);
    (0..count)
        .map(|_| {
            (
                f32::from(rng.random_range(0..side)),
                f32::from(rng.random_range(0..side)),
            )
        })
        .collect()
}

fn query_rects(count: usize, extent: f32, size: f32) -> Vec<Rect<f32>> {
    let mut rng = StdRng::seed_from_u64(0xFACE_FEED_CAFE_BABE);
    (0..count)
        .map(|_| {
            let x: f32 = rng.random_range(0.0..extent - size);
            let y: f32 = rng.random_range(0.0..extent - size);
            Rect::new(x, y, x + size, y + size)
        })
        .collect()
}

fn bench_ints_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("ints_build");
    for &n in &[1_000_usize, 10_000, 100_000] {
        let points = gen_uniform_points(n, 2000.0);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("uniform_n{n}"), |b| {
            b.iter_batched(
                || {
                    QuadTreeInts::new(
                        64,
                        (
                            |i: u32| points[i as usize].0,
                            |i: u32| points[i as usize].1,
                        ),
                    )
                },
                |mut tree| {
                    for i in 0..n as u32 {
                        tree.add(i);
                    }
                    black_box(tree.tree().leaf_count());
                },
                BatchSize::SmallInput,
            );
        });
    }
    let points = gen_lattice_points(50_000, 16);
    group.bench_function("lattice_duplicates", |b| {
        b.iter_batched(
            || {
                QuadTreeInts::new(
                    64,
                    (
                        |i: u32| points[i as usize].0,
                        |i: u32| points[i as usize].1,
                    ),
                )
            },
            |mut tree| {
                for i in 0..points.len() as u32 {
                    tree.add(i);
                }
                black_box(tree.tree().leaf_count());
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_ints_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("ints_query");
    for (name, points) in [
        ("uniform", gen_uniform_points(50_000, 2000.0)),
        ("clustered", gen_clustered_points(32, 1_500, 120.0)),
    ] {
        let mut tree = QuadTreeInts::new(
            64,
            (
                |i: u32| points[i as usize].0,
                |i: u32| points[i as usize].1,
            ),
        );
        for i in 0..points.len() as u32 {
            tree.add(i);
        }
        let rects = query_rects(256, 2000.0, 150.0);

        group.bench_function(format!("{name}_quadtree"), |b| {
            let mut out = Vec::new();
            b.iter(|| {
                let mut total = 0_usize;
                for &r in &rects {
                    out.clear();
                    total += tree.search_into(r, &mut out);
                }
                black_box(total)
            });
        });
        group.bench_function(format!("{name}_linear_scan"), |b| {
            b.iter(|| {
                let mut total = 0_usize;
                for r in &rects {
                    total += points
                        .iter()
                        .filter(|&&(x, y)| r.contains_point(x, y))
                        .count();
                }
                black_box(total)
            });
        });
    }
    group.finish();
}

fn bench_xys_i64_intervals(c: &mut Criterion) {
    let mut group = c.benchmark_group("xys_i64_intervals");
    let mut rng = StdRng::seed_from_u64(42);
    let intervals: Vec<(i64, i64)> = (0..20_000)
        .map(|_| {
            let start = rng.random_range(0_i64..1_000_000);
            (start, start + rng.random_range(0_i64..5_000))
        })
        .collect();
    let mut tree: QuadTreeXys<(i64, i64), i64> = QuadTreeXys::new(32);
    for &iv in &intervals {
        tree.add(iv);
    }
    group.bench_function("overlapping_window", |b| {
        let mut out = Vec::new();
        b.iter(|| {
            let mut total = 0_usize;
            for q in 0..128_i64 {
                let lo = q * 7_000;
                out.clear();
                total += tree.search_into(Rect::new(i64::MIN, lo, lo + 2_000, i64::MAX), &mut out);
            }
            black_box(total)
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_ints_build,
    bench_ints_query,
    bench_xys_i64_intervals
);
criterion_main!(benches);
