//! CI Performance Suite - performance regression testing for CI/CD
//!
//! This benchmark covers the hot paths of the library in one CI-sized suite:
//!
//! 1. Incremental insertion with each locator strategy at a few scales
//! 2. Uniform SFC refinement of a square, with and without a hole
//!
//! Inputs are generated from fixed seeds outside the measured loop so runs are
//! comparable across commits.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sfc_mesh::core::triangulation::{IncrementalTriangulation, TriangulationConfig};
use sfc_mesh::core::algorithms::locate::{BaseLocator, LocatorKind};
use sfc_mesh::geometry::distance::{circle, difference, rectangle, uniform_edge_length};
use sfc_mesh::geometry::point::Point;
use sfc_mesh::geometry::util::{BoundingBox, generate_random_points_seeded};
use sfc_mesh::refinement::config::RefinerConfigBuilder;
use sfc_mesh::refinement::uniform::SfcUniformRefiner;
use std::hint::black_box;

/// Point counts used by the insertion benchmarks
const COUNTS: &[usize] = &[100, 1_000, 5_000];

/// Target edge lengths used by the refinement benchmarks
const EDGE_LENGTHS: &[f64] = &[1.0, 0.5, 0.25];

fn bench_insertion(c: &mut Criterion) {
    let bound = BoundingBox::from_bounds([0.0, 0.0], [100.0, 100.0]);
    let mut group = c.benchmark_group("insertion");
    group.sample_size(20);

    for &count in COUNTS {
        let points: Vec<Point<f64>> =
            generate_random_points_seeded(count, (0.0, 100.0), 42_u64.wrapping_add(count as u64))
                .expect("generate_random_points_seeded failed");
        group.throughput(Throughput::Elements(count as u64));

        for (name, kind) in [
            ("base", LocatorKind::Base),
            ("delaunay_tree", LocatorKind::DelaunayTree),
        ] {
            group.bench_with_input(BenchmarkId::new(name, count), &points, |b, points| {
                b.iter(|| {
                    let mut triangulation = IncrementalTriangulation::with_locator_kind(
                        TriangulationConfig::new(bound),
                        kind,
                    )
                    .expect("triangulation setup failed");
                    triangulation
                        .insert_all(points.iter().copied())
                        .expect("insertion failed");
                    black_box(triangulation.mesh().number_of_faces())
                });
            });
        }
    }
    group.finish();
}

fn bench_refinement(c: &mut Criterion) {
    let bound = BoundingBox::from_bounds([0.0, 0.0], [10.0, 10.0]);
    let mut group = c.benchmark_group("sfc_refinement");
    group.sample_size(10);

    for &edge_length in EDGE_LENGTHS {
        let config = RefinerConfigBuilder::default()
            .bound(bound)
            .min_edge_length(edge_length)
            .build()
            .expect("refiner config failed");

        group.bench_with_input(
            BenchmarkId::new("square", edge_length),
            &config,
            |b, &config| {
                b.iter(|| {
                    let mut refiner = SfcUniformRefiner::new(
                        config,
                        rectangle(bound),
                        uniform_edge_length(1.0),
                        BaseLocator::new(),
                    )
                    .expect("refiner setup failed");
                    black_box(refiner.generate().expect("refinement failed"))
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("square_with_hole", edge_length),
            &config,
            |b, &config| {
                b.iter(|| {
                    let domain =
                        difference(rectangle(bound), circle(Point::new([5.0, 5.0]), 2.0));
                    let mut refiner = SfcUniformRefiner::new(
                        config,
                        domain,
                        uniform_edge_length(1.0),
                        BaseLocator::new(),
                    )
                    .expect("refiner setup failed");
                    black_box(refiner.generate().expect("refinement failed"))
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_insertion, bench_refinement
);
criterion_main!(benches);
