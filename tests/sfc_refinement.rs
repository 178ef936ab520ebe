//! Integration tests for the Sierpinski-curve uniform refiner.
//!
//! - Uniform refinement of a square matches an independent Delaunay triangulation
//! - Border shrinking and hole carving against a signed distance function
//! - Level cap, fixed points and curve-ordered storage

#![forbid(unsafe_code)]

use std::sync::Arc;

use approx::assert_relative_eq;
use sfc_mesh::prelude::*;

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

fn config(bound: BoundingBox<f64>, min_edge_length: f64) -> RefinerConfig<f64> {
    RefinerConfigBuilder::default()
        .bound(bound)
        .min_edge_length(min_edge_length)
        .build()
        .unwrap()
}

// =============================================================================
// UNIFORM SQUARE
// =============================================================================

#[test]
fn test_square_refinement_matches_delaunay_of_its_vertices() {
    init_tracing();
    let bound = BoundingBox::from_bounds([0.0, 0.0], [10.0, 10.0]);
    let mut refiner = SfcUniformRefiner::new(
        config(bound, 1.0),
        rectangle(bound),
        uniform_edge_length(1.0),
        BaseLocator::new(),
    )
    .unwrap();
    let levels = refiner.refine().unwrap();
    assert_eq!(refiner.state(), RefinerState::RefinementFinished);
    // Eight levels split edges; the ninth finds nothing left to do.
    assert_eq!(levels, 9);

    let shared = refiner.triangulation();
    let points: Vec<Point<f64>> = {
        let triangulation = shared.read().unwrap();
        let mesh = triangulation.mesh();
        assert_eq!(mesh.number_of_faces(), 512);
        assert_eq!(mesh.number_of_vertices(), 289);
        for e in mesh.edges() {
            assert!(mesh.edge_length(e).unwrap() <= 1.0);
        }
        refiner.curve().validate(mesh).unwrap();
        let stats = triangulation.statistics().unwrap();
        assert_relative_eq!(stats.min_angle, std::f64::consts::FRAC_PI_4, epsilon = 1e-9);
        assert_relative_eq!(stats.max_edge_length, 10.0 / 16.0 * 2.0_f64.sqrt(), epsilon = 1e-9);
        triangulation.points().copied().collect()
    };

    let vertex_bound = BoundingBox::from_points(points.iter()).unwrap();
    let independent_config =
        TriangulationConfig::new(vertex_bound).with_super_structure(SuperStructure::Retained);
    let mut independent =
        IncrementalTriangulation::new(independent_config, BaseLocator::new()).unwrap();
    // The four corners already exist in the retained square.
    assert_eq!(independent.insert_all(points).unwrap(), 285);
    independent.finalize().unwrap();
    independent.validate_delaunay().unwrap();
    assert_eq!(independent.mesh().number_of_faces(), 512);
}

#[test]
fn test_generate_lays_out_faces_in_curve_order() {
    let bound = BoundingBox::from_bounds([0.0, 0.0], [4.0, 4.0]);
    let mut refiner = SfcUniformRefiner::new(
        config(bound, 1.0),
        rectangle(bound),
        uniform_edge_length(1.0),
        DelaunayTree::new(),
    )
    .unwrap();
    refiner.refine().unwrap();
    let centroids: Vec<Point<f64>> = {
        let shared = refiner.triangulation();
        let triangulation = shared.read().unwrap();
        let mesh = triangulation.mesh();
        refiner
            .curve()
            .faces(mesh)
            .unwrap()
            .into_iter()
            .map(|f| mesh.to_triangle(f).unwrap().centroid())
            .collect()
    };

    let shared = refiner.generate().unwrap();
    assert_eq!(refiner.state(), RefinerState::Finished);
    let triangulation = shared.read().unwrap();
    let stored: Vec<Point<f64>> = triangulation
        .faces()
        .map(|f| triangulation.to_triangle(f).unwrap().centroid())
        .collect();
    assert_eq!(stored.len(), centroids.len());
    for (a, b) in stored.iter().zip(&centroids) {
        assert!(a.distance(b) < 1e-12);
    }
    // Consecutive faces along the curve share an edge, so their centroids stay close.
    for pair in stored.windows(2) {
        assert!(pair[0].distance(&pair[1]) < 1.0);
    }
    triangulation.validate().unwrap();
}

#[test]
fn test_level_cap_stops_refinement() {
    let bound = BoundingBox::from_bounds([0.0, 0.0], [10.0, 10.0]);
    let config = RefinerConfigBuilder::default()
        .bound(bound)
        .max_levels(3)
        .build()
        .unwrap();
    let mut refiner = SfcUniformRefiner::new(
        config,
        rectangle(bound),
        uniform_edge_length(1.0),
        BaseLocator::new(),
    )
    .unwrap();
    assert_eq!(refiner.refine().unwrap(), 3);
    assert_eq!(refiner.state(), RefinerState::RefinementFinished);
    assert_eq!(refiner.curve().len(), 16);
}

#[test]
fn test_step_walks_the_state_machine() {
    let bound = BoundingBox::from_bounds([0.0, 0.0], [2.0, 2.0]);
    let mut refiner = SfcUniformRefiner::new(
        config(bound, 1.0),
        rectangle(bound),
        uniform_edge_length(1.0),
        BaseLocator::new(),
    )
    .unwrap();
    let mut states = vec![refiner.state()];
    while refiner.state() != RefinerState::Finished {
        states.push(refiner.step().unwrap());
    }
    assert_eq!(states.first(), Some(&RefinerState::Initialized));
    assert!(states.contains(&RefinerState::Refining));
    assert!(states.contains(&RefinerState::RefinementFinished));
    assert_eq!(refiner.step().unwrap(), RefinerState::Finished);
}

// =============================================================================
// DOMAINS
// =============================================================================

#[test]
fn test_rectangle_with_circular_hole() {
    init_tracing();
    let bound = BoundingBox::from_bounds([0.0, 0.0], [12.0, 6.0]);
    let center = Point::new([6.0, 3.0]);
    let domain = difference(rectangle(bound), circle(center, 1.5));
    let mut refiner =
        SfcUniformRefiner::new(config(bound, 0.5), domain, uniform_edge_length(1.0), DelaunayTree::new())
            .unwrap();
    let shared = refiner.generate().unwrap();
    let triangulation = shared.read().unwrap();
    let mesh = triangulation.mesh();

    assert_eq!(refiner.hole_faces().len(), 1);
    assert_eq!(mesh.number_of_holes(), 1);
    for f in triangulation.faces() {
        let c = triangulation.to_triangle(f).unwrap().centroid();
        assert!(c.y() <= 6.0);
        assert!(c.distance(&center) >= 1.5);
    }
    let hole_edges = mesh.face_edges(refiner.hole_faces()[0]).unwrap();
    assert!(hole_edges.len() > 3);
    for e in hole_edges {
        let mid = mesh.midpoint(e).unwrap();
        assert!(mid.distance(&center) < 2.5);
    }
    triangulation.validate().unwrap();
    let stats = triangulation.statistics().unwrap();
    assert!(stats.max_edge_length <= 0.5 + 1e-12);
    assert_eq!(stats.degenerate_faces, 0);
}

#[test]
fn test_fixed_points_and_obstacles() {
    let bound = BoundingBox::from_bounds([0.0, 0.0], [8.0, 8.0]);
    let fixed = vec![Point::new([2.2, 5.9]), Point::new([7.0, 1.0])];
    let obstacle = Polygon::rectangle(&BoundingBox::from_bounds([0.0, 0.0], [4.0, 4.0]));
    let mut refiner = SfcUniformRefiner::new(
        config(bound, 0.5),
        rectangle(bound),
        uniform_edge_length(1.0),
        BaseLocator::new(),
    )
    .unwrap()
    .with_obstacles(vec![Box::new(obstacle)])
    .with_fixed_points(fixed.clone());

    let shared = refiner.generate().unwrap();
    let readers: Vec<_> = (0..2).map(|_| Arc::clone(&shared)).collect();
    for reader in readers {
        let triangulation = reader.read().unwrap();
        for p in &fixed {
            assert!(triangulation.points().any(|q| q.distance(p) < 1e-12));
        }
        triangulation.validate().unwrap();
    }
}
