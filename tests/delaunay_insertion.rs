//! Integration tests for incremental Delaunay insertion.
//!
//! - Corners plus center of a unit square
//! - Insertion exactly on an internal edge
//! - Flipping an illegal diagonal
//! - Locator strategies producing the same mesh
//! - Compaction keeping the locator usable

#![forbid(unsafe_code)]

use sfc_mesh::core::algorithms::legalization::{EdgeLegality, edge_legality, legalize};
use sfc_mesh::core::util::find_delaunay_violations;
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

fn unit_bound() -> BoundingBox<f64> {
    BoundingBox::from_bounds([0.0, 0.0], [1.0, 1.0])
}

// =============================================================================
// BASIC CONFIGURATIONS
// =============================================================================

#[test]
fn test_unit_square_corners_and_center() {
    init_tracing();
    let config = TriangulationConfig::new(unit_bound());
    let mut triangulation = IncrementalTriangulation::new(config, BaseLocator::new()).unwrap();
    let points = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.5, 0.5]].map(Point::new);
    assert_eq!(triangulation.insert_all(points).unwrap(), 5);
    triangulation.finalize().unwrap();

    let mesh = triangulation.mesh();
    assert_eq!(mesh.number_of_faces(), 4);
    assert_eq!(mesh.number_of_vertices(), 5);
    assert!(triangulation.super_vertices().is_empty());
    for e in mesh.edges() {
        assert_ne!(edge_legality(mesh, e).unwrap(), EdgeLegality::Illegal);
    }
    // Every face uses the center.
    let center = mesh
        .vertices()
        .find(|&v| mesh.point(v).unwrap().distance(&Point::new([0.5, 0.5])) < 1e-12)
        .unwrap();
    assert_eq!(mesh.vertex_faces(center).unwrap().len(), 4);
    triangulation.validate().unwrap();
}

#[test]
fn test_point_on_shared_edge() {
    init_tracing();
    let config = TriangulationConfig::new(BoundingBox::from_bounds([0.0, 0.0], [2.0, 2.0]))
        .with_super_structure(SuperStructure::Retained);
    let mut triangulation = IncrementalTriangulation::new(config, BaseLocator::new()).unwrap();
    triangulation.init().unwrap();
    let [a, b] = triangulation.initial_diagonal().unwrap();
    let faces_before = [
        triangulation.mesh().face(a).unwrap(),
        triangulation.mesh().face(b).unwrap(),
    ];

    let into = triangulation.insert(Point::new([1.0, 1.0])).unwrap().unwrap();
    let mesh = triangulation.mesh();
    let v = mesh.vertex(into).unwrap();
    assert_eq!(mesh.number_of_faces(), 4);
    assert_eq!(mesh.vertex_in_edges(v).unwrap().len(), 4);
    // Both original faces survive as parts of the split.
    for f in faces_before {
        assert!(mesh.is_interior(f));
    }
    for e in mesh.vertex_in_edges(v).unwrap() {
        assert_ne!(edge_legality(mesh, e).unwrap(), EdgeLegality::Illegal);
    }
    triangulation.validate().unwrap();
}

#[test]
fn test_flip_replaces_illegal_diagonal() {
    let mut mesh: Mesh<f64> = Mesh::new();
    let square = mesh.create_square(&unit_bound()).unwrap();
    let [c0, c1, c2, c3] = square.corners;
    // Pull the fourth corner into the circumcircle of (c0, c1, c2).
    mesh.set_point(c3, Point::new([0.2, 0.8])).unwrap();
    let e = square.diagonal[0];
    assert_eq!(edge_legality(&mesh, e).unwrap(), EdgeLegality::Illegal);

    let flip = mesh.flip(e).unwrap();
    let ends = [mesh.start_vertex(e).unwrap(), mesh.vertex(e).unwrap()];
    assert!(ends.contains(&c1) && ends.contains(&c3));
    assert!(!ends.contains(&c0) && !ends.contains(&c2));
    for f in flip.faces {
        assert_eq!(mesh.face_edges(f).unwrap().len(), 3);
        assert!(mesh.to_triangle(f).unwrap().signed_area() > 0.0);
    }
    assert_eq!(edge_legality(&mesh, e).unwrap(), EdgeLegality::Legal);
    assert!(find_delaunay_violations(&mesh).unwrap().is_empty());
    validate_topology(&mesh).unwrap();
}

#[test]
fn test_legalize_reports_flips_to_locator() {
    let mut mesh: Mesh<f64> = Mesh::new();
    let square = mesh.create_square(&unit_bound()).unwrap();
    mesh.set_point(square.corners[3], Point::new([0.2, 0.8])).unwrap();
    let mut locator = DelaunayTree::new();
    locator
        .split_face_event(&mesh, None, &square.faces)
        .unwrap();
    let stats = legalize(&mut mesh, &mut locator, [square.diagonal[0]]).unwrap();
    assert_eq!(stats.flips_performed, 1);

    let p = Point::new([0.9, 0.5]);
    let face = locator.locate(&mesh, &p, 1e-9).unwrap().unwrap();
    assert!(mesh.to_triangle(face).unwrap().contains(&p, 1e-9));
}

// =============================================================================
// LOCATORS
// =============================================================================

#[test]
fn test_locators_agree_on_random_points() {
    init_tracing();
    let points = generate_random_points_seeded::<f64>(200, (0.0, 10.0), 7).unwrap();
    let bound = BoundingBox::from_bounds([0.0, 0.0], [10.0, 10.0]);

    let mut base = IncrementalTriangulation::with_locator_kind(
        TriangulationConfig::new(bound),
        LocatorKind::Base,
    )
    .unwrap();
    let mut tree = IncrementalTriangulation::with_locator_kind(
        TriangulationConfig::new(bound),
        LocatorKind::DelaunayTree,
    )
    .unwrap();
    let inserted_base = base.insert_all(points.iter().copied()).unwrap();
    let inserted_tree = tree.insert_all(points.iter().copied()).unwrap();
    assert_eq!(inserted_base, inserted_tree);
    base.finalize().unwrap();
    tree.finalize().unwrap();

    for triangulation in [&base, &tree] {
        triangulation.validate().unwrap();
        triangulation.validate_delaunay().unwrap();
    }
    let base_stats = base.statistics().unwrap();
    let tree_stats = tree.statistics().unwrap();
    assert_eq!(base_stats.vertices, tree_stats.vertices);
    assert_eq!(base_stats.faces, tree_stats.faces);
    assert_eq!(base_stats.edges, tree_stats.edges);
}

#[test]
fn test_hierarchy_locator_is_not_implemented() {
    let mut triangulation = IncrementalTriangulation::with_locator_kind(
        TriangulationConfig::new(unit_bound()),
        LocatorKind::DelaunayHierarchy,
    )
    .unwrap();
    let result = triangulation.insert(Point::new([0.25, 0.75]));
    assert!(matches!(
        result,
        Err(TriangulationError::Locate(LocateError::NotImplemented { .. }))
    ));
}

#[test]
fn test_compaction_keeps_tree_locator_usable() {
    let points = generate_random_points_seeded::<f64>(60, (0.0, 1.0), 42).unwrap();
    let mut triangulation =
        IncrementalTriangulation::new(TriangulationConfig::new(unit_bound()), DelaunayTree::new())
            .unwrap();
    triangulation.insert_all(points.iter().copied()).unwrap();
    triangulation.finalize().unwrap();

    let order: Vec<FaceKey> = triangulation.faces().collect();
    triangulation.arrange_memory(&order).unwrap();
    let (_, _, face_slots) = triangulation.mesh().storage_len();
    assert_eq!(
        face_slots,
        triangulation.mesh().number_of_faces() + triangulation.mesh().number_of_holes() + 1
    );

    // Mesh vertices and face centroids all lie inside the finalized region.
    let mut queries: Vec<Point<f64>> = triangulation.points().copied().collect();
    queries.extend(
        triangulation
            .faces()
            .map(|f| triangulation.to_triangle(f).unwrap().centroid()),
    );
    assert!(queries.len() > points.len());
    for p in &queries {
        let face = triangulation.locate(p).unwrap().unwrap();
        assert!(triangulation.to_triangle(face).unwrap().contains(p, 1e-9));
    }
    triangulation.validate().unwrap();
}
