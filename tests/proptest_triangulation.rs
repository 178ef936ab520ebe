//! Property-based tests for incremental triangulation.
//!
//! - Topology and the empty-circle property hold after every batch of insertions
//! - Face count follows Euler's formula for a triangulated disk
//! - Both locators build meshes with the same counts

use proptest::prelude::*;
use sfc_mesh::prelude::*;

// =============================================================================
// TEST CONFIGURATION
// =============================================================================

fn unit_coordinate() -> impl Strategy<Value = f64> {
    (0.0..1.0).prop_filter("must be finite", |x: &f64| x.is_finite())
}

fn points(max: usize) -> impl Strategy<Value = Vec<Point<f64>>> {
    prop::collection::vec(
        (unit_coordinate(), unit_coordinate()).prop_map(|(x, y)| Point::new([x, y])),
        1..=max,
    )
}

fn build<L: PointLocator<f64>>(points: &[Point<f64>], locator: L) -> IncrementalTriangulation<f64, L> {
    let config = TriangulationConfig::new(BoundingBox::from_bounds([0.0, 0.0], [1.0, 1.0]));
    let mut triangulation = IncrementalTriangulation::new(config, locator).unwrap();
    triangulation.insert_all(points.iter().copied()).unwrap();
    triangulation
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Property: structure and Delaunay property survive any insertion sequence
    #[test]
    fn prop_insertion_keeps_invariants(points in points(40)) {
        let triangulation = build(&points, BaseLocator::new());
        prop_assert!(triangulation.validate().is_ok());
        prop_assert!(triangulation.validate_delaunay().is_ok());
        let mesh = triangulation.mesh();
        prop_assert_eq!(triangulation.super_vertices().len(), 4);
        // Triangulated square with n interior vertices has 2n + 2 faces.
        prop_assert_eq!(mesh.number_of_faces(), 2 * (mesh.number_of_vertices() - 4) + 2);
    }

    /// Property: finalized meshes are convex Delaunay disks with V - E + F = 1
    #[test]
    fn prop_finalized_mesh_is_a_disk(points in points(30)) {
        let mut triangulation = build(&points, BaseLocator::new());
        prop_assume!(triangulation.mesh().number_of_vertices() >= 7);
        prop_assert!(triangulation.finalize().is_ok());
        let mesh = triangulation.mesh();
        let v = i64::try_from(mesh.number_of_vertices()).unwrap();
        let e = i64::try_from(mesh.number_of_edges()).unwrap();
        let f = i64::try_from(mesh.number_of_faces()).unwrap();
        prop_assert!(f > 0);
        prop_assert_eq!(v - e + f, 1);
        prop_assert!(triangulation.validate().is_ok());
        prop_assert!(triangulation.validate_delaunay().is_ok());
        // The finalized region is convex: the border never turns outward.
        for x in mesh.face_edges(mesh.border()).unwrap() {
            let u = *mesh.point(mesh.start_vertex(x).unwrap()).unwrap();
            let w = *mesh.point(mesh.vertex(mesh.next(x).unwrap()).unwrap()).unwrap();
            let v = *mesh.point(mesh.vertex(x).unwrap()).unwrap();
            prop_assert_ne!(orientation(&u, &v, &w), Orientation::POSITIVE);
        }
    }

    /// Property: locator strategy does not change the result counts
    #[test]
    fn prop_locators_agree(points in points(30)) {
        let base = build(&points, BaseLocator::new());
        let tree = build(&points, DelaunayTree::new());
        prop_assert_eq!(base.mesh().number_of_vertices(), tree.mesh().number_of_vertices());
        prop_assert_eq!(base.mesh().number_of_faces(), tree.mesh().number_of_faces());
        prop_assert!(tree.validate_delaunay().is_ok());
    }

    /// Property: every inserted point is found inside a face afterwards
    #[test]
    fn prop_inserted_points_are_locatable(points in points(25)) {
        let triangulation = build(&points, DelaunayTree::new());
        for p in &points {
            let face = triangulation.locate(p).unwrap();
            prop_assert!(face.is_some());
            let triangle = triangulation.to_triangle(face.unwrap()).unwrap();
            prop_assert!(triangle.contains(p, 1e-9));
        }
    }
}
