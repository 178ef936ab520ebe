//! JSON round trips of meshes, configurations and statistics.

use sfc_mesh::core::util::{mesh_statistics, validate_topology};
use sfc_mesh::prelude::*;

fn refined_mesh() -> Mesh<f64> {
    let bound = BoundingBox::from_bounds([0.0, 0.0], [6.0, 3.0]);
    let config = RefinerConfigBuilder::default()
        .bound(bound)
        .min_edge_length(0.75)
        .build()
        .unwrap();
    let domain = difference(rectangle(bound), circle(Point::new([3.0, 1.5]), 0.8));
    let mut refiner =
        SfcUniformRefiner::new(config, domain, uniform_edge_length(1.0), BaseLocator::new())
            .unwrap();
    let shared = refiner.generate().unwrap();
    shared.read().unwrap().mesh().clone()
}

#[test]
fn test_mesh_json_roundtrip() {
    let mesh = refined_mesh();
    let json = serde_json::to_string(&mesh).expect("Serialization failed");
    let restored: Mesh<f64> = serde_json::from_str(&json).expect("Deserialization failed");

    assert_eq!(restored.number_of_vertices(), mesh.number_of_vertices());
    assert_eq!(restored.number_of_faces(), mesh.number_of_faces());
    assert_eq!(restored.number_of_holes(), mesh.number_of_holes());
    assert_eq!(restored.border(), mesh.border());
    validate_topology(&restored).unwrap();
    assert_eq!(
        mesh_statistics(&restored).unwrap(),
        mesh_statistics(&mesh).unwrap()
    );
    // Keys survive, so the same face maps to the same triangle.
    for f in mesh.faces() {
        assert_eq!(restored.to_triangle(f).unwrap(), mesh.to_triangle(f).unwrap());
    }
}

#[test]
fn test_config_json_roundtrip() {
    let config: RefinerConfig<f64> = RefinerConfigBuilder::default()
        .bound(BoundingBox::from_bounds([-1.0, -2.0], [3.0, 4.0]))
        .min_edge_length(0.25)
        .smooth_holes(true)
        .build()
        .unwrap();
    let json = serde_json::to_string(&config).unwrap();
    let restored: RefinerConfig<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, config);

    let triangulation_config = TriangulationConfig::new(config.bound)
        .with_super_structure(SuperStructure::Retained);
    let json = serde_json::to_string(&triangulation_config).unwrap();
    let restored: TriangulationConfig<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, triangulation_config);
}

#[test]
fn test_statistics_json_roundtrip() {
    let stats = mesh_statistics(&refined_mesh()).unwrap();
    assert!(stats.holes >= 1);
    let json = serde_json::to_string(&stats).unwrap();
    let restored: MeshStatistics<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, stats);
}
