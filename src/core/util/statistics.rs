//! Summary statistics of a mesh: element counts, edge length range and triangle quality.

use serde::{Deserialize, Serialize};

use crate::core::mesh::{Mesh, MeshError};
use crate::geometry::quality::{min_angle, radius_ratio};
use crate::geometry::traits::coordinate::CoordinateScalar;

/// Counts and quality measures of a mesh.
///
/// Edge lengths cover every live edge, border and hole edges included. Quality measures
/// cover interior faces; degenerate triangles are counted but excluded from the ratio.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = ""))]
pub struct MeshStatistics<T>
where
    T: CoordinateScalar,
{
    /// Live vertices.
    pub vertices: usize,
    /// Live interior faces.
    pub faces: usize,
    /// Live hole faces.
    pub holes: usize,
    /// Live undirected edges.
    pub edges: usize,
    /// Shortest edge (zero for an empty mesh).
    pub min_edge_length: T,
    /// Longest edge (zero for an empty mesh).
    pub max_edge_length: T,
    /// Worst circumradius-to-inradius ratio (2 is equilateral).
    pub max_radius_ratio: T,
    /// Smallest interior angle in radians.
    pub min_angle: T,
    /// Interior faces with zero area.
    pub degenerate_faces: usize,
}

/// Computes [`MeshStatistics`] in one pass over edges and faces.
///
/// # Errors
///
/// Returns an error if a live element references a destroyed one.
///
/// # Examples
///
/// ```rust
/// use sfc_mesh::core::mesh::Mesh;
/// use sfc_mesh::core::util::mesh_statistics;
/// use sfc_mesh::geometry::util::BoundingBox;
///
/// let mut mesh: Mesh<f64> = Mesh::new();
/// mesh.create_square(&BoundingBox::from_bounds([0.0, 0.0], [1.0, 1.0])).unwrap();
/// let stats = mesh_statistics(&mesh).unwrap();
/// assert_eq!(stats.faces, 2);
/// assert!((stats.max_edge_length - 2.0_f64.sqrt()).abs() < 1e-12);
/// ```
pub fn mesh_statistics<T: CoordinateScalar>(
    mesh: &Mesh<T>,
) -> Result<MeshStatistics<T>, MeshError> {
    let mut min_edge = T::infinity();
    let mut max_edge = T::zero();
    let mut edges = 0;
    for e in mesh.edges() {
        let length = mesh.edge_length(e)?;
        min_edge = min_edge.min(length);
        max_edge = max_edge.max(length);
        edges += 1;
    }
    if edges == 0 {
        min_edge = T::zero();
    }

    let mut max_ratio = T::zero();
    let mut smallest_angle = T::infinity();
    let mut degenerate_faces = 0;
    let mut faces = 0;
    for f in mesh.faces() {
        faces += 1;
        let triangle = mesh.to_triangle(f)?;
        match radius_ratio(&triangle) {
            Ok(ratio) => max_ratio = max_ratio.max(ratio),
            Err(_) => degenerate_faces += 1,
        }
        smallest_angle = smallest_angle.min(min_angle(&triangle));
    }
    if faces == 0 {
        smallest_angle = T::zero();
    }

    Ok(MeshStatistics {
        vertices: mesh.number_of_vertices(),
        faces,
        holes: mesh.number_of_holes(),
        edges,
        min_edge_length: min_edge,
        max_edge_length: max_edge,
        max_radius_ratio: max_ratio,
        min_angle: smallest_angle,
        degenerate_faces,
    })
}
