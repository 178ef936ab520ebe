use crate::core::mesh::{FaceKey, HalfEdgeKey, VertexKey};
use slotmap::SparseSecondaryMap;

// =============================================================================
// SLOTMAP SECONDARY MAPS FOR AUXILIARY DATA
// =============================================================================

/// Sparse secondary map for auxiliary data associated with faces.
///
/// The Delaunay-Tree locator keeps its face → DAG node lookup here, and
/// [`MeshRemap`](crate::core::mesh::MeshRemap) records old → new face handles.
///
/// # Examples
///
/// ```rust
/// use sfc_mesh::core::collections::FaceSecondaryMap;
/// use sfc_mesh::core::mesh::Mesh;
///
/// let mesh: Mesh<f64> = Mesh::new();
/// let mut marks: FaceSecondaryMap<bool> = FaceSecondaryMap::new();
/// marks.insert(mesh.border(), true);
/// assert_eq!(marks.get(mesh.border()), Some(&true));
/// ```
pub type FaceSecondaryMap<V> = SparseSecondaryMap<FaceKey, V>;

/// Sparse secondary map for auxiliary data associated with half-edges.
pub type HalfEdgeSecondaryMap<V> = SparseSecondaryMap<HalfEdgeKey, V>;

/// Sparse secondary map for auxiliary data associated with vertices.
pub type VertexSecondaryMap<V> = SparseSecondaryMap<VertexKey, V>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::Mesh;
    use crate::geometry::point::Point;

    #[test]
    fn test_vertex_secondary_map() {
        let mut mesh: Mesh<f64> = Mesh::new();
        let a = mesh.create_vertex(Point::new([0.0, 0.0]));
        let b = mesh.create_vertex(Point::new([1.0, 0.0]));

        let mut order: VertexSecondaryMap<usize> = VertexSecondaryMap::new();
        order.insert(a, 0);
        order.insert(b, 1);
        assert_eq!(order.get(b), Some(&1));
        assert_eq!(order.len(), 2);
    }
}
