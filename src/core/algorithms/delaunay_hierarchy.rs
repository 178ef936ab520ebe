//! Delaunay-Hierarchy point location (extension point).
//!
//! A hierarchy keeps a stack of ever sparser triangulations over random samples of the
//! vertices and locates by walking down the levels. The strategy can be selected, but
//! every operation reports [`LocateError::NotImplemented`] when called, so selecting it
//! fails at the first use rather than silently degrading.

use std::marker::PhantomData;

use crate::core::algorithms::locate::{LocateError, LocatorKind, PointLocator};
use crate::core::mesh::{FaceKey, Mesh, MeshRemap, VertexKey};
use crate::geometry::point::Point;
use crate::geometry::traits::coordinate::CoordinateScalar;

/// Hierarchical point locator. Not implemented.
#[derive(Debug, Clone, Default)]
pub struct DelaunayHierarchy<T> {
    _phantom: PhantomData<T>,
}

impl<T> DelaunayHierarchy<T> {
    /// Creates the (inert) locator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

const fn not_implemented(operation: &'static str) -> LocateError {
    LocateError::NotImplemented {
        strategy: LocatorKind::DelaunayHierarchy,
        operation,
    }
}

impl<T> PointLocator<T> for DelaunayHierarchy<T>
where
    T: CoordinateScalar,
{
    fn kind(&self) -> LocatorKind {
        LocatorKind::DelaunayHierarchy
    }

    fn locate(
        &self,
        _mesh: &Mesh<T>,
        _p: &Point<T>,
        _epsilon: T,
    ) -> Result<Option<FaceKey>, LocateError> {
        Err(not_implemented("locate"))
    }

    fn split_face_event(
        &mut self,
        _mesh: &Mesh<T>,
        _original: Option<FaceKey>,
        _new_faces: &[FaceKey],
    ) -> Result<(), LocateError> {
        Err(not_implemented("split_face_event"))
    }

    fn flip_edge_event(&mut self, _mesh: &Mesh<T>, _faces: [FaceKey; 2]) -> Result<(), LocateError> {
        Err(not_implemented("flip_edge_event"))
    }

    fn insert_event(&mut self, _mesh: &Mesh<T>, _vertex: VertexKey) -> Result<(), LocateError> {
        Err(not_implemented("insert_event"))
    }

    fn delete_boundary_face(&mut self, _mesh: &Mesh<T>, _face: FaceKey) -> Result<(), LocateError> {
        Err(not_implemented("delete_boundary_face"))
    }

    fn compacted(&mut self, _mesh: &Mesh<T>, _remap: &MeshRemap) -> Result<(), LocateError> {
        Err(not_implemented("compacted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_operation_is_not_implemented() {
        let mesh: Mesh<f64> = Mesh::new();
        let mut hierarchy = DelaunayHierarchy::<f64>::new();
        let p = Point::new([0.0, 0.0]);
        assert!(matches!(
            hierarchy.locate(&mesh, &p, 1e-9),
            Err(LocateError::NotImplemented { operation: "locate", .. })
        ));
        assert!(matches!(
            hierarchy.locate_point(&mesh, &p, true, 1e-9),
            Err(LocateError::NotImplemented { .. })
        ));
        assert!(matches!(
            hierarchy.split_face_event(&mesh, None, &[]),
            Err(LocateError::NotImplemented { .. })
        ));
        assert!(matches!(
            hierarchy.delete_boundary_face(&mesh, mesh.border()),
            Err(LocateError::NotImplemented { .. })
        ));
        assert_eq!(hierarchy.kind(), LocatorKind::DelaunayHierarchy);
    }
}
