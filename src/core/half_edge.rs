//! Directed half-edges.
//!
//! A [`HalfEdge`] stores its *end* vertex; the start vertex is the end vertex of
//! its `prev`. Every half-edge of a valid mesh has a twin, including those on the
//! outer boundary, whose twins belong to the border face.

use serde::{Deserialize, Serialize};

use crate::core::mesh::{FaceKey, HalfEdgeKey, VertexKey};

/// A directed half-edge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalfEdge {
    pub(crate) vertex: VertexKey,
    pub(crate) next: Option<HalfEdgeKey>,
    pub(crate) prev: Option<HalfEdgeKey>,
    pub(crate) twin: Option<HalfEdgeKey>,
    pub(crate) face: Option<FaceKey>,
    pub(crate) destroyed: bool,
}

impl HalfEdge {
    pub(crate) const fn new(vertex: VertexKey) -> Self {
        Self {
            vertex,
            next: None,
            prev: None,
            twin: None,
            face: None,
            destroyed: false,
        }
    }

    /// End vertex.
    #[inline]
    #[must_use]
    pub const fn vertex(&self) -> VertexKey {
        self.vertex
    }

    /// Next half-edge of the face cycle.
    #[inline]
    #[must_use]
    pub const fn next(&self) -> Option<HalfEdgeKey> {
        self.next
    }

    /// Previous half-edge of the face cycle.
    #[inline]
    #[must_use]
    pub const fn prev(&self) -> Option<HalfEdgeKey> {
        self.prev
    }

    /// Oppositely directed partner.
    #[inline]
    #[must_use]
    pub const fn twin(&self) -> Option<HalfEdgeKey> {
        self.twin
    }

    /// Incident face (on the left).
    #[inline]
    #[must_use]
    pub const fn face(&self) -> Option<FaceKey> {
        self.face
    }

    /// Whether the half-edge has been marked for garbage collection.
    #[inline]
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}
