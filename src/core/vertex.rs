//! Mesh vertices.
//!
//! A [`Vertex`] owns its [`Point`] and a reference to one *incoming* incident
//! half-edge (a half-edge whose end vertex is this vertex). Rotating around the vertex
//! starts from that half-edge; see [`Mesh::vertex_in_edges`](crate::core::mesh::Mesh::vertex_in_edges).

use serde::{Deserialize, Serialize};

use crate::core::mesh::HalfEdgeKey;
use crate::geometry::point::Point;
use crate::geometry::traits::coordinate::CoordinateScalar;

/// A mesh vertex.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = ""))]
pub struct Vertex<T>
where
    T: CoordinateScalar,
{
    pub(crate) point: Point<T>,
    pub(crate) edge: Option<HalfEdgeKey>,
    pub(crate) destroyed: bool,
}

impl<T> Vertex<T>
where
    T: CoordinateScalar,
{
    pub(crate) const fn new(point: Point<T>) -> Self {
        Self {
            point,
            edge: None,
            destroyed: false,
        }
    }

    /// The vertex position.
    #[inline]
    #[must_use]
    pub const fn point(&self) -> &Point<T> {
        &self.point
    }

    /// One incoming half-edge, if the vertex has been connected.
    #[inline]
    #[must_use]
    pub const fn edge(&self) -> Option<HalfEdgeKey> {
        self.edge
    }

    /// Whether the vertex has been marked for garbage collection.
    #[inline]
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}
