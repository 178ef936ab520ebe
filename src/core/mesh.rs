//! Half-edge mesh (doubly connected edge list).
//!
//! The [`Mesh`] stores vertices, half-edges and faces in three slotmap arenas keyed by
//! [`VertexKey`], [`HalfEdgeKey`] and [`FaceKey`]. Links between elements are keys, so
//! the cyclic `next`/`prev`/`twin`/`face` structure needs no shared ownership.
//!
//! # Conventions
//!
//! - A half-edge stores its **end** vertex; its start is the end of `prev`.
//! - Interior faces are counter-clockwise 3-cycles; the face lies to the left.
//! - Every half-edge has a twin. Twins of the outermost edges belong to the single
//!   **border** face, twins of hole boundaries to a **hole** face.
//! - A vertex references one **incoming** half-edge.
//!
//! # Lifecycle
//!
//! Elements are never removed by topology edits; they are *destroyed* (marked) and
//! reclaimed by [`Mesh::garbage_collection`]. [`Mesh::arrange_memory`] rebuilds the
//! arenas in a caller-supplied face order, which changes every key and returns a
//! [`MeshRemap`]. Reading a destroyed or stale element is reported as a [`MeshError`].
//!
//! # Examples
//!
//! ```rust
//! use sfc_mesh::core::mesh::Mesh;
//! use sfc_mesh::geometry::point::Point;
//! use sfc_mesh::geometry::util::BoundingBox;
//!
//! let mut mesh: Mesh<f64> = Mesh::new();
//! let square = mesh
//!     .create_square(&BoundingBox::from_bounds([0.0, 0.0], [1.0, 1.0]))
//!     .unwrap();
//! assert_eq!(mesh.number_of_faces(), 2);
//! assert_eq!(mesh.number_of_vertices(), 4);
//! assert_eq!(mesh.number_of_edges(), 5);
//!
//! let t = mesh.to_triangle(square.faces[0]).unwrap();
//! assert!(t.signed_area() > 0.0);
//! ```

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use thiserror::Error;

use crate::core::collections::{
    FaceSecondaryMap, FastHashSet, HalfEdgeKeyBuffer, HalfEdgeSecondaryMap, StorageMap,
    VertexKeyBuffer, VertexSecondaryMap,
};
use crate::core::face::{Face, FaceKind};
use crate::core::half_edge::HalfEdge;
use crate::core::vertex::Vertex;
use crate::geometry::point::Point;
use crate::geometry::traits::coordinate::CoordinateScalar;
use crate::geometry::util::{Line, Triangle};

// =============================================================================
// KEYS
// =============================================================================

new_key_type! {
    /// Key type for accessing vertices in the mesh storage.
    pub struct VertexKey;
}

new_key_type! {
    /// Key type for accessing half-edges in the mesh storage.
    pub struct HalfEdgeKey;
}

new_key_type! {
    /// Key type for accessing faces in the mesh storage.
    pub struct FaceKey;
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Which link of a half-edge was missing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
    /// `next`
    Next,
    /// `prev`
    Prev,
    /// `twin`
    Twin,
    /// `face`
    Face,
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Next => write!(f, "next"),
            Self::Prev => write!(f, "prev"),
            Self::Twin => write!(f, "twin"),
            Self::Face => write!(f, "face"),
        }
    }
}

/// Errors raised by mesh accessors and topology edits.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    /// The vertex key is not present in storage.
    #[error("Vertex {key:?} not found in mesh storage")]
    VertexNotFound {
        /// The stale key.
        key: VertexKey,
    },
    /// The half-edge key is not present in storage.
    #[error("Half-edge {key:?} not found in mesh storage")]
    HalfEdgeNotFound {
        /// The stale key.
        key: HalfEdgeKey,
    },
    /// The face key is not present in storage.
    #[error("Face {key:?} not found in mesh storage")]
    FaceNotFound {
        /// The stale key.
        key: FaceKey,
    },
    /// The vertex has been destroyed.
    #[error("Vertex {key:?} has been destroyed")]
    DestroyedVertex {
        /// The destroyed vertex.
        key: VertexKey,
    },
    /// The half-edge has been destroyed.
    #[error("Half-edge {key:?} has been destroyed")]
    DestroyedHalfEdge {
        /// The destroyed half-edge.
        key: HalfEdgeKey,
    },
    /// The face has been destroyed.
    #[error("Face {key:?} has been destroyed")]
    DestroyedFace {
        /// The destroyed face.
        key: FaceKey,
    },
    /// A half-edge link has not been set.
    #[error("Half-edge {edge:?} has no {link} link")]
    MissingLink {
        /// The half-edge.
        edge: HalfEdgeKey,
        /// The missing link.
        link: LinkKind,
    },
    /// A face has no boundary half-edge.
    #[error("Face {face:?} has no boundary half-edge")]
    MissingFaceEdge {
        /// The face.
        face: FaceKey,
    },
    /// A vertex has no incident half-edge.
    #[error("Vertex {vertex:?} has no incident half-edge")]
    IsolatedVertex {
        /// The vertex.
        vertex: VertexKey,
    },
    /// Walking a face cycle did not return to the start.
    #[error("Face cycle of {face:?} did not close after {steps} steps")]
    BrokenCycle {
        /// The face.
        face: FaceKey,
        /// Steps taken before giving up.
        steps: usize,
    },
    /// Rotating around a vertex did not return to the start.
    #[error("Rotation around {vertex:?} did not close after {steps} steps")]
    BrokenRotation {
        /// The vertex.
        vertex: VertexKey,
        /// Steps taken before giving up.
        steps: usize,
    },
    /// The face is not a triangle.
    #[error("Face {face:?} has {edges} edges, expected 3")]
    NotATriangle {
        /// The face.
        face: FaceKey,
        /// Length of its cycle.
        edges: usize,
    },
    /// A topology edit was requested on an unsuitable element.
    #[error("Invalid mesh operation: {message}")]
    InvalidOperation {
        /// What went wrong.
        message: String,
    },
}

// =============================================================================
// ELEMENT KEY TRAIT
// =============================================================================

/// Keys of mesh elements, used by the generic [`Mesh::is_destroyed`] / [`Mesh::is_alive`].
pub trait ElementKey: slotmap::Key {
    /// `Some(destroyed)` for stored elements, `None` for stale keys.
    fn destroyed_in<T: CoordinateScalar>(self, mesh: &Mesh<T>) -> Option<bool>;
}

impl ElementKey for VertexKey {
    fn destroyed_in<T: CoordinateScalar>(self, mesh: &Mesh<T>) -> Option<bool> {
        mesh.vertices.get(self).map(|v| v.destroyed)
    }
}

impl ElementKey for HalfEdgeKey {
    fn destroyed_in<T: CoordinateScalar>(self, mesh: &Mesh<T>) -> Option<bool> {
        mesh.half_edges.get(self).map(|e| e.destroyed)
    }
}

impl ElementKey for FaceKey {
    fn destroyed_in<T: CoordinateScalar>(self, mesh: &Mesh<T>) -> Option<bool> {
        mesh.faces.get(self).map(|f| f.destroyed)
    }
}

// =============================================================================
// REMAP
// =============================================================================

/// Old → new key translation produced by [`Mesh::arrange_memory`].
#[derive(Clone, Debug, Default)]
pub struct MeshRemap {
    /// Vertex translation.
    pub vertices: VertexSecondaryMap<VertexKey>,
    /// Half-edge translation.
    pub half_edges: HalfEdgeSecondaryMap<HalfEdgeKey>,
    /// Face translation.
    pub faces: FaceSecondaryMap<FaceKey>,
}

impl MeshRemap {
    /// New key of a vertex, if it survived.
    #[must_use]
    pub fn vertex(&self, old: VertexKey) -> Option<VertexKey> {
        self.vertices.get(old).copied()
    }

    /// New key of a half-edge, if it survived.
    #[must_use]
    pub fn half_edge(&self, old: HalfEdgeKey) -> Option<HalfEdgeKey> {
        self.half_edges.get(old).copied()
    }

    /// New key of a face, if it survived.
    #[must_use]
    pub fn face(&self, old: FaceKey) -> Option<FaceKey> {
        self.faces.get(old).copied()
    }
}

// =============================================================================
// MESH
// =============================================================================

/// Handles of the two-triangle square built by [`Mesh::create_square`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SquareHandles {
    /// Corners in counter-clockwise order starting at the minimum corner.
    pub corners: [VertexKey; 4],
    /// Lower-right triangle `(c0, c1, c2)` and upper-left triangle `(c0, c2, c3)`.
    pub faces: [FaceKey; 2],
    /// The diagonal half-edges: `c2 → c0` in the first face, `c0 → c2` in the second.
    pub diagonal: [HalfEdgeKey; 2],
}

/// A planar half-edge mesh.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(deserialize = ""))]
pub struct Mesh<T>
where
    T: CoordinateScalar,
{
    pub(crate) vertices: StorageMap<VertexKey, Vertex<T>>,
    pub(crate) half_edges: StorageMap<HalfEdgeKey, HalfEdge>,
    pub(crate) faces: StorageMap<FaceKey, Face>,
    pub(crate) border: FaceKey,
}

impl<T> Default for Mesh<T>
where
    T: CoordinateScalar,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mesh<T>
where
    T: CoordinateScalar,
{
    /// Creates an empty mesh holding only the border face.
    #[must_use]
    pub fn new() -> Self {
        let mut faces = StorageMap::with_key();
        let border = faces.insert(Face::new(FaceKind::Border));
        Self {
            vertices: StorageMap::with_key(),
            half_edges: StorageMap::with_key(),
            faces,
            border,
        }
    }

    /// The border face.
    #[inline]
    #[must_use]
    pub const fn border(&self) -> FaceKey {
        self.border
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Creates a point. Points only become part of the mesh through a vertex.
    #[must_use]
    pub const fn create_point(x: T, y: T) -> Point<T> {
        Point::new([x, y])
    }

    /// Creates an unconnected vertex.
    pub fn create_vertex(&mut self, point: Point<T>) -> VertexKey {
        self.vertices.insert(Vertex::new(point))
    }

    /// Creates an unlinked half-edge ending at `end`.
    pub fn create_half_edge(&mut self, end: VertexKey) -> HalfEdgeKey {
        self.half_edges.insert(HalfEdge::new(end))
    }

    /// Creates a half-edge ending at `end` that belongs to `face`.
    pub fn create_edge(&mut self, end: VertexKey, face: FaceKey) -> HalfEdgeKey {
        let mut edge = HalfEdge::new(end);
        edge.face = Some(face);
        self.half_edges.insert(edge)
    }

    /// Creates an interior face without a boundary half-edge.
    pub fn create_face(&mut self) -> FaceKey {
        self.faces.insert(Face::new(FaceKind::Interior))
    }

    /// Creates a hole face without a boundary half-edge.
    pub fn create_hole_face(&mut self) -> FaceKey {
        self.faces.insert(Face::new(FaceKind::Hole))
    }

    // -------------------------------------------------------------------------
    // Element access
    // -------------------------------------------------------------------------

    /// Live vertex data.
    ///
    /// # Errors
    ///
    /// [`MeshError::VertexNotFound`] or [`MeshError::DestroyedVertex`].
    pub fn vertex_data(&self, v: VertexKey) -> Result<&Vertex<T>, MeshError> {
        let vertex = self
            .vertices
            .get(v)
            .ok_or(MeshError::VertexNotFound { key: v })?;
        if vertex.destroyed {
            return Err(MeshError::DestroyedVertex { key: v });
        }
        Ok(vertex)
    }

    /// Live half-edge data.
    ///
    /// # Errors
    ///
    /// [`MeshError::HalfEdgeNotFound`] or [`MeshError::DestroyedHalfEdge`].
    pub fn half_edge_data(&self, e: HalfEdgeKey) -> Result<&HalfEdge, MeshError> {
        let edge = self
            .half_edges
            .get(e)
            .ok_or(MeshError::HalfEdgeNotFound { key: e })?;
        if edge.destroyed {
            return Err(MeshError::DestroyedHalfEdge { key: e });
        }
        Ok(edge)
    }

    /// Live face data.
    ///
    /// # Errors
    ///
    /// [`MeshError::FaceNotFound`] or [`MeshError::DestroyedFace`].
    pub fn face_data(&self, f: FaceKey) -> Result<&Face, MeshError> {
        let face = self
            .faces
            .get(f)
            .ok_or(MeshError::FaceNotFound { key: f })?;
        if face.destroyed {
            return Err(MeshError::DestroyedFace { key: f });
        }
        Ok(face)
    }

    fn vertex_mut(&mut self, v: VertexKey) -> Result<&mut Vertex<T>, MeshError> {
        match self.vertices.get_mut(v) {
            Some(vertex) if !vertex.destroyed => Ok(vertex),
            Some(_) => Err(MeshError::DestroyedVertex { key: v }),
            None => Err(MeshError::VertexNotFound { key: v }),
        }
    }

    fn half_edge_mut(&mut self, e: HalfEdgeKey) -> Result<&mut HalfEdge, MeshError> {
        match self.half_edges.get_mut(e) {
            Some(edge) if !edge.destroyed => Ok(edge),
            Some(_) => Err(MeshError::DestroyedHalfEdge { key: e }),
            None => Err(MeshError::HalfEdgeNotFound { key: e }),
        }
    }

    pub(crate) fn face_mut(&mut self, f: FaceKey) -> Result<&mut Face, MeshError> {
        match self.faces.get_mut(f) {
            Some(face) if !face.destroyed => Ok(face),
            Some(_) => Err(MeshError::DestroyedFace { key: f }),
            None => Err(MeshError::FaceNotFound { key: f }),
        }
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    /// Sets `next(e) = n` and `prev(n) = e`.
    ///
    /// # Errors
    ///
    /// Returns an error if either half-edge is stale or destroyed.
    pub fn set_next(&mut self, e: HalfEdgeKey, n: HalfEdgeKey) -> Result<(), MeshError> {
        self.half_edge_data(n)?;
        self.half_edge_mut(e)?.next = Some(n);
        self.half_edge_mut(n)?.prev = Some(e);
        Ok(())
    }

    /// Sets `prev(e) = p` and `next(p) = e`.
    ///
    /// # Errors
    ///
    /// Returns an error if either half-edge is stale or destroyed.
    pub fn set_prev(&mut self, e: HalfEdgeKey, p: HalfEdgeKey) -> Result<(), MeshError> {
        self.set_next(p, e)
    }

    /// Makes `a` and `b` twins of each other.
    ///
    /// # Errors
    ///
    /// Returns an error if either half-edge is stale or destroyed.
    pub fn set_twin(&mut self, a: HalfEdgeKey, b: HalfEdgeKey) -> Result<(), MeshError> {
        self.half_edge_data(b)?;
        self.half_edge_mut(a)?.twin = Some(b);
        self.half_edge_mut(b)?.twin = Some(a);
        Ok(())
    }

    /// Sets the incident face of `e`.
    ///
    /// # Errors
    ///
    /// Returns an error if `e` or `f` is stale or destroyed.
    pub fn set_face(&mut self, e: HalfEdgeKey, f: FaceKey) -> Result<(), MeshError> {
        self.face_data(f)?;
        self.half_edge_mut(e)?.face = Some(f);
        Ok(())
    }

    /// Sets the boundary half-edge of `f`.
    ///
    /// # Errors
    ///
    /// Returns an error if `e` or `f` is stale or destroyed.
    pub fn set_edge_of_face(&mut self, f: FaceKey, e: HalfEdgeKey) -> Result<(), MeshError> {
        self.half_edge_data(e)?;
        self.face_mut(f)?.edge = Some(e);
        Ok(())
    }

    /// Sets the incoming half-edge of `v`.
    ///
    /// # Errors
    ///
    /// Returns an error if `v` or `e` is stale or destroyed.
    pub fn set_edge_of_vertex(&mut self, v: VertexKey, e: HalfEdgeKey) -> Result<(), MeshError> {
        self.half_edge_data(e)?;
        self.vertex_mut(v)?.edge = Some(e);
        Ok(())
    }

    /// Sets the end vertex of `e`.
    ///
    /// # Errors
    ///
    /// Returns an error if `e` or `v` is stale or destroyed.
    pub fn set_vertex(&mut self, e: HalfEdgeKey, v: VertexKey) -> Result<(), MeshError> {
        self.vertex_data(v)?;
        self.half_edge_mut(e)?.vertex = v;
        Ok(())
    }

    /// Relocates a vertex. No geometric validation is performed.
    ///
    /// # Errors
    ///
    /// Returns an error if `v` is stale or destroyed.
    pub fn set_point(&mut self, v: VertexKey, point: Point<T>) -> Result<(), MeshError> {
        self.vertex_mut(v)?.point = point;
        Ok(())
    }

    /// Changes the kind of a face.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is stale or destroyed, or if the border kind is
    /// assigned or removed.
    pub fn set_face_kind(&mut self, f: FaceKey, kind: FaceKind) -> Result<(), MeshError> {
        if f == self.border || kind == FaceKind::Border {
            return Err(MeshError::InvalidOperation {
                message: format!("cannot change {f:?} to {kind}: the border face is unique"),
            });
        }
        self.face_mut(f)?.kind = kind;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Readers
    // -------------------------------------------------------------------------

    /// Next half-edge of the face cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if `e` is stale, destroyed or unlinked.
    pub fn next(&self, e: HalfEdgeKey) -> Result<HalfEdgeKey, MeshError> {
        self.half_edge_data(e)?.next.ok_or(MeshError::MissingLink {
            edge: e,
            link: LinkKind::Next,
        })
    }

    /// Previous half-edge of the face cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if `e` is stale, destroyed or unlinked.
    pub fn prev(&self, e: HalfEdgeKey) -> Result<HalfEdgeKey, MeshError> {
        self.half_edge_data(e)?.prev.ok_or(MeshError::MissingLink {
            edge: e,
            link: LinkKind::Prev,
        })
    }

    /// Oppositely directed half-edge.
    ///
    /// # Errors
    ///
    /// Returns an error if `e` is stale, destroyed or unlinked.
    pub fn twin(&self, e: HalfEdgeKey) -> Result<HalfEdgeKey, MeshError> {
        self.half_edge_data(e)?.twin.ok_or(MeshError::MissingLink {
            edge: e,
            link: LinkKind::Twin,
        })
    }

    /// Incident face of `e`.
    ///
    /// # Errors
    ///
    /// Returns an error if `e` is stale, destroyed or unlinked.
    pub fn face(&self, e: HalfEdgeKey) -> Result<FaceKey, MeshError> {
        self.half_edge_data(e)?.face.ok_or(MeshError::MissingLink {
            edge: e,
            link: LinkKind::Face,
        })
    }

    /// Face on the other side of `e`.
    ///
    /// # Errors
    ///
    /// Returns an error if `e` or its twin is stale, destroyed or unlinked.
    pub fn twin_face(&self, e: HalfEdgeKey) -> Result<FaceKey, MeshError> {
        self.face(self.twin(e)?)
    }

    /// End vertex of `e`.
    ///
    /// # Errors
    ///
    /// Returns an error if `e` is stale or destroyed.
    pub fn vertex(&self, e: HalfEdgeKey) -> Result<VertexKey, MeshError> {
        Ok(self.half_edge_data(e)?.vertex)
    }

    /// Start vertex of `e` (end vertex of its `prev`).
    ///
    /// # Errors
    ///
    /// Returns an error if `e` is stale, destroyed or unlinked.
    pub fn start_vertex(&self, e: HalfEdgeKey) -> Result<VertexKey, MeshError> {
        self.vertex(self.prev(e)?)
    }

    /// Boundary half-edge of `f`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is stale, destroyed or has no half-edge.
    pub fn edge_of_face(&self, f: FaceKey) -> Result<HalfEdgeKey, MeshError> {
        self.face_data(f)?
            .edge
            .ok_or(MeshError::MissingFaceEdge { face: f })
    }

    /// Incoming half-edge of `v`.
    ///
    /// # Errors
    ///
    /// Returns an error if `v` is stale, destroyed or isolated.
    pub fn edge_of_vertex(&self, v: VertexKey) -> Result<HalfEdgeKey, MeshError> {
        self.vertex_data(v)?
            .edge
            .ok_or(MeshError::IsolatedVertex { vertex: v })
    }

    /// Position of `v`.
    ///
    /// # Errors
    ///
    /// Returns an error if `v` is stale or destroyed.
    pub fn point(&self, v: VertexKey) -> Result<&Point<T>, MeshError> {
        Ok(&self.vertex_data(v)?.point)
    }

    /// Kind of `f`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is stale or destroyed.
    pub fn face_kind(&self, f: FaceKey) -> Result<FaceKind, MeshError> {
        Ok(self.face_data(f)?.kind)
    }

    /// Half-edges of the boundary cycle of `f`, starting at its stored half-edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the cycle references destroyed elements or does not close.
    pub fn face_edges(&self, f: FaceKey) -> Result<HalfEdgeKeyBuffer, MeshError> {
        let start = self.edge_of_face(f)?;
        let limit = self.half_edges.len() + 1;
        let mut edges = HalfEdgeKeyBuffer::new();
        let mut current = start;
        loop {
            edges.push(current);
            current = self.next(current)?;
            if current == start {
                return Ok(edges);
            }
            if edges.len() > limit {
                return Err(MeshError::BrokenCycle {
                    face: f,
                    steps: edges.len(),
                });
            }
        }
    }

    /// End vertices of the boundary cycle of `f`, in cycle order.
    ///
    /// # Errors
    ///
    /// See [`face_edges`](Self::face_edges).
    pub fn face_vertices(&self, f: FaceKey) -> Result<VertexKeyBuffer, MeshError> {
        self.face_edges(f)?
            .into_iter()
            .map(|e| self.vertex(e))
            .collect()
    }

    /// All half-edges ending at `v`, in clockwise rotation order.
    ///
    /// # Errors
    ///
    /// Returns an error if `v` is isolated or the rotation does not close.
    pub fn vertex_in_edges(&self, v: VertexKey) -> Result<HalfEdgeKeyBuffer, MeshError> {
        let start = self.edge_of_vertex(v)?;
        let limit = self.half_edges.len() + 1;
        let mut edges = HalfEdgeKeyBuffer::new();
        let mut current = start;
        loop {
            edges.push(current);
            current = self.twin(self.next(current)?)?;
            if current == start {
                return Ok(edges);
            }
            if edges.len() > limit {
                return Err(MeshError::BrokenRotation {
                    vertex: v,
                    steps: edges.len(),
                });
            }
        }
    }

    /// Faces around `v` (including border and hole faces).
    ///
    /// # Errors
    ///
    /// See [`vertex_in_edges`](Self::vertex_in_edges).
    pub fn vertex_faces(&self, v: VertexKey) -> Result<Vec<FaceKey>, MeshError> {
        self.vertex_in_edges(v)?
            .into_iter()
            .map(|e| self.face(e))
            .collect()
    }

    /// Vertices adjacent to `v`.
    ///
    /// # Errors
    ///
    /// See [`vertex_in_edges`](Self::vertex_in_edges).
    pub fn neighbor_vertices(&self, v: VertexKey) -> Result<VertexKeyBuffer, MeshError> {
        self.vertex_in_edges(v)?
            .into_iter()
            .map(|e| self.start_vertex(e))
            .collect()
    }

    // -------------------------------------------------------------------------
    // Predicates
    // -------------------------------------------------------------------------

    /// `e` lies on a border or hole face.
    ///
    /// # Errors
    ///
    /// Returns an error if `e` or its face is stale or destroyed.
    pub fn is_boundary(&self, e: HalfEdgeKey) -> Result<bool, MeshError> {
        Ok(self.face_data(self.face(e)?)?.is_boundary())
    }

    /// `e` or its twin lies on a border or hole face.
    ///
    /// # Errors
    ///
    /// Returns an error if `e`, its twin or their faces are stale or destroyed.
    pub fn is_at_boundary(&self, e: HalfEdgeKey) -> Result<bool, MeshError> {
        Ok(self.is_boundary(e)? || self.is_boundary(self.twin(e)?)?)
    }

    /// `f` is a border or hole face.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is stale or destroyed.
    pub fn is_face_boundary(&self, f: FaceKey) -> Result<bool, MeshError> {
        Ok(self.face_data(f)?.is_boundary())
    }

    /// `f` is the border face.
    #[must_use]
    pub fn is_border(&self, f: FaceKey) -> bool {
        f == self.border
    }

    /// `f` is a live hole face.
    #[must_use]
    pub fn is_hole(&self, f: FaceKey) -> bool {
        self.face_data(f)
            .is_ok_and(|face| face.kind == FaceKind::Hole)
    }

    /// `f` is a live interior face.
    #[must_use]
    pub fn is_interior(&self, f: FaceKey) -> bool {
        self.face_data(f)
            .is_ok_and(|face| face.kind == FaceKind::Interior)
    }

    /// `key` was destroyed or is no longer stored.
    #[must_use]
    pub fn is_destroyed<K: ElementKey>(&self, key: K) -> bool {
        key.destroyed_in(self).is_none_or(|destroyed| destroyed)
    }

    /// `key` is stored and not destroyed.
    #[must_use]
    pub fn is_alive<K: ElementKey>(&self, key: K) -> bool {
        key.destroyed_in(self) == Some(false)
    }

    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------

    /// Materializes a triangular face.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotATriangle`] for longer cycles, or an access error.
    pub fn to_triangle(&self, f: FaceKey) -> Result<Triangle<T>, MeshError> {
        let vertices = self.face_vertices(f)?;
        if vertices.len() != 3 {
            return Err(MeshError::NotATriangle {
                face: f,
                edges: vertices.len(),
            });
        }
        Ok(Triangle::new(
            *self.point(vertices[0])?,
            *self.point(vertices[1])?,
            *self.point(vertices[2])?,
        ))
    }

    /// Segment from the start to the end of `e`.
    ///
    /// # Errors
    ///
    /// Returns an access error for stale, destroyed or unlinked elements.
    pub fn to_line(&self, e: HalfEdgeKey) -> Result<Line<T>, MeshError> {
        Ok(Line::new(
            *self.point(self.start_vertex(e)?)?,
            *self.point(self.vertex(e)?)?,
        ))
    }

    /// Midpoint of `e`.
    ///
    /// # Errors
    ///
    /// See [`to_line`](Self::to_line).
    pub fn midpoint(&self, e: HalfEdgeKey) -> Result<Point<T>, MeshError> {
        Ok(self.to_line(e)?.midpoint())
    }

    /// Length of `e`.
    ///
    /// # Errors
    ///
    /// See [`to_line`](Self::to_line).
    pub fn edge_length(&self, e: HalfEdgeKey) -> Result<T, MeshError> {
        Ok(self.to_line(e)?.length())
    }

    // -------------------------------------------------------------------------
    // Iteration and counts
    // -------------------------------------------------------------------------

    /// Live interior faces in storage order.
    pub fn faces(&self) -> impl Iterator<Item = FaceKey> + '_ {
        self.faces
            .iter()
            .filter(|(_, f)| !f.destroyed && f.kind == FaceKind::Interior)
            .map(|(k, _)| k)
    }

    /// Live hole faces in storage order.
    pub fn hole_faces(&self) -> impl Iterator<Item = FaceKey> + '_ {
        self.faces
            .iter()
            .filter(|(_, f)| !f.destroyed && f.kind == FaceKind::Hole)
            .map(|(k, _)| k)
    }

    /// All live faces, including the border and holes.
    pub fn all_faces(&self) -> impl Iterator<Item = FaceKey> + '_ {
        self.faces
            .iter()
            .filter(|(_, f)| !f.destroyed)
            .map(|(k, _)| k)
    }

    /// Live vertices in storage order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexKey> + '_ {
        self.vertices
            .iter()
            .filter(|(_, v)| !v.destroyed)
            .map(|(k, _)| k)
    }

    /// Positions of live vertices in storage order.
    pub fn points(&self) -> impl Iterator<Item = &Point<T>> + '_ {
        self.vertices
            .values()
            .filter(|v| !v.destroyed)
            .map(|v| &v.point)
    }

    /// Live half-edges in storage order.
    pub fn half_edges(&self) -> impl Iterator<Item = HalfEdgeKey> + '_ {
        self.half_edges
            .iter()
            .filter(|(_, e)| !e.destroyed)
            .map(|(k, _)| k)
    }

    /// One half-edge per live undirected edge.
    pub fn edges(&self) -> impl Iterator<Item = HalfEdgeKey> + '_ {
        self.half_edges
            .iter()
            .filter(|(k, e)| !e.destroyed && e.twin.is_none_or(|t| *k < t))
            .map(|(k, _)| k)
    }

    /// Number of live interior faces.
    #[must_use]
    pub fn number_of_faces(&self) -> usize {
        self.faces().count()
    }

    /// Number of live hole faces.
    #[must_use]
    pub fn number_of_holes(&self) -> usize {
        self.hole_faces().count()
    }

    /// Number of live vertices.
    #[must_use]
    pub fn number_of_vertices(&self) -> usize {
        self.vertices.values().filter(|v| !v.destroyed).count()
    }

    /// Number of live half-edges.
    #[must_use]
    pub fn number_of_half_edges(&self) -> usize {
        self.half_edges.values().filter(|e| !e.destroyed).count()
    }

    /// Number of live undirected edges.
    #[must_use]
    pub fn number_of_edges(&self) -> usize {
        self.edges().count()
    }

    /// Number of stored slots, destroyed elements included.
    #[must_use]
    pub fn storage_len(&self) -> (usize, usize, usize) {
        (self.vertices.len(), self.half_edges.len(), self.faces.len())
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Marks a vertex destroyed.
    ///
    /// # Errors
    ///
    /// Returns an error if `v` is stale or already destroyed.
    pub fn destroy_vertex(&mut self, v: VertexKey) -> Result<(), MeshError> {
        let vertex = self.vertex_mut(v)?;
        vertex.destroyed = true;
        vertex.edge = None;
        Ok(())
    }

    /// Marks a half-edge destroyed.
    ///
    /// # Errors
    ///
    /// Returns an error if `e` is stale or already destroyed.
    pub fn destroy_half_edge(&mut self, e: HalfEdgeKey) -> Result<(), MeshError> {
        self.half_edge_mut(e)?.destroyed = true;
        Ok(())
    }

    /// Marks a face destroyed. The border face cannot be destroyed.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is the border, stale or already destroyed.
    pub fn destroy_face(&mut self, f: FaceKey) -> Result<(), MeshError> {
        if f == self.border {
            return Err(MeshError::InvalidOperation {
                message: "the border face cannot be destroyed".to_string(),
            });
        }
        let face = self.face_mut(f)?;
        face.destroyed = true;
        face.edge = None;
        Ok(())
    }

    /// Physically removes destroyed elements. Returns the number of slots reclaimed.
    pub fn garbage_collection(&mut self) -> usize {
        let before = self.vertices.len() + self.half_edges.len() + self.faces.len();
        self.vertices.retain(|_, v| !v.destroyed);
        self.half_edges.retain(|_, e| !e.destroyed);
        self.faces.retain(|_, f| !f.destroyed);
        let after = self.vertices.len() + self.half_edges.len() + self.faces.len();
        let reclaimed = before - after;
        tracing::debug!("[mesh] garbage collection reclaimed {reclaimed} slots");
        reclaimed
    }

    /// Rebuilds storage so that faces follow `ordered_faces`.
    ///
    /// Listed live faces come first (duplicates and destroyed faces skipped), then
    /// any remaining live faces, the border face last. Half-edges are laid out in
    /// face-walk order and vertices in first-visit order. Destroyed elements are
    /// dropped. Topology and geometry are unchanged, but **every key changes**; use
    /// the returned [`MeshRemap`] to translate handles kept outside the mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if a live element links to a destroyed or stale one.
    pub fn arrange_memory(&mut self, ordered_faces: &[FaceKey]) -> Result<MeshRemap, MeshError> {
        let mut face_order: Vec<FaceKey> = Vec::with_capacity(self.faces.len());
        let mut seen: FastHashSet<FaceKey> = FastHashSet::default();
        for &f in ordered_faces {
            if f != self.border && self.is_alive(f) && seen.insert(f) {
                face_order.push(f);
            }
        }
        for f in self.all_faces() {
            if f != self.border && seen.insert(f) {
                face_order.push(f);
            }
        }
        face_order.push(self.border);

        let mut remap = MeshRemap::default();
        let mut faces = StorageMap::with_capacity_and_key(face_order.len());
        let mut edge_order: Vec<HalfEdgeKey> = Vec::with_capacity(self.half_edges.len());
        let mut edge_seen: FastHashSet<HalfEdgeKey> = FastHashSet::default();

        for &f in &face_order {
            let face = self.face_data(f)?;
            let new_key = faces.insert(Face::new(face.kind));
            remap.faces.insert(f, new_key);
            if face.edge.is_some() {
                for e in self.face_edges(f)? {
                    if edge_seen.insert(e) {
                        edge_order.push(e);
                    }
                }
            }
        }
        // Cycles not reachable from a face's stored half-edge (pinched boundaries).
        for e in self.half_edges() {
            if edge_seen.insert(e) {
                edge_order.push(e);
            }
        }

        let mut half_edges = StorageMap::with_capacity_and_key(edge_order.len());
        let mut vertices = StorageMap::with_capacity_and_key(self.vertices.len());
        for &e in &edge_order {
            let old = self.half_edge_data(e)?;
            let v = old.vertex;
            if !remap.vertices.contains_key(v) {
                let vertex = self.vertex_data(v)?;
                let new_v = vertices.insert(Vertex::new(vertex.point));
                remap.vertices.insert(v, new_v);
            }
            let new_e = half_edges.insert(HalfEdge::new(v));
            remap.half_edges.insert(e, new_e);
        }
        for v in self.vertices() {
            if !remap.vertices.contains_key(v) {
                let new_v = vertices.insert(Vertex::new(self.vertex_data(v)?.point));
                remap.vertices.insert(v, new_v);
            }
        }

        let map_edge = |old: Option<HalfEdgeKey>| -> Result<Option<HalfEdgeKey>, MeshError> {
            old.map(|e| {
                remap
                    .half_edge(e)
                    .ok_or(MeshError::DestroyedHalfEdge { key: e })
            })
            .transpose()
        };

        for &e in &edge_order {
            let old = self.half_edge_data(e)?;
            let new_key = remap
                .half_edge(e)
                .ok_or(MeshError::HalfEdgeNotFound { key: e })?;
            let vertex = remap
                .vertex(old.vertex)
                .ok_or(MeshError::DestroyedVertex { key: old.vertex })?;
            let face = old
                .face
                .map(|f| remap.face(f).ok_or(MeshError::DestroyedFace { key: f }))
                .transpose()?;
            let next = map_edge(old.next)?;
            let prev = map_edge(old.prev)?;
            let twin = map_edge(old.twin)?;
            if let Some(slot) = half_edges.get_mut(new_key) {
                slot.vertex = vertex;
                slot.face = face;
                slot.next = next;
                slot.prev = prev;
                slot.twin = twin;
            }
        }
        for &f in &face_order {
            let edge = map_edge(self.face_data(f)?.edge)?;
            if let Some(slot) = remap.face(f).and_then(|k| faces.get_mut(k)) {
                slot.edge = edge;
            }
        }
        for v in self.vertices() {
            let edge = map_edge(self.vertex_data(v)?.edge)?;
            if let Some(slot) = remap.vertex(v).and_then(|k| vertices.get_mut(k)) {
                slot.edge = edge;
            }
        }

        let border = remap
            .face(self.border)
            .ok_or(MeshError::FaceNotFound { key: self.border })?;
        self.vertices = vertices;
        self.half_edges = half_edges;
        self.faces = faces;
        self.border = border;

        tracing::debug!(
            "[mesh] arranged memory: {} faces, {} half-edges, {} vertices",
            self.faces.len(),
            self.half_edges.len(),
            self.vertices.len()
        );
        Ok(remap)
    }
}

// =============================================================================
// TESTS
// =============================================================================
