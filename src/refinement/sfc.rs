//! Sierpinski space-filling curve over the triangles of a refinement.
//!
//! Every interior face owns exactly one curve node. A node stores the face's longest
//! half-edge (the edge the face will be bisected across) and a traversal direction:
//!
//! - [`SfcDirection::Forward`]: enter at `start(e)`, leave at `end(e)`;
//! - [`SfcDirection::Backward`]: enter at `end(e)`, leave at `start(e)`.
//!
//! Bisecting `e` at its midpoint turns the legs of the triangle into the longest edges of
//! the two halves, so a node is replaced by two children built from `prev(e)` and
//! `next(e)` (see [`children`]), and the curve stays continuous: the exit vertex of every
//! node is the entry vertex of its successor.
//!
//! The list is intrusive and arena-backed: nodes live in a slotmap and link to their
//! neighbours by key, so replacing a node is O(1) and a removed key is simply stale.

use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

use crate::core::collections::FastHashSet;
use crate::core::mesh::{FaceKey, HalfEdgeKey, Mesh, MeshError, MeshRemap, VertexKey};
use crate::geometry::traits::coordinate::CoordinateScalar;

new_key_type! {
    /// Key type for accessing curve nodes.
    pub struct SfcNodeKey;
}

/// Traversal direction of a node's triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SfcDirection {
    /// Enter at the start of the node edge.
    Forward,
    /// Enter at the end of the node edge.
    Backward,
}

/// One node of the curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SfcNode {
    edge: HalfEdgeKey,
    direction: SfcDirection,
    prev: Option<SfcNodeKey>,
    next: Option<SfcNodeKey>,
}

impl SfcNode {
    /// The longest half-edge of the node's triangle.
    #[must_use]
    pub const fn edge(&self) -> HalfEdgeKey {
        self.edge
    }

    /// Traversal direction.
    #[must_use]
    pub const fn direction(&self) -> SfcDirection {
        self.direction
    }

    /// Vertex the curve enters the triangle at.
    ///
    /// # Errors
    ///
    /// Returns an error if the node edge is not live.
    pub fn entry<T: CoordinateScalar>(&self, mesh: &Mesh<T>) -> Result<VertexKey, MeshError> {
        match self.direction {
            SfcDirection::Forward => mesh.start_vertex(self.edge),
            SfcDirection::Backward => mesh.vertex(self.edge),
        }
    }

    /// Vertex the curve leaves the triangle at.
    ///
    /// # Errors
    ///
    /// Returns an error if the node edge is not live.
    pub fn exit<T: CoordinateScalar>(&self, mesh: &Mesh<T>) -> Result<VertexKey, MeshError> {
        match self.direction {
            SfcDirection::Forward => mesh.vertex(self.edge),
            SfcDirection::Backward => mesh.start_vertex(self.edge),
        }
    }
}

/// Errors raised by curve edits and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurveError {
    /// The node key is stale or was never issued.
    #[error("Unknown curve node {node:?}")]
    UnknownNode {
        /// The key.
        node: SfcNodeKey,
    },
    /// The node's edge does not lie in an interior face.
    #[error("Curve node {node:?} points into non-interior face {face:?}")]
    NotInterior {
        /// The node.
        node: SfcNodeKey,
        /// The face of its edge.
        face: FaceKey,
    },
    /// Two nodes cover the same face.
    #[error("Face {face:?} is covered by more than one curve node")]
    DuplicateFace {
        /// The face.
        face: FaceKey,
    },
    /// Node and interior face counts differ.
    #[error("Curve has {nodes} nodes for {faces} interior faces")]
    FaceCount {
        /// Number of nodes.
        nodes: usize,
        /// Number of interior faces.
        faces: usize,
    },
    /// The node does not start where its predecessor ends.
    #[error("Curve is discontinuous before node {node:?}")]
    Discontinuous {
        /// The node.
        node: SfcNodeKey,
    },
    /// A node edge disappeared during storage rearrangement.
    #[error("Curve edge {edge:?} is missing from the storage remap")]
    MissingEdge {
        /// The old edge key.
        edge: HalfEdgeKey,
    },
    /// Mesh access failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// The two children that replace a node whose edge `e` is bisected.
///
/// `Forward` yields `[Backward(prev(e)), Backward(next(e))]`, `Backward` yields
/// `[Forward(next(e)), Forward(prev(e))]`. Must be computed before the split.
///
/// # Errors
///
/// Returns an error if `e` is not live.
pub fn children<T: CoordinateScalar>(
    mesh: &Mesh<T>,
    e: HalfEdgeKey,
    direction: SfcDirection,
) -> Result<[(HalfEdgeKey, SfcDirection); 2], MeshError> {
    let prev = mesh.prev(e)?;
    let next = mesh.next(e)?;
    Ok(match direction {
        SfcDirection::Forward => [
            (prev, SfcDirection::Backward),
            (next, SfcDirection::Backward),
        ],
        SfcDirection::Backward => [
            (next, SfcDirection::Forward),
            (prev, SfcDirection::Forward),
        ],
    })
}

/// Doubly-linked, arena-backed Sierpinski curve.
#[derive(Debug, Clone, Default)]
pub struct SierpinskiCurve {
    nodes: SlotMap<SfcNodeKey, SfcNode>,
    head: Option<SfcNodeKey>,
    tail: Option<SfcNodeKey>,
}

impl SierpinskiCurve {
    /// An empty curve.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The two-node curve over the initial square, one `Forward` node per diagonal
    /// half-edge.
    #[must_use]
    pub fn from_diagonal(diagonal: [HalfEdgeKey; 2]) -> Self {
        let mut curve = Self::new();
        for edge in diagonal {
            curve.push_back(edge, SfcDirection::Forward);
        }
        curve
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the curve has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First node.
    #[must_use]
    pub const fn head(&self) -> Option<SfcNodeKey> {
        self.head
    }

    /// Node data.
    #[must_use]
    pub fn get(&self, node: SfcNodeKey) -> Option<&SfcNode> {
        self.nodes.get(node)
    }

    /// Appends a node.
    pub fn push_back(&mut self, edge: HalfEdgeKey, direction: SfcDirection) -> SfcNodeKey {
        let key = self.nodes.insert(SfcNode {
            edge,
            direction,
            prev: self.tail,
            next: None,
        });
        match self.tail.and_then(|tail| self.nodes.get_mut(tail)) {
            Some(tail) => tail.next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        key
    }

    /// Replaces `node` by two consecutive nodes in its place.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::UnknownNode`] for a stale key.
    pub fn replace(
        &mut self,
        node: SfcNodeKey,
        children: [(HalfEdgeKey, SfcDirection); 2],
    ) -> Result<[SfcNodeKey; 2], CurveError> {
        let old = self.remove(node)?;
        let [(e0, d0), (e1, d1)] = children;
        let first = self.nodes.insert(SfcNode {
            edge: e0,
            direction: d0,
            prev: old.prev,
            next: None,
        });
        let second = self.nodes.insert(SfcNode {
            edge: e1,
            direction: d1,
            prev: Some(first),
            next: old.next,
        });
        if let Some(n) = self.nodes.get_mut(first) {
            n.next = Some(second);
        }
        self.link(old.prev, Some(first));
        self.link(Some(second), old.next);
        Ok([first, second])
    }

    /// Unlinks and returns `node`.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::UnknownNode`] for a stale key.
    pub fn remove(&mut self, node: SfcNodeKey) -> Result<SfcNode, CurveError> {
        let old = self
            .nodes
            .remove(node)
            .ok_or(CurveError::UnknownNode { node })?;
        self.link(old.prev, old.next);
        Ok(old)
    }

    fn link(&mut self, prev: Option<SfcNodeKey>, next: Option<SfcNodeKey>) {
        match prev.and_then(|p| self.nodes.get_mut(p)) {
            Some(p) => p.next = next,
            None => self.head = next,
        }
        match next.and_then(|n| self.nodes.get_mut(n)) {
            Some(n) => n.prev = prev,
            None => self.tail = prev,
        }
    }

    /// Removes every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    /// Nodes in curve order.
    pub fn iter(&self) -> impl Iterator<Item = (SfcNodeKey, &SfcNode)> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let key = cursor?;
            let node = self.nodes.get(key)?;
            cursor = node.next;
            Some((key, node))
        })
    }

    /// Faces in curve order.
    ///
    /// # Errors
    ///
    /// Returns an error if a node edge is not live.
    pub fn faces<T: CoordinateScalar>(&self, mesh: &Mesh<T>) -> Result<Vec<FaceKey>, MeshError> {
        self.iter().map(|(_, node)| mesh.face(node.edge)).collect()
    }

    /// Translates node edges after [`Mesh::arrange_memory`].
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::MissingEdge`] if a node edge has no new key.
    pub fn remap(&mut self, remap: &MeshRemap) -> Result<(), CurveError> {
        for node in self.nodes.values_mut() {
            node.edge = remap
                .half_edge(node.edge)
                .ok_or(CurveError::MissingEdge { edge: node.edge })?;
        }
        Ok(())
    }

    /// Checks that the curve covers every interior face exactly once and is continuous.
    ///
    /// # Errors
    ///
    /// Returns the first [`CurveError`] found.
    pub fn validate<T: CoordinateScalar>(&self, mesh: &Mesh<T>) -> Result<(), CurveError> {
        let mut seen = FastHashSet::default();
        let mut previous_exit: Option<VertexKey> = None;
        let mut count = 0;
        for (key, node) in self.iter() {
            count += 1;
            let face = mesh.face(node.edge)?;
            if !mesh.is_interior(face) {
                return Err(CurveError::NotInterior { node: key, face });
            }
            if !seen.insert(face) {
                return Err(CurveError::DuplicateFace { face });
            }
            let entry = node.entry(mesh)?;
            if previous_exit.is_some_and(|exit| exit != entry) {
                return Err(CurveError::Discontinuous { node: key });
            }
            previous_exit = Some(node.exit(mesh)?);
        }
        let faces = mesh.number_of_faces();
        if count != self.nodes.len() || count != faces {
            return Err(CurveError::FaceCount {
                nodes: count,
                faces,
            });
        }
        Ok(())
    }
}
