//! Mesh faces.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::mesh::HalfEdgeKey;

/// Kind of a face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceKind {
    /// An ordinary triangle.
    Interior,
    /// The single unbounded outer face.
    Border,
    /// A removed interior region (obstacle).
    Hole,
}

impl fmt::Display for FaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interior => write!(f, "interior"),
            Self::Border => write!(f, "border"),
            Self::Hole => write!(f, "hole"),
        }
    }
}

/// A face: one boundary half-edge plus its kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub(crate) edge: Option<HalfEdgeKey>,
    pub(crate) kind: FaceKind,
    pub(crate) destroyed: bool,
}

impl Face {
    pub(crate) const fn new(kind: FaceKind) -> Self {
        Self {
            edge: None,
            kind,
            destroyed: false,
        }
    }

    /// One half-edge of the face's boundary cycle.
    #[inline]
    #[must_use]
    pub const fn edge(&self) -> Option<HalfEdgeKey> {
        self.edge
    }

    /// The face kind.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> FaceKind {
        self.kind
    }

    /// Border or hole.
    #[inline]
    #[must_use]
    pub const fn is_boundary(&self) -> bool {
        !matches!(self.kind, FaceKind::Interior)
    }

    /// Whether the face has been marked for garbage collection.
    #[inline]
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}
