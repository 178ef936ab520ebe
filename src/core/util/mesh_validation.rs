//! Structural and Delaunay validation of half-edge meshes.
//!
//! [`validate_topology`] stops at the first broken invariant; [`validation_report`]
//! checks everything and returns all violations grouped by [`InvariantKind`].

use thiserror::Error;

use crate::core::algorithms::legalization::{EdgeLegality, edge_legality};
use crate::core::face::FaceKind;
use crate::core::mesh::{FaceKey, HalfEdgeKey, Mesh, MeshError, VertexKey};
use crate::geometry::predicates::{Orientation, orientation};
use crate::geometry::traits::coordinate::CoordinateScalar;

/// Errors reported by mesh validation.
///
/// # Examples
///
/// ```rust
/// use sfc_mesh::core::util::MeshValidationError;
///
/// let err = MeshValidationError::BorderFace { count: 2 };
/// assert!(err.to_string().contains("2"));
/// ```
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MeshValidationError {
    /// The mesh does not have exactly one live border face.
    #[error("Expected exactly one border face, found {count}")]
    BorderFace {
        /// Number of live border faces.
        count: usize,
    },
    /// `twin(twin(e)) != e`.
    #[error("Twin of {edge:?} does not point back")]
    TwinMismatch {
        /// The half-edge.
        edge: HalfEdgeKey,
    },
    /// `next(prev(e)) != e` or `prev(next(e)) != e`.
    #[error("Next/prev links around {edge:?} are inconsistent")]
    BrokenLinks {
        /// The half-edge.
        edge: HalfEdgeKey,
    },
    /// The twin of `e` does not end where `e` starts.
    #[error("Twin of {edge:?} does not end at its start vertex")]
    TwinEndpointMismatch {
        /// The half-edge.
        edge: HalfEdgeKey,
    },
    /// A half-edge of a face cycle points at another face.
    #[error("Half-edge {edge:?} in the cycle of {expected:?} points at another face")]
    FaceAssignment {
        /// The half-edge.
        edge: HalfEdgeKey,
        /// The face whose cycle contains it.
        expected: FaceKey,
    },
    /// An interior face is not a 3-cycle.
    #[error("Interior face {face:?} has {edges} edges")]
    NotATriangle {
        /// The face.
        face: FaceKey,
        /// Length of its cycle.
        edges: usize,
    },
    /// An interior face is not counter-clockwise.
    #[error("Interior face {face:?} is not counter-clockwise")]
    Orientation {
        /// The face.
        face: FaceKey,
    },
    /// A vertex's incoming half-edge does not end at it.
    #[error("Vertex {vertex:?} has no valid incoming half-edge")]
    VertexIncidence {
        /// The vertex.
        vertex: VertexKey,
    },
    /// The vertex across an internal edge lies inside the circumcircle.
    #[error("Edge {edge:?} violates the empty-circle property")]
    DelaunayViolation {
        /// One half-edge of the illegal edge.
        edge: HalfEdgeKey,
    },
    /// A mesh accessor failed during validation.
    #[error("Mesh access failed: {source}")]
    Mesh {
        /// The underlying error.
        #[from]
        source: MeshError,
    },
}

/// Classifies the kind of invariant that failed during validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InvariantKind {
    /// Exactly one border face.
    Border,
    /// Twin and next/prev symmetry of half-edges.
    HalfEdgeLinks,
    /// Closed face cycles, triangle faces, orientation.
    FaceCycles,
    /// Vertex → incoming half-edge references.
    VertexIncidence,
    /// Empty-circle property of internal edges.
    Delaunay,
}

/// A single invariant violation recorded during validation diagnostics.
#[derive(Clone, Debug)]
pub struct InvariantViolation {
    /// The kind of invariant that failed.
    pub kind: InvariantKind,
    /// The detailed validation error explaining the failure.
    pub error: MeshValidationError,
}

/// Aggregate report of one or more validation failures.
#[derive(Clone, Debug, Default)]
pub struct MeshValidationReport {
    /// The ordered list of invariant violations that occurred.
    pub violations: Vec<InvariantViolation>,
}

impl MeshValidationReport {
    /// Returns `true` if no violations were recorded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations of one kind.
    pub fn of_kind(&self, kind: InvariantKind) -> impl Iterator<Item = &MeshValidationError> {
        self.violations
            .iter()
            .filter(move |v| v.kind == kind)
            .map(|v| &v.error)
    }

    fn record(&mut self, kind: InvariantKind, result: Result<(), MeshValidationError>) {
        if let Err(error) = result {
            self.violations.push(InvariantViolation { kind, error });
        }
    }
}

/// Configuration options for [`validation_report`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ValidationOptions {
    /// Whether to validate the empty-circle invariant.
    pub check_delaunay: bool,
}

// =============================================================================
// CHECKS
// =============================================================================

fn check_border<T: CoordinateScalar>(mesh: &Mesh<T>) -> Result<(), MeshValidationError> {
    let count = mesh
        .all_faces()
        .filter(|&f| mesh.face_kind(f).is_ok_and(|k| k == FaceKind::Border))
        .count();
    if count == 1 && mesh.is_alive(mesh.border()) {
        Ok(())
    } else {
        Err(MeshValidationError::BorderFace { count })
    }
}

fn check_half_edge<T: CoordinateScalar>(
    mesh: &Mesh<T>,
    e: HalfEdgeKey,
) -> Result<(), MeshValidationError> {
    let twin = mesh.twin(e)?;
    if mesh.twin(twin)? != e {
        return Err(MeshValidationError::TwinMismatch { edge: e });
    }
    if mesh.next(mesh.prev(e)?)? != e || mesh.prev(mesh.next(e)?)? != e {
        return Err(MeshValidationError::BrokenLinks { edge: e });
    }
    if mesh.vertex(twin)? != mesh.start_vertex(e)? {
        return Err(MeshValidationError::TwinEndpointMismatch { edge: e });
    }
    mesh.face_data(mesh.face(e)?)?;
    mesh.vertex_data(mesh.vertex(e)?)?;
    Ok(())
}

fn check_face<T: CoordinateScalar>(mesh: &Mesh<T>, f: FaceKey) -> Result<(), MeshValidationError> {
    let kind = mesh.face_kind(f)?;
    if kind == FaceKind::Border && mesh.face_data(f)?.edge().is_none() {
        // Empty mesh.
        return Ok(());
    }
    let edges = mesh.face_edges(f)?;
    for &e in &edges {
        if mesh.face(e)? != f {
            return Err(MeshValidationError::FaceAssignment {
                edge: e,
                expected: f,
            });
        }
    }
    if kind == FaceKind::Interior {
        if edges.len() != 3 {
            return Err(MeshValidationError::NotATriangle {
                face: f,
                edges: edges.len(),
            });
        }
        let t = mesh.to_triangle(f)?;
        let [a, b, c] = &t.points;
        if orientation(a, b, c) != Orientation::POSITIVE {
            return Err(MeshValidationError::Orientation { face: f });
        }
    }
    Ok(())
}

fn check_vertex<T: CoordinateScalar>(
    mesh: &Mesh<T>,
    v: VertexKey,
) -> Result<(), MeshValidationError> {
    let e = mesh
        .edge_of_vertex(v)
        .map_err(|_| MeshValidationError::VertexIncidence { vertex: v })?;
    if mesh.is_destroyed(e) || mesh.vertex(e)? != v {
        return Err(MeshValidationError::VertexIncidence { vertex: v });
    }
    Ok(())
}

/// Checks every structural invariant and returns the first failure.
///
/// # Errors
///
/// Returns the first [`MeshValidationError`] encountered.
pub fn validate_topology<T: CoordinateScalar>(mesh: &Mesh<T>) -> Result<(), MeshValidationError> {
    check_border(mesh)?;
    for e in mesh.half_edges() {
        check_half_edge(mesh, e)?;
    }
    for f in mesh.all_faces() {
        check_face(mesh, f)?;
    }
    for v in mesh.vertices() {
        check_vertex(mesh, v)?;
    }
    Ok(())
}

/// Internal edges whose twin apex lies strictly inside the circumcircle.
///
/// Returns one half-edge per illegal undirected edge.
///
/// # Errors
///
/// Returns an error if the mesh around an edge is inconsistent.
pub fn find_delaunay_violations<T: CoordinateScalar>(
    mesh: &Mesh<T>,
) -> Result<Vec<HalfEdgeKey>, MeshError> {
    let mut violations = Vec::new();
    for e in mesh.edges() {
        if edge_legality(mesh, e)? == EdgeLegality::Illegal {
            violations.push(e);
        }
    }
    Ok(violations)
}

/// Runs all checks and collects every violation.
///
/// # Errors
///
/// Returns the full [`MeshValidationReport`] if any invariant failed.
pub fn validation_report<T: CoordinateScalar>(
    mesh: &Mesh<T>,
    options: ValidationOptions,
) -> Result<(), MeshValidationReport> {
    let mut report = MeshValidationReport::default();
    report.record(InvariantKind::Border, check_border(mesh));
    for e in mesh.half_edges() {
        report.record(InvariantKind::HalfEdgeLinks, check_half_edge(mesh, e));
    }
    for f in mesh.all_faces() {
        report.record(InvariantKind::FaceCycles, check_face(mesh, f));
    }
    for v in mesh.vertices() {
        report.record(InvariantKind::VertexIncidence, check_vertex(mesh, v));
    }
    if options.check_delaunay {
        match find_delaunay_violations(mesh) {
            Ok(edges) => {
                for edge in edges {
                    report.record(
                        InvariantKind::Delaunay,
                        Err(MeshValidationError::DelaunayViolation { edge }),
                    );
                }
            }
            Err(source) => report.record(InvariantKind::Delaunay, Err(source.into())),
        }
    }

    if report.is_empty() {
        Ok(())
    } else {
        Err(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Point;
    use crate::geometry::util::BoundingBox;

    fn square() -> Mesh<f64> {
        let mut mesh = Mesh::new();
        mesh.create_square(&BoundingBox::from_bounds([0.0, 0.0], [2.0, 1.0]))
            .unwrap();
        mesh
    }

    #[test]
    fn test_valid_square() {
        let mesh = square();
        assert!(validate_topology(&mesh).is_ok());
        assert!(
            validation_report(
                &mesh,
                ValidationOptions {
                    check_delaunay: true
                }
            )
            .is_ok()
        );
        assert!(validate_topology(&Mesh::<f64>::new()).is_ok());
    }

    #[test]
    fn test_detects_moved_vertex() {
        let mut mesh = square();
        let v = mesh.vertices().nth(1).unwrap();
        // Dragging a corner across the diagonal inverts a triangle.
        mesh.set_point(v, Point::new([-1.0, 3.0])).unwrap();
        let report = validation_report(&mesh, ValidationOptions::default()).unwrap_err();
        assert!(report.of_kind(InvariantKind::FaceCycles).count() >= 1);
    }

    #[test]
    fn test_detects_broken_twin() {
        let mut mesh = square();
        let border_edge = mesh.edge_of_face(mesh.border()).unwrap();
        let other = mesh.next(border_edge).unwrap();
        let twin = mesh.twin(other).unwrap();
        mesh.set_twin(border_edge, twin).unwrap();
        assert!(validate_topology(&mesh).is_err());
    }

    #[test]
    fn test_detects_delaunay_violation() {
        let mut mesh = square();
        let diagonal = mesh
            .edges()
            .find(|&e| !mesh.is_at_boundary(e).unwrap())
            .unwrap();
        // Pull a corner towards the opposite triangle so the diagonal becomes illegal.
        let far = mesh.vertex(mesh.next(diagonal).unwrap()).unwrap();
        let p = *mesh.point(far).unwrap();
        let centre = Point::new([1.0, 0.5]);
        mesh.set_point(far, p.midpoint(&centre)).unwrap();
        let violations = find_delaunay_violations(&mesh).unwrap();
        assert_eq!(violations.len(), 1);
    }
}
