//! Point location in planar triangulations.
//!
//! A [`PointLocator`] answers "which triangle contains this point?" and is notified of
//! every topological change the triangulation engine makes, so strategies that keep an
//! index (the [`DelaunayTree`]) can stay in sync. The strategy is chosen once, when the
//! engine is constructed, either statically (generic parameter) or through
//! [`AnyLocator`] from a [`LocatorKind`].
//!
//! # Algorithm
//!
//! [`BaseLocator`] implements a visibility walk: starting from a hint face it repeatedly
//! crosses the edge whose supporting line separates the face from the query point, until
//! no such edge exists. A walk that would cross into the border or a hole, or that
//! revisits a face, falls back to a linear scan over all faces.
//!
//! # References
//!
//! - O. Devillers, S. Pion, and M. Teillaud, "Walking in a Triangulation",
//!   International Journal of Foundations of Computer Science, 2001.

use crate::core::algorithms::delaunay_hierarchy::DelaunayHierarchy;
use crate::core::algorithms::delaunay_tree::DelaunayTree;
use crate::core::collections::{FaceKeyBuffer, FastHashSet};
use crate::core::mesh::{FaceKey, HalfEdgeKey, Mesh, MeshError, MeshRemap, VertexKey};
use crate::geometry::point::Point;
use crate::geometry::predicates::signed_distance_to_line;
use crate::geometry::traits::coordinate::CoordinateScalar;

/// Safety limit for cycle detection in walks.
pub const MAX_WALK_STEPS: usize = 10000;

/// Where a point lies relative to one triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateResult {
    /// Point is strictly inside the face
    InsideFace(FaceKey),
    /// Point is on an edge of the face (the half-edge belongs to the face)
    OnEdge(HalfEdgeKey),
    /// Point coincides with a corner of the face
    OnVertex(VertexKey),
    /// Point is outside the face
    Outside,
}

/// Available point location strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LocatorKind {
    /// Visibility walk with linear-scan fallback.
    #[default]
    Base,
    /// History DAG of all triangles ever created.
    DelaunayTree,
    /// Multi-level hierarchy (not implemented).
    DelaunayHierarchy,
}

impl std::fmt::Display for LocatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base => write!(f, "Base"),
            Self::DelaunayTree => write!(f, "Delaunay-Tree"),
            Self::DelaunayHierarchy => write!(f, "Delaunay-Hierarchy"),
        }
    }
}

/// Error during point location.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocateError {
    /// Triangulation has no faces
    #[error("Cannot locate in empty triangulation")]
    EmptyTriangulation,

    /// Face reference is invalid
    #[error("Invalid face reference: {face:?}")]
    InvalidFace {
        /// The invalid face key
        face: FaceKey,
    },

    /// Cycle detected during walking (numerical issues)
    #[error("Cycle detected after {steps} steps - possible numerical degeneracy")]
    CycleDetected {
        /// Number of steps before cycle detection
        steps: usize,
    },

    /// The strategy does not implement the requested operation
    #[error("{strategy} point location does not implement {operation}")]
    NotImplemented {
        /// The strategy
        strategy: LocatorKind,
        /// The operation that was requested
        operation: &'static str,
    },

    /// Mesh access failed while locating
    #[error("Mesh access failed: {source}")]
    Mesh {
        #[from]
        /// The underlying mesh error
        source: MeshError,
    },
}

// =============================================================================
// LOCATOR TRAIT
// =============================================================================

/// A point location strategy bound to one triangulation.
///
/// Queries take the mesh by shared reference; events are delivered by the engine right
/// after the corresponding mesh edit, so the mesh already reflects the change.
pub trait PointLocator<T>: Send + Sync
where
    T: CoordinateScalar,
{
    /// Which strategy this is.
    fn kind(&self) -> LocatorKind;

    /// Returns the interior face containing `p` (epsilon-inclusive), or `None` if `p`
    /// lies outside the meshed region or inside a hole.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty triangulation, an inconsistent mesh, or an
    /// unimplemented strategy.
    fn locate(
        &self,
        mesh: &Mesh<T>,
        p: &Point<T>,
        epsilon: T,
    ) -> Result<Option<FaceKey>, LocateError>;

    /// Candidate faces for `p`.
    ///
    /// One face for a strictly interior point; every interior face sharing the edge for
    /// an on-edge point; for a point within `epsilon` of a vertex, nothing in insertion
    /// mode and the interior faces around the vertex otherwise.
    ///
    /// # Errors
    ///
    /// See [`locate`](Self::locate).
    fn locate_point(
        &self,
        mesh: &Mesh<T>,
        p: &Point<T>,
        for_insertion: bool,
        epsilon: T,
    ) -> Result<FaceKeyBuffer, LocateError> {
        match self.locate(mesh, p, epsilon)? {
            Some(face) => candidates_from_face(mesh, face, p, for_insertion, epsilon),
            None => Ok(FaceKeyBuffer::new()),
        }
    }

    /// `original` was replaced by `new_faces` (`None`: faces created from nothing).
    ///
    /// # Errors
    ///
    /// Returns an error if the strategy cannot record the event.
    fn split_face_event(
        &mut self,
        mesh: &Mesh<T>,
        original: Option<FaceKey>,
        new_faces: &[FaceKey],
    ) -> Result<(), LocateError>;

    /// The shared edge of `faces` was flipped; both faces were rewritten in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the strategy cannot record the event.
    fn flip_edge_event(&mut self, mesh: &Mesh<T>, faces: [FaceKey; 2]) -> Result<(), LocateError>;

    /// `vertex` was inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the strategy cannot record the event.
    fn insert_event(&mut self, mesh: &Mesh<T>, vertex: VertexKey) -> Result<(), LocateError>;

    /// `face` stopped being an interior face (merged into the border or a hole).
    ///
    /// # Errors
    ///
    /// Returns an error if the strategy cannot record the event.
    fn delete_boundary_face(&mut self, mesh: &Mesh<T>, face: FaceKey) -> Result<(), LocateError>;

    /// The mesh storage was rebuilt; every key changed according to `remap`.
    ///
    /// # Errors
    ///
    /// Returns an error if the strategy cannot record the event.
    fn compacted(&mut self, mesh: &Mesh<T>, remap: &MeshRemap) -> Result<(), LocateError>;
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Classifies `p` against the triangle `face`.
///
/// Precedence is vertex > edge > interior: a point within `epsilon` of a corner is
/// [`LocateResult::OnVertex`] even if it is also near an edge.
///
/// # Errors
///
/// Returns an error if `face` is not a live triangle.
pub fn classify_point<T>(
    mesh: &Mesh<T>,
    face: FaceKey,
    p: &Point<T>,
    epsilon: T,
) -> Result<LocateResult, LocateError>
where
    T: CoordinateScalar,
{
    let edges = mesh.face_edges(face)?;
    let mut distances = [T::zero(); 3];
    for (i, &e) in edges.iter().take(3).enumerate() {
        let line = mesh.to_line(e)?;
        distances[i] = signed_distance_to_line(&line.from, &line.to, p);
    }
    if distances.iter().any(|&d| d < -epsilon) {
        return Ok(LocateResult::Outside);
    }
    for &e in &edges {
        let v = mesh.vertex(e)?;
        if mesh.point(v)?.distance(p) <= epsilon {
            return Ok(LocateResult::OnVertex(v));
        }
    }
    for (i, &e) in edges.iter().take(3).enumerate() {
        if distances[i].abs() <= epsilon {
            return Ok(LocateResult::OnEdge(e));
        }
    }
    Ok(LocateResult::InsideFace(face))
}

/// Candidate faces for `p`, given an interior face that contains it.
///
/// # Errors
///
/// Returns an error if the mesh around `face` is inconsistent.
pub fn candidates_from_face<T>(
    mesh: &Mesh<T>,
    face: FaceKey,
    p: &Point<T>,
    for_insertion: bool,
    epsilon: T,
) -> Result<FaceKeyBuffer, LocateError>
where
    T: CoordinateScalar,
{
    let mut candidates = FaceKeyBuffer::new();
    match classify_point(mesh, face, p, epsilon)? {
        LocateResult::OnVertex(v) => {
            if !for_insertion {
                candidates.extend(
                    mesh.vertex_faces(v)?
                        .into_iter()
                        .filter(|&f| mesh.is_interior(f)),
                );
            }
        }
        LocateResult::OnEdge(e) => {
            candidates.push(mesh.face(e)?);
            let other = mesh.twin_face(e)?;
            if mesh.is_interior(other) {
                candidates.push(other);
            }
        }
        LocateResult::InsideFace(f) => candidates.push(f),
        LocateResult::Outside => {}
    }
    Ok(candidates)
}

/// Linear scan over all interior faces.
///
/// # Errors
///
/// Returns an error if a face cannot be materialized.
pub fn scan_faces<T>(
    mesh: &Mesh<T>,
    p: &Point<T>,
    epsilon: T,
) -> Result<Option<FaceKey>, LocateError>
where
    T: CoordinateScalar,
{
    for face in mesh.faces() {
        if mesh.to_triangle(face)?.contains(p, epsilon) {
            return Ok(Some(face));
        }
    }
    Ok(None)
}

// =============================================================================
// BASE LOCATOR
// =============================================================================

/// How a visibility walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    /// The face containing the point.
    Found(FaceKey),
    /// The walk would leave the interior through a border or hole edge.
    Blocked,
    /// The walk revisited a face or ran out of steps.
    Cycle {
        /// Steps taken.
        steps: usize,
    },
}

/// Visibility walk from `start` towards `p`.
///
/// # Errors
///
/// Returns an error if the walk reaches a destroyed or malformed face.
pub fn walk<T>(
    mesh: &Mesh<T>,
    start: FaceKey,
    p: &Point<T>,
    epsilon: T,
) -> Result<WalkOutcome, LocateError>
where
    T: CoordinateScalar,
{
    let mut current = start;
    let mut visited = FastHashSet::default();

    for step in 0..MAX_WALK_STEPS {
        if !visited.insert(current) {
            return Ok(WalkOutcome::Cycle { steps: step });
        }

        // Cross the edge the point is furthest beyond.
        let mut exit: Option<(HalfEdgeKey, T)> = None;
        for e in mesh.face_edges(current)? {
            let line = mesh.to_line(e)?;
            let d = signed_distance_to_line(&line.from, &line.to, p);
            if d < -epsilon && exit.is_none_or(|(_, best)| d < best) {
                exit = Some((e, d));
            }
        }

        let Some((e, _)) = exit else {
            return Ok(WalkOutcome::Found(current));
        };
        let next = mesh.twin_face(e)?;
        if !mesh.is_interior(next) {
            return Ok(WalkOutcome::Blocked);
        }
        current = next;
    }

    Ok(WalkOutcome::Cycle {
        steps: MAX_WALK_STEPS,
    })
}

/// Visibility-walk point location.
///
/// Keeps only a hint: the face of the most recently inserted vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaseLocator {
    hint: Option<FaceKey>,
}

impl BaseLocator {
    /// Creates a locator without a hint.
    #[must_use]
    pub const fn new() -> Self {
        Self { hint: None }
    }

    /// The face the next walk starts from, if still valid.
    #[must_use]
    pub const fn hint(&self) -> Option<FaceKey> {
        self.hint
    }
}

impl<T> PointLocator<T> for BaseLocator
where
    T: CoordinateScalar,
{
    fn kind(&self) -> LocatorKind {
        LocatorKind::Base
    }

    fn locate(
        &self,
        mesh: &Mesh<T>,
        p: &Point<T>,
        epsilon: T,
    ) -> Result<Option<FaceKey>, LocateError> {
        let start = match self.hint {
            Some(face) if mesh.is_interior(face) => face,
            _ => mesh
                .faces()
                .next()
                .ok_or(LocateError::EmptyTriangulation)?,
        };

        match walk(mesh, start, p, epsilon)? {
            WalkOutcome::Found(face) => Ok(Some(face)),
            WalkOutcome::Blocked => scan_faces(mesh, p, epsilon),
            WalkOutcome::Cycle { steps } => {
                tracing::debug!("[locate] walk cycled after {steps} steps; scanning");
                scan_faces(mesh, p, epsilon)
            }
        }
    }

    fn split_face_event(
        &mut self,
        _mesh: &Mesh<T>,
        _original: Option<FaceKey>,
        new_faces: &[FaceKey],
    ) -> Result<(), LocateError> {
        if self.hint.is_none() {
            self.hint = new_faces.first().copied();
        }
        Ok(())
    }

    fn flip_edge_event(&mut self, _mesh: &Mesh<T>, _faces: [FaceKey; 2]) -> Result<(), LocateError> {
        Ok(())
    }

    fn insert_event(&mut self, mesh: &Mesh<T>, vertex: VertexKey) -> Result<(), LocateError> {
        let edge = mesh.edge_of_vertex(vertex)?;
        let face = mesh.face(edge)?;
        self.hint = mesh.is_interior(face).then_some(face);
        Ok(())
    }

    fn delete_boundary_face(&mut self, _mesh: &Mesh<T>, face: FaceKey) -> Result<(), LocateError> {
        if self.hint == Some(face) {
            self.hint = None;
        }
        Ok(())
    }

    fn compacted(&mut self, _mesh: &Mesh<T>, remap: &MeshRemap) -> Result<(), LocateError> {
        self.hint = self.hint.and_then(|face| remap.face(face));
        Ok(())
    }
}

// =============================================================================
// STRATEGY SELECTION
// =============================================================================

/// A locator chosen at runtime from a [`LocatorKind`].
#[derive(Debug, Clone)]
pub enum AnyLocator<T>
where
    T: CoordinateScalar,
{
    /// [`BaseLocator`]
    Base(BaseLocator),
    /// [`DelaunayTree`]
    DelaunayTree(DelaunayTree<T>),
    /// [`DelaunayHierarchy`]
    DelaunayHierarchy(DelaunayHierarchy<T>),
}

impl<T> AnyLocator<T>
where
    T: CoordinateScalar,
{
    /// Creates an empty locator of the given kind.
    #[must_use]
    pub fn from_kind(kind: LocatorKind) -> Self {
        match kind {
            LocatorKind::Base => Self::Base(BaseLocator::new()),
            LocatorKind::DelaunayTree => Self::DelaunayTree(DelaunayTree::new()),
            LocatorKind::DelaunayHierarchy => Self::DelaunayHierarchy(DelaunayHierarchy::new()),
        }
    }

    fn inner(&self) -> &dyn PointLocator<T> {
        match self {
            Self::Base(l) => l,
            Self::DelaunayTree(l) => l,
            Self::DelaunayHierarchy(l) => l,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn PointLocator<T> {
        match self {
            Self::Base(l) => l,
            Self::DelaunayTree(l) => l,
            Self::DelaunayHierarchy(l) => l,
        }
    }
}

impl<T> Default for AnyLocator<T>
where
    T: CoordinateScalar,
{
    fn default() -> Self {
        Self::from_kind(LocatorKind::default())
    }
}

impl<T> PointLocator<T> for AnyLocator<T>
where
    T: CoordinateScalar,
{
    fn kind(&self) -> LocatorKind {
        self.inner().kind()
    }

    fn locate(
        &self,
        mesh: &Mesh<T>,
        p: &Point<T>,
        epsilon: T,
    ) -> Result<Option<FaceKey>, LocateError> {
        self.inner().locate(mesh, p, epsilon)
    }

    fn locate_point(
        &self,
        mesh: &Mesh<T>,
        p: &Point<T>,
        for_insertion: bool,
        epsilon: T,
    ) -> Result<FaceKeyBuffer, LocateError> {
        self.inner().locate_point(mesh, p, for_insertion, epsilon)
    }

    fn split_face_event(
        &mut self,
        mesh: &Mesh<T>,
        original: Option<FaceKey>,
        new_faces: &[FaceKey],
    ) -> Result<(), LocateError> {
        self.inner_mut().split_face_event(mesh, original, new_faces)
    }

    fn flip_edge_event(&mut self, mesh: &Mesh<T>, faces: [FaceKey; 2]) -> Result<(), LocateError> {
        self.inner_mut().flip_edge_event(mesh, faces)
    }

    fn insert_event(&mut self, mesh: &Mesh<T>, vertex: VertexKey) -> Result<(), LocateError> {
        self.inner_mut().insert_event(mesh, vertex)
    }

    fn delete_boundary_face(&mut self, mesh: &Mesh<T>, face: FaceKey) -> Result<(), LocateError> {
        self.inner_mut().delete_boundary_face(mesh, face)
    }

    fn compacted(&mut self, mesh: &Mesh<T>, remap: &MeshRemap) -> Result<(), LocateError> {
        self.inner_mut().compacted(mesh, remap)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mesh::SquareHandles;
    use crate::geometry::util::BoundingBox;

    const EPS: f64 = 1e-9;

    fn unit_square() -> (Mesh<f64>, SquareHandles) {
        let mut mesh = Mesh::new();
        let handles = mesh
            .create_square(&BoundingBox::from_bounds([0.0, 0.0], [1.0, 1.0]))
            .unwrap();
        (mesh, handles)
    }

    #[test]
    fn test_classify_precedence() {
        let (mesh, handles) = unit_square();
        let lower = handles.faces[0];
        assert_eq!(
            classify_point(&mesh, lower, &Point::new([0.0, 0.0]), EPS).unwrap(),
            LocateResult::OnVertex(handles.corners[0])
        );
        assert!(matches!(
            classify_point(&mesh, lower, &Point::new([0.5, 0.5]), EPS).unwrap(),
            LocateResult::OnEdge(_)
        ));
        assert_eq!(
            classify_point(&mesh, lower, &Point::new([0.7, 0.2]), EPS).unwrap(),
            LocateResult::InsideFace(lower)
        );
        assert_eq!(
            classify_point(&mesh, lower, &Point::new([0.2, 0.7]), EPS).unwrap(),
            LocateResult::Outside
        );
    }

    #[test]
    fn test_base_locate_and_candidates() {
        let (mesh, handles) = unit_square();
        let locator = BaseLocator::new();
        assert_eq!(
            locator.locate(&mesh, &Point::new([0.2, 0.7]), EPS).unwrap(),
            Some(handles.faces[1])
        );
        assert_eq!(
            locator.locate(&mesh, &Point::new([2.0, 0.5]), EPS).unwrap(),
            None
        );

        let on_diagonal = locator
            .locate_point(&mesh, &Point::new([0.5, 0.5]), true, EPS)
            .unwrap();
        assert_eq!(on_diagonal.len(), 2);

        let on_corner = Point::new([1.0, 1.0]);
        assert!(
            locator
                .locate_point(&mesh, &on_corner, true, EPS)
                .unwrap()
                .is_empty()
        );
        assert_eq!(
            locator
                .locate_point(&mesh, &on_corner, false, EPS)
                .unwrap()
                .len(),
            2
        );

        let on_border = locator
            .locate_point(&mesh, &Point::new([0.5, 0.0]), true, EPS)
            .unwrap();
        assert_eq!(on_border.as_slice(), &[handles.faces[0]]);
    }

    #[test]
    fn test_empty_mesh_reports_error() {
        let mesh: Mesh<f64> = Mesh::new();
        let locator = BaseLocator::new();
        assert_eq!(
            locator.locate(&mesh, &Point::new([0.0, 0.0]), EPS),
            Err(LocateError::EmptyTriangulation)
        );
    }

    #[test]
    fn test_any_locator_dispatch() {
        let (mesh, handles) = unit_square();
        let mut locator: AnyLocator<f64> = AnyLocator::from_kind(LocatorKind::Base);
        locator
            .split_face_event(&mesh, None, &handles.faces)
            .unwrap();
        assert_eq!(locator.kind(), LocatorKind::Base);
        assert_eq!(
            locator.locate(&mesh, &Point::new([0.9, 0.1]), EPS).unwrap(),
            Some(handles.faces[0])
        );

        let hierarchy: AnyLocator<f64> = AnyLocator::from_kind(LocatorKind::DelaunayHierarchy);
        assert!(matches!(
            hierarchy.locate(&mesh, &Point::new([0.9, 0.1]), EPS),
            Err(LocateError::NotImplemented { .. })
        ));
    }

    #[test]
    fn test_walk_reports_blocked_at_border() {
        let (mesh, handles) = unit_square();
        let outcome = walk(&mesh, handles.faces[1], &Point::new([1.5, 0.5]), EPS).unwrap();
        assert_eq!(outcome, WalkOutcome::Blocked);
    }
}
