//! Incremental Delaunay triangulation engine.
//!
//! [`IncrementalTriangulation`] owns a half-edge [`Mesh`] and one [`PointLocator`]. Every
//! insertion follows the same pipeline:
//!
//! 1. locate the candidate face(s) for the point;
//! 2. split the containing triangle, or the edge the point lies on;
//! 3. legalize the edges opposite the new vertex with Lawson flips;
//! 4. notify the locator of each topological change.
//!
//! The mesh starts as a square split along its `(min,min)–(max,max)` diagonal. With
//! [`SuperStructure::Enclosing`] the square is enlarged around the configured bound and its
//! corners are removed again by [`finalize`](IncrementalTriangulation::finalize); with
//! [`SuperStructure::Retained`] the square is the bound itself and stays part of the mesh,
//! which is what the SFC refiner needs.
//!
//! # Examples
//!
//! ```rust
//! use sfc_mesh::core::algorithms::locate::BaseLocator;
//! use sfc_mesh::core::triangulation::{IncrementalTriangulation, TriangulationConfig};
//! use sfc_mesh::geometry::point::Point;
//! use sfc_mesh::geometry::util::BoundingBox;
//!
//! let config = TriangulationConfig::new(BoundingBox::from_bounds([0.0, 0.0], [1.0, 1.0]));
//! let mut triangulation = IncrementalTriangulation::new(config, BaseLocator::new()).unwrap();
//! for p in [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.5, 0.5]] {
//!     triangulation.insert(Point::new(p)).unwrap();
//! }
//! triangulation.finalize().unwrap();
//! assert_eq!(triangulation.mesh().number_of_faces(), 4);
//! assert!(triangulation.validate_delaunay().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::algorithms::legalization::{LegalizationError, flip_is_valid, legalize};
use crate::core::algorithms::locate::{
    AnyLocator, LocateError, LocateResult, LocatorKind, PointLocator, classify_point,
};
use crate::core::collections::{FaceKeyBuffer, HalfEdgeKeyBuffer, SmallBuffer};
use crate::core::face::FaceKind;
use crate::core::mesh::{
    FaceKey, HalfEdgeKey, Mesh, MeshError, MeshRemap, SquareHandles, VertexKey,
};
use crate::core::operations::{BoundaryMerge, NotchFill};
use crate::core::util::{
    MeshStatistics, MeshValidationError, find_delaunay_violations, mesh_statistics,
    validate_topology,
};
use crate::geometry::point::Point;
use crate::geometry::predicates::{Orientation, orientation};
use crate::geometry::traits::coordinate::{CoordinateScalar, CoordinateValidationError};
use crate::geometry::util::{BoundingBox, Triangle};

/// Side of the enclosing square relative to the largest side of the bound.
const ENCLOSING_FACTOR: f64 = 4.0;

/// Default epsilon, relative to the largest side of the bound.
pub const DEFAULT_EPSILON_FACTOR: f64 = 1e-4;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// How the initial square relates to the configured bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SuperStructure {
    /// An enlarged square whose corners are removed by `finalize`.
    #[default]
    Enclosing,
    /// The bound itself; its corners stay in the mesh.
    Retained,
}

/// Configuration of an [`IncrementalTriangulation`].
///
/// # Examples
///
/// ```rust
/// use sfc_mesh::core::triangulation::{SuperStructure, TriangulationConfig};
/// use sfc_mesh::geometry::util::BoundingBox;
///
/// let config = TriangulationConfig::new(BoundingBox::from_bounds([0.0, 0.0], [10.0, 5.0]))
///     .with_super_structure(SuperStructure::Retained)
///     .with_epsilon_factor(1e-6);
/// assert_eq!(config.super_structure, SuperStructure::Retained);
/// assert!((config.epsilon() - 1e-5_f64).abs() < 1e-18);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = ""))]
pub struct TriangulationConfig<T>
where
    T: CoordinateScalar,
{
    /// Region every inserted point must lie in.
    pub bound: BoundingBox<T>,
    /// Whether the initial square encloses or equals the bound.
    pub super_structure: SuperStructure,
    /// Epsilon relative to the largest side of `bound`.
    pub epsilon_factor: T,
}

impl<T> TriangulationConfig<T>
where
    T: CoordinateScalar,
{
    /// Enclosing super structure and the default epsilon factor.
    #[must_use]
    pub fn new(bound: BoundingBox<T>) -> Self {
        Self {
            bound,
            super_structure: SuperStructure::default(),
            epsilon_factor: T::cast_f64(DEFAULT_EPSILON_FACTOR),
        }
    }

    /// Sets the super structure.
    #[must_use]
    pub const fn with_super_structure(mut self, super_structure: SuperStructure) -> Self {
        self.super_structure = super_structure;
        self
    }

    /// Sets the relative epsilon.
    #[must_use]
    pub const fn with_epsilon_factor(mut self, epsilon_factor: T) -> Self {
        self.epsilon_factor = epsilon_factor;
        self
    }

    /// Absolute epsilon used for all point classifications.
    #[must_use]
    pub fn epsilon(&self) -> T {
        self.epsilon_factor * self.bound.max_side()
    }
}

/// Lifecycle of an [`IncrementalTriangulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriangulationState {
    /// No mesh yet.
    Uninitialized,
    /// The initial square exists; points can be inserted.
    Initialized,
    /// The super structure was removed; no further insertions.
    Finalized,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised by the triangulation engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TriangulationError {
    /// Mesh access or a topological operation failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
    /// Point location failed.
    #[error(transparent)]
    Locate(#[from] LocateError),
    /// Edge legalization failed.
    #[error(transparent)]
    Legalization(#[from] LegalizationError),
    /// The mesh contradicts what point location reported.
    #[error("Mesh inconsistency: {message}")]
    MeshInconsistency {
        /// What was inconsistent.
        message: String,
    },
    /// The point lies outside the initial square.
    #[error("Point ({x}, {y}) lies outside the triangulated square")]
    PointOutsideBounds {
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
    },
    /// The configured bound has no area or non-finite corners.
    #[error("Invalid bound: {message}")]
    InvalidBound {
        /// Why the bound was rejected.
        message: String,
    },
    /// The configured epsilon factor is not positive and finite.
    #[error("Invalid epsilon factor: {value}")]
    InvalidEpsilon {
        /// The rejected value.
        value: f64,
    },
    /// The point has NaN or infinite coordinates.
    #[error("Invalid point: {source}")]
    InvalidPoint {
        /// The coordinate error.
        #[from]
        source: CoordinateValidationError,
    },
    /// The operation needs an initialized triangulation.
    #[error("Triangulation has not been initialized")]
    NotInitialized,
    /// The operation is not allowed after `finalize`.
    #[error("Triangulation has already been finalized")]
    AlreadyFinalized,
}

// =============================================================================
// ENGINE
// =============================================================================

/// Incremental Delaunay triangulation over a half-edge mesh.
///
/// # Type Parameters
/// - `T`: coordinate scalar
/// - `L`: point location strategy, fixed for the lifetime of the triangulation
#[derive(Debug, Clone)]
pub struct IncrementalTriangulation<T, L = crate::core::algorithms::locate::BaseLocator>
where
    T: CoordinateScalar,
    L: PointLocator<T>,
{
    config: TriangulationConfig<T>,
    mesh: Mesh<T>,
    locator: L,
    state: TriangulationState,
    square: BoundingBox<T>,
    epsilon: T,
    initial: Option<SquareHandles>,
    super_vertices: SmallBuffer<VertexKey, 4>,
}

impl<T> IncrementalTriangulation<T, AnyLocator<T>>
where
    T: CoordinateScalar,
{
    /// Creates a triangulation with the strategy named by `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_locator_kind(
        config: TriangulationConfig<T>,
        kind: LocatorKind,
    ) -> Result<Self, TriangulationError> {
        Self::new(config, AnyLocator::from_kind(kind))
    }
}

impl<T, L> IncrementalTriangulation<T, L>
where
    T: CoordinateScalar,
    L: PointLocator<T>,
{
    /// Creates an uninitialized triangulation.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::InvalidBound`] for an empty or non-finite bound and
    /// [`TriangulationError::InvalidEpsilon`] for a non-positive epsilon factor.
    pub fn new(config: TriangulationConfig<T>, locator: L) -> Result<Self, TriangulationError> {
        if !config.bound.is_valid() {
            return Err(TriangulationError::InvalidBound {
                message: format!(
                    "bound {:?}..{:?} must have positive finite extents",
                    config.bound.min, config.bound.max
                ),
            });
        }
        let factor = config.epsilon_factor;
        if !(factor.is_finite() && factor > T::zero()) {
            return Err(TriangulationError::InvalidEpsilon {
                value: factor.as_f64(),
            });
        }
        let square = match config.super_structure {
            SuperStructure::Enclosing => config
                .bound
                .enclosing_square(T::cast_f64(ENCLOSING_FACTOR)),
            SuperStructure::Retained => config.bound,
        };
        Ok(Self {
            config,
            mesh: Mesh::new(),
            locator,
            state: TriangulationState::Uninitialized,
            square,
            epsilon: config.epsilon(),
            initial: None,
            super_vertices: SmallBuffer::new(),
        })
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// The underlying mesh.
    #[must_use]
    pub const fn mesh(&self) -> &Mesh<T> {
        &self.mesh
    }

    /// The point location strategy.
    #[must_use]
    pub const fn locator(&self) -> &L {
        &self.locator
    }

    /// The configuration this triangulation was created with.
    #[must_use]
    pub const fn config(&self) -> &TriangulationConfig<T> {
        &self.config
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> TriangulationState {
        self.state
    }

    /// Absolute classification epsilon.
    #[must_use]
    pub const fn epsilon(&self) -> T {
        self.epsilon
    }

    /// The square that was (or will be) triangulated initially.
    #[must_use]
    pub const fn bounding_square(&self) -> &BoundingBox<T> {
        &self.square
    }

    /// Handles of the initial square, until the storage is rearranged.
    #[must_use]
    pub const fn initial_square(&self) -> Option<&SquareHandles> {
        self.initial.as_ref()
    }

    /// The two half-edges of the initial diagonal, lower-right triangle first.
    #[must_use]
    pub fn initial_diagonal(&self) -> Option<[HalfEdgeKey; 2]> {
        self.initial.as_ref().map(|handles| handles.diagonal)
    }

    /// Corners of the enclosing square that `finalize` will remove.
    #[must_use]
    pub fn super_vertices(&self) -> &[VertexKey] {
        &self.super_vertices
    }

    /// Live interior faces.
    pub fn faces(&self) -> impl Iterator<Item = FaceKey> + '_ {
        self.mesh.faces()
    }

    /// Live vertices.
    pub fn vertices(&self) -> impl Iterator<Item = VertexKey> + '_ {
        self.mesh.vertices()
    }

    /// Positions of live vertices.
    pub fn points(&self) -> impl Iterator<Item = &Point<T>> + '_ {
        self.mesh.points()
    }

    /// Geometry of the face `f`.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is not a live face.
    pub fn to_triangle(&self, f: FaceKey) -> Result<Triangle<T>, TriangulationError> {
        Ok(self.mesh.to_triangle(f)?)
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Builds the initial two-triangle square. Does nothing when already initialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the locator rejects the initial faces.
    pub fn init(&mut self) -> Result<(), TriangulationError> {
        if self.state != TriangulationState::Uninitialized {
            return Ok(());
        }
        let handles = self.mesh.create_square(&self.square)?;
        self.locator
            .split_face_event(&self.mesh, None, &handles.faces)?;
        if self.config.super_structure == SuperStructure::Enclosing {
            self.super_vertices.extend(handles.corners);
        }
        tracing::debug!(
            "[triangulation] initialized {:?} square {:?}..{:?} with {} locator",
            self.config.super_structure,
            self.square.min,
            self.square.max,
            self.locator.kind()
        );
        self.initial = Some(handles);
        self.state = TriangulationState::Initialized;
        Ok(())
    }

    fn require_open(&self) -> Result<(), TriangulationError> {
        match self.state {
            TriangulationState::Initialized => Ok(()),
            TriangulationState::Uninitialized => Err(TriangulationError::NotInitialized),
            TriangulationState::Finalized => Err(TriangulationError::AlreadyFinalized),
        }
    }

    fn require_initialized(&self) -> Result<(), TriangulationError> {
        if self.state == TriangulationState::Uninitialized {
            Err(TriangulationError::NotInitialized)
        } else {
            Ok(())
        }
    }

    // =========================================================================
    // INSERTION
    // =========================================================================

    /// Inserts `p` and restores the Delaunay property.
    ///
    /// Initializes the triangulation on first use. Returns a half-edge ending at the new
    /// vertex, or `None` if `p` is within epsilon of an existing vertex.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::PointOutsideBounds`] for points outside the initial
    /// square, [`TriangulationError::AlreadyFinalized`] after `finalize`, and
    /// [`TriangulationError::MeshInconsistency`] if point location contradicts the mesh.
    pub fn insert(&mut self, p: Point<T>) -> Result<Option<HalfEdgeKey>, TriangulationError> {
        if self.state == TriangulationState::Finalized {
            return Err(TriangulationError::AlreadyFinalized);
        }
        p.validate()?;
        self.init()?;
        if !self.square.contains(&p, self.epsilon) {
            return Err(TriangulationError::PointOutsideBounds {
                x: p.x().as_f64(),
                y: p.y().as_f64(),
            });
        }

        let candidates = self
            .locator
            .locate_point(&self.mesh, &p, true, self.epsilon)?;
        match candidates.as_slice() {
            [] => {
                if self.is_near_vertex(&p)? {
                    tracing::warn!("[triangulation] skipping duplicate point {p}");
                    Ok(None)
                } else {
                    Err(self.inconsistency(format!("no face contains {p}")))
                }
            }
            &[face] => match classify_point(&self.mesh, face, &p, self.epsilon)? {
                LocateResult::InsideFace(f) => self.insert_in_face(f, p).map(Some),
                LocateResult::OnEdge(e) => self.insert_on_edge(e, p, true).map(Some),
                LocateResult::OnVertex(_) => {
                    tracing::warn!("[triangulation] skipping duplicate point {p}");
                    Ok(None)
                }
                LocateResult::Outside => {
                    Err(self.inconsistency(format!("{p} lies outside candidate {face:?}")))
                }
            },
            &[first, second] => {
                let shared = self.shared_edge(first, second)?.ok_or_else(|| {
                    self.inconsistency(format!("{first:?} and {second:?} share no edge"))
                })?;
                self.insert_on_edge(shared, p, true).map(Some)
            }
            many => Err(self.inconsistency(format!(
                "{} candidate faces for {p}",
                many.len()
            ))),
        }
    }

    /// Inserts all points in order.
    ///
    /// Returns the number of points that created a new vertex.
    ///
    /// # Errors
    ///
    /// Stops at the first failed insertion.
    pub fn insert_all<I>(&mut self, points: I) -> Result<usize, TriangulationError>
    where
        I: IntoIterator<Item = Point<T>>,
    {
        let mut inserted = 0;
        for p in points {
            if self.insert(p)?.is_some() {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Inserts `p` on the edge `e`, legalizing afterwards only when asked to.
    ///
    /// # Errors
    ///
    /// Returns an error if the triangulation is not open for insertion or the split fails.
    pub fn split_edge(
        &mut self,
        e: HalfEdgeKey,
        p: Point<T>,
        legalize: bool,
    ) -> Result<HalfEdgeKey, TriangulationError> {
        self.require_open()?;
        p.validate()?;
        self.insert_on_edge(e, p, legalize)
    }

    fn insert_in_face(&mut self, f: FaceKey, p: Point<T>) -> Result<HalfEdgeKey, TriangulationError> {
        let split = self.mesh.split_triangle(f, p)?;
        self.locator
            .split_face_event(&self.mesh, Some(f), &split.faces)?;
        legalize(&mut self.mesh, &mut self.locator, split.outer_edges)?;
        self.locator.insert_event(&self.mesh, split.vertex)?;
        Ok(self.mesh.edge_of_vertex(split.vertex)?)
    }

    fn insert_on_edge(
        &mut self,
        e: HalfEdgeKey,
        p: Point<T>,
        legalize_edges: bool,
    ) -> Result<HalfEdgeKey, TriangulationError> {
        let split = self.mesh.split_edge(e, p)?;
        for (original, faces) in &split.splits {
            self.locator
                .split_face_event(&self.mesh, Some(*original), faces)?;
        }
        if legalize_edges {
            legalize(
                &mut self.mesh,
                &mut self.locator,
                split.outer_edges.iter().copied(),
            )?;
        }
        self.locator.insert_event(&self.mesh, split.vertex)?;
        Ok(self.mesh.edge_of_vertex(split.vertex)?)
    }

    fn is_near_vertex(&self, p: &Point<T>) -> Result<bool, TriangulationError> {
        let Some(face) = self.locator.locate(&self.mesh, p, self.epsilon)? else {
            return Ok(false);
        };
        Ok(matches!(
            classify_point(&self.mesh, face, p, self.epsilon)?,
            LocateResult::OnVertex(_)
        ))
    }

    fn shared_edge(
        &self,
        first: FaceKey,
        second: FaceKey,
    ) -> Result<Option<HalfEdgeKey>, TriangulationError> {
        for e in self.mesh.face_edges(first)? {
            if self.mesh.twin_face(e)? == second {
                return Ok(Some(e));
            }
        }
        Ok(None)
    }

    fn inconsistency(&self, message: String) -> TriangulationError {
        tracing::error!("[triangulation] {message}");
        TriangulationError::MeshInconsistency { message }
    }

    // =========================================================================
    // FINALIZATION AND BOUNDARY EDITS
    // =========================================================================

    /// Removes the enclosing square and every face touching its corners.
    ///
    /// Edges from a square corner are first flipped away wherever the flip yields a
    /// triangle of inserted points. Faces are then peeled one border-adjacent face at a
    /// time, concave pockets left on the border are closed, and the result is legalized,
    /// so the remaining faces cover the convex hull of the inserted points. A hull vertex
    /// whose only inserted neighbour is a single vertex has no face left and is dropped
    /// with the square; this needs a point set that is tiny or nearly collinear relative
    /// to the bound. With [`SuperStructure::Retained`] only the state changes. Calling it
    /// again does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::NotInitialized`] before `init`, or
    /// [`TriangulationError::MeshInconsistency`] if some super face can never reach the
    /// border.
    pub fn finalize(&mut self) -> Result<(), TriangulationError> {
        match self.state {
            TriangulationState::Uninitialized => return Err(TriangulationError::NotInitialized),
            TriangulationState::Finalized => return Ok(()),
            TriangulationState::Initialized => {}
        }

        let flipped = self.flip_away_from_super_vertices()?;

        let mut pending: Vec<FaceKey> = Vec::new();
        for &s in &self.super_vertices {
            for f in self.mesh.vertex_faces(s)? {
                if self.mesh.is_interior(f) && !pending.contains(&f) {
                    pending.push(f);
                }
            }
        }

        let mut removed = 0;
        while !pending.is_empty() {
            let before = pending.len();
            let mut remaining = Vec::with_capacity(before);
            for f in pending {
                if !self.mesh.is_interior(f) {
                    continue;
                }
                if self.touches_border(f)? {
                    self.mesh.merge_into_boundary(f, self.mesh.border())?;
                    self.locator.delete_boundary_face(&self.mesh, f)?;
                    removed += 1;
                } else {
                    remaining.push(f);
                }
            }
            if remaining.len() == before {
                return Err(self.inconsistency(format!(
                    "{before} super faces are not reachable from the border"
                )));
            }
            pending = remaining;
        }

        for &s in &self.super_vertices {
            if self.mesh.is_alive(s) {
                return Err(self.inconsistency(format!("super vertex {s:?} survived finalize")));
            }
        }
        self.super_vertices.clear();

        let pockets = if removed > 0 && self.mesh.number_of_faces() > 0 {
            self.close_border_pockets()?
        } else {
            0
        };
        if flipped > 0 || pockets > 0 {
            let edges: Vec<HalfEdgeKey> = self.mesh.half_edges().collect();
            legalize(&mut self.mesh, &mut self.locator, edges)?;
        }

        self.state = TriangulationState::Finalized;
        tracing::debug!(
            "[triangulation] finalized: {flipped} flips, removed {removed} super faces, \
             closed {pockets} pockets, {} faces remain",
            self.mesh.number_of_faces()
        );
        Ok(())
    }

    /// Flips edges `b → s` from a square corner `s` whose quadrilateral is convex and
    /// whose other three vertices were inserted. Each flip lowers the degree of `s`.
    fn flip_away_from_super_vertices(&mut self) -> Result<usize, TriangulationError> {
        let mut flipped = 0;
        loop {
            let mut changed = false;
            for i in 0..self.super_vertices.len() {
                let s = self.super_vertices[i];
                for e in self.mesh.vertex_in_edges(s)? {
                    if self.opens_inserted_triangle(e)? {
                        let flip = self.mesh.flip(e)?;
                        self.locator.flip_edge_event(&self.mesh, flip.faces)?;
                        flipped += 1;
                        changed = true;
                        // The rotation around `s` changed.
                        break;
                    }
                }
            }
            if !changed {
                return Ok(flipped);
            }
        }
    }

    fn opens_inserted_triangle(&self, e: HalfEdgeKey) -> Result<bool, TriangulationError> {
        if self.mesh.is_at_boundary(e)? {
            return Ok(false);
        }
        let t = self.mesh.twin(e)?;
        let ends = [
            self.mesh.start_vertex(e)?,
            self.mesh.vertex(self.mesh.next(e)?)?,
            self.mesh.vertex(self.mesh.next(t)?)?,
        ];
        if ends.iter().any(|v| self.super_vertices.contains(v)) {
            return Ok(false);
        }
        Ok(flip_is_valid(&self.mesh, e)?)
    }

    /// Fills border corners that turn towards the outside until the border is convex.
    fn close_border_pockets(&mut self) -> Result<usize, TriangulationError> {
        let border = self.mesh.border();
        let mut closed = 0;
        loop {
            let cycle = self.mesh.face_edges(border)?;
            if cycle.len() <= 3 {
                return Ok(closed);
            }
            let mut pocket = None;
            for &x in &cycle {
                if self.is_border_pocket(x, &cycle)? {
                    pocket = Some(x);
                    break;
                }
            }
            let Some(x) = pocket else {
                return Ok(closed);
            };
            let fill = self.mesh.fill_boundary_notch(x)?;
            self.locator
                .split_face_event(&self.mesh, None, &[fill.face])?;
            closed += 1;
        }
    }

    /// The border runs clockwise around the mesh, so a left turn at `vertex(x)` is a
    /// pocket. It can be closed when no other border vertex touches the corner triangle.
    fn is_border_pocket(
        &self,
        x: HalfEdgeKey,
        cycle: &[HalfEdgeKey],
    ) -> Result<bool, TriangulationError> {
        let y = self.mesh.next(x)?;
        let (u, v, w) = (
            self.mesh.start_vertex(x)?,
            self.mesh.vertex(x)?,
            self.mesh.vertex(y)?,
        );
        if u == w || u == v || v == w {
            return Ok(false);
        }
        let (pu, pv, pw) = (
            *self.mesh.point(u)?,
            *self.mesh.point(v)?,
            *self.mesh.point(w)?,
        );
        if orientation(&pu, &pv, &pw) != Orientation::POSITIVE {
            return Ok(false);
        }
        let corner = Triangle::new(pu, pv, pw);
        for &z in cycle {
            let q = self.mesh.vertex(z)?;
            if q != u && q != v && q != w && corner.contains(self.mesh.point(q)?, self.epsilon) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether the interior face `f` shares an edge with the border.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is not a live face.
    pub fn touches_border(&self, f: FaceKey) -> Result<bool, TriangulationError> {
        let border = self.mesh.border();
        for e in self.mesh.face_edges(f)? {
            if self.mesh.twin_face(e)? == border {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Merges the border-adjacent interior face `f` into the border.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is not interior or does not touch the border.
    pub fn remove_border_face(&mut self, f: FaceKey) -> Result<BoundaryMerge, TriangulationError> {
        self.require_initialized()?;
        let merge = self.mesh.merge_into_boundary(f, self.mesh.border())?;
        self.locator.delete_boundary_face(&self.mesh, f)?;
        Ok(merge)
    }

    /// Turns the interior face `f` into a hole face.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is not a live interior face.
    pub fn create_hole(&mut self, f: FaceKey) -> Result<FaceKey, TriangulationError> {
        self.require_initialized()?;
        if !self.mesh.is_interior(f) {
            return Err(MeshError::InvalidOperation {
                message: format!("{f:?} is not an interior face"),
            }
            .into());
        }
        self.mesh.set_face_kind(f, FaceKind::Hole)?;
        self.locator.delete_boundary_face(&self.mesh, f)?;
        Ok(f)
    }

    /// Merges the interior face `f` into the adjacent hole face `hole`.
    ///
    /// # Errors
    ///
    /// Returns an error if `hole` is not a hole or the faces share no edge.
    pub fn merge_into_hole(
        &mut self,
        f: FaceKey,
        hole: FaceKey,
    ) -> Result<BoundaryMerge, TriangulationError> {
        self.require_initialized()?;
        if !self.mesh.is_hole(hole) {
            return Err(MeshError::InvalidOperation {
                message: format!("{hole:?} is not a hole face"),
            }
            .into());
        }
        let merge = self.mesh.merge_into_boundary(f, hole)?;
        self.locator.delete_boundary_face(&self.mesh, f)?;
        Ok(merge)
    }

    /// Closes the hole corner starting at `x` with a new interior triangle.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` is not on a hole with more than three edges.
    pub fn fill_hole_notch(&mut self, x: HalfEdgeKey) -> Result<NotchFill, TriangulationError> {
        self.require_initialized()?;
        let hole = self.mesh.face(x)?;
        if !self.mesh.is_hole(hole) {
            return Err(MeshError::InvalidOperation {
                message: format!("{x:?} is not on a hole boundary"),
            }
            .into());
        }
        let fill = self.mesh.fill_boundary_notch(x)?;
        self.locator
            .split_face_event(&self.mesh, None, &[fill.face])?;
        Ok(fill)
    }

    /// Moves the vertex `v` to `p` without any topological change.
    ///
    /// # Errors
    ///
    /// Returns an error if `p` is not finite or `v` is not live.
    pub fn snap_vertex(&mut self, v: VertexKey, p: Point<T>) -> Result<(), TriangulationError> {
        p.validate()?;
        self.mesh.set_point(v, p)?;
        Ok(())
    }

    // =========================================================================
    // STORAGE
    // =========================================================================

    /// Rebuilds storage so that faces follow `ordered_faces`; see [`Mesh::arrange_memory`].
    ///
    /// The locator is told about the new handles and the initial square handles are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if a listed face is not live or the locator rejects the remap.
    pub fn arrange_memory(
        &mut self,
        ordered_faces: &[FaceKey],
    ) -> Result<MeshRemap, TriangulationError> {
        let remap = self.mesh.arrange_memory(ordered_faces)?;
        self.locator.compacted(&self.mesh, &remap)?;
        self.super_vertices = self
            .super_vertices
            .iter()
            .filter_map(|&v| remap.vertex(v))
            .collect();
        self.initial = None;
        Ok(remap)
    }

    /// Physically removes destroyed elements. Live handles stay valid.
    pub fn garbage_collection(&mut self) -> usize {
        self.mesh.garbage_collection()
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Interior face containing `p`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the triangulation is empty or the locator fails.
    pub fn locate(&self, p: &Point<T>) -> Result<Option<FaceKey>, TriangulationError> {
        Ok(self.locator.locate(&self.mesh, p, self.epsilon)?)
    }

    /// Candidate faces for `p` as used by insertion.
    ///
    /// # Errors
    ///
    /// Returns an error if the locator fails.
    pub fn locate_point(
        &self,
        p: &Point<T>,
        for_insertion: bool,
    ) -> Result<FaceKeyBuffer, TriangulationError> {
        Ok(self
            .locator
            .locate_point(&self.mesh, p, for_insertion, self.epsilon)?)
    }

    /// Edges ending at `v`, as a convenience for callers walking the vertex star.
    ///
    /// # Errors
    ///
    /// Returns an error if `v` is not live.
    pub fn incoming_edges(&self, v: VertexKey) -> Result<HalfEdgeKeyBuffer, TriangulationError> {
        Ok(self.mesh.vertex_in_edges(v)?)
    }

    /// Checks every structural invariant of the mesh.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), MeshValidationError> {
        validate_topology(&self.mesh)
    }

    /// Checks the empty-circle property of every internal edge.
    ///
    /// # Errors
    ///
    /// Returns [`MeshValidationError::DelaunayViolation`] for the first illegal edge.
    pub fn validate_delaunay(&self) -> Result<(), MeshValidationError> {
        match find_delaunay_violations(&self.mesh)?.first() {
            Some(&edge) => Err(MeshValidationError::DelaunayViolation { edge }),
            None => Ok(()),
        }
    }

    /// Counts and quality measures of the current mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh is inconsistent.
    pub fn statistics(&self) -> Result<MeshStatistics<T>, TriangulationError> {
        Ok(mesh_statistics(&self.mesh)?)
    }
}

// =============================================================================
// TESTS
// =============================================================================
