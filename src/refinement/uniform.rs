//! Sierpinski space-filling-curve uniform refinement.
//!
//! [`SfcUniformRefiner`] starts from the two-triangle bounding square of the configured
//! region and bisects triangles level by level until every edge satisfies the sizing
//! field. Each level runs in two phases:
//!
//! 1. walk the [`SierpinskiCurve`] and replace every node whose edge will be split by its
//!    two children, queueing one half-edge per split edge;
//! 2. split every queued edge at its midpoint, without legalization.
//!
//! Splitting only edges that are the longest edge on *both* sides keeps the mesh
//! conforming; a triangle that wants to split but faces a non-matching neighbour forces
//! that neighbour to split at the next level.
//!
//! [`finish`](SfcUniformRefiner::finish) turns the refined square into the final mesh:
//! fixed points, removal of everything outside the signed distance function, holes,
//! optional smoothing, and a storage layout in curve order.
//!
//! # Examples
//!
//! ```rust
//! use sfc_mesh::core::algorithms::locate::BaseLocator;
//! use sfc_mesh::geometry::distance::{rectangle, uniform_edge_length};
//! use sfc_mesh::geometry::util::BoundingBox;
//! use sfc_mesh::refinement::config::RefinerConfigBuilder;
//! use sfc_mesh::refinement::uniform::SfcUniformRefiner;
//!
//! let bound = BoundingBox::from_bounds([0.0, 0.0], [4.0, 4.0]);
//! let config = RefinerConfigBuilder::default().bound(bound).build().unwrap();
//! let mut refiner = SfcUniformRefiner::new(
//!     config,
//!     rectangle(bound),
//!     uniform_edge_length(1.0),
//!     BaseLocator::new(),
//! )
//! .unwrap();
//! let triangulation = refiner.generate().unwrap();
//! let triangulation = triangulation.read().unwrap();
//! assert_eq!(triangulation.mesh().number_of_faces(), 64);
//! ```

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::core::algorithms::locate::PointLocator;
use crate::core::collections::{FastHashSet, SmallBuffer};
use crate::core::mesh::{FaceKey, HalfEdgeKey, Mesh, MeshError, VertexKey};
use crate::core::triangulation::{
    IncrementalTriangulation, SuperStructure, TriangulationConfig, TriangulationError,
};
use crate::geometry::distance::{DistanceFunction, EdgeLengthFunction};
use crate::geometry::point::Point;
use crate::geometry::predicates::{Orientation, orientation};
use crate::geometry::quality::angle_at;
use crate::geometry::shapes::Obstacle;
use crate::geometry::traits::coordinate::CoordinateScalar;
use crate::geometry::util::Triangle;
use crate::refinement::config::RefinerConfig;
use crate::refinement::sfc::{CurveError, SfcDirection, SfcNodeKey, SierpinskiCurve, children};

/// Triangulation shared between the refiner and its readers.
pub type SharedTriangulation<T, L> = Arc<RwLock<IncrementalTriangulation<T, L>>>;

/// Lifecycle of a refiner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefinerState {
    /// The bounding square exists; no level has run yet.
    Initialized,
    /// At least one level ran and more are needed.
    Refining,
    /// No edge needs splitting anymore.
    RefinementFinished,
    /// `finish` completed; the mesh is final.
    Finished,
    /// A level or `finish` stopped part-way. The shared mesh may be half-edited and
    /// every further operation is rejected.
    Failed,
}

/// Errors raised during refinement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RefinementError {
    /// The triangulation engine failed.
    #[error(transparent)]
    Triangulation(#[from] TriangulationError),
    /// The curve is out of sync with the mesh.
    #[error(transparent)]
    Curve(#[from] CurveError),
    /// Mesh access failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
    /// A thread panicked while holding the triangulation lock.
    #[error("Shared triangulation lock is poisoned")]
    LockPoisoned,
    /// The operation is not allowed in the current state.
    #[error("Cannot {operation} while {state:?}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The refiner state.
        state: RefinerState,
    },
}

// =============================================================================
// EDGE RULES
// =============================================================================

fn canonical_pair<T: CoordinateScalar>(
    mesh: &Mesh<T>,
    e: HalfEdgeKey,
) -> Result<(Point<T>, Point<T>), MeshError> {
    let a = *mesh.point(mesh.start_vertex(e)?)?;
    let b = *mesh.point(mesh.vertex(e)?)?;
    Ok(if a.lexicographic_cmp(&b) == Ordering::Greater {
        (b, a)
    } else {
        (a, b)
    })
}

fn compare_pairs<T: CoordinateScalar>(a: &(Point<T>, Point<T>), b: &(Point<T>, Point<T>)) -> Ordering {
    a.0.lexicographic_cmp(&b.0)
        .then_with(|| a.1.lexicographic_cmp(&b.1))
}

/// Whether `e` is the longest edge of its face.
///
/// Lengths within a relative tolerance tie; ties go to the edge with the
/// lexicographically smallest endpoint pair, so both half-edges of an edge agree.
///
/// # Errors
///
/// Returns an error if the face of `e` is not live.
pub fn is_longest_edge<T: CoordinateScalar>(
    mesh: &Mesh<T>,
    e: HalfEdgeKey,
) -> Result<bool, MeshError> {
    let length = mesh.edge_length(e)?;
    let tolerance = length * T::predicate_tolerance();
    let key = canonical_pair(mesh, e)?;
    for x in mesh.face_edges(mesh.face(e)?)? {
        if x == e {
            continue;
        }
        let other = mesh.edge_length(x)?;
        if other > length + tolerance {
            return Ok(false);
        }
        if (other - length).abs() <= tolerance
            && compare_pairs(&canonical_pair(mesh, x)?, &key) == Ordering::Less
        {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Which half-edge of a split edge is handed to the engine.
///
/// The boundary side is never primary; opposite a boundary the interior side is;
/// otherwise the half-edge whose start point is lexicographically smaller.
///
/// # Errors
///
/// Returns an error if `e` is not live.
pub fn is_primary<T: CoordinateScalar>(mesh: &Mesh<T>, e: HalfEdgeKey) -> Result<bool, MeshError> {
    if mesh.is_boundary(e)? {
        return Ok(false);
    }
    if mesh.is_boundary(mesh.twin(e)?)? {
        return Ok(true);
    }
    let start = mesh.point(mesh.start_vertex(e)?)?;
    let end = mesh.point(mesh.vertex(e)?)?;
    Ok(start.lexicographic_cmp(end) == Ordering::Less)
}

// =============================================================================
// REFINER
// =============================================================================

/// Uniform SFC refiner over a signed distance domain.
pub struct SfcUniformRefiner<T, L = crate::core::algorithms::locate::BaseLocator>
where
    T: CoordinateScalar,
    L: PointLocator<T>,
{
    config: RefinerConfig<T>,
    triangulation: SharedTriangulation<T, L>,
    curve: SierpinskiCurve,
    distance: Box<dyn DistanceFunction<T>>,
    edge_length: Box<dyn EdgeLengthFunction<T>>,
    obstacles: Vec<Box<dyn Obstacle<T>>>,
    fixed_points: Vec<Point<T>>,
    forced: FastHashSet<FaceKey>,
    hole_faces: Vec<FaceKey>,
    state: RefinerState,
    level: usize,
}

impl<T, L> fmt::Debug for SfcUniformRefiner<T, L>
where
    T: CoordinateScalar,
    L: PointLocator<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SfcUniformRefiner")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("level", &self.level)
            .field("curve_nodes", &self.curve.len())
            .field("obstacles", &self.obstacles.len())
            .field("fixed_points", &self.fixed_points)
            .finish_non_exhaustive()
    }
}

impl<T, L> SfcUniformRefiner<T, L>
where
    T: CoordinateScalar,
    L: PointLocator<T>,
{
    /// Builds the bounding square of `config.bound` and the two-node curve over it.
    ///
    /// `distance` is negative inside the domain; `edge_length` is multiplied by
    /// `config.min_edge_length` to get the target length at a point.
    ///
    /// # Errors
    ///
    /// Returns an error if the triangulation cannot be initialized.
    pub fn new<D, E>(
        config: RefinerConfig<T>,
        distance: D,
        edge_length: E,
        locator: L,
    ) -> Result<Self, RefinementError>
    where
        D: DistanceFunction<T> + 'static,
        E: EdgeLengthFunction<T> + 'static,
    {
        let triangulation_config = TriangulationConfig::new(config.bound.bounding_square())
            .with_super_structure(SuperStructure::Retained)
            .with_epsilon_factor(config.epsilon_factor);
        let mut triangulation = IncrementalTriangulation::new(triangulation_config, locator)?;
        triangulation.init()?;
        let diagonal = triangulation
            .initial_diagonal()
            .ok_or(TriangulationError::NotInitialized)?;

        Ok(Self {
            config,
            triangulation: Arc::new(RwLock::new(triangulation)),
            curve: SierpinskiCurve::from_diagonal(diagonal),
            distance: Box::new(distance),
            edge_length: Box::new(edge_length),
            obstacles: Vec::new(),
            fixed_points: Vec::new(),
            forced: FastHashSet::default(),
            hole_faces: Vec::new(),
            state: RefinerState::Initialized,
            level: 0,
        })
    }

    /// Adds obstacle shapes used to stop refinement early inside them.
    #[must_use]
    pub fn with_obstacles(mut self, obstacles: Vec<Box<dyn Obstacle<T>>>) -> Self {
        self.obstacles.extend(obstacles);
        self
    }

    /// Adds points that must be vertices of the finished mesh.
    #[must_use]
    pub fn with_fixed_points(mut self, points: Vec<Point<T>>) -> Self {
        self.fixed_points.extend(points);
        self
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> RefinerState {
        self.state
    }

    /// Number of levels run so far.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &RefinerConfig<T> {
        &self.config
    }

    /// The curve; empty once finished.
    #[must_use]
    pub const fn curve(&self) -> &SierpinskiCurve {
        &self.curve
    }

    /// Hole faces of the finished mesh.
    #[must_use]
    pub fn hole_faces(&self) -> &[FaceKey] {
        &self.hole_faces
    }

    /// A handle to the shared triangulation for readers.
    #[must_use]
    pub fn triangulation(&self) -> SharedTriangulation<T, L> {
        Arc::clone(&self.triangulation)
    }

    fn lock(&self) -> Result<SharedTriangulation<T, L>, RefinementError> {
        if self.triangulation.is_poisoned() {
            return Err(RefinementError::LockPoisoned);
        }
        Ok(Arc::clone(&self.triangulation))
    }

    // =========================================================================
    // DRIVING
    // =========================================================================

    /// Advances by one unit of work: a level while refining, `finish` once refinement
    /// is done, nothing afterwards. Returns the new state.
    ///
    /// # Errors
    ///
    /// Propagates the first refinement error.
    pub fn step(&mut self) -> Result<RefinerState, RefinementError> {
        match self.state {
            RefinerState::Initialized | RefinerState::Refining => {
                self.next_sfc_level()?;
            }
            RefinerState::RefinementFinished => self.finish()?,
            RefinerState::Finished => {}
            RefinerState::Failed => {
                return Err(RefinementError::InvalidState {
                    operation: "step",
                    state: self.state,
                });
            }
        }
        Ok(self.state)
    }

    /// Runs levels until refinement is finished. Returns the number of levels run.
    ///
    /// # Errors
    ///
    /// Propagates the first refinement error.
    pub fn refine(&mut self) -> Result<usize, RefinementError> {
        while matches!(
            self.state,
            RefinerState::Initialized | RefinerState::Refining
        ) {
            self.next_sfc_level()?;
        }
        Ok(self.level)
    }

    /// Refines and finishes; returns the shared triangulation.
    ///
    /// # Errors
    ///
    /// Propagates the first refinement error.
    pub fn generate(&mut self) -> Result<SharedTriangulation<T, L>, RefinementError> {
        while self.state != RefinerState::Finished {
            self.step()?;
        }
        Ok(self.triangulation())
    }

    /// Whether `e` needs no further splitting.
    fn is_complete(&self, mesh: &Mesh<T>, e: HalfEdgeKey) -> Result<bool, MeshError> {
        let mid = mesh.midpoint(e)?;
        let target = self.edge_length.edge_length(&mid) * self.config.min_edge_length;
        if mesh.edge_length(e)? <= target {
            return Ok(true);
        }

        let mut triangles: SmallBuffer<Triangle<T>, 2> = SmallBuffer::new();
        triangles.push(mesh.to_triangle(mesh.face(e)?)?);
        let other = mesh.twin_face(e)?;
        if mesh.is_interior(other) {
            triangles.push(mesh.to_triangle(other)?);
        }
        if triangles
            .iter()
            .all(|t| self.config.bound.excludes_triangle(t))
        {
            return Ok(true);
        }
        Ok(self
            .obstacles
            .iter()
            .any(|o| triangles.iter().all(|t| o.contains_triangle(t))))
    }

    /// Runs one refinement level. Returns the number of edges split.
    ///
    /// # Errors
    ///
    /// Returns [`RefinementError::InvalidState`] once refinement is finished, or the
    /// first curve or triangulation error. After such an error the state is
    /// [`RefinerState::Failed`].
    pub fn next_sfc_level(&mut self) -> Result<usize, RefinementError> {
        if !matches!(
            self.state,
            RefinerState::Initialized | RefinerState::Refining
        ) {
            return Err(RefinementError::InvalidState {
                operation: "run a refinement level",
                state: self.state,
            });
        }
        let result = self.run_level();
        self.fail_on_error("refinement level", result)
    }

    fn fail_on_error<R>(
        &mut self,
        phase: &str,
        result: Result<R, RefinementError>,
    ) -> Result<R, RefinementError> {
        if let Err(err) = &result {
            tracing::error!("[refiner] {phase} failed at level {}: {err}", self.level);
            self.state = RefinerState::Failed;
        }
        result
    }

    fn run_level(&mut self) -> Result<usize, RefinementError> {
        let shared = self.lock()?;
        let mut triangulation = shared.write().map_err(|_| RefinementError::LockPoisoned)?;

        let mut candidates: Vec<(SfcNodeKey, HalfEdgeKey, SfcDirection)> = Vec::new();
        let mut next_forced = FastHashSet::default();
        {
            let mesh = triangulation.mesh();
            for (key, node) in self.curve.iter() {
                let e = node.edge();
                let face = mesh.face(e)?;
                let twin = mesh.twin(e)?;
                let other = mesh.face(twin)?;
                let wants = self.forced.contains(&face)
                    || self.forced.contains(&other)
                    || !self.is_complete(mesh, e)?;
                if !wants {
                    continue;
                }
                if !is_longest_edge(mesh, e)? {
                    tracing::debug!("[refiner] node edge {e:?} is not the longest of {face:?}");
                    continue;
                }
                if mesh.is_boundary(twin)? || is_longest_edge(mesh, twin)? {
                    candidates.push((key, e, node.direction()));
                } else {
                    next_forced.insert(other);
                }
            }
        }

        let mut queue: Vec<HalfEdgeKey> = Vec::with_capacity(candidates.len());
        for (key, e, direction) in candidates.iter().copied() {
            let mesh = triangulation.mesh();
            self.curve.replace(key, children(mesh, e, direction)?)?;
            if is_primary(mesh, e)? {
                queue.push(e);
            }
        }
        for &e in &queue {
            let mid = triangulation.mesh().midpoint(e)?;
            triangulation.split_edge(e, mid, false)?;
        }

        self.forced = next_forced;
        self.level += 1;
        tracing::debug!(
            "[refiner] level {}: {} candidates, {} splits, {} forced, {} faces",
            self.level,
            candidates.len(),
            queue.len(),
            self.forced.len(),
            triangulation.mesh().number_of_faces()
        );

        if queue.is_empty() && self.forced.is_empty() {
            self.state = RefinerState::RefinementFinished;
        } else if self.level >= self.config.max_levels {
            tracing::warn!(
                "[refiner] stopping after {} levels with {} pending splits",
                self.level,
                queue.len() + self.forced.len()
            );
            self.state = RefinerState::RefinementFinished;
        } else {
            self.state = RefinerState::Refining;
        }
        Ok(queue.len())
    }

    // =========================================================================
    // FINISH
    // =========================================================================

    /// Post-processes the refined square into the final mesh.
    ///
    /// Holds the write lock for the whole run. In order: place fixed points, finalize,
    /// remove border faces outside the domain, carve holes, optionally smooth holes,
    /// lay out storage in curve order (holes last), collect garbage.
    ///
    /// # Errors
    ///
    /// Returns [`RefinementError::InvalidState`] unless refinement is finished, or the
    /// first error of any phase. After such an error the state is
    /// [`RefinerState::Failed`].
    pub fn finish(&mut self) -> Result<(), RefinementError> {
        match self.state {
            RefinerState::Finished => return Ok(()),
            RefinerState::RefinementFinished => {}
            state => {
                return Err(RefinementError::InvalidState {
                    operation: "finish",
                    state,
                });
            }
        }
        let result = self.run_finish();
        self.fail_on_error("finish", result)
    }

    fn run_finish(&mut self) -> Result<(), RefinementError> {
        let shared = self.lock()?;
        let mut triangulation = shared.write().map_err(|_| RefinementError::LockPoisoned)?;

        let snapshot = self.curve.faces(triangulation.mesh())?;
        for &p in &self.fixed_points {
            self.place_fixed_point(&mut triangulation, p)?;
        }
        triangulation.finalize()?;
        let removed = self.shrink_border(&mut triangulation)?;
        let holes = self.carve_holes(&mut triangulation)?;
        let mut filled = 0;
        if self.config.smooth_holes {
            for &hole in &holes {
                filled += smooth_hole(&mut *triangulation, hole, self.config.smoothing_angle)?;
            }
        }

        let mesh = triangulation.mesh();
        let mut order: Vec<FaceKey> = snapshot
            .into_iter()
            .filter(|&f| mesh.is_interior(f))
            .collect();
        order.extend(holes.iter().copied().filter(|&h| mesh.is_hole(h)));
        let remap = triangulation.arrange_memory(&order)?;
        self.hole_faces = holes.iter().filter_map(|&h| remap.face(h)).collect();
        triangulation.garbage_collection();

        self.curve.clear();
        self.forced.clear();
        self.state = RefinerState::Finished;
        tracing::debug!(
            "[refiner] finished: {} faces, {} vertices, {removed} border faces removed, {} holes, {filled} notches filled",
            triangulation.mesh().number_of_faces(),
            triangulation.mesh().number_of_vertices(),
            self.hole_faces.len()
        );
        Ok(())
    }

    fn place_fixed_point(
        &self,
        triangulation: &mut IncrementalTriangulation<T, L>,
        p: Point<T>,
    ) -> Result<(), RefinementError> {
        if let Some(face) = triangulation.locate(&p)? {
            let mesh = triangulation.mesh();
            let mut nearest: Option<(VertexKey, T)> = None;
            for v in mesh.face_vertices(face)? {
                let d = mesh.point(v)?.distance(&p);
                if nearest.is_none_or(|(_, best)| d < best) {
                    nearest = Some((v, d));
                }
            }
            if let Some((v, d)) = nearest
                && d <= self.config.min_edge_length
            {
                tracing::warn!("[refiner] snapping {v:?} onto fixed point {p} (moved {d})");
                triangulation.snap_vertex(v, p)?;
                return Ok(());
            }
        }
        triangulation.insert(p)?;
        Ok(())
    }

    fn is_outside(&self, triangulation: &IncrementalTriangulation<T, L>, f: FaceKey) -> Result<bool, MeshError> {
        let centroid = triangulation.mesh().to_triangle(f)?.centroid();
        Ok(self.distance.distance(&centroid) > T::zero())
    }

    /// Peels border-adjacent faces outside the domain until none is left.
    fn shrink_border(
        &self,
        triangulation: &mut IncrementalTriangulation<T, L>,
    ) -> Result<usize, RefinementError> {
        let mut stack: Vec<FaceKey> = Vec::new();
        for f in triangulation.faces() {
            if triangulation.touches_border(f)? {
                stack.push(f);
            }
        }
        let mut removed = 0;
        while let Some(f) = stack.pop() {
            if !triangulation.mesh().is_interior(f)
                || !triangulation.touches_border(f)?
                || !self.is_outside(triangulation, f)?
            {
                continue;
            }
            let mesh = triangulation.mesh();
            let mut neighbours: SmallBuffer<FaceKey, 3> = SmallBuffer::new();
            for e in mesh.face_edges(f)? {
                let g = mesh.twin_face(e)?;
                if mesh.is_interior(g) {
                    neighbours.push(g);
                }
            }
            triangulation.remove_border_face(f)?;
            removed += 1;
            stack.extend(neighbours);
        }
        Ok(removed)
    }

    /// Merges each connected component of outside faces into one hole face.
    fn carve_holes(
        &self,
        triangulation: &mut IncrementalTriangulation<T, L>,
    ) -> Result<Vec<FaceKey>, RefinementError> {
        let mut seeds: Vec<FaceKey> = Vec::new();
        for f in triangulation.faces() {
            if self.is_outside(triangulation, f)? {
                seeds.push(f);
            }
        }
        let outside: FastHashSet<FaceKey> = seeds.iter().copied().collect();
        let mut visited: FastHashSet<FaceKey> = FastHashSet::default();
        let mut holes = Vec::new();

        for seed in seeds {
            if !visited.insert(seed) {
                continue;
            }
            // Discovery order guarantees every face is adjacent to an earlier one.
            let mut component = vec![seed];
            let mut queue = VecDeque::from([seed]);
            let mesh = triangulation.mesh();
            while let Some(f) = queue.pop_front() {
                for e in mesh.face_edges(f)? {
                    let g = mesh.twin_face(e)?;
                    if outside.contains(&g) && visited.insert(g) {
                        component.push(g);
                        queue.push_back(g);
                    }
                }
            }
            let hole = triangulation.create_hole(seed)?;
            for &f in &component[1..] {
                triangulation.merge_into_hole(f, hole)?;
            }
            tracing::debug!(
                "[refiner] carved hole {hole:?} from {} faces",
                component.len()
            );
            holes.push(hole);
        }
        Ok(holes)
    }
}

/// Whether the hole corner `x → next(x)` is a convex, empty corner sharper than
/// `max_angle`.
fn is_fillable_notch<T: CoordinateScalar>(
    mesh: &Mesh<T>,
    x: HalfEdgeKey,
    cycle: &[HalfEdgeKey],
    max_angle: T,
    epsilon: T,
) -> Result<bool, MeshError> {
    let y = mesh.next(x)?;
    let (u, v, w) = (mesh.start_vertex(x)?, mesh.vertex(x)?, mesh.vertex(y)?);
    if u == w {
        return Ok(false);
    }
    let (pu, pv, pw) = (*mesh.point(u)?, *mesh.point(v)?, *mesh.point(w)?);
    if orientation(&pu, &pv, &pw) != Orientation::POSITIVE || angle_at(&pv, &pu, &pw) >= max_angle
    {
        return Ok(false);
    }
    let corner = Triangle::new(pu, pv, pw);
    for &z in cycle {
        let q = mesh.vertex(z)?;
        if q != u && q != v && q != w && corner.contains(mesh.point(q)?, epsilon) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Closes acute corners of `hole` one at a time. Returns the number of triangles added.
fn smooth_hole<T, L>(
    triangulation: &mut IncrementalTriangulation<T, L>,
    hole: FaceKey,
    max_angle: T,
) -> Result<usize, RefinementError>
where
    T: CoordinateScalar,
    L: PointLocator<T>,
{
    let epsilon = triangulation.epsilon();
    let mut filled = 0;
    loop {
        let mesh = triangulation.mesh();
        if !mesh.is_hole(hole) {
            break;
        }
        let cycle = mesh.face_edges(hole)?;
        if cycle.len() <= 3 {
            break;
        }
        let mut corner = None;
        for &x in &cycle {
            if is_fillable_notch(mesh, x, &cycle, max_angle, epsilon)? {
                corner = Some(x);
                break;
            }
        }
        let Some(x) = corner else { break };
        triangulation.fill_hole_notch(x)?;
        filled += 1;
    }
    Ok(filled)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::delaunay_tree::DelaunayTree;
    use crate::core::algorithms::locate::BaseLocator;
    use crate::geometry::distance::{circle, difference, rectangle, uniform_edge_length};
    use crate::geometry::shapes::Circle;
    use crate::geometry::util::BoundingBox;
    use crate::refinement::config::RefinerConfigBuilder;

    fn square_refiner(side: f64, min_edge_length: f64) -> SfcUniformRefiner<f64> {
        let bound = BoundingBox::from_bounds([0.0, 0.0], [side, side]);
        let config = RefinerConfigBuilder::default()
            .bound(bound)
            .min_edge_length(min_edge_length)
            .build()
            .unwrap();
        SfcUniformRefiner::new(
            config,
            rectangle(bound),
            uniform_edge_length(1.0),
            BaseLocator::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_levels_keep_curve_in_sync() {
        let mut refiner = square_refiner(4.0, 1.0);
        assert_eq!(refiner.state(), RefinerState::Initialized);
        while refiner.state() != RefinerState::RefinementFinished {
            refiner.next_sfc_level().unwrap();
            let shared = refiner.triangulation();
            let triangulation = shared.read().unwrap();
            refiner.curve().validate(triangulation.mesh()).unwrap();
        }
        // The diagonal 4·√2 shrinks by √2 per level; the sixth level finds nothing to split.
        assert_eq!(refiner.level(), 6);
        assert_eq!(refiner.curve().len(), 64);
    }

    #[test]
    fn test_generate_square() {
        let mut refiner = square_refiner(10.0, 1.0);
        let shared = refiner.generate().unwrap();
        let triangulation = shared.read().unwrap();
        let mesh = triangulation.mesh();
        assert_eq!(mesh.number_of_faces(), 512);
        assert_eq!(mesh.number_of_vertices(), 289);
        for e in mesh.edges() {
            assert!(mesh.edge_length(e).unwrap() <= 1.0);
        }
        triangulation.validate().unwrap();
        assert!(refiner.curve().is_empty());
        assert!(refiner.hole_faces().is_empty());
    }

    #[test]
    fn test_finish_requires_finished_refinement() {
        let mut refiner = square_refiner(4.0, 1.0);
        assert!(matches!(
            refiner.finish(),
            Err(RefinementError::InvalidState { .. })
        ));
        refiner.refine().unwrap();
        refiner.finish().unwrap();
        assert_eq!(refiner.step().unwrap(), RefinerState::Finished);
        assert!(matches!(
            refiner.next_sfc_level(),
            Err(RefinementError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_failed_finish_is_terminal() {
        let mut refiner =
            square_refiner(4.0, 1.0).with_fixed_points(vec![Point::new([20.0, 20.0])]);
        refiner.refine().unwrap();
        assert!(matches!(
            refiner.finish(),
            Err(RefinementError::Triangulation(
                TriangulationError::PointOutsideBounds { .. }
            ))
        ));
        assert_eq!(refiner.state(), RefinerState::Failed);
        assert!(matches!(
            refiner.finish(),
            Err(RefinementError::InvalidState { .. })
        ));
        assert!(matches!(
            refiner.step(),
            Err(RefinementError::InvalidState { .. })
        ));
        assert!(refiner.generate().is_err());
        assert!(matches!(
            refiner.next_sfc_level(),
            Err(RefinementError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_hole_is_carved() {
        let bound = BoundingBox::from_bounds([0.0, 0.0], [8.0, 8.0]);
        let config = RefinerConfigBuilder::default()
            .bound(bound)
            .min_edge_length(0.5)
            .build()
            .unwrap();
        let domain = difference(rectangle(bound), circle(Point::new([4.0, 4.0]), 1.5));
        let mut refiner =
            SfcUniformRefiner::new(config, domain, uniform_edge_length(1.0), DelaunayTree::new())
                .unwrap();
        let shared = refiner.generate().unwrap();
        let triangulation = shared.read().unwrap();
        assert_eq!(refiner.hole_faces().len(), 1);
        let hole = refiner.hole_faces()[0];
        assert!(triangulation.mesh().is_hole(hole));
        for f in triangulation.faces() {
            let c = triangulation.to_triangle(f).unwrap().centroid();
            assert!(c.distance(&Point::new([4.0, 4.0])) >= 1.5);
        }
        triangulation.validate().unwrap();
    }

    #[test]
    fn test_border_shrinks_to_rectangle() {
        let bound = BoundingBox::from_bounds([0.0, 0.0], [8.0, 4.0]);
        let config = RefinerConfigBuilder::default()
            .bound(bound)
            .min_edge_length(1.0)
            .build()
            .unwrap();
        let mut refiner =
            SfcUniformRefiner::new(config, rectangle(bound), uniform_edge_length(1.0), BaseLocator::new())
                .unwrap();
        let shared = refiner.generate().unwrap();
        let triangulation = shared.read().unwrap();
        assert!(triangulation.mesh().number_of_faces() > 0);
        for f in triangulation.faces() {
            assert!(triangulation.to_triangle(f).unwrap().centroid().y() <= 4.0);
        }
        triangulation.validate().unwrap();
    }

    #[test]
    fn test_obstacle_stops_refinement() {
        let bound = BoundingBox::from_bounds([0.0, 0.0], [8.0, 8.0]);
        let config = RefinerConfigBuilder::default()
            .bound(bound)
            .min_edge_length(0.5)
            .build()
            .unwrap();
        let plain = {
            let mut refiner = SfcUniformRefiner::new(
                config,
                rectangle(bound),
                uniform_edge_length(1.0),
                BaseLocator::new(),
            )
            .unwrap();
            refiner.refine().unwrap();
            refiner.curve().len()
        };
        let mut refiner = SfcUniformRefiner::new(
            config,
            rectangle(bound),
            uniform_edge_length(1.0),
            BaseLocator::new(),
        )
        .unwrap()
        .with_obstacles(vec![Box::new(Circle::new(Point::new([4.0, 4.0]), 3.0))]);
        refiner.refine().unwrap();
        assert!(refiner.curve().len() < plain);
        let shared = refiner.triangulation();
        refiner.curve().validate(shared.read().unwrap().mesh()).unwrap();
    }

    #[test]
    fn test_fixed_points_become_vertices() {
        let bound = BoundingBox::from_bounds([0.0, 0.0], [4.0, 4.0]);
        let config = RefinerConfigBuilder::default()
            .bound(bound)
            .min_edge_length(1.0)
            .build()
            .unwrap();
        let fixed = vec![Point::new([1.1, 0.9]), Point::new([2.5, 2.5])];
        let mut refiner = SfcUniformRefiner::new(
            config,
            rectangle(bound),
            uniform_edge_length(1.0),
            BaseLocator::new(),
        )
        .unwrap()
        .with_fixed_points(fixed.clone());
        let shared = refiner.generate().unwrap();
        let triangulation = shared.read().unwrap();
        for p in &fixed {
            assert!(triangulation.points().any(|q| q.distance(p) < 1e-12));
        }
        triangulation.validate().unwrap();
    }

    #[test]
    fn test_longest_edge_and_primary_rules() {
        let mut mesh: Mesh<f64> = Mesh::new();
        let square = mesh
            .create_square(&BoundingBox::from_bounds([0.0, 0.0], [1.0, 1.0]))
            .unwrap();
        let [a, b] = square.diagonal;
        assert!(is_longest_edge(&mesh, a).unwrap());
        assert!(is_longest_edge(&mesh, b).unwrap());
        assert!(!is_longest_edge(&mesh, mesh.next(a).unwrap()).unwrap());
        // Exactly one side of an internal edge is primary.
        assert_ne!(is_primary(&mesh, a).unwrap(), is_primary(&mesh, b).unwrap());
        let border_edge = mesh.edge_of_face(mesh.border()).unwrap();
        assert!(!is_primary(&mesh, border_edge).unwrap());
        assert!(is_primary(&mesh, mesh.twin(border_edge).unwrap()).unwrap());
    }

    #[test]
    fn test_smoothing_closes_acute_corner() {
        let bound = BoundingBox::from_bounds([0.0, 0.0], [4.0, 4.0]);
        let config = RefinerConfigBuilder::default()
            .bound(bound)
            .min_edge_length(1.0)
            .build()
            .unwrap();
        let mut refiner = SfcUniformRefiner::new(
            config,
            rectangle(bound),
            uniform_edge_length(1.0),
            BaseLocator::new(),
        )
        .unwrap();
        refiner.refine().unwrap();
        let shared = refiner.triangulation();
        let mut triangulation = shared.write().unwrap();
        // Two faces sharing a leg make a four-sided hole with 45° corners.
        let f = triangulation.faces().next().unwrap();
        let e = triangulation
            .mesh()
            .face_edges(f)
            .unwrap()
            .into_iter()
            .find(|&e| !is_longest_edge(triangulation.mesh(), e).unwrap())
            .unwrap();
        let g = triangulation.mesh().twin_face(e).unwrap();
        let faces = triangulation.mesh().number_of_faces();
        let hole = triangulation.create_hole(f).unwrap();
        triangulation.merge_into_hole(g, hole).unwrap();
        let filled = smooth_hole(&mut *triangulation, hole, std::f64::consts::FRAC_PI_2).unwrap();
        assert_eq!(filled, 1);
        assert_eq!(triangulation.mesh().number_of_faces(), faces - 1);
        assert_eq!(triangulation.mesh().face_edges(hole).unwrap().len(), 3);
        triangulation.validate().unwrap();
    }
}
