//! Lawson edge legalization.
//!
//! After a vertex is inserted, the edges opposite it are checked with the in-circle
//! predicate: if the vertex across an edge lies strictly inside the circumcircle of the
//! triangle on this side, the edge is flipped and the two far edges of the quadrilateral
//! are checked next. Edges on the border or a hole are never flipped.
//!
//! Cocircular configurations are classified as [`InSphere::BOUNDARY`] and left alone,
//! which guarantees termination on regular grids.
//!
//! # References
//! - C. L. Lawson, "Software for C1 surface interpolation", 1977.
//! - L. J. Guibas and J. Stolfi, "Primitives for the manipulation of general subdivisions
//!   and the computation of Voronoi diagrams", ACM TOG, 1985.

use thiserror::Error;

use crate::core::algorithms::locate::{LocateError, PointLocator};
use crate::core::mesh::{HalfEdgeKey, Mesh, MeshError};
use crate::geometry::predicates::{InSphere, Orientation, insphere, orientation};
use crate::geometry::traits::coordinate::CoordinateScalar;

/// Statistics from one legalization pass.
///
/// # Examples
///
/// ```rust
/// use sfc_mesh::core::algorithms::legalization::LegalizationStats;
///
/// let stats = LegalizationStats::default();
/// assert_eq!(stats.flips_performed, 0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegalizationStats {
    /// Number of edges taken from the work stack.
    pub edges_checked: usize,
    /// Number of flips performed.
    pub flips_performed: usize,
    /// Maximum stack length observed.
    pub max_stack_len: usize,
}

/// Errors raised during legalization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LegalizationError {
    /// Legalization did not converge within the flip budget.
    #[error("Edge legalization failed to converge after {max_flips} flips")]
    NonConvergent {
        /// Maximum flips allowed.
        max_flips: usize,
    },
    /// Underlying mesh error.
    #[error(transparent)]
    Mesh(#[from] MeshError),
    /// The locator rejected a flip event.
    #[error(transparent)]
    Locate(#[from] LocateError),
}

/// Outcome of checking a single edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeLegality {
    /// The edge satisfies the empty-circle property.
    Legal,
    /// The edge is on the border or a hole and is exempt.
    Constrained,
    /// The vertex across the edge is inside the circumcircle.
    Illegal,
}

/// Checks the empty-circle property of the edge `e` against the vertex across it.
///
/// # Errors
///
/// Returns an error if the neighbourhood of `e` is not a pair of triangles.
pub fn edge_legality<T>(mesh: &Mesh<T>, e: HalfEdgeKey) -> Result<EdgeLegality, MeshError>
where
    T: CoordinateScalar,
{
    if mesh.is_at_boundary(e)? {
        return Ok(EdgeLegality::Constrained);
    }
    let t = mesh.twin(e)?;
    let a = mesh.point(mesh.start_vertex(e)?)?;
    let b = mesh.point(mesh.vertex(e)?)?;
    let c = mesh.point(mesh.vertex(mesh.next(e)?)?)?;
    let d = mesh.point(mesh.vertex(mesh.next(t)?)?)?;
    Ok(match insphere(a, b, c, d) {
        InSphere::INSIDE => EdgeLegality::Illegal,
        InSphere::BOUNDARY | InSphere::OUTSIDE => EdgeLegality::Legal,
    })
}

/// Flipping `e` must produce two counter-clockwise triangles.
pub(crate) fn flip_is_valid<T>(mesh: &Mesh<T>, e: HalfEdgeKey) -> Result<bool, MeshError>
where
    T: CoordinateScalar,
{
    let t = mesh.twin(e)?;
    let a = mesh.point(mesh.start_vertex(e)?)?;
    let b = mesh.point(mesh.vertex(e)?)?;
    let c = mesh.point(mesh.vertex(mesh.next(e)?)?)?;
    let d = mesh.point(mesh.vertex(mesh.next(t)?)?)?;
    Ok(orientation(c, a, d) == Orientation::POSITIVE && orientation(d, b, c) == Orientation::POSITIVE)
}

/// Legalizes `edges` and everything their flips expose.
///
/// Every flip is reported to `locator` through
/// [`PointLocator::flip_edge_event`] right after it happens.
///
/// # Errors
///
/// Returns [`LegalizationError::NonConvergent`] if the flip budget (proportional to the
/// mesh size) is exhausted, or the first mesh/locator error encountered.
pub fn legalize<T, L>(
    mesh: &mut Mesh<T>,
    locator: &mut L,
    edges: impl IntoIterator<Item = HalfEdgeKey>,
) -> Result<LegalizationStats, LegalizationError>
where
    T: CoordinateScalar,
    L: PointLocator<T> + ?Sized,
{
    let mut stack: Vec<HalfEdgeKey> = edges.into_iter().collect();
    let mut stats = LegalizationStats {
        max_stack_len: stack.len(),
        ..LegalizationStats::default()
    };
    let max_flips = 16 + 8 * mesh.number_of_half_edges();

    while let Some(e) = stack.pop() {
        stats.edges_checked += 1;
        if !mesh.is_alive(e) || edge_legality(mesh, e)? != EdgeLegality::Illegal {
            continue;
        }
        if !flip_is_valid(mesh, e)? {
            tracing::debug!("[legalize] skipping non-convex flip of {e:?}");
            continue;
        }
        if stats.flips_performed >= max_flips {
            tracing::error!("[legalize] no convergence after {max_flips} flips");
            return Err(LegalizationError::NonConvergent { max_flips });
        }

        let flip = mesh.flip(e)?;
        locator.flip_edge_event(mesh, flip.faces)?;
        stats.flips_performed += 1;
        stack.extend(flip.far_edges);
        stats.max_stack_len = stats.max_stack_len.max(stack.len());
    }

    Ok(stats)
}
