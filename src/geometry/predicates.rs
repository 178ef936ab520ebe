//! Geometric predicates for planar triangulations.
//!
//! The predicates evaluate the classic 2×2 orientation and 3×3 in-circle determinants
//! in floating point and classify results whose magnitude is below a relative error
//! bound as degenerate. The bound is `T::predicate_tolerance()` times the permanent of
//! the determinant (the same expansion with absolute values), which scales with the
//! input and makes cocircular and collinear configurations stable.

use crate::geometry::point::Point;
use crate::geometry::traits::coordinate::CoordinateScalar;

/// Represents the position of a point relative to a circumcircle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InSphere {
    /// The point is outside the circumcircle
    OUTSIDE,
    /// The point is on the circumcircle (within numerical tolerance)
    BOUNDARY,
    /// The point is inside the circumcircle
    INSIDE,
}

impl std::fmt::Display for InSphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OUTSIDE => write!(f, "OUTSIDE"),
            Self::BOUNDARY => write!(f, "BOUNDARY"),
            Self::INSIDE => write!(f, "INSIDE"),
        }
    }
}

/// Represents the orientation of a point triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Clockwise turn (determinant < 0)
    NEGATIVE,
    /// Collinear (determinant ≈ 0)
    DEGENERATE,
    /// Counter-clockwise turn (determinant > 0)
    POSITIVE,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

/// Raw orientation determinant of `(a, b, c)`.
///
/// Twice the signed area of the triangle: positive for counter-clockwise order.
#[inline]
#[must_use]
pub fn orient2d<T: CoordinateScalar>(a: &Point<T>, b: &Point<T>, c: &Point<T>) -> T {
    (b.x() - a.x()) * (c.y() - a.y()) - (b.y() - a.y()) * (c.x() - a.x())
}

/// Determine the orientation of the point triple `(a, b, c)`.
///
/// # Examples
///
/// ```
/// use sfc_mesh::geometry::point::Point;
/// use sfc_mesh::geometry::predicates::{Orientation, orientation};
///
/// let a = Point::new([0.0, 0.0]);
/// let b = Point::new([1.0, 0.0]);
/// assert_eq!(orientation(&a, &b, &Point::new([0.0, 1.0])), Orientation::POSITIVE);
/// assert_eq!(orientation(&a, &b, &Point::new([0.0, -1.0])), Orientation::NEGATIVE);
/// assert_eq!(orientation(&a, &b, &Point::new([2.0, 0.0])), Orientation::DEGENERATE);
/// ```
#[must_use]
pub fn orientation<T: CoordinateScalar>(a: &Point<T>, b: &Point<T>, c: &Point<T>) -> Orientation {
    let left = (b.x() - a.x()) * (c.y() - a.y());
    let right = (b.y() - a.y()) * (c.x() - a.x());
    let det = left - right;
    let permanent = left.abs() + right.abs();

    if det.abs() <= T::predicate_tolerance() * permanent {
        Orientation::DEGENERATE
    } else if det > T::zero() {
        Orientation::POSITIVE
    } else {
        Orientation::NEGATIVE
    }
}

/// Test whether `d` lies inside the circumcircle of triangle `(a, b, c)`.
///
/// The triangle may be given in either orientation. Cocircular configurations are
/// reported as [`InSphere::BOUNDARY`], which legalization treats as legal.
///
/// # Examples
///
/// ```
/// use sfc_mesh::geometry::point::Point;
/// use sfc_mesh::geometry::predicates::{InSphere, insphere};
///
/// let a = Point::new([0.0, 0.0]);
/// let b = Point::new([1.0, 0.0]);
/// let c = Point::new([0.0, 1.0]);
/// assert_eq!(insphere(&a, &b, &c, &Point::new([0.25, 0.25])), InSphere::INSIDE);
/// assert_eq!(insphere(&a, &b, &c, &Point::new([1.0, 1.0])), InSphere::BOUNDARY);
/// assert_eq!(insphere(&a, &b, &c, &Point::new([3.0, 3.0])), InSphere::OUTSIDE);
/// ```
#[must_use]
pub fn insphere<T: CoordinateScalar>(
    a: &Point<T>,
    b: &Point<T>,
    c: &Point<T>,
    d: &Point<T>,
) -> InSphere {
    let adx = a.x() - d.x();
    let ady = a.y() - d.y();
    let bdx = b.x() - d.x();
    let bdy = b.y() - d.y();
    let cdx = c.x() - d.x();
    let cdy = c.y() - d.y();

    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    let bc = bdx * cdy - bdy * cdx;
    let ca = cdx * ady - cdy * adx;
    let ab = adx * bdy - ady * bdx;
    let det = alift * bc + blift * ca + clift * ab;

    let permanent = alift * ((bdx * cdy).abs() + (bdy * cdx).abs())
        + blift * ((cdx * ady).abs() + (cdy * adx).abs())
        + clift * ((adx * bdy).abs() + (ady * bdx).abs());

    if det.abs() <= T::predicate_tolerance() * permanent {
        return InSphere::BOUNDARY;
    }

    let inside = match orientation(a, b, c) {
        Orientation::POSITIVE => det > T::zero(),
        Orientation::NEGATIVE => det < T::zero(),
        Orientation::DEGENERATE => return InSphere::BOUNDARY,
    };

    if inside {
        InSphere::INSIDE
    } else {
        InSphere::OUTSIDE
    }
}

/// Signed distance of `p` from the infinite line through `a` and `b`.
///
/// Positive on the left of `a → b`. Returns zero for a degenerate line.
#[must_use]
pub fn signed_distance_to_line<T: CoordinateScalar>(a: &Point<T>, b: &Point<T>, p: &Point<T>) -> T {
    let length = a.distance(b);
    if length <= T::zero() {
        return T::zero();
    }
    orient2d(a, b, p) / length
}

// =============================================================================
// TESTS
// =============================================================================
