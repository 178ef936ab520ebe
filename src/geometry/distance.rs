//! Signed distance and edge-length fields.
//!
//! The refiner consumes two scalar fields over the plane:
//!
//! - a **signed distance function**: negative inside the meshable domain, positive
//!   outside it and inside obstacles, evaluable anywhere;
//! - an **edge-length function**: a relative sizing field that is multiplied by the
//!   configured minimum edge length.
//!
//! Both are blanket-implemented for closures, so callers usually pass a closure or
//! one of the combinators below.
//!
//! # Examples
//!
//! ```
//! use sfc_mesh::geometry::distance::{DistanceFunction, circle, difference, rectangle};
//! use sfc_mesh::geometry::point::Point;
//! use sfc_mesh::geometry::util::BoundingBox;
//!
//! let plate = rectangle(BoundingBox::from_bounds([0.0, 0.0], [10.0, 10.0]));
//! let hole = circle(Point::new([5.0, 5.0]), 2.0);
//! let domain = difference(plate, hole);
//!
//! assert!(domain.distance(&Point::new([1.0, 1.0])) < 0.0);
//! assert!(domain.distance(&Point::new([5.0, 5.0])) > 0.0);
//! assert!(domain.distance(&Point::new([-1.0, 5.0])) > 0.0);
//! ```

use crate::geometry::point::Point;
use crate::geometry::traits::coordinate::CoordinateScalar;
use crate::geometry::util::BoundingBox;

/// A signed distance function over the plane.
pub trait DistanceFunction<T: CoordinateScalar>: Send + Sync {
    /// Signed distance of `p` to the domain boundary; negative inside.
    fn distance(&self, p: &Point<T>) -> T;
}

impl<T, F> DistanceFunction<T> for F
where
    T: CoordinateScalar,
    F: Fn(&Point<T>) -> T + Send + Sync,
{
    fn distance(&self, p: &Point<T>) -> T {
        self(p)
    }
}

/// A relative edge-length (sizing) field over the plane.
pub trait EdgeLengthFunction<T: CoordinateScalar>: Send + Sync {
    /// Desired relative edge length at `p`.
    fn edge_length(&self, p: &Point<T>) -> T;
}

impl<T, F> EdgeLengthFunction<T> for F
where
    T: CoordinateScalar,
    F: Fn(&Point<T>) -> T + Send + Sync,
{
    fn edge_length(&self, p: &Point<T>) -> T {
        self(p)
    }
}

/// Constant sizing field.
pub fn uniform_edge_length<T: CoordinateScalar>(value: T) -> impl Fn(&Point<T>) -> T + Send + Sync {
    move |_: &Point<T>| value
}

/// Signed distance of an axis-aligned rectangle.
pub fn rectangle<T: CoordinateScalar>(bbox: BoundingBox<T>) -> impl Fn(&Point<T>) -> T + Send + Sync {
    move |p: &Point<T>| {
        let half = T::cast_f64(0.5);
        let c = bbox.center();
        let dx = (p.x() - c.x()).abs() - bbox.width() * half;
        let dy = (p.y() - c.y()).abs() - bbox.height() * half;
        let outside = dx.max(T::zero()).hypot(dy.max(T::zero()));
        dx.max(dy).min(T::zero()) + outside
    }
}

/// Signed distance of a disc.
pub fn circle<T: CoordinateScalar>(center: Point<T>, radius: T) -> impl Fn(&Point<T>) -> T + Send + Sync {
    move |p: &Point<T>| p.distance(&center) - radius
}

/// Union of two domains (`min`).
pub fn union<T, A, B>(a: A, b: B) -> impl Fn(&Point<T>) -> T + Send + Sync
where
    T: CoordinateScalar,
    A: DistanceFunction<T>,
    B: DistanceFunction<T>,
{
    move |p: &Point<T>| a.distance(p).min(b.distance(p))
}

/// Intersection of two domains (`max`).
pub fn intersection<T, A, B>(a: A, b: B) -> impl Fn(&Point<T>) -> T + Send + Sync
where
    T: CoordinateScalar,
    A: DistanceFunction<T>,
    B: DistanceFunction<T>,
{
    move |p: &Point<T>| a.distance(p).max(b.distance(p))
}

/// Domain `a` with `b` removed (`max(a, -b)`).
pub fn difference<T, A, B>(a: A, b: B) -> impl Fn(&Point<T>) -> T + Send + Sync
where
    T: CoordinateScalar,
    A: DistanceFunction<T>,
    B: DistanceFunction<T>,
{
    move |p: &Point<T>| a.distance(p).max(-b.distance(p))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rectangle_distance() {
        let d = rectangle(BoundingBox::from_bounds([0.0_f64, 0.0], [4.0, 2.0]));
        assert_relative_eq!(d.distance(&Point::new([2.0, 1.0])), -1.0);
        assert_relative_eq!(d.distance(&Point::new([5.0, 1.0])), 1.0);
        assert_relative_eq!(d.distance(&Point::new([7.0, 6.0])), 5.0);
        assert_relative_eq!(d.distance(&Point::new([0.0, 1.0])), 0.0);
    }

    #[test]
    fn test_circle_and_combinators() {
        let a = circle(Point::new([0.0_f64, 0.0]), 1.0);
        let b = circle(Point::new([1.5, 0.0]), 1.0);
        let p = Point::new([1.2, 0.0]);

        assert_relative_eq!(a.distance(&p), 0.2, epsilon = 1e-12);
        assert_relative_eq!(b.distance(&p), -0.7, epsilon = 1e-12);
        assert_relative_eq!(union(&a, &b).distance(&p), -0.7, epsilon = 1e-12);
        assert_relative_eq!(intersection(&a, &b).distance(&p), 0.2, epsilon = 1e-12);
        assert_relative_eq!(difference(&b, &a).distance(&p), -0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_edge_length() {
        let f = uniform_edge_length(0.5_f32);
        assert_eq!(f.edge_length(&Point::new([3.0, 4.0])), 0.5);
    }
}
