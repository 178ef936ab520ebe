//! Planar geometric primitives and utility functions.
//!
//! This module contains the value types the mesh materializes on demand
//! ([`Triangle`], [`Line`]), the axis-aligned [`BoundingBox`] used by the engine and the
//! refiner, and random point generation helpers for tests and benchmarks.

pub mod point_generation;

pub use point_generation::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::point::Point;
use crate::geometry::predicates::{orient2d, signed_distance_to_line};
use crate::geometry::traits::coordinate::CoordinateScalar;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur during random point generation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RandomPointGenerationError {
    /// The coordinate range is empty or inverted.
    #[error("Invalid coordinate range: minimum {min} must be less than maximum {max}")]
    InvalidRange {
        /// The minimum value of the range, as a string.
        min: String,
        /// The maximum value of the range, as a string.
        max: String,
    },

    /// Grid parameters cannot produce a finite grid.
    #[error("Invalid grid parameters: {reason}")]
    InvalidGrid {
        /// Why the parameters were rejected.
        reason: String,
    },
}

// =============================================================================
// LINE
// =============================================================================

/// A directed line segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = ""))]
pub struct Line<T>
where
    T: CoordinateScalar,
{
    /// Start point.
    pub from: Point<T>,
    /// End point.
    pub to: Point<T>,
}

impl<T> Line<T>
where
    T: CoordinateScalar,
{
    /// Creates a segment from `from` to `to`.
    #[must_use]
    pub const fn new(from: Point<T>, to: Point<T>) -> Self {
        Self { from, to }
    }

    /// Length of the segment.
    #[must_use]
    pub fn length(&self) -> T {
        self.from.distance(&self.to)
    }

    /// Midpoint of the segment.
    #[must_use]
    pub fn midpoint(&self) -> Point<T> {
        self.from.midpoint(&self.to)
    }

    /// Euclidean distance from `p` to the closest point of the segment.
    ///
    /// # Examples
    ///
    /// ```
    /// use sfc_mesh::geometry::point::Point;
    /// use sfc_mesh::geometry::util::Line;
    ///
    /// let line = Line::new(Point::new([0.0, 0.0]), Point::new([2.0, 0.0]));
    /// assert_eq!(line.distance_to_point(&Point::new([1.0, 1.0])), 1.0);
    /// assert_eq!(line.distance_to_point(&Point::new([3.0, 0.0])), 1.0);
    /// ```
    #[must_use]
    pub fn distance_to_point(&self, p: &Point<T>) -> T {
        let dx = self.to.x() - self.from.x();
        let dy = self.to.y() - self.from.y();
        let length_squared = dx * dx + dy * dy;
        if length_squared <= T::zero() {
            return self.from.distance(p);
        }
        let t = ((p.x() - self.from.x()) * dx + (p.y() - self.from.y()) * dy) / length_squared;
        let t = t.max(T::zero()).min(T::one());
        let closest = Point::new([self.from.x() + t * dx, self.from.y() + t * dy]);
        closest.distance(p)
    }

    /// Returns `true` if the two segments cross at a single interior point of both.
    ///
    /// Touching at endpoints and collinear overlaps are not proper intersections.
    #[must_use]
    pub fn intersects_properly(&self, other: &Self) -> bool {
        let d1 = orient2d(&self.from, &self.to, &other.from);
        let d2 = orient2d(&self.from, &self.to, &other.to);
        let d3 = orient2d(&other.from, &other.to, &self.from);
        let d4 = orient2d(&other.from, &other.to, &self.to);
        let zero = T::zero();
        ((d1 > zero && d2 < zero) || (d1 < zero && d2 > zero))
            && ((d3 > zero && d4 < zero) || (d3 < zero && d4 > zero))
    }
}

// =============================================================================
// TRIANGLE
// =============================================================================

/// A triangle given by three corner points.
///
/// Triangles materialized from a mesh face are counter-clockwise.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = ""))]
pub struct Triangle<T>
where
    T: CoordinateScalar,
{
    /// The three corners.
    pub points: [Point<T>; 3],
}

impl<T> Triangle<T>
where
    T: CoordinateScalar,
{
    /// Creates a triangle from three corners.
    #[must_use]
    pub const fn new(a: Point<T>, b: Point<T>, c: Point<T>) -> Self {
        Self { points: [a, b, c] }
    }

    /// Signed area; positive for counter-clockwise corners.
    #[must_use]
    pub fn signed_area(&self) -> T {
        let [a, b, c] = &self.points;
        orient2d(a, b, c) * T::cast_f64(0.5)
    }

    /// Absolute area.
    #[must_use]
    pub fn area(&self) -> T {
        self.signed_area().abs()
    }

    /// Centroid (the "midpoint" used for signed-distance classification of faces).
    #[must_use]
    pub fn centroid(&self) -> Point<T> {
        let third = T::one() / T::cast_f64(3.0);
        let [a, b, c] = &self.points;
        Point::new([
            (a.x() + b.x() + c.x()) * third,
            (a.y() + b.y() + c.y()) * third,
        ])
    }

    /// Edge `i` runs from corner `i` to corner `(i + 1) % 3`.
    #[must_use]
    pub fn edge(&self, i: usize) -> Line<T> {
        Line::new(self.points[i % 3], self.points[(i + 1) % 3])
    }

    /// Lengths of the three edges in [`edge`](Self::edge) order.
    #[must_use]
    pub fn edge_lengths(&self) -> [T; 3] {
        [
            self.edge(0).length(),
            self.edge(1).length(),
            self.edge(2).length(),
        ]
    }

    /// Circumcenter, or `None` for a degenerate triangle.
    #[must_use]
    pub fn circumcenter(&self) -> Option<Point<T>> {
        let [a, b, c] = &self.points;
        let bx = b.x() - a.x();
        let by = b.y() - a.y();
        let cx = c.x() - a.x();
        let cy = c.y() - a.y();
        let d = T::cast_f64(2.0) * (bx * cy - by * cx);
        if d == T::zero() {
            return None;
        }
        let b2 = bx * bx + by * by;
        let c2 = cx * cx + cy * cy;
        let ux = (cy * b2 - by * c2) / d;
        let uy = (bx * c2 - cx * b2) / d;
        Some(Point::new([a.x() + ux, a.y() + uy]))
    }

    /// Circumradius, or `None` for a degenerate triangle.
    #[must_use]
    pub fn circumradius(&self) -> Option<T> {
        self.circumcenter().map(|c| c.distance(&self.points[0]))
    }

    /// Inradius (`2·area / perimeter`).
    #[must_use]
    pub fn inradius(&self) -> T {
        let perimeter = self.edge_lengths().iter().fold(T::zero(), |acc, &l| acc + l);
        if perimeter <= T::zero() {
            return T::zero();
        }
        T::cast_f64(2.0) * self.area() / perimeter
    }

    /// Returns `true` if `p` lies inside the triangle or within `epsilon` of its boundary.
    ///
    /// Works for either orientation.
    ///
    /// # Examples
    ///
    /// ```
    /// use sfc_mesh::geometry::point::Point;
    /// use sfc_mesh::geometry::util::Triangle;
    ///
    /// let t = Triangle::new(
    ///     Point::new([0.0, 0.0]),
    ///     Point::new([1.0, 0.0]),
    ///     Point::new([0.0, 1.0]),
    /// );
    /// assert!(t.contains(&Point::new([0.2, 0.2]), 0.0));
    /// assert!(t.contains(&Point::new([0.5, -1e-6]), 1e-4));
    /// assert!(!t.contains(&Point::new([1.0, 1.0]), 1e-4));
    /// ```
    #[must_use]
    pub fn contains(&self, p: &Point<T>, epsilon: T) -> bool {
        let sign = if self.signed_area() < T::zero() {
            -T::one()
        } else {
            T::one()
        };
        (0..3).all(|i| {
            let e = self.edge(i);
            sign * signed_distance_to_line(&e.from, &e.to, p) >= -epsilon
        })
    }

    /// Axis-aligned bounding box of the triangle.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox<T> {
        let [a, b, c] = &self.points;
        BoundingBox::new(
            Point::new([a.x().min(b.x()).min(c.x()), a.y().min(b.y()).min(c.y())]),
            Point::new([a.x().max(b.x()).max(c.x()), a.y().max(b.y()).max(c.y())]),
        )
    }
}

// =============================================================================
// BOUNDING BOX
// =============================================================================

/// Axis-aligned rectangle given by its minimum and maximum corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = ""))]
pub struct BoundingBox<T>
where
    T: CoordinateScalar,
{
    /// Lower-left corner.
    pub min: Point<T>,
    /// Upper-right corner.
    pub max: Point<T>,
}

impl<T> BoundingBox<T>
where
    T: CoordinateScalar,
{
    /// Creates a box from its two corners.
    #[must_use]
    pub const fn new(min: Point<T>, max: Point<T>) -> Self {
        Self { min, max }
    }

    /// Creates a box from `[x_min, y_min]` and `[x_max, y_max]`.
    #[must_use]
    pub const fn from_bounds(min: [T; 2], max: [T; 2]) -> Self {
        Self::new(Point::new(min), Point::new(max))
    }

    /// Smallest box containing all `points`, or `None` for an empty iterator.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point<T>>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(*first, *first);
        for p in iter {
            bbox.min = Point::new([bbox.min.x().min(p.x()), bbox.min.y().min(p.y())]);
            bbox.max = Point::new([bbox.max.x().max(p.x()), bbox.max.y().max(p.y())]);
        }
        Some(bbox)
    }

    /// Extent along x.
    #[must_use]
    pub fn width(&self) -> T {
        self.max.x() - self.min.x()
    }

    /// Extent along y.
    #[must_use]
    pub fn height(&self) -> T {
        self.max.y() - self.min.y()
    }

    /// The larger of width and height; the length scale of the box.
    #[must_use]
    pub fn max_side(&self) -> T {
        self.width().max(self.height())
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Point<T> {
        self.min.midpoint(&self.max)
    }

    /// Returns `true` when both extents are positive and finite.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.validate().is_ok()
            && self.max.validate().is_ok()
            && self.width() > T::zero()
            && self.height() > T::zero()
    }

    /// Square with side [`max_side`](Self::max_side) anchored at the minimum corner.
    ///
    /// # Examples
    ///
    /// ```
    /// use sfc_mesh::geometry::util::BoundingBox;
    ///
    /// let bbox = BoundingBox::from_bounds([0.0, 0.0], [4.0, 2.0]);
    /// assert_eq!(bbox.bounding_square(), BoundingBox::from_bounds([0.0, 0.0], [4.0, 4.0]));
    /// ```
    #[must_use]
    pub fn bounding_square(&self) -> Self {
        let side = self.max_side();
        Self::from_bounds(
            [self.min.x(), self.min.y()],
            [self.min.x() + side, self.min.y() + side],
        )
    }

    /// Square centered on this box whose side is `factor` times [`max_side`](Self::max_side).
    #[must_use]
    pub fn enclosing_square(&self, factor: T) -> Self {
        let half = self.max_side() * factor * T::cast_f64(0.5);
        let c = self.center();
        Self::from_bounds([c.x() - half, c.y() - half], [c.x() + half, c.y() + half])
    }

    /// Returns `true` if `p` is inside the box or within `epsilon` of it.
    #[must_use]
    pub fn contains(&self, p: &Point<T>, epsilon: T) -> bool {
        p.x() >= self.min.x() - epsilon
            && p.x() <= self.max.x() + epsilon
            && p.y() >= self.min.y() - epsilon
            && p.y() <= self.max.y() + epsilon
    }

    /// Returns `true` if the closed boxes overlap.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x() <= other.max.x()
            && other.min.x() <= self.max.x()
            && self.min.y() <= other.max.y()
            && other.min.y() <= self.max.y()
    }

    /// Conservative test that a triangle lies completely outside the box.
    ///
    /// Returns `true` only when the triangle's own bounding box does not overlap.
    #[must_use]
    pub fn excludes_triangle(&self, triangle: &Triangle<T>) -> bool {
        !self.intersects(&triangle.bounding_box())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_triangle() -> Triangle<f64> {
        Triangle::new(
            Point::new([0.0, 0.0]),
            Point::new([1.0, 0.0]),
            Point::new([0.0, 1.0]),
        )
    }

    #[test]
    fn test_triangle_measures() {
        let t = unit_triangle();
        assert_relative_eq!(t.signed_area(), 0.5);
        assert_relative_eq!(t.centroid().x(), 1.0 / 3.0);
        let c = t.circumcenter().unwrap();
        assert_relative_eq!(c.x(), 0.5);
        assert_relative_eq!(c.y(), 0.5);
        assert_relative_eq!(t.circumradius().unwrap(), 0.5_f64.sqrt());
        assert_relative_eq!(t.edge_lengths()[1], 2.0_f64.sqrt());
        assert_relative_eq!(t.inradius(), 1.0 / (2.0 + 2.0_f64.sqrt()));
    }

    #[test]
    fn test_triangle_contains_both_orientations() {
        let t = unit_triangle();
        let [a, b, c] = t.points;
        let cw = Triangle::new(a, c, b);
        let p = Point::new([0.25, 0.25]);
        assert!(t.contains(&p, 0.0));
        assert!(cw.contains(&p, 0.0));
        assert!(!cw.contains(&Point::new([-0.1, 0.5]), 1e-3));
    }

    #[test]
    fn test_degenerate_triangle_has_no_circumcenter() {
        let t = Triangle::new(
            Point::new([0.0_f64, 0.0]),
            Point::new([1.0, 0.0]),
            Point::new([2.0, 0.0]),
        );
        assert!(t.circumcenter().is_none());
        assert_relative_eq!(t.inradius(), 0.0);
    }

    #[test]
    fn test_line_intersections() {
        let a = Line::new(Point::new([0.0_f64, 0.0]), Point::new([2.0, 2.0]));
        let b = Line::new(Point::new([0.0, 2.0]), Point::new([2.0, 0.0]));
        let touching = Line::new(Point::new([2.0, 2.0]), Point::new([3.0, 0.0]));
        assert!(a.intersects_properly(&b));
        assert!(!a.intersects_properly(&touching));
        assert_relative_eq!(a.length(), 8.0_f64.sqrt());
        assert_eq!(a.midpoint(), Point::new([1.0, 1.0]));
    }

    #[test]
    fn test_bounding_box_operations() {
        let points = [
            Point::new([1.0_f64, 2.0]),
            Point::new([-1.0, 5.0]),
            Point::new([3.0, 0.0]),
        ];
        let bbox = BoundingBox::from_points(points.iter()).unwrap();
        assert_eq!(bbox.min, Point::new([-1.0, 0.0]));
        assert_eq!(bbox.max, Point::new([3.0, 5.0]));
        assert_relative_eq!(bbox.max_side(), 5.0);
        assert!(bbox.is_valid());
        assert!(bbox.contains(&Point::new([3.0 + 1e-9, 0.0]), 1e-6));

        let square = bbox.enclosing_square(2.0);
        assert_relative_eq!(square.width(), 10.0);
        assert_relative_eq!(square.center().x(), bbox.center().x());

        let far = Triangle::new(
            Point::new([10.0, 10.0]),
            Point::new([11.0, 10.0]),
            Point::new([10.0, 11.0]),
        );
        assert!(bbox.excludes_triangle(&far));
        assert!(!bbox.excludes_triangle(&unit_triangle()));
        assert!(BoundingBox::<f64>::from_points(std::iter::empty()).is_none());
    }
}
