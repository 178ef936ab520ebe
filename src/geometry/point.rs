//! Planar points.
//!
//! [`Point`] is a plain `Copy` coordinate pair. Identity of a mesh point is the
//! [`VertexKey`](crate::core::mesh::VertexKey) that owns it, not its coordinates, so
//! equality here is ordinary IEEE 754 equality.

#![forbid(unsafe_code)]

use crate::geometry::traits::coordinate::{
    CoordinateScalar, CoordinateValidationError, validate_coordinates,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// =============================================================================
// POINT STRUCT DEFINITION
// =============================================================================

/// A point in the plane with coordinates of generic scalar type `T`.
///
/// # Examples
///
/// ```rust
/// use sfc_mesh::geometry::point::Point;
///
/// let p = Point::new([1.0, 2.0]);
/// assert_eq!(p.coords(), &[1.0, 2.0]);
/// assert_eq!(p.x(), 1.0);
/// assert_eq!(p.y(), 2.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = ""))]
pub struct Point<T>
where
    T: CoordinateScalar,
{
    /// The coordinates of the point.
    coords: [T; 2],
}

// =============================================================================
// PUBLIC API
// =============================================================================

impl<T> Point<T>
where
    T: CoordinateScalar,
{
    /// Creates a new point from an `[x, y]` array.
    #[inline]
    #[must_use]
    pub const fn new(coords: [T; 2]) -> Self {
        Self { coords }
    }

    /// Returns a reference to the point's coordinates.
    #[inline]
    #[must_use]
    pub const fn coords(&self) -> &[T; 2] {
        &self.coords
    }

    /// The x coordinate.
    #[inline]
    #[must_use]
    pub const fn x(&self) -> T {
        self.coords[0]
    }

    /// The y coordinate.
    #[inline]
    #[must_use]
    pub const fn y(&self) -> T {
        self.coords[1]
    }

    /// Validates that both coordinates are finite.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateValidationError::InvalidCoordinate`] for NaN or infinite values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sfc_mesh::geometry::point::Point;
    ///
    /// assert!(Point::new([0.0, 1.0]).validate().is_ok());
    /// assert!(Point::new([f64::NAN, 1.0]).validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), CoordinateValidationError> {
        validate_coordinates(&self.coords)
    }

    /// Squared Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance_squared(&self, other: &Self) -> T {
        let dx = self.x() - other.x();
        let dy = self.y() - other.y();
        dx * dx + dy * dy
    }

    /// Euclidean distance to `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sfc_mesh::geometry::point::Point;
    ///
    /// let a = Point::new([0.0, 0.0]);
    /// let b = Point::new([3.0, 4.0]);
    /// assert_eq!(a.distance(&b), 5.0);
    /// ```
    #[inline]
    #[must_use]
    pub fn distance(&self, other: &Self) -> T {
        (self.x() - other.x()).hypot(self.y() - other.y())
    }

    /// Midpoint of the segment between `self` and `other`.
    #[inline]
    #[must_use]
    pub fn midpoint(&self, other: &Self) -> Self {
        let half = T::cast_f64(0.5);
        Self::new([
            (self.x() + other.x()) * half,
            (self.y() + other.y()) * half,
        ])
    }

    /// Lexicographic comparison (x first, then y).
    ///
    /// NaN coordinates compare as equal so the order is total on validated input
    /// and never panics otherwise.
    #[must_use]
    pub fn lexicographic_cmp(&self, other: &Self) -> Ordering {
        self.x()
            .partial_cmp(&other.x())
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.y().partial_cmp(&other.y()).unwrap_or(Ordering::Equal))
    }
}

// =============================================================================
// TRAIT IMPLEMENTATIONS
// =============================================================================

impl<T> From<[T; 2]> for Point<T>
where
    T: CoordinateScalar,
{
    #[inline]
    fn from(coords: [T; 2]) -> Self {
        Self::new(coords)
    }
}

impl<T> From<Point<T>> for [T; 2]
where
    T: CoordinateScalar,
{
    #[inline]
    fn from(point: Point<T>) -> Self {
        point.coords
    }
}

impl<T> fmt::Display for Point<T>
where
    T: CoordinateScalar,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x(), self.y())
    }
}

// =============================================================================
// TESTS
// =============================================================================
