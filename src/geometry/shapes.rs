//! Obstacle shapes.
//!
//! Obstacles are an optional early-exit heuristic for the refiner: an edge whose two
//! adjacent triangles both lie inside one obstacle needs no further refinement. The
//! signed distance function remains the source of truth for what gets carved.

use serde::{Deserialize, Serialize};

use crate::geometry::point::Point;
use crate::geometry::util::{BoundingBox, Line, Triangle};
use crate::geometry::traits::coordinate::CoordinateScalar;

/// A closed planar region.
pub trait Obstacle<T: CoordinateScalar>: Send + Sync {
    /// Returns `true` if `p` lies inside or on the shape.
    fn contains_point(&self, p: &Point<T>) -> bool;

    /// Returns `true` if the whole triangle lies inside the shape.
    fn contains_triangle(&self, triangle: &Triangle<T>) -> bool;

    /// Axis-aligned bounds of the shape.
    fn bounding_box(&self) -> BoundingBox<T>;
}

// =============================================================================
// CIRCLE
// =============================================================================

/// A disc.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = ""))]
pub struct Circle<T>
where
    T: CoordinateScalar,
{
    /// Center of the disc.
    pub center: Point<T>,
    /// Radius of the disc.
    pub radius: T,
}

impl<T> Circle<T>
where
    T: CoordinateScalar,
{
    /// Creates a disc.
    #[must_use]
    pub const fn new(center: Point<T>, radius: T) -> Self {
        Self { center, radius }
    }
}

impl<T> Obstacle<T> for Circle<T>
where
    T: CoordinateScalar,
{
    fn contains_point(&self, p: &Point<T>) -> bool {
        p.distance_squared(&self.center) <= self.radius * self.radius
    }

    fn contains_triangle(&self, triangle: &Triangle<T>) -> bool {
        // A disc is convex: containing the corners suffices.
        triangle.points.iter().all(|p| self.contains_point(p))
    }

    fn bounding_box(&self) -> BoundingBox<T> {
        BoundingBox::from_bounds(
            [self.center.x() - self.radius, self.center.y() - self.radius],
            [self.center.x() + self.radius, self.center.y() + self.radius],
        )
    }
}

// =============================================================================
// POLYGON
// =============================================================================

/// A simple polygon given by its corners in either orientation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = ""))]
pub struct Polygon<T>
where
    T: CoordinateScalar,
{
    points: Vec<Point<T>>,
}

impl<T> Polygon<T>
where
    T: CoordinateScalar,
{
    /// Creates a polygon; returns `None` for fewer than three corners.
    #[must_use]
    pub fn new(points: Vec<Point<T>>) -> Option<Self> {
        (points.len() >= 3).then_some(Self { points })
    }

    /// Axis-aligned rectangle as a polygon.
    #[must_use]
    pub fn rectangle(bbox: &BoundingBox<T>) -> Self {
        Self {
            points: vec![
                bbox.min,
                Point::new([bbox.max.x(), bbox.min.y()]),
                bbox.max,
                Point::new([bbox.min.x(), bbox.max.y()]),
            ],
        }
    }

    /// The corners.
    #[must_use]
    pub fn points(&self) -> &[Point<T>] {
        &self.points
    }

    fn edges(&self) -> impl Iterator<Item = Line<T>> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| Line::new(self.points[i], self.points[(i + 1) % n]))
    }

    fn on_boundary(&self, p: &Point<T>) -> bool {
        self.edges()
            .any(|e| e.distance_to_point(p) <= T::default_tolerance())
    }
}

impl<T> Obstacle<T> for Polygon<T>
where
    T: CoordinateScalar,
{
    fn contains_point(&self, p: &Point<T>) -> bool {
        if self.on_boundary(p) {
            return true;
        }
        // Even-odd ray casting towards +x.
        let mut inside = false;
        for edge in self.edges() {
            let (a, b) = (edge.from, edge.to);
            if (a.y() > p.y()) != (b.y() > p.y()) {
                let t = (p.y() - a.y()) / (b.y() - a.y());
                let x = a.x() + t * (b.x() - a.x());
                if p.x() < x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    fn contains_triangle(&self, triangle: &Triangle<T>) -> bool {
        if !triangle.points.iter().all(|p| self.contains_point(p)) {
            return false;
        }
        // Corners inside a non-convex polygon may still straddle a notch.
        (0..3).all(|i| {
            let side = triangle.edge(i);
            self.edges().all(|e| !side.intersects_properly(&e))
        }) && self
            .points
            .iter()
            .all(|corner| !triangle.contains(corner, -T::default_tolerance()))
    }

    fn bounding_box(&self) -> BoundingBox<T> {
        // `new` guarantees at least three points.
        BoundingBox::from_points(self.points.iter())
            .unwrap_or_else(|| BoundingBox::new(Point::default(), Point::default()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
