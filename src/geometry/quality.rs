//! Geometric quality measures for triangles.
//!
//! # Quality Metrics
//!
//! - **Radius Ratio**: circumradius divided by inradius. An equilateral triangle has
//!   the optimal value 2; slivers grow without bound.
//! - **Minimum Angle**: smallest interior angle in radians.
//!
//! The refiner uses [`angle_at`] to detect acute hole corners, and mesh statistics
//! report the worst radius ratio of a finished mesh.
//!
//! # References
//!
//! - Shewchuk, J.R. "What Is a Good Linear Element? Interpolation, Conditioning,
//!   Anisotropy, and Quality Measures" (2002)

use crate::geometry::point::Point;
use crate::geometry::traits::coordinate::CoordinateScalar;
use crate::geometry::util::Triangle;

/// Errors that can occur during quality metric computation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QualityError {
    /// Triangle is degenerate (zero or near-zero area)
    #[error("Degenerate triangle: area {area}")]
    DegenerateTriangle {
        /// Approximate measure of degeneracy
        area: String,
    },
}

/// Circumradius over inradius.
///
/// # Errors
///
/// Returns [`QualityError::DegenerateTriangle`] for collinear corners.
///
/// # Examples
///
/// ```
/// use sfc_mesh::geometry::point::Point;
/// use sfc_mesh::geometry::quality::radius_ratio;
/// use sfc_mesh::geometry::util::Triangle;
///
/// let h = 3.0_f64.sqrt() / 2.0;
/// let equilateral = Triangle::new(
///     Point::new([0.0, 0.0]),
///     Point::new([1.0, 0.0]),
///     Point::new([0.5, h]),
/// );
/// let ratio = radius_ratio(&equilateral).unwrap();
/// assert!((ratio - 2.0).abs() < 1e-12);
/// ```
pub fn radius_ratio<T: CoordinateScalar>(triangle: &Triangle<T>) -> Result<T, QualityError> {
    let inradius = triangle.inradius();
    let degenerate = || QualityError::DegenerateTriangle {
        area: format!("{:?}", triangle.area()),
    };
    if inradius <= T::default_tolerance() {
        return Err(degenerate());
    }
    let circumradius = triangle.circumradius().ok_or_else(degenerate)?;
    Ok(circumradius / inradius)
}

/// Unsigned angle (radians, in `[0, π]`) at `at` between the rays towards `a` and `b`.
#[must_use]
pub fn angle_at<T: CoordinateScalar>(at: &Point<T>, a: &Point<T>, b: &Point<T>) -> T {
    let ux = a.x() - at.x();
    let uy = a.y() - at.y();
    let vx = b.x() - at.x();
    let vy = b.y() - at.y();
    let cross = ux * vy - uy * vx;
    let dot = ux * vx + uy * vy;
    cross.abs().atan2(dot)
}

/// Smallest interior angle of a triangle in radians.
#[must_use]
pub fn min_angle<T: CoordinateScalar>(triangle: &Triangle<T>) -> T {
    let [a, b, c] = &triangle.points;
    angle_at(a, b, c).min(angle_at(b, c, a)).min(angle_at(c, a, b))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    #[test]
    fn test_radius_ratio_right_isosceles() {
        let t = Triangle::new(
            Point::new([0.0_f64, 0.0]),
            Point::new([1.0, 0.0]),
            Point::new([0.0, 1.0]),
        );
        // R = √2/2, r = 1/(2+√2)
        let expected = (0.5_f64.sqrt()) * (2.0 + 2.0_f64.sqrt());
        assert_relative_eq!(radius_ratio(&t).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_radius_ratio_degenerate() {
        let t = Triangle::new(
            Point::new([0.0_f64, 0.0]),
            Point::new([1.0, 0.0]),
            Point::new([2.0, 0.0]),
        );
        assert!(matches!(
            radius_ratio(&t),
            Err(QualityError::DegenerateTriangle { .. })
        ));
    }

    #[test]
    fn test_angles() {
        let o = Point::new([0.0_f64, 0.0]);
        let x = Point::new([1.0, 0.0]);
        let y = Point::new([0.0, 2.0]);
        assert_relative_eq!(angle_at(&o, &x, &y), FRAC_PI_2);
        assert_relative_eq!(angle_at(&o, &y, &x), FRAC_PI_2);

        let t = Triangle::new(o, x, Point::new([0.0, 1.0]));
        assert_relative_eq!(min_angle(&t), FRAC_PI_4, epsilon = 1e-12);
    }
}
