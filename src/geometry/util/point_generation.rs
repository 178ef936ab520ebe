//! Random point generation functions.
//!
//! Used by tests and benchmarks to produce reproducible planar point sets.

use rand::Rng;
use rand::distr::uniform::SampleUniform;

use crate::geometry::point::Point;
use crate::geometry::traits::coordinate::CoordinateScalar;

pub use super::RandomPointGenerationError;

/// Generate random points with coordinates drawn uniformly from `range`.
///
/// Uses the thread-local RNG; see [`generate_random_points_seeded`] for reproducible output.
///
/// # Errors
///
/// Returns [`RandomPointGenerationError::InvalidRange`] if `range.0 >= range.1`.
pub fn generate_random_points<T: CoordinateScalar + SampleUniform>(
    n_points: usize,
    range: (T, T),
) -> Result<Vec<Point<T>>, RandomPointGenerationError> {
    validate_range(range)?;
    let mut rng = rand::rng();
    Ok((0..n_points)
        .map(|_| {
            Point::new([
                rng.random_range(range.0..range.1),
                rng.random_range(range.0..range.1),
            ])
        })
        .collect())
}

/// Generate random points with a seeded RNG.
///
/// # Errors
///
/// Returns [`RandomPointGenerationError::InvalidRange`] if `range.0 >= range.1`.
///
/// # Examples
///
/// ```
/// use sfc_mesh::geometry::util::generate_random_points_seeded;
///
/// let points1 = generate_random_points_seeded::<f64>(100, (-5.0, 5.0), 42).unwrap();
/// let points2 = generate_random_points_seeded::<f64>(100, (-5.0, 5.0), 42).unwrap();
/// assert_eq!(points1, points2);
///
/// let points3 = generate_random_points_seeded::<f64>(100, (-5.0, 5.0), 123).unwrap();
/// assert_ne!(points1, points3);
/// ```
pub fn generate_random_points_seeded<T: CoordinateScalar + SampleUniform>(
    n_points: usize,
    range: (T, T),
    seed: u64,
) -> Result<Vec<Point<T>>, RandomPointGenerationError> {
    use rand::SeedableRng;

    validate_range(range)?;

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut points = Vec::with_capacity(n_points);

    for _ in 0..n_points {
        points.push(Point::new([
            rng.random_range(range.0..range.1),
            rng.random_range(range.0..range.1),
        ]));
    }

    Ok(points)
}

/// Generate a `points_per_dim × points_per_dim` regular grid starting at `offset`.
///
/// # Errors
///
/// Returns [`RandomPointGenerationError::InvalidGrid`] for a zero-sized grid or a
/// non-positive spacing.
///
/// # Examples
///
/// ```
/// use sfc_mesh::geometry::util::generate_grid_points;
///
/// let grid = generate_grid_points::<f64>(3, 0.5, [1.0, 1.0]).unwrap();
/// assert_eq!(grid.len(), 9);
/// assert_eq!(grid[0].coords(), &[1.0, 1.0]);
/// assert_eq!(grid[8].coords(), &[2.0, 2.0]);
/// ```
pub fn generate_grid_points<T: CoordinateScalar>(
    points_per_dim: usize,
    spacing: T,
    offset: [T; 2],
) -> Result<Vec<Point<T>>, RandomPointGenerationError> {
    if points_per_dim == 0 {
        return Err(RandomPointGenerationError::InvalidGrid {
            reason: "points_per_dim must be positive".to_string(),
        });
    }
    if spacing.is_nan() || spacing <= T::zero() {
        return Err(RandomPointGenerationError::InvalidGrid {
            reason: format!("spacing must be positive, got {spacing:?}"),
        });
    }

    let mut points = Vec::with_capacity(points_per_dim * points_per_dim);
    let mut y = offset[1];
    for _ in 0..points_per_dim {
        let mut x = offset[0];
        for _ in 0..points_per_dim {
            points.push(Point::new([x, y]));
            x = x + spacing;
        }
        y = y + spacing;
    }
    Ok(points)
}

fn validate_range<T: CoordinateScalar>(range: (T, T)) -> Result<(), RandomPointGenerationError> {
    if range.0.is_nan() || range.1.is_nan() || range.0 >= range.1 {
        return Err(RandomPointGenerationError::InvalidRange {
            min: format!("{:?}", range.0),
            max: format!("{:?}", range.1),
        });
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_random_points_in_range() {
        let points = generate_random_points::<f64>(200, (-1.0, 1.0)).unwrap();
        assert_eq!(points.len(), 200);
        for p in &points {
            assert!((-1.0..1.0).contains(&p.x()));
            assert!((-1.0..1.0).contains(&p.y()));
        }
    }

    #[test]
    fn test_generate_random_points_invalid_range() {
        assert!(matches!(
            generate_random_points::<f64>(10, (1.0, 1.0)),
            Err(RandomPointGenerationError::InvalidRange { .. })
        ));
        assert!(generate_random_points_seeded::<f32>(10, (2.0, -2.0), 7).is_err());
    }

    #[test]
    fn test_generate_grid_points_invalid() {
        assert!(generate_grid_points::<f64>(0, 1.0, [0.0, 0.0]).is_err());
        assert!(generate_grid_points::<f64>(3, 0.0, [0.0, 0.0]).is_err());
    }
}
