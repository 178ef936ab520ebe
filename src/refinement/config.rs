//! Refiner configuration.
//!
//! Built with [`RefinerConfigBuilder`]; only the bounding box is required.
//!
//! # Examples
//!
//! ```rust
//! use sfc_mesh::geometry::util::BoundingBox;
//! use sfc_mesh::refinement::config::RefinerConfigBuilder;
//!
//! let config = RefinerConfigBuilder::default()
//!     .bound(BoundingBox::from_bounds([0.0, 0.0], [10.0, 10.0]))
//!     .min_edge_length(0.5)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.max_levels, 64);
//! assert!(!config.smooth_holes);
//! ```

use serde::{Deserialize, Serialize};

use crate::geometry::traits::coordinate::CoordinateScalar;
use crate::geometry::util::BoundingBox;

/// Parameters of an SFC uniform refinement run.
#[derive(Builder, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = ""))]
#[builder(build_fn(validate = "Self::validate"))]
pub struct RefinerConfig<T>
where
    T: CoordinateScalar,
{
    /// Region to mesh; the initial square is its bounding square.
    pub bound: BoundingBox<T>,
    /// Factor applied to the edge-length function.
    #[builder(default = "T::one()")]
    pub min_edge_length: T,
    /// Classification epsilon relative to the largest side of the bounding square.
    #[builder(default = "T::cast_f64(crate::core::triangulation::DEFAULT_EPSILON_FACTOR)")]
    pub epsilon_factor: T,
    /// Refinement stops after this many levels even if edges are still too long.
    #[builder(default = "64")]
    pub max_levels: usize,
    /// Close acute hole corners after carving.
    #[builder(default = "false")]
    pub smooth_holes: bool,
    /// Hole corners below this angle (radians) are closed when smoothing.
    #[builder(default = "T::cast_f64(std::f64::consts::FRAC_PI_2)")]
    pub smoothing_angle: T,
}

impl<T> RefinerConfigBuilder<T>
where
    T: CoordinateScalar,
{
    fn validate(&self) -> Result<(), String> {
        if let Some(bound) = &self.bound
            && !bound.is_valid()
        {
            return Err("bound must have positive finite extents".to_string());
        }
        if let Some(length) = self.min_edge_length
            && !(length.is_finite() && length > T::zero())
        {
            return Err(format!("min_edge_length must be positive, got {length}"));
        }
        if let Some(factor) = self.epsilon_factor
            && !(factor.is_finite() && factor > T::zero())
        {
            return Err(format!("epsilon_factor must be positive, got {factor}"));
        }
        if self.max_levels == Some(0) {
            return Err("max_levels must be at least 1".to_string());
        }
        Ok(())
    }
}
