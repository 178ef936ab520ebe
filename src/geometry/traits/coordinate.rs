//! Coordinate scalar abstraction for planar meshing.
//!
//! Every geometric type in this crate is generic over a floating-point scalar `T`
//! bounded by [`CoordinateScalar`]. The trait consolidates the numeric, validation and
//! serialization requirements in one place so that downstream signatures stay short.
//!
//! # Core Traits
//!
//! - **`CoordinateScalar`**: trait alias for `f32`/`f64` with tolerance and conversion helpers
//! - **`FiniteCheck`**: validation of scalar values (no NaN or infinity)
//!
//! # Examples
//!
//! ```rust
//! use sfc_mesh::geometry::traits::coordinate::{CoordinateScalar, FiniteCheck};
//!
//! assert_eq!(f64::default_tolerance(), 1e-15);
//! assert_eq!(f64::cast_f64(0.5), 0.5);
//! assert!(!f64::NAN.is_finite_generic());
//! ```

use num_traits::Float;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::{Debug, Display};
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur during coordinate validation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CoordinateValidationError {
    /// A coordinate value is invalid (NaN or infinite).
    #[error("Invalid coordinate at index {coordinate_index}: {coordinate_value}")]
    InvalidCoordinate {
        /// Index of the invalid coordinate (0 = x, 1 = y).
        coordinate_index: usize,
        /// Value of the invalid coordinate, as a string.
        coordinate_value: String,
    },
}

/// Default tolerance for f32 floating-point comparisons.
pub const DEFAULT_TOLERANCE_F32: f32 = 1e-6;

/// Default tolerance for f64 floating-point comparisons.
pub const DEFAULT_TOLERANCE_F64: f64 = 1e-15;

// =============================================================================
// TRAITS
// =============================================================================

/// Helper trait for checking finiteness of coordinates.
///
/// # Examples
///
/// ```
/// use sfc_mesh::geometry::traits::coordinate::FiniteCheck;
///
/// assert!(1.0f64.is_finite_generic());
/// assert!(!f32::INFINITY.is_finite_generic());
/// ```
pub trait FiniteCheck {
    /// Returns true if the value is finite (not NaN or infinite).
    fn is_finite_generic(&self) -> bool;
}

macro_rules! impl_finite_check {
    (float: $($t:ty),*) => {
        $(
            impl FiniteCheck for $t {
                #[inline(always)]
                fn is_finite_generic(&self) -> bool {
                    self.is_finite()
                }
            }
        )*
    };
}

impl_finite_check!(float: f32, f64);

/// Trait alias for the scalar type used by points, meshes and refiners.
///
/// Implemented for `f32` and `f64`. Besides the `Float` arithmetic it provides lossless
/// (for `f64`) conversions to and from `f64`, which is how constants and user tolerances
/// enter generic code without `Option`-returning casts at every call site.
pub trait CoordinateScalar:
    Float
    + FiniteCheck
    + Default
    + Debug
    + Display
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Returns the appropriate default tolerance for this coordinate scalar type.
    ///
    /// - For `f32`: `1e-6`
    /// - For `f64`: `1e-15`
    fn default_tolerance() -> Self;

    /// Relative tolerance used by the in-circle and orientation predicates.
    ///
    /// Determinants whose magnitude is below `predicate_tolerance() * permanent`
    /// are classified as degenerate.
    fn predicate_tolerance() -> Self;

    /// Converts an `f64` constant into this scalar type (rounding for `f32`).
    fn cast_f64(value: f64) -> Self;

    /// Converts this scalar into an `f64`.
    fn as_f64(self) -> f64;
}

impl CoordinateScalar for f32 {
    fn default_tolerance() -> Self {
        DEFAULT_TOLERANCE_F32
    }

    fn predicate_tolerance() -> Self {
        1e-5
    }

    #[expect(clippy::cast_possible_truncation)]
    fn cast_f64(value: f64) -> Self {
        value as Self
    }

    fn as_f64(self) -> f64 {
        f64::from(self)
    }
}

impl CoordinateScalar for f64 {
    fn default_tolerance() -> Self {
        DEFAULT_TOLERANCE_F64
    }

    fn predicate_tolerance() -> Self {
        1e-12
    }

    fn cast_f64(value: f64) -> Self {
        value
    }

    fn as_f64(self) -> f64 {
        self
    }
}

/// Validates that every value of a coordinate array is finite.
///
/// # Errors
///
/// Returns [`CoordinateValidationError::InvalidCoordinate`] for the first NaN or
/// infinite entry.
pub fn validate_coordinates<T: CoordinateScalar>(
    coords: &[T; 2],
) -> Result<(), CoordinateValidationError> {
    for (coordinate_index, value) in coords.iter().enumerate() {
        if !value.is_finite_generic() {
            return Err(CoordinateValidationError::InvalidCoordinate {
                coordinate_index,
                coordinate_value: format!("{value:?}"),
            });
        }
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
    fn test_default_tolerances() {
        assert_eq!(f32::default_tolerance(), DEFAULT_TOLERANCE_F32);
        assert_eq!(f64::default_tolerance(), DEFAULT_TOLERANCE_F64);
        assert!(f64::predicate_tolerance() > f64::default_tolerance());
        assert!(f32::predicate_tolerance() > f32::default_tolerance());
    }

    #[test]
    fn test_cast_round_trip() {
        assert_eq!(f64::cast_f64(1.25).as_f64(), 1.25);
        assert_eq!(f32::cast_f64(1.25).as_f64(), 1.25);
    }

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(&[1.0_f64, -2.0]).is_ok());

        let err = validate_coordinates(&[0.0_f64, f64::NAN]).unwrap_err();
        match err {
            CoordinateValidationError::InvalidCoordinate {
                coordinate_index, ..
            } => assert_eq!(coordinate_index, 1),
        }

        assert!(validate_coordinates(&[f32::INFINITY, 0.0]).is_err());
    }
}
