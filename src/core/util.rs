//! Helpers that inspect a mesh without modifying it: structural and Delaunay
//! validation, and summary statistics.

pub mod mesh_validation;
pub mod statistics;

pub use mesh_validation::*;
pub use statistics::*;
