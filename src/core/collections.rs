//! Collection aliases used throughout the mesh, locators and refiner.
//!
//! Centralizing the aliases keeps the storage backend, hasher and inline capacities
//! swappable in one place.

mod aliases;
mod secondary_maps;

pub use aliases::*;
pub use secondary_maps::*;
