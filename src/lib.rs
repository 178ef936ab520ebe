//! # sfc_mesh
//!
//! This is a library for planar unstructured triangle meshing. It combines an incremental
//! Delaunay triangulation on a half-edge mesh with a Sierpinski space-filling-curve
//! refiner that produces uniform meshes over a domain described by a signed distance
//! function.
//!
//! # Features
//!
//! - Half-edge (DCEL) mesh with arena storage, stable keys, lazy deletion and compaction
//! - Incremental Delaunay insertion with edge-flip legalization
//! - Pluggable point location: linear scan with walking, or a history DAG (Delaunay tree)
//! - Sierpinski-curve uniform refinement with conforming newest-vertex bisection
//! - Border shrinking, hole carving, fixed points and hole smoothing
//! - Generic floating-point coordinates (`f32`, `f64`) through `CoordinateScalar`
//! - Serialization/Deserialization with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! Insert points into a triangulation of an enclosing square:
//!
//! ```rust
//! use sfc_mesh::prelude::*;
//!
//! let config = TriangulationConfig::new(BoundingBox::from_bounds([0.0, 0.0], [1.0, 1.0]));
//! let mut triangulation = IncrementalTriangulation::new(config, BaseLocator::new()).unwrap();
//!
//! let points = [
//!     Point::new([0.0, 0.0]),
//!     Point::new([1.0, 0.0]),
//!     Point::new([1.0, 1.0]),
//!     Point::new([0.0, 1.0]),
//!     Point::new([0.5, 0.5]),
//! ];
//! assert_eq!(triangulation.insert_all(points).unwrap(), 5);
//! triangulation.finalize().unwrap();
//!
//! assert_eq!(triangulation.mesh().number_of_faces(), 4);
//! assert!(triangulation.validate_delaunay().is_ok());
//! ```
//!
//! # Uniform Refinement
//!
//! Mesh a domain with a target edge length:
//!
//! ```rust
//! use sfc_mesh::prelude::*;
//!
//! let bound = BoundingBox::from_bounds([0.0, 0.0], [10.0, 10.0]);
//! let config = RefinerConfigBuilder::default().bound(bound).build().unwrap();
//! let mut refiner = SfcUniformRefiner::new(
//!     config,
//!     rectangle(bound),
//!     uniform_edge_length(1.0),
//!     BaseLocator::new(),
//! )
//! .unwrap();
//!
//! let triangulation = refiner.generate().unwrap();
//! let triangulation = triangulation.read().unwrap();
//! assert_eq!(triangulation.mesh().number_of_faces(), 512);
//! assert_eq!(triangulation.mesh().number_of_vertices(), 289);
//! ```
//!
//! # Mesh Invariants
//!
//! [`Mesh`](core::mesh::Mesh) maintains the usual half-edge invariants, checked by
//! [`validate_topology`](core::util::validate_topology):
//!
//! - **Twins** – `twin(twin(e)) == e` and twins run in opposite directions.
//! - **Cycles** – `next(prev(e)) == e`, and every edge of a face cycle points to that face.
//! - **Interior faces** – exactly three edges, counter-clockwise.
//! - **Boundary faces** – the border and hole faces bound the triangulated region; an
//!   edge never has a boundary face on both sides.
//! - **Vertex handles** – every live vertex names a live incoming edge.
//!
//! The Delaunay property holds for meshes built purely by insertion; the refiner splits
//! edges without legalization and does not maintain it.

// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// The `core` module contains the half-edge mesh, its topological operations, the point
/// locators and the incremental triangulation engine.
pub mod core {
    /// Algorithms that run on top of the mesh
    pub mod algorithms {
        /// History DAG point location (Delaunay tree)
        pub mod delaunay_tree;
        /// Multi-level point location placeholder
        pub mod delaunay_hierarchy;
        /// Edge-flip restoration of the Delaunay property
        pub mod legalization;
        /// Point location strategies and the locator trait
        pub mod locate;
    }
    /// Collection aliases optimized for mesh workloads
    pub mod collections;
    pub mod face;
    pub mod half_edge;
    pub mod mesh;
    /// Topological edits: square creation, splits, flips, boundary merges
    pub mod operations;
    /// Incremental Delaunay triangulation engine
    pub mod triangulation;
    pub mod util;
    pub mod vertex;
    // Re-export the `core` modules.
    pub use face::*;
    pub use half_edge::*;
    pub use mesh::*;
    pub use triangulation::*;
    pub use util::*;
    pub use vertex::*;
    // Note: collections module not re-exported here to avoid namespace pollution
}

/// Contains geometric types including the `Point` struct, predicates, distance
/// functions and obstacle shapes.
pub mod geometry {
    /// Signed distance and edge-length functions
    pub mod distance;
    pub mod point;
    pub mod predicates;
    /// Triangle quality measures
    pub mod quality;
    /// Obstacle shapes used as refinement early-exits
    pub mod shapes;
    /// Planar primitives, bounding boxes and point generation
    pub mod util;
    /// Traits module containing the coordinate scalar abstraction.
    pub mod traits {
        pub mod coordinate;
        pub use coordinate::*;
    }
    pub use distance::*;
    pub use point::*;
    pub use predicates::*;
    pub use quality::*;
    pub use shapes::*;
    pub use traits::*;
    pub use util::*;
}

/// Space-filling-curve driven mesh refinement.
pub mod refinement {
    /// Refiner configuration and its builder
    pub mod config;
    /// Sierpinski curve over mesh faces
    pub mod sfc;
    /// The uniform refiner
    pub mod uniform;
    pub use config::*;
    pub use sfc::*;
    pub use uniform::*;
}

/// A prelude module that re-exports commonly used types.
/// This makes it easier to import the most commonly used items from the crate.
pub mod prelude {
    // Re-export from core
    pub use crate::core::{
        algorithms::{
            delaunay_hierarchy::DelaunayHierarchy,
            delaunay_tree::DelaunayTree,
            legalization::legalize,
            locate::{AnyLocator, BaseLocator, LocateError, LocateResult, LocatorKind, PointLocator},
        },
        face::*,
        half_edge::*,
        mesh::*,
        triangulation::*,
        util::*,
        vertex::*,
    };

    pub use crate::core::collections::{FastHashMap, FastHashSet, SmallBuffer};

    // Re-export from geometry
    pub use crate::geometry::{
        distance::*, point::*, predicates::*, quality::*, shapes::*, traits::coordinate::*,
        util::*,
    };

    pub use crate::refinement::{config::*, sfc::*, uniform::*};
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================
