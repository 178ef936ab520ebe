use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet, FxHasher};
use smallvec::SmallVec;

#[cfg(not(feature = "dense-slotmap"))]
use slotmap::SlotMap;

#[cfg(feature = "dense-slotmap")]
use slotmap::DenseSlotMap;

use crate::core::mesh::{FaceKey, HalfEdgeKey, VertexKey};

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Storage backend for mesh elements.
///
/// Abstracts over `DenseSlotMap` (**default**) and `SlotMap` (when built with
/// `--no-default-features`). Iteration order of a freshly built map is insertion
/// order for both backends, which is what
/// [`Mesh::arrange_memory`](crate::core::mesh::Mesh::arrange_memory) relies on.
///
/// # Feature Flags
///
/// - **default**: Uses `DenseSlotMap` (enabled via the default `dense-slotmap` feature)
/// - **--no-default-features**: Uses `SlotMap` for comparison and experimentation
#[cfg(not(feature = "dense-slotmap"))]
pub type StorageMap<K, V> = SlotMap<K, V>;

#[cfg(feature = "dense-slotmap")]
pub type StorageMap<K, V> = DenseSlotMap<K, V>;

// =============================================================================
// CORE OPTIMIZED TYPES
// =============================================================================

/// Optimized `HashMap` type for performance-critical operations.
/// Uses `FastHasher` (`rustc_hash::FxHasher`) for faster hashing in non-cryptographic contexts.
///
/// # Security Warning
///
/// ⚠️ **Not DoS-resistant**: Do not use with attacker-controlled keys.
///
/// # Examples
///
/// ```rust
/// use sfc_mesh::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<u64, usize> = FastHashMap::default();
/// map.insert(123, 456);
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Fast non-cryptographic hasher alias for internal collections.
pub type FastHasher = FxHasher;

/// Build hasher that instantiates [`FastHasher`].
pub type FastBuildHasher = FxBuildHasher;

/// Re-export the Entry enum for `FastHashMap`.
pub use std::collections::hash_map::Entry;

/// Optimized `HashSet` type for performance-critical operations.
///
/// # Examples
///
/// ```rust
/// use sfc_mesh::core::collections::FastHashSet;
///
/// let mut set: FastHashSet<u32> = FastHashSet::default();
/// assert!(set.insert(7));
/// assert!(!set.insert(7));
/// ```
pub type FastHashSet<T> = FxHashSet<T>;

/// Small-optimized Vec that uses stack allocation for small collections.
///
/// # Size Guidelines
///
/// - **N=2**: Faces sharing an edge
/// - **N=4**: Faces produced by one split
/// - **N=8**: Typical vertex degrees
///
/// # Examples
///
/// ```rust
/// use sfc_mesh::core::collections::SmallBuffer;
///
/// let mut buffer: SmallBuffer<i32, 8> = SmallBuffer::new();
/// for i in 0..5 {
///     buffer.push(i);
/// }
/// assert!(!buffer.spilled());
/// ```
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

// =============================================================================
// SEMANTIC SIZE CONSTANTS AND TYPE ALIASES
// =============================================================================

/// Inline capacity for per-vertex neighborhoods.
pub const TYPICAL_VERTEX_DEGREE: usize = 8;

/// Faces returned by point location: one for interior points, two for an edge,
/// a fan for a vertex.
pub type FaceKeyBuffer = SmallBuffer<FaceKey, TYPICAL_VERTEX_DEGREE>;

/// Half-edges of a face cycle or a vertex rotation.
pub type HalfEdgeKeyBuffer = SmallBuffer<HalfEdgeKey, TYPICAL_VERTEX_DEGREE>;

/// Vertices of a face or a vertex neighborhood.
pub type VertexKeyBuffer = SmallBuffer<VertexKey, TYPICAL_VERTEX_DEGREE>;

/// Set of faces, used for visited tracking in walks and flood fills.
pub type FaceKeySet = FastHashSet<FaceKey>;

/// Creates a [`FastHashMap`] with the given capacity.
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}

/// Creates a [`FastHashSet`] with the given capacity.
#[must_use]
pub fn fast_hash_set_with_capacity<T>(capacity: usize) -> FastHashSet<T> {
    FastHashSet::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fast_collections_with_capacity() {
        let mut map: FastHashMap<u32, &str> = fast_hash_map_with_capacity(16);
        map.insert(1, "one");
        assert!(map.capacity() >= 16);
        match map.entry(1) {
            Entry::Occupied(e) => assert_eq!(*e.get(), "one"),
            Entry::Vacant(_) => panic!("entry should exist"),
        }

        let set: FastHashSet<u32> = fast_hash_set_with_capacity(4);
        assert!(set.capacity() >= 4);
    }

    #[test]
    fn test_small_buffer_inline() {
        let buffer: FaceKeyBuffer = FaceKeyBuffer::new();
        assert_eq!(buffer.inline_size(), TYPICAL_VERTEX_DEGREE);
    }
}
