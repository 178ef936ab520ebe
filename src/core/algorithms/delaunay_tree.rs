//! Delaunay-Tree point location.
//!
//! The tree is the history of the triangulation: a directed acyclic graph whose nodes
//! are all triangles that ever existed. A split hangs the new triangles below the one
//! they replaced; a flip creates two triangles that are children of *both* flipped
//! triangles. Locating a point descends from the root through every node whose triangle
//! contains it, so the expected cost is logarithmic for random insertion orders.
//!
//! Nodes live in a slotmap and reference each other by [`DagNodeKey`], which allows
//! multiple parents without shared ownership. Faces are reused in place by the mesh
//! operations, so a face's *current* node is tracked in a separate map; a leaf is live
//! exactly when it is the current node of an interior face.
//!
//! [`PointLocator::compacted`] retires the graph (every face key changed) and the tree
//! answers further queries through its embedded visibility walk.

use slotmap::{SlotMap, new_key_type};

use crate::core::algorithms::locate::{
    BaseLocator, LocateError, LocatorKind, PointLocator, candidates_from_face,
};
use crate::core::collections::{FaceKeyBuffer, FastHashMap, FastHashSet, SmallBuffer};
use crate::core::mesh::{FaceKey, Mesh, MeshRemap, VertexKey};
use crate::geometry::point::Point;
use crate::geometry::traits::coordinate::CoordinateScalar;
use crate::geometry::util::Triangle;

new_key_type! {
    /// Key type for accessing nodes of the history graph.
    pub struct DagNodeKey;
}

/// Pruning slack, relative to the query epsilon, for triangles cached in inner nodes.
const PRUNE_SLACK: f64 = 4.0;

#[derive(Debug, Clone)]
struct DagNode<T>
where
    T: CoordinateScalar,
{
    /// Geometry at creation time; `None` for the virtual root.
    triangle: Option<Triangle<T>>,
    face: Option<FaceKey>,
    children: SmallBuffer<DagNodeKey, 3>,
}

/// History-DAG point locator.
#[derive(Debug, Clone)]
pub struct DelaunayTree<T>
where
    T: CoordinateScalar,
{
    nodes: SlotMap<DagNodeKey, DagNode<T>>,
    root: Option<DagNodeKey>,
    current: FastHashMap<FaceKey, DagNodeKey>,
    walker: BaseLocator,
    retired: bool,
}

impl<T> Default for DelaunayTree<T>
where
    T: CoordinateScalar,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DelaunayTree<T>
where
    T: CoordinateScalar,
{
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            current: FastHashMap::default(),
            walker: BaseLocator::new(),
            retired: false,
        }
    }

    /// Number of nodes in the history graph (root included).
    #[must_use]
    pub fn number_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live leaves.
    #[must_use]
    pub fn number_of_live_leaves(&self) -> usize {
        self.current.len()
    }

    /// Whether the graph was dropped after a storage rebuild.
    #[must_use]
    pub const fn is_retired(&self) -> bool {
        self.retired
    }

    fn root(&mut self) -> DagNodeKey {
        if let Some(root) = self.root {
            return root;
        }
        let root = self.nodes.insert(DagNode {
            triangle: None,
            face: None,
            children: SmallBuffer::new(),
        });
        self.root = Some(root);
        root
    }

    fn add_child(
        &mut self,
        mesh: &Mesh<T>,
        parents: &[DagNodeKey],
        face: FaceKey,
    ) -> Result<DagNodeKey, LocateError> {
        let triangle = mesh.to_triangle(face)?;
        let child = self.nodes.insert(DagNode {
            triangle: Some(triangle),
            face: Some(face),
            children: SmallBuffer::new(),
        });
        for &parent in parents {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.children.push(child);
            }
        }
        self.current.insert(face, child);
        Ok(child)
    }

    /// All live interior faces whose triangle contains `p`.
    fn live_leaves(
        &self,
        mesh: &Mesh<T>,
        p: &Point<T>,
        epsilon: T,
        first_only: bool,
    ) -> Result<FaceKeyBuffer, LocateError> {
        let mut found = FaceKeyBuffer::new();
        let Some(root) = self.root else {
            return Ok(found);
        };
        let slack = epsilon * T::cast_f64(PRUNE_SLACK);
        let mut stack = vec![root];
        let mut visited = FastHashSet::default();

        while let Some(key) = stack.pop() {
            if !visited.insert(key) {
                continue;
            }
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            if let Some(triangle) = &node.triangle
                && !triangle.contains(p, slack)
            {
                continue;
            }
            if node.children.is_empty() {
                let Some(face) = node.face else { continue };
                if self.current.get(&face) != Some(&key) || !mesh.is_interior(face) {
                    continue;
                }
                if mesh.to_triangle(face)?.contains(p, epsilon) && !found.contains(&face) {
                    found.push(face);
                    if first_only {
                        break;
                    }
                }
            } else {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        Ok(found)
    }
}

impl<T> PointLocator<T> for DelaunayTree<T>
where
    T: CoordinateScalar,
{
    fn kind(&self) -> LocatorKind {
        LocatorKind::DelaunayTree
    }

    fn locate(
        &self,
        mesh: &Mesh<T>,
        p: &Point<T>,
        epsilon: T,
    ) -> Result<Option<FaceKey>, LocateError> {
        if self.retired || self.root.is_none() {
            return self.walker.locate(mesh, p, epsilon);
        }
        match self.live_leaves(mesh, p, epsilon, true)?.first() {
            Some(&face) => Ok(Some(face)),
            None => self.walker.locate(mesh, p, epsilon),
        }
    }

    fn locate_point(
        &self,
        mesh: &Mesh<T>,
        p: &Point<T>,
        for_insertion: bool,
        epsilon: T,
    ) -> Result<FaceKeyBuffer, LocateError> {
        let leaves = if self.retired {
            FaceKeyBuffer::new()
        } else {
            self.live_leaves(mesh, p, epsilon, false)?
        };
        if leaves.is_empty() {
            return match self.walker.locate(mesh, p, epsilon)? {
                Some(face) => candidates_from_face(mesh, face, p, for_insertion, epsilon),
                None => Ok(FaceKeyBuffer::new()),
            };
        }

        let mut candidates = FaceKeyBuffer::new();
        for face in leaves {
            let here = candidates_from_face(mesh, face, p, for_insertion, epsilon)?;
            if for_insertion && here.is_empty() {
                // Near an existing vertex.
                return Ok(here);
            }
            for f in here {
                if !candidates.contains(&f) {
                    candidates.push(f);
                }
            }
        }
        Ok(candidates)
    }

    fn split_face_event(
        &mut self,
        mesh: &Mesh<T>,
        original: Option<FaceKey>,
        new_faces: &[FaceKey],
    ) -> Result<(), LocateError> {
        self.walker.split_face_event(mesh, original, new_faces)?;
        if self.retired {
            return Ok(());
        }
        let parent = match original {
            Some(face) => *self
                .current
                .get(&face)
                .ok_or(LocateError::InvalidFace { face })?,
            None => self.root(),
        };
        for &face in new_faces {
            self.add_child(mesh, &[parent], face)?;
        }
        Ok(())
    }

    fn flip_edge_event(&mut self, mesh: &Mesh<T>, faces: [FaceKey; 2]) -> Result<(), LocateError> {
        if self.retired {
            return Ok(());
        }
        let parent = |face: FaceKey| {
            self.current
                .get(&face)
                .copied()
                .ok_or(LocateError::InvalidFace { face })
        };
        let parents = [parent(faces[0])?, parent(faces[1])?];
        for face in faces {
            self.add_child(mesh, &parents, face)?;
        }
        Ok(())
    }

    fn insert_event(&mut self, mesh: &Mesh<T>, vertex: VertexKey) -> Result<(), LocateError> {
        self.walker.insert_event(mesh, vertex)
    }

    fn delete_boundary_face(&mut self, mesh: &Mesh<T>, face: FaceKey) -> Result<(), LocateError> {
        self.current.remove(&face);
        self.walker.delete_boundary_face(mesh, face)
    }

    fn compacted(&mut self, mesh: &Mesh<T>, remap: &MeshRemap) -> Result<(), LocateError> {
        tracing::debug!(
            "[locate] retiring Delaunay-Tree with {} nodes after storage rebuild",
            self.nodes.len()
        );
        self.nodes.clear();
        self.current.clear();
        self.root = None;
        self.retired = true;
        self.walker.compacted(mesh, remap)
    }
}
