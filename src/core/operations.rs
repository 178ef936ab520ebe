//! Topological edits on the half-edge mesh.
//!
//! These operations are pure topology: they create, relink and destroy mesh elements but
//! never consult geometric predicates (apart from placing the new vertex). Deciding *when*
//! to split, flip or merge belongs to the triangulation engine.
//!
//! All edits keep the mesh valid: twins stay symmetric, face cycles stay closed and every
//! live vertex keeps a live incoming half-edge.

use crate::core::collections::{FastHashSet, HalfEdgeKeyBuffer, SmallBuffer, VertexKeyBuffer};
use crate::core::face::FaceKind;
use crate::core::mesh::{FaceKey, HalfEdgeKey, Mesh, MeshError, SquareHandles, VertexKey};
use crate::geometry::point::Point;
use crate::geometry::traits::coordinate::CoordinateScalar;
use crate::geometry::util::BoundingBox;

// =============================================================================
// OPERATION TAXONOMY
// =============================================================================

/// Classification of the topological edits the mesh supports.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TopologicalOperation {
    /// 1 → 3: a new vertex inside a triangle.
    SplitTriangle,
    /// 2 → 4 (or 1 → 2 at the boundary): a new vertex on an edge.
    SplitEdge,
    /// 2 → 2: replace the diagonal of a quadrilateral.
    Flip,
    /// 1 → 0: absorb a triangle into the border or a hole.
    MergeIntoBoundary,
    /// 0 → 1: close a convex corner of a hole with a new triangle.
    FillNotch,
}

impl std::fmt::Display for TopologicalOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SplitTriangle => write!(f, "split-triangle"),
            Self::SplitEdge => write!(f, "split-edge"),
            Self::Flip => write!(f, "flip"),
            Self::MergeIntoBoundary => write!(f, "merge-into-boundary"),
            Self::FillNotch => write!(f, "fill-notch"),
        }
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// Outcome of [`Mesh::split_triangle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriangleSplit {
    /// The new vertex.
    pub vertex: VertexKey,
    /// The three faces; the first reuses the split face.
    pub faces: [FaceKey; 3],
    /// Edges opposite the new vertex, one per new face.
    pub outer_edges: [HalfEdgeKey; 3],
}

/// Outcome of [`Mesh::split_edge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSplit {
    /// The new vertex.
    pub vertex: VertexKey,
    /// A half-edge ending at the new vertex.
    pub edge_into_vertex: HalfEdgeKey,
    /// Each split interior face with the two faces that replace it (the first reuses it).
    pub splits: SmallBuffer<(FaceKey, [FaceKey; 2]), 2>,
    /// Edges opposite the new vertex in the new faces.
    pub outer_edges: SmallBuffer<HalfEdgeKey, 4>,
}

/// Outcome of [`Mesh::flip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeFlip {
    /// The two faces, reused in place.
    pub faces: [FaceKey; 2],
    /// The far edges of the quadrilateral, opposite the apex of the flipped edge's face.
    pub far_edges: [HalfEdgeKey; 2],
}

/// Outcome of [`Mesh::merge_into_boundary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryMerge {
    /// Vertices destroyed because no edge reaches them anymore.
    pub removed_vertices: VertexKeyBuffer,
    /// Number of undirected edges removed.
    pub removed_edges: usize,
}

/// Outcome of [`Mesh::fill_boundary_notch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotchFill {
    /// The new interior triangle.
    pub face: FaceKey,
    /// The closing edge, inside the new triangle.
    pub edge: HalfEdgeKey,
}

// =============================================================================
// OPERATIONS
// =============================================================================

impl<T> Mesh<T>
where
    T: CoordinateScalar,
{
    /// Builds the two-triangle square `bound` with the `(min,min)–(max,max)` diagonal.
    ///
    /// The mesh must not contain any vertex yet.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidOperation`] if the mesh is not empty.
    pub fn create_square(&mut self, bound: &BoundingBox<T>) -> Result<SquareHandles, MeshError> {
        if self.number_of_vertices() != 0 {
            return Err(MeshError::InvalidOperation {
                message: "create_square requires an empty mesh".to_string(),
            });
        }
        let (min, max) = (bound.min, bound.max);
        let c0 = self.create_vertex(min);
        let c1 = self.create_vertex(Point::new([max.x(), min.y()]));
        let c2 = self.create_vertex(max);
        let c3 = self.create_vertex(Point::new([min.x(), max.y()]));

        let fa = self.create_face();
        let fb = self.create_face();
        let border = self.border;

        let a0 = self.create_edge(c1, fa);
        let a1 = self.create_edge(c2, fa);
        let a2 = self.create_edge(c0, fa);
        let b0 = self.create_edge(c2, fb);
        let b1 = self.create_edge(c3, fb);
        let b2 = self.create_edge(c0, fb);
        let r0 = self.create_edge(c0, border);
        let r1 = self.create_edge(c1, border);
        let r2 = self.create_edge(c2, border);
        let r3 = self.create_edge(c3, border);

        for (x, y, z) in [(a0, a1, a2), (b0, b1, b2)] {
            self.set_next(x, y)?;
            self.set_next(y, z)?;
            self.set_next(z, x)?;
        }
        self.set_next(r3, r2)?;
        self.set_next(r2, r1)?;
        self.set_next(r1, r0)?;
        self.set_next(r0, r3)?;

        self.set_twin(a2, b0)?;
        self.set_twin(a0, r0)?;
        self.set_twin(a1, r1)?;
        self.set_twin(b1, r2)?;
        self.set_twin(b2, r3)?;

        self.set_edge_of_face(fa, a0)?;
        self.set_edge_of_face(fb, b0)?;
        self.set_edge_of_face(border, r0)?;

        self.set_edge_of_vertex(c0, a2)?;
        self.set_edge_of_vertex(c1, a0)?;
        self.set_edge_of_vertex(c2, a1)?;
        self.set_edge_of_vertex(c3, b1)?;

        Ok(SquareHandles {
            corners: [c0, c1, c2, c3],
            faces: [fa, fb],
            diagonal: [a2, b0],
        })
    }

    /// Inserts a vertex at `p` inside the triangle `f`, replacing it by three triangles.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is not a live interior triangle.
    pub fn split_triangle(&mut self, f: FaceKey, p: Point<T>) -> Result<TriangleSplit, MeshError> {
        self.require_interior(f)?;
        let edges = self.face_edges(f)?;
        if edges.len() != 3 {
            return Err(MeshError::NotATriangle {
                face: f,
                edges: edges.len(),
            });
        }
        let outer = [edges[0], edges[1], edges[2]];
        let ends = [
            self.vertex(outer[0])?,
            self.vertex(outer[1])?,
            self.vertex(outer[2])?,
        ];

        let v = self.create_vertex(p);
        let faces = [f, self.create_face(), self.create_face()];
        let mut into_v = [outer[0]; 3];
        let mut out_of_v = [outer[0]; 3];
        for i in 0..3 {
            let start = ends[(i + 2) % 3];
            into_v[i] = self.create_edge(v, faces[i]);
            out_of_v[i] = self.create_edge(start, faces[i]);
        }
        for i in 0..3 {
            self.set_face(outer[i], faces[i])?;
            self.set_next(outer[i], into_v[i])?;
            self.set_next(into_v[i], out_of_v[i])?;
            self.set_next(out_of_v[i], outer[i])?;
            self.set_twin(into_v[i], out_of_v[(i + 1) % 3])?;
            self.set_edge_of_face(faces[i], outer[i])?;
        }
        self.set_edge_of_vertex(v, into_v[0])?;

        Ok(TriangleSplit {
            vertex: v,
            faces,
            outer_edges: outer,
        })
    }

    /// Inserts a vertex at `p` on the edge `e`.
    ///
    /// Both adjacent triangles are split in two; if one side is the border or a hole
    /// only the interior side is split and the boundary cycle gains one half-edge.
    ///
    /// # Errors
    ///
    /// Returns an error if neither side of `e` is an interior triangle.
    pub fn split_edge(&mut self, e: HalfEdgeKey, p: Point<T>) -> Result<EdgeSplit, MeshError> {
        let e = if self.is_boundary(e)? { self.twin(e)? } else { e };
        if self.is_boundary(e)? {
            return Err(MeshError::InvalidOperation {
                message: format!("edge {e:?} has no interior side to split"),
            });
        }
        let t = self.twin(e)?;
        let f1 = self.face(e)?;
        let f2 = self.face(t)?;
        let e1 = self.next(e)?;
        let e2 = self.next(e1)?;
        let a = self.vertex(t)?;
        let b = self.vertex(e)?;
        let c = self.vertex(e1)?;
        let t_interior = !self.is_face_boundary(f2)?;

        let v = self.create_vertex(p);
        let f3 = self.create_face();

        // Interior side: (a, v, c) reuses f1, (v, b, c) is new.
        let g = self.create_edge(b, f3);
        let cv = self.create_edge(v, f3);
        let vc = self.create_edge(c, f1);
        self.set_vertex(e, v)?;
        self.set_face(e1, f3)?;
        self.set_next(e, vc)?;
        self.set_next(vc, e2)?;
        self.set_next(e2, e)?;
        self.set_next(g, e1)?;
        self.set_next(e1, cv)?;
        self.set_next(cv, g)?;
        self.set_twin(cv, vc)?;
        self.set_edge_of_face(f1, e)?;
        self.set_edge_of_face(f3, g)?;

        let mut splits = SmallBuffer::new();
        splits.push((f1, [f1, f3]));
        let mut outer_edges = SmallBuffer::new();
        outer_edges.push(e2);
        outer_edges.push(e1);

        let h;
        if t_interior {
            let t1 = self.next(t)?;
            let t2 = self.next(t1)?;
            let d = self.vertex(t1)?;
            let f4 = self.create_face();
            h = self.create_edge(a, f4);
            let dv = self.create_edge(v, f4);
            let vd = self.create_edge(d, f2);
            self.set_vertex(t, v)?;
            self.set_face(t1, f4)?;
            self.set_next(t, vd)?;
            self.set_next(vd, t2)?;
            self.set_next(t2, t)?;
            self.set_next(h, t1)?;
            self.set_next(t1, dv)?;
            self.set_next(dv, h)?;
            self.set_twin(dv, vd)?;
            self.set_edge_of_face(f2, t)?;
            self.set_edge_of_face(f4, h)?;
            splits.push((f2, [f2, f4]));
            outer_edges.push(t2);
            outer_edges.push(t1);
        } else {
            h = self.create_edge(a, f2);
            let after = self.next(t)?;
            self.set_vertex(t, v)?;
            self.set_next(t, h)?;
            self.set_next(h, after)?;
        }

        self.set_twin(e, h)?;
        self.set_twin(t, g)?;
        self.set_edge_of_vertex(v, e)?;
        self.set_edge_of_vertex(b, g)?;
        self.set_edge_of_vertex(a, h)?;

        Ok(EdgeSplit {
            vertex: v,
            edge_into_vertex: e,
            splits,
            outer_edges,
        })
    }

    /// Flips the diagonal `e` of the quadrilateral formed by its two triangles.
    ///
    /// With `e: a → b`, `next(e)` ending at `c` and `next(twin(e))` ending at `d`, the
    /// half-edge `e` becomes `d → c` and its twin `c → d`. Faces are reused in place.
    ///
    /// # Errors
    ///
    /// Returns an error if either side of `e` is not an interior triangle.
    pub fn flip(&mut self, e: HalfEdgeKey) -> Result<EdgeFlip, MeshError> {
        let t = self.twin(e)?;
        let f1 = self.face(e)?;
        let f2 = self.face(t)?;
        self.require_interior(f1)?;
        self.require_interior(f2)?;

        let e1 = self.next(e)?;
        let e2 = self.next(e1)?;
        let t1 = self.next(t)?;
        let t2 = self.next(t1)?;
        let a = self.vertex(t)?;
        let b = self.vertex(e)?;
        let c = self.vertex(e1)?;
        let d = self.vertex(t1)?;

        self.set_vertex(e, c)?;
        self.set_vertex(t, d)?;
        self.set_next(e, e2)?;
        self.set_next(e2, t1)?;
        self.set_next(t1, e)?;
        self.set_next(t, t2)?;
        self.set_next(t2, e1)?;
        self.set_next(e1, t)?;
        self.set_face(t1, f1)?;
        self.set_face(e1, f2)?;
        self.set_edge_of_face(f1, e)?;
        self.set_edge_of_face(f2, t)?;
        self.set_edge_of_vertex(a, e2)?;
        self.set_edge_of_vertex(b, t2)?;

        Ok(EdgeFlip {
            faces: [f1, f2],
            far_edges: [t1, t2],
        })
    }

    /// Absorbs the interior face `f` into the adjacent boundary face `boundary`.
    ///
    /// Every edge shared by `f` and `boundary` is deleted, the remaining edges of `f`
    /// join the boundary cycle, and vertices left without edges are destroyed.
    ///
    /// # Errors
    ///
    /// Returns an error if `f` is not interior, `boundary` is not a border or hole
    /// face, or the two faces share no edge.
    pub fn merge_into_boundary(
        &mut self,
        f: FaceKey,
        boundary: FaceKey,
    ) -> Result<BoundaryMerge, MeshError> {
        self.require_interior(f)?;
        if !self.is_face_boundary(boundary)? {
            return Err(MeshError::InvalidOperation {
                message: format!("{boundary:?} is not a border or hole face"),
            });
        }

        let edges = self.face_edges(f)?;
        let mut deleted: FastHashSet<HalfEdgeKey> = FastHashSet::default();
        for &x in &edges {
            let twin = self.twin(x)?;
            if self.face(twin)? == boundary {
                deleted.insert(x);
                deleted.insert(twin);
            }
        }
        if deleted.is_empty() {
            return Err(MeshError::InvalidOperation {
                message: format!("{f:?} shares no edge with {boundary:?}"),
            });
        }

        // Everything below is computed on the unmodified mesh.
        let mut relinks: Vec<(HalfEdgeKey, HalfEdgeKey)> = Vec::with_capacity(deleted.len());
        for &d in &deleted {
            let p = self.prev(d)?;
            if deleted.contains(&p) {
                continue;
            }
            let mut z = d;
            let mut steps = 0;
            while deleted.contains(&z) {
                z = self.next(self.twin(z)?)?;
                steps += 1;
                if steps > deleted.len() + 1 {
                    return Err(MeshError::BrokenCycle {
                        face: boundary,
                        steps,
                    });
                }
            }
            relinks.push((p, z));
        }

        let mut affected: VertexKeyBuffer = VertexKeyBuffer::new();
        for &d in &deleted {
            let v = self.vertex(d)?;
            if !affected.contains(&v) {
                affected.push(v);
            }
        }
        let mut incoming: SmallBuffer<(VertexKey, Option<HalfEdgeKey>), 4> = SmallBuffer::new();
        for &v in &affected {
            let keep = self
                .vertex_in_edges(v)?
                .into_iter()
                .find(|e| !deleted.contains(e));
            incoming.push((v, keep));
        }
        let survivors: HalfEdgeKeyBuffer = edges
            .iter()
            .copied()
            .filter(|x| !deleted.contains(x))
            .collect();
        let boundary_edge = self.edge_of_face(boundary)?;

        for (p, z) in relinks.iter().copied() {
            self.set_next(p, z)?;
        }
        for &x in &survivors {
            self.set_face(x, boundary)?;
        }
        let mut removed_vertices = VertexKeyBuffer::new();
        for (v, keep) in incoming {
            match keep {
                Some(e) => self.set_edge_of_vertex(v, e)?,
                None => {
                    self.destroy_vertex(v)?;
                    removed_vertices.push(v);
                }
            }
        }
        if deleted.contains(&boundary_edge) {
            match relinks.first() {
                Some(&(p, _)) => self.set_edge_of_face(boundary, p)?,
                None => self.face_mut(boundary)?.edge = None,
            }
        }
        for &d in &deleted {
            self.destroy_half_edge(d)?;
        }
        self.destroy_face(f)?;

        Ok(BoundaryMerge {
            removed_vertices,
            removed_edges: deleted.len() / 2,
        })
    }

    /// Closes the corner `x → next(x)` of a hole or the border with a new interior triangle.
    ///
    /// With `x: u → v` and `y = next(x): v → w`, the triangle `(u, v, w)` is created from
    /// `x`, `y` and a new edge `w → u`; the boundary cycle continues along `u → w`. The
    /// caller is responsible for checking that the corner is convex and empty.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` is not on a boundary face or the cycle is a triangle.
    pub fn fill_boundary_notch(&mut self, x: HalfEdgeKey) -> Result<NotchFill, MeshError> {
        let hole = self.face(x)?;
        if self.face_kind(hole)? == FaceKind::Interior {
            return Err(MeshError::InvalidOperation {
                message: format!("{x:?} is not on a boundary face"),
            });
        }
        let cycle = self.face_edges(hole)?;
        if cycle.len() <= 3 {
            return Err(MeshError::InvalidOperation {
                message: format!("boundary {hole:?} is a triangle; convert it instead"),
            });
        }
        let y = self.next(x)?;
        let before = self.prev(x)?;
        let after = self.next(y)?;
        let u = self.start_vertex(x)?;
        let w = self.vertex(y)?;
        if u == w {
            return Err(MeshError::InvalidOperation {
                message: format!("corner at {x:?} is a spike"),
            });
        }

        let triangle = self.create_face();
        let z = self.create_edge(u, triangle);
        let zt = self.create_edge(w, hole);
        self.set_twin(z, zt)?;
        self.set_face(x, triangle)?;
        self.set_face(y, triangle)?;
        self.set_next(x, y)?;
        self.set_next(y, z)?;
        self.set_next(z, x)?;
        self.set_next(before, zt)?;
        self.set_next(zt, after)?;
        self.set_edge_of_face(triangle, x)?;
        let hole_edge = self.edge_of_face(hole)?;
        if hole_edge == x || hole_edge == y {
            self.set_edge_of_face(hole, zt)?;
        }

        Ok(NotchFill { face: triangle, edge: z })
    }

    fn require_interior(&self, f: FaceKey) -> Result<(), MeshError> {
        if self.face_kind(f)? == FaceKind::Interior {
            Ok(())
        } else {
            Err(MeshError::InvalidOperation {
                message: format!("{f:?} is not an interior face"),
            })
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::predicates::{Orientation, orientation};

    fn unit_square() -> (Mesh<f64>, SquareHandles) {
        let mut mesh = Mesh::new();
        let handles = mesh
            .create_square(&BoundingBox::from_bounds([0.0, 0.0], [1.0, 1.0]))
            .unwrap();
        (mesh, handles)
    }

    fn assert_valid(mesh: &Mesh<f64>) {
        for e in mesh.half_edges() {
            let twin = mesh.twin(e).unwrap();
            assert_eq!(mesh.twin(twin).unwrap(), e, "twin symmetry of {e:?}");
            assert_eq!(mesh.next(mesh.prev(e).unwrap()).unwrap(), e);
            assert_eq!(mesh.prev(mesh.next(e).unwrap()).unwrap(), e);
            assert_eq!(mesh.vertex(twin).unwrap(), mesh.start_vertex(e).unwrap());
            assert!(mesh.is_alive(mesh.face(e).unwrap()));
        }
        for f in mesh.all_faces() {
            for e in mesh.face_edges(f).unwrap() {
                assert_eq!(mesh.face(e).unwrap(), f);
            }
        }
        for f in mesh.faces() {
            assert_eq!(mesh.face_edges(f).unwrap().len(), 3);
            let t = mesh.to_triangle(f).unwrap();
            assert_eq!(
                orientation(&t.points[0], &t.points[1], &t.points[2]),
                Orientation::POSITIVE
            );
        }
        for v in mesh.vertices() {
            let e = mesh.edge_of_vertex(v).unwrap();
            assert_eq!(mesh.vertex(e).unwrap(), v);
        }
    }

    #[test]
    fn test_split_triangle() {
        let (mut mesh, handles) = unit_square();
        let split = mesh
            .split_triangle(handles.faces[0], Point::new([0.7, 0.2]))
            .unwrap();
        assert_valid(&mesh);
        assert_eq!(mesh.number_of_faces(), 4);
        assert_eq!(mesh.number_of_vertices(), 5);
        assert_eq!(mesh.vertex_in_edges(split.vertex).unwrap().len(), 3);
        assert_eq!(split.faces[0], handles.faces[0]);
        for (f, e) in split.faces.iter().zip(split.outer_edges) {
            assert_eq!(mesh.face(e).unwrap(), *f);
            assert_eq!(mesh.vertex(mesh.next(e).unwrap()).unwrap(), split.vertex);
        }
    }

    #[test]
    fn test_split_interior_edge() {
        let (mut mesh, handles) = unit_square();
        let split = mesh
            .split_edge(handles.diagonal[0], Point::new([0.5, 0.5]))
            .unwrap();
        assert_valid(&mesh);
        assert_eq!(mesh.number_of_faces(), 4);
        assert_eq!(split.splits.len(), 2);
        assert_eq!(split.outer_edges.len(), 4);
        assert_eq!(mesh.vertex(split.edge_into_vertex).unwrap(), split.vertex);
        assert_eq!(mesh.vertex_in_edges(split.vertex).unwrap().len(), 4);
    }

    #[test]
    fn test_split_border_edge() {
        let (mut mesh, _) = unit_square();
        let border_edge = mesh.edge_of_face(mesh.border()).unwrap();
        let mid = mesh.midpoint(border_edge).unwrap();
        let split = mesh.split_edge(border_edge, mid).unwrap();
        assert_valid(&mesh);
        assert_eq!(mesh.number_of_faces(), 3);
        assert_eq!(split.splits.len(), 1);
        assert_eq!(mesh.face_edges(mesh.border()).unwrap().len(), 5);
        assert!(
            mesh.vertex_faces(split.vertex)
                .unwrap()
                .contains(&mesh.border())
        );
    }

    #[test]
    fn test_flip_diagonal() {
        let (mut mesh, handles) = unit_square();
        let [d, _] = handles.diagonal;
        let flip = mesh.flip(d).unwrap();
        assert_valid(&mesh);
        let line = mesh.to_line(d).unwrap();
        // The diagonal now connects (0,1) and (1,0).
        assert!((line.from.x() - line.to.x()).abs() > 0.9);
        assert!((line.from.y() - line.to.y()).abs() > 0.9);
        assert_eq!(flip.faces, handles.faces);
        // Flipping back restores a diagonal through (0,0) and (1,1).
        mesh.flip(d).unwrap();
        assert_valid(&mesh);
        let line = mesh.to_line(d).unwrap();
        assert!((line.from.x() - line.from.y()).abs() < 1e-12);
    }

    #[test]
    fn test_flip_rejects_boundary_edge() {
        let (mut mesh, _) = unit_square();
        let border_edge = mesh.edge_of_face(mesh.border()).unwrap();
        assert!(matches!(
            mesh.flip(border_edge),
            Err(MeshError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_merge_into_border() {
        let (mut mesh, handles) = unit_square();
        let merge = mesh
            .merge_into_boundary(handles.faces[0], mesh.border())
            .unwrap();
        assert_valid(&mesh);
        assert_eq!(mesh.number_of_faces(), 1);
        assert_eq!(merge.removed_edges, 2);
        assert_eq!(merge.removed_vertices.as_slice(), &[handles.corners[1]]);
        assert_eq!(mesh.number_of_vertices(), 3);
        assert_eq!(mesh.face_edges(mesh.border()).unwrap().len(), 3);
    }

    #[test]
    fn test_merge_requires_adjacency() {
        let (mut mesh, handles) = unit_square();
        let split = mesh
            .split_triangle(handles.faces[0], Point::new([0.7, 0.2]))
            .unwrap();
        // The face opposite the diagonal has no border edge.
        let inner = split
            .faces
            .into_iter()
            .find(|&f| {
                mesh.face_edges(f)
                    .unwrap()
                    .iter()
                    .all(|&e| !mesh.is_at_boundary(e).unwrap())
            })
            .unwrap();
        assert!(mesh.merge_into_boundary(inner, mesh.border()).is_err());
    }

    #[test]
    fn test_fill_notch_after_hole() {
        let (mut mesh, handles) = unit_square();
        let split = mesh
            .split_triangle(handles.faces[0], Point::new([0.6, 0.3]))
            .unwrap();
        // Make a hole out of the face along the bottom edge, then grow it.
        let bottom = split.faces[0];
        mesh.set_face_kind(bottom, FaceKind::Hole).unwrap();
        let neighbour = split.faces[1];
        mesh.merge_into_boundary(neighbour, bottom).unwrap();
        assert_valid(&mesh);
        let cycle = mesh.face_edges(bottom).unwrap();
        assert_eq!(cycle.len(), 4);

        // The corner at (1,1) is convex and empty.
        let x = cycle
            .iter()
            .copied()
            .find(|&x| mesh.start_vertex(x).unwrap() == handles.corners[1])
            .unwrap();
        let y = mesh.next(x).unwrap();
        let u = *mesh.point(handles.corners[1]).unwrap();
        let v = *mesh.point(mesh.vertex(x).unwrap()).unwrap();
        let w = *mesh.point(mesh.vertex(y).unwrap()).unwrap();
        assert_eq!(orientation(&u, &v, &w), Orientation::POSITIVE);
        let fill = mesh.fill_boundary_notch(x).unwrap();
        assert_valid(&mesh);
        assert!(mesh.is_interior(fill.face));
        assert_eq!(mesh.face_edges(bottom).unwrap().len(), 3);
        assert!(mesh.fill_boundary_notch(mesh.edge_of_face(bottom).unwrap()).is_err());
        // Interior edges have no corner to fill.
        assert!(mesh.fill_boundary_notch(fill.edge).is_err());
    }
}
