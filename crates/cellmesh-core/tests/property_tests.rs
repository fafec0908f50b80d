//! # Property-Based Tests
//!
//! Invariants of both mesh structures checked over generated inputs:
//! halfedge consistency, identifier monotonicity, edge key symmetry and
//! document round trips.

use cellmesh_core::{
    Attributes, CellId, EdgeKey, EntityKind, FaceId, HalfedgeMesh, HalffaceVolMesh, VertexId,
    mesh_from_json, mesh_to_json, volmesh_from_json, volmesh_to_json,
};
use proptest::collection::vec;
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;

// =============================================================================
// BUILDERS
// =============================================================================

/// A `w` x `h` grid of quads with counter-clockwise cycles.
fn grid(w: u64, h: u64) -> HalfedgeMesh {
    let mut mesh = HalfedgeMesh::new();
    for j in 0..=h {
        for i in 0..=w {
            let mut attrs = Attributes::new();
            attrs.insert("x".into(), json!(i));
            attrs.insert("y".into(), json!(j));
            mesh.insert_vertex(attrs).expect("vertex");
        }
    }
    let row = w + 1;
    for j in 0..h {
        for i in 0..w {
            let a = i + j * row;
            let cycle = [a, a + 1, a + 1 + row, a + row].map(VertexId);
            mesh.insert_face(&cycle).expect("grid face");
        }
    }
    mesh
}

/// `n` disjoint tetrahedra.
fn tetrahedra(n: u64) -> HalffaceVolMesh {
    let mut mesh = HalffaceVolMesh::new();
    for k in 0..n {
        for _ in 0..4 {
            mesh.insert_vertex(Attributes::new()).expect("vertex");
        }
        let base = 4 * k;
        let faces: Vec<Vec<VertexId>> = [[0, 1, 2], [0, 2, 3], [0, 3, 1], [1, 3, 2]]
            .iter()
            .map(|f| f.iter().map(|&i| VertexId(base + i)).collect())
            .collect();
        mesh.insert_cell(&faces).expect("tetrahedron");
    }
    mesh
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Grid counts follow V = (w+1)(h+1), F = wh, E = w(h+1) + h(w+1).
    #[test]
    fn grid_counts(w in 1u64..6, h in 1u64..6) {
        let mesh = grid(w, h);
        prop_assert_eq!(mesh.vertex_count() as u64, (w + 1) * (h + 1));
        prop_assert_eq!(mesh.face_count() as u64, w * h);
        prop_assert_eq!(mesh.edge_count() as u64, w * (h + 1) + h * (w + 1));
    }

    /// Every directed edge of every face cycle names that face, and its
    /// reverse is present in the halfedge map.
    #[test]
    fn halfedges_agree_with_face_cycles(w in 1u64..5, h in 1u64..5, deleted in vec(0u64..16, 0..6)) {
        let mut mesh = grid(w, h);
        for f in deleted {
            let _ = mesh.delete_face(FaceId(f));
        }
        for face in mesh.faces().collect::<Vec<_>>() {
            for (u, v) in mesh.face_halfedges(face).expect("halfedges") {
                prop_assert_eq!(mesh.halfedge_face(u, v), Some(face));
                prop_assert!(mesh.has_edge(v, u));
            }
        }
        for (u, v) in mesh.edges() {
            prop_assert!(mesh.halfedge_face(u, v).is_some() || mesh.halfedge_face(v, u).is_some());
        }
    }

    /// On an intact grid the ring of every vertex visits all its neighbors,
    /// and the neighbor list names each of them once.
    #[test]
    fn vertex_ring_covers_neighbors(w in 1u64..5, h in 1u64..5) {
        let mesh = grid(w, h);
        for vertex in mesh.vertices() {
            let ring: BTreeSet<VertexId> =
                mesh.vertex_ring(vertex).expect("ring").into_iter().collect();
            let listed = mesh.vertex_neighbors(vertex).expect("nbrs");
            let nbrs: BTreeSet<VertexId> = listed.iter().copied().collect();
            prop_assert_eq!(listed.len(), nbrs.len());
            prop_assert_eq!(ring, nbrs);
        }
    }

    /// Identifiers only grow, even when the newest entity is deleted.
    #[test]
    fn vertex_ids_are_never_reused(ops in vec(any::<bool>(), 1..60)) {
        let mut mesh = HalfedgeMesh::new();
        let mut issued = BTreeSet::new();
        let mut last: Option<VertexId> = None;
        for insert in ops {
            if insert || last.is_none() {
                let id = mesh.insert_vertex(Attributes::new()).expect("vertex");
                prop_assert!(issued.insert(id));
                prop_assert!(last.is_none_or(|prev| id > prev));
                last = Some(id);
            } else if let Some(id) = last {
                let _ = mesh.delete_vertex(id);
            }
        }
        let max = mesh.ids().peek_max(EntityKind::Vertex);
        prop_assert_eq!(max, issued.len() as i64 - 1);
    }

    /// An edge key reads the same in either direction and writes min-max.
    #[test]
    fn edge_key_symmetry(u in 0u64..100_000, v in 0u64..100_000) {
        prop_assume!(u != v);
        let forward: EdgeKey = format!("{}-{}", u, v).parse().expect("parse");
        let backward: EdgeKey = format!("{}-{}", v, u).parse().expect("parse");
        prop_assert_eq!(forward, backward);
        prop_assert_eq!(forward.to_string(), format!("{}-{}", u.min(v), u.max(v)));
    }

    /// Writing then reading a mesh yields an equal mesh with the same
    /// adjacency and the same identifier marks.
    #[test]
    fn mesh_document_round_trip(w in 1u64..4, h in 1u64..4, deleted in vec(0u64..9, 0..4)) {
        let mut mesh = grid(w, h);
        for f in deleted {
            let _ = mesh.delete_face(FaceId(f));
        }
        let _ = mesh.set_edge_attribute(VertexId(1), VertexId(0), "seam", json!(true));
        let text = mesh_to_json(&mesh, false).expect("serialize");
        let restored = mesh_from_json(&text).expect("parse");

        prop_assert_eq!(&restored, &mesh);
        prop_assert_eq!(restored.edges().collect::<Vec<_>>(), mesh.edges().collect::<Vec<_>>());
        for (u, v) in mesh.edges() {
            prop_assert_eq!(restored.halfedge_face(u, v), mesh.halfedge_face(u, v));
            prop_assert_eq!(restored.halfedge_face(v, u), mesh.halfedge_face(v, u));
        }
        prop_assert_eq!(mesh_to_json(&restored, false).expect("serialize"), text);
    }

    /// Volmesh round trip keeps cells, planes and the face id mark.
    #[test]
    fn volmesh_document_round_trip(n in 1u64..5, deleted in vec(0u64..5, 0..3)) {
        let mut mesh = tetrahedra(n);
        for c in deleted {
            let _ = mesh.delete_cell(CellId(c));
        }
        let text = volmesh_to_json(&mesh, false).expect("serialize");
        let restored = volmesh_from_json(&text).expect("parse");

        prop_assert_eq!(&restored, &mesh);
        prop_assert_eq!(restored.ids().peek_max(EntityKind::Face), 4 * n as i64 - 1);
        for cell in mesh.cells() {
            let original: Vec<_> = mesh.cell(cell).expect("cell").plane().collect();
            let reread: Vec<_> = restored.cell(cell).expect("cell").plane().collect();
            prop_assert_eq!(original, reread);
        }
    }

    /// Every directed edge of a cell has exactly one owning half-face, and
    /// that half-face contains the edge.
    #[test]
    fn cell_plane_is_consistent(n in 1u64..4) {
        let mesh = tetrahedra(n);
        for cell in mesh.cells() {
            let planes: Vec<_> = mesh.cell(cell).expect("cell").plane().collect();
            prop_assert_eq!(planes.len(), 12);
            for (u, v, face) in planes {
                let i = face.iter().position(|&x| x == u).expect("u in face");
                prop_assert_eq!(face[(i + 1) % face.len()], v);
                prop_assert!(mesh.cell_face(cell, v, u).is_some());
            }
        }
    }
}
