//! # Halfedge Mesh
//!
//! Polygonal surface mesh: vertices plus faces stored as oriented vertex
//! cycles. Edge adjacency is derived from the face cycles into a halfedge
//! map `u -> v -> face`, where `face` is the face to the left of the
//! directed edge `u -> v`, or `None` on the boundary.
//!
//! All cross references are integer identifiers. Deleting a vertex deletes
//! every face that uses it; deleting a face never deletes vertices.

use crate::attributes::{AttributeStore, check_vertex_record, check_vertex_value};
use crate::ids::IdAllocator;
use crate::keys::{EdgeKey, check_edge_endpoints};
use crate::loops::{self, directed_edges};
use crate::{Attributes, EntityKind, FaceId, MeshError, VertexId};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};

/// Directed adjacency: `u -> v -> face left of u->v`.
type HalfedgeMap = BTreeMap<VertexId, BTreeMap<VertexId, Option<FaceId>>>;

/// A halfedge surface mesh.
#[derive(Debug, Clone)]
pub struct HalfedgeMesh {
    /// Mesh-level metadata (`name`, free-form keys).
    attributes: Attributes,

    /// Vertex records. Every live vertex has a record, possibly empty.
    vertex: AttributeStore<VertexId>,

    /// Face cycles in stored order.
    face: BTreeMap<FaceId, Vec<VertexId>>,

    /// Face attribute overrides. Every live face has a record.
    facedata: AttributeStore<FaceId>,

    /// Edge attribute overrides, keyed direction-independently.
    edgedata: AttributeStore<EdgeKey>,

    /// Derived: directed halfedges.
    halfedge: HalfedgeMap,

    /// Derived: vertex -> incident faces.
    incidence: BTreeMap<VertexId, BTreeSet<FaceId>>,

    ids: IdAllocator,
}

impl Default for HalfedgeMesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Two meshes are equal when their stored state is equal; the derived
/// adjacency indexes are not compared.
impl PartialEq for HalfedgeMesh {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
            && self.vertex == other.vertex
            && self.face == other.face
            && self.facedata == other.facedata
            && self.edgedata == other.edgedata
            && self.ids == other.ids
    }
}

impl HalfedgeMesh {
    /// Create an empty mesh. Vertices default to `x = y = z = 0.0`.
    #[must_use]
    pub fn new() -> Self {
        let mut vertex = AttributeStore::new();
        for axis in ["x", "y", "z"] {
            vertex.set_default(axis, json!(0.0));
        }
        Self::with_defaults(
            Attributes::new(),
            vertex,
            AttributeStore::new(),
            AttributeStore::new(),
        )
    }

    pub(crate) fn with_defaults(
        attributes: Attributes,
        vertex: AttributeStore<VertexId>,
        facedata: AttributeStore<FaceId>,
        edgedata: AttributeStore<EdgeKey>,
    ) -> Self {
        Self {
            attributes,
            vertex,
            face: BTreeMap::new(),
            facedata,
            edgedata,
            halfedge: BTreeMap::new(),
            incidence: BTreeMap::new(),
            ids: IdAllocator::new(),
        }
    }

    // =========================================================================
    // MESH-LEVEL STATE
    // =========================================================================

    /// Mesh-level metadata.
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Mutable mesh-level metadata.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// High-water marks of issued identifiers.
    #[must_use]
    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    pub(crate) fn ids_mut(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    /// Vertex attribute storage (defaults and per-vertex records).
    #[must_use]
    pub fn vertex_store(&self) -> &AttributeStore<VertexId> {
        &self.vertex
    }

    /// Face attribute storage.
    #[must_use]
    pub fn face_store(&self) -> &AttributeStore<FaceId> {
        &self.facedata
    }

    /// Edge attribute storage.
    #[must_use]
    pub fn edge_store(&self) -> &AttributeStore<EdgeKey> {
        &self.edgedata
    }

    // =========================================================================
    // VERTICES
    // =========================================================================

    /// Add a vertex. `attrs` becomes its override record; coordinates in
    /// it must be numeric.
    pub fn insert_vertex(&mut self, attrs: Attributes) -> Result<VertexId, MeshError> {
        check_vertex_record(&attrs)?;
        let id = self.ids.next_vertex()?;
        self.place_vertex(id, attrs);
        Ok(id)
    }

    pub(crate) fn place_vertex(&mut self, id: VertexId, attrs: Attributes) {
        self.ids.observe(EntityKind::Vertex, id.0);
        self.vertex.insert_record(id, attrs);
        self.halfedge.entry(id).or_default();
        self.incidence.entry(id).or_default();
    }

    /// Delete a vertex, every face that uses it, and every edge record
    /// that names it.
    pub fn delete_vertex(&mut self, id: VertexId) -> Result<(), MeshError> {
        if !self.has_vertex(id) {
            return Err(MeshError::vertex_not_found(id));
        }

        let faces: Vec<FaceId> = self
            .incidence
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        for face in &faces {
            self.delete_face(*face)?;
        }

        if let Some(nbrs) = self.halfedge.remove(&id) {
            for nbr in nbrs.keys() {
                if let Some(back) = self.halfedge.get_mut(nbr) {
                    back.remove(&id);
                }
            }
        }
        self.incidence.remove(&id);
        self.vertex.remove(&id);
        self.edgedata.retain(|key| !key.contains(id));

        tracing::debug!(vertex = id.0, faces = faces.len(), "deleted vertex");
        Ok(())
    }

    /// Whether the vertex exists.
    #[must_use]
    pub fn has_vertex(&self, id: VertexId) -> bool {
        self.vertex.contains(&id)
    }

    /// Live vertices in identifier order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertex.iter().map(|(id, _)| *id)
    }

    /// Number of live vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex.len()
    }

    /// Vertices sharing an edge with `id`, in face-traversal order.
    ///
    /// Incident faces are visited in identifier order; each contributes the
    /// vertex after `id` in its cycle, then the vertex before it.
    pub fn vertex_neighbors(&self, id: VertexId) -> Result<Vec<VertexId>, MeshError> {
        let faces = self
            .incidence
            .get(&id)
            .ok_or(MeshError::vertex_not_found(id))?;

        let mut seen = BTreeSet::new();
        let mut nbrs = Vec::new();
        for cycle in faces.iter().filter_map(|face| self.face.get(face)) {
            let around = [loops::successor(cycle, id), loops::predecessor(cycle, id)];
            for nbr in around.into_iter().flatten() {
                if seen.insert(nbr) {
                    nbrs.push(nbr);
                }
            }
        }
        Ok(nbrs)
    }

    /// Neighbors of `id` in cyclic order around it.
    ///
    /// For a boundary vertex the walk starts at the neighbor reached through
    /// a boundary halfedge and stops at the other side of the boundary.
    pub fn vertex_ring(&self, id: VertexId) -> Result<Vec<VertexId>, MeshError> {
        let nbrs = self
            .halfedge
            .get(&id)
            .ok_or(MeshError::vertex_not_found(id))?;
        if nbrs.len() < 2 {
            return Ok(nbrs.keys().copied().collect());
        }

        let Some(start) = nbrs
            .iter()
            .find(|(_, face)| face.is_none())
            .or_else(|| nbrs.iter().next())
            .map(|(nbr, _)| *nbr)
        else {
            return Ok(Vec::new());
        };

        let mut ring = vec![start];
        let mut current = start;
        for _ in 0..nbrs.len() {
            let Some(face) = self.halfedge_face(current, id) else {
                break;
            };
            let Some(next) = self
                .face
                .get(&face)
                .and_then(|cycle| loops::successor(cycle, id))
            else {
                break;
            };
            if next == start || ring.contains(&next) {
                break;
            }
            ring.push(next);
            current = next;
        }
        Ok(ring)
    }

    /// Faces incident to `id`, in identifier order.
    pub fn vertex_faces(&self, id: VertexId) -> Result<Vec<FaceId>, MeshError> {
        self.incidence
            .get(&id)
            .map(|faces| faces.iter().copied().collect())
            .ok_or(MeshError::vertex_not_found(id))
    }

    /// Number of edges at `id`.
    pub fn vertex_degree(&self, id: VertexId) -> Result<usize, MeshError> {
        self.halfedge
            .get(&id)
            .map(BTreeMap::len)
            .ok_or(MeshError::vertex_not_found(id))
    }

    /// Whether `id` lies on an open boundary. Isolated vertices do not.
    pub fn is_vertex_on_boundary(&self, id: VertexId) -> Result<bool, MeshError> {
        let nbrs = self
            .halfedge
            .get(&id)
            .ok_or(MeshError::vertex_not_found(id))?;
        Ok(nbrs
            .iter()
            .any(|(nbr, face)| face.is_none() || self.halfedge_face(*nbr, id).is_none()))
    }

    // =========================================================================
    // FACES
    // =========================================================================

    /// Add a face from an oriented vertex cycle.
    pub fn insert_face(&mut self, vertices: &[VertexId]) -> Result<FaceId, MeshError> {
        loops::validate_loop(vertices, |v| self.has_vertex(v))?;
        let id = self.ids.next_face()?;
        self.place_face(id, vertices.to_vec());
        self.facedata.ensure(id);
        Ok(id)
    }

    pub(crate) fn place_face(&mut self, id: FaceId, cycle: Vec<VertexId>) {
        self.ids.observe(EntityKind::Face, id.0);
        for (u, v) in directed_edges(&cycle) {
            self.halfedge.entry(u).or_default().insert(v, Some(id));
            self.halfedge.entry(v).or_default().entry(u).or_insert(None);
        }
        for &vertex in &cycle {
            self.incidence.entry(vertex).or_default().insert(id);
        }
        self.face.insert(id, cycle);
    }

    /// Remove a face from the adjacency indexes and return its cycle.
    fn unplace_face(&mut self, id: FaceId) -> Option<Vec<VertexId>> {
        let cycle = self.face.remove(&id)?;
        for &vertex in &cycle {
            if let Some(faces) = self.incidence.get_mut(&vertex) {
                faces.remove(&id);
            }
        }
        for (u, v) in directed_edges(&cycle) {
            if self.halfedge_face(u, v) == Some(id) {
                // Another face may share this orientation on a non-manifold edge.
                let other = self.incidence.get(&u).and_then(|faces| {
                    faces.iter().copied().find(|f| {
                        self.face
                            .get(f)
                            .and_then(|c| loops::successor(c, u))
                            == Some(v)
                    })
                });
                if let Some(slot) = self.halfedge.get_mut(&u).and_then(|m| m.get_mut(&v)) {
                    *slot = other;
                }
            }
            if self.halfedge_face(u, v).is_none() && self.halfedge_face(v, u).is_none() {
                if let Some(m) = self.halfedge.get_mut(&u) {
                    m.remove(&v);
                }
                if let Some(m) = self.halfedge.get_mut(&v) {
                    m.remove(&u);
                }
            }
        }
        Some(cycle)
    }

    /// Delete a face and its attribute record. Vertices stay, even isolated.
    pub fn delete_face(&mut self, id: FaceId) -> Result<(), MeshError> {
        self.unplace_face(id).ok_or(MeshError::face_not_found(id))?;
        self.facedata.remove(&id);
        Ok(())
    }

    /// Whether the face exists.
    #[must_use]
    pub fn has_face(&self, id: FaceId) -> bool {
        self.face.contains_key(&id)
    }

    /// Live faces in identifier order.
    pub fn faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.face.keys().copied()
    }

    /// Number of live faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.face.len()
    }

    /// The stored cycle of a face, verbatim.
    pub fn face_vertices(&self, id: FaceId) -> Result<&[VertexId], MeshError> {
        self.face
            .get(&id)
            .map(Vec::as_slice)
            .ok_or(MeshError::face_not_found(id))
    }

    /// Directed halfedges of a face, in cycle order.
    pub fn face_halfedges(&self, id: FaceId) -> Result<Vec<(VertexId, VertexId)>, MeshError> {
        Ok(directed_edges(self.face_vertices(id)?).collect())
    }

    /// Faces across the edges of `id`, in cycle order, without repeats.
    pub fn face_neighbors(&self, id: FaceId) -> Result<Vec<FaceId>, MeshError> {
        let mut nbrs = Vec::new();
        for (u, v) in directed_edges(self.face_vertices(id)?) {
            if let Some(nbr) = self.halfedge_face(v, u) {
                if nbr != id && !nbrs.contains(&nbr) {
                    nbrs.push(nbr);
                }
            }
        }
        Ok(nbrs)
    }

    /// Replace `old` by `new` in the given faces, or in every face using
    /// `old` when `faces` is `None`. Faces keep their identifiers and
    /// attributes. Nothing changes if any rewritten cycle is invalid.
    pub fn substitute_vertex_in_faces(
        &mut self,
        old: VertexId,
        new: VertexId,
        faces: Option<&[FaceId]>,
    ) -> Result<Vec<FaceId>, MeshError> {
        if !self.has_vertex(old) {
            return Err(MeshError::vertex_not_found(old));
        }
        if !self.has_vertex(new) {
            return Err(MeshError::vertex_not_found(new));
        }
        let targets: Vec<FaceId> = match faces {
            Some(list) => list.to_vec(),
            None => self.vertex_faces(old)?,
        };

        let mut rewritten = Vec::with_capacity(targets.len());
        for &face in &targets {
            let cycle: Vec<VertexId> = self
                .face_vertices(face)?
                .iter()
                .map(|&v| if v == old { new } else { v })
                .collect();
            loops::validate_loop(&cycle, |v| self.has_vertex(v))?;
            rewritten.push((face, cycle));
        }

        for (face, cycle) in rewritten {
            self.unplace_face(face);
            self.place_face(face, cycle);
        }
        Ok(targets)
    }

    // =========================================================================
    // EDGES & HALFEDGES
    // =========================================================================

    /// Face to the left of the directed edge `u -> v`, if any.
    #[must_use]
    pub fn halfedge_face(&self, u: VertexId, v: VertexId) -> Option<FaceId> {
        self.halfedge.get(&u)?.get(&v).copied().flatten()
    }

    /// Whether some face uses the edge `(u, v)` in either direction.
    #[must_use]
    pub fn has_edge(&self, u: VertexId, v: VertexId) -> bool {
        self.halfedge
            .get(&u)
            .is_some_and(|nbrs| nbrs.contains_key(&v))
    }

    /// Whether `(u, v)` is an edge with a face on one side only.
    #[must_use]
    pub fn is_edge_on_boundary(&self, u: VertexId, v: VertexId) -> bool {
        self.has_edge(u, v)
            && (self.halfedge_face(u, v).is_none() || self.halfedge_face(v, u).is_none())
    }

    /// Every edge once, as `(lo, hi)` in ascending order.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        self.halfedge.iter().flat_map(|(u, nbrs)| {
            nbrs.keys()
                .filter(move |v| *u < **v)
                .map(move |v| (*u, *v))
        })
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }

    // =========================================================================
    // ATTRIBUTES
    // =========================================================================

    /// Vertex attribute with default fallback. `None` for unknown vertices.
    #[must_use]
    pub fn vertex_attribute(&self, id: VertexId, key: &str) -> Option<&Value> {
        if !self.has_vertex(id) {
            return None;
        }
        self.vertex.get(&id, key)
    }

    /// Set a vertex attribute override. Coordinates must be numeric.
    pub fn set_vertex_attribute(
        &mut self,
        id: VertexId,
        key: &str,
        value: Value,
    ) -> Result<(), MeshError> {
        if !self.has_vertex(id) {
            return Err(MeshError::vertex_not_found(id));
        }
        check_vertex_value(key, &value)?;
        self.vertex.set(id, key, value);
        Ok(())
    }

    /// Remove a vertex attribute override, returning it.
    pub fn unset_vertex_attribute(
        &mut self,
        id: VertexId,
        key: &str,
    ) -> Result<Option<Value>, MeshError> {
        if !self.has_vertex(id) {
            return Err(MeshError::vertex_not_found(id));
        }
        Ok(self.vertex.unset(&id, key))
    }

    /// Merged attributes of a vertex.
    pub fn vertex_attributes(&self, id: VertexId) -> Result<Attributes, MeshError> {
        if !self.has_vertex(id) {
            return Err(MeshError::vertex_not_found(id));
        }
        Ok(self.vertex.attributes(&id))
    }

    /// Set a default vertex attribute (`dva`). Coordinates must be numeric.
    pub fn set_default_vertex_attribute(
        &mut self,
        key: &str,
        value: Value,
    ) -> Result<(), MeshError> {
        check_vertex_value(key, &value)?;
        self.vertex.set_default(key, value);
        Ok(())
    }

    /// Face attribute with default fallback. `None` for unknown faces.
    #[must_use]
    pub fn face_attribute(&self, id: FaceId, key: &str) -> Option<&Value> {
        if !self.has_face(id) {
            return None;
        }
        self.facedata.get(&id, key)
    }

    /// Set a face attribute override.
    pub fn set_face_attribute(
        &mut self,
        id: FaceId,
        key: &str,
        value: Value,
    ) -> Result<(), MeshError> {
        if !self.has_face(id) {
            return Err(MeshError::face_not_found(id));
        }
        self.facedata.set(id, key, value);
        Ok(())
    }

    /// Remove a face attribute override, returning it.
    pub fn unset_face_attribute(
        &mut self,
        id: FaceId,
        key: &str,
    ) -> Result<Option<Value>, MeshError> {
        if !self.has_face(id) {
            return Err(MeshError::face_not_found(id));
        }
        Ok(self.facedata.unset(&id, key))
    }

    /// Merged attributes of a face.
    pub fn face_attributes(&self, id: FaceId) -> Result<Attributes, MeshError> {
        if !self.has_face(id) {
            return Err(MeshError::face_not_found(id));
        }
        Ok(self.facedata.attributes(&id))
    }

    /// Set a default face attribute (`dfa`).
    pub fn set_default_face_attribute(&mut self, key: &str, value: Value) {
        self.facedata.set_default(key, value);
    }

    /// Edge attribute with default fallback, reachable from either direction.
    #[must_use]
    pub fn edge_attribute(&self, u: VertexId, v: VertexId, key: &str) -> Option<&Value> {
        if !self.has_vertex(u) || !self.has_vertex(v) {
            return None;
        }
        self.edgedata.get(&EdgeKey::new(u, v), key)
    }

    /// Set an edge attribute override. Both endpoints must exist and differ.
    pub fn set_edge_attribute(
        &mut self,
        u: VertexId,
        v: VertexId,
        key: &str,
        value: Value,
    ) -> Result<(), MeshError> {
        self.check_endpoints(u, v)?;
        self.edgedata.set(EdgeKey::new(u, v), key, value);
        Ok(())
    }

    /// Remove an edge attribute override, returning it.
    pub fn unset_edge_attribute(
        &mut self,
        u: VertexId,
        v: VertexId,
        key: &str,
    ) -> Result<Option<Value>, MeshError> {
        self.check_endpoints(u, v)?;
        Ok(self.edgedata.unset(&EdgeKey::new(u, v), key))
    }

    /// Set a default edge attribute (`dea`).
    pub fn set_default_edge_attribute(&mut self, key: &str, value: Value) {
        self.edgedata.set_default(key, value);
    }

    fn check_endpoints(&self, u: VertexId, v: VertexId) -> Result<(), MeshError> {
        check_edge_endpoints(u, v, |end| self.has_vertex(end))
    }

    pub(crate) fn place_face_record(&mut self, id: FaceId, record: Attributes) {
        self.facedata.insert_record(id, record);
    }

    pub(crate) fn place_edge_record(&mut self, key: EdgeKey, record: Attributes) {
        self.edgedata.insert_record(key, record);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn vid(raw: &[u64]) -> Vec<VertexId> {
        raw.iter().copied().map(VertexId).collect()
    }

    /// 3x3 vertex grid split into four quads:
    ///
    /// ```text
    /// 6 - 7 - 8
    /// |   |   |
    /// 3 - 4 - 5
    /// |   |   |
    /// 0 - 1 - 2
    /// ```
    fn grid() -> HalfedgeMesh {
        let mut mesh = HalfedgeMesh::new();
        for _ in 0..9 {
            mesh.insert_vertex(Attributes::new()).expect("vertex");
        }
        for quad in [[0, 1, 4, 3], [1, 2, 5, 4], [3, 4, 7, 6], [4, 5, 8, 7]] {
            mesh.insert_face(&vid(&quad)).expect("face");
        }
        mesh
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let mesh = grid();
        assert_eq!(mesh.vertex_count(), 9);
        assert_eq!(mesh.face_count(), 4);
        assert_eq!(mesh.edge_count(), 12);
        assert_eq!(mesh.ids().peek_max(EntityKind::Vertex), 8);
        assert_eq!(mesh.ids().peek_max(EntityKind::Face), 3);
    }

    #[test]
    fn face_rejects_bad_loops() {
        let mut mesh = grid();
        for bad in [vid(&[0, 1]), vid(&[0, 1, 1]), vid(&[0, 1, 99])] {
            assert!(matches!(
                mesh.insert_face(&bad),
                Err(MeshError::InvalidLoop(_))
            ));
        }
        assert_eq!(mesh.ids().peek_max(EntityKind::Face), 3);
    }

    #[test]
    fn neighbors_and_ring_of_interior_vertex() {
        let mesh = grid();
        let center = VertexId(4);
        assert_eq!(mesh.vertex_neighbors(center).expect("nbrs"), vid(&[3, 1, 5, 7]));
        assert_eq!(mesh.vertex_degree(center).expect("degree"), 4);

        let ring = mesh.vertex_ring(center).expect("ring");
        assert_eq!(ring.len(), 4);
        let mut sorted = ring.clone();
        sorted.sort();
        assert_eq!(sorted, vid(&[1, 3, 5, 7]));
        // consecutive ring entries share a face with the center
        for i in 0..ring.len() {
            let a = ring[i];
            let b = ring[(i + 1) % ring.len()];
            assert!(!mesh.has_edge(a, b));
            let shared = mesh.vertex_faces(a).expect("faces");
            assert!(mesh
                .vertex_faces(b)
                .expect("faces")
                .iter()
                .any(|f| shared.contains(f)));
        }
        assert!(!mesh.is_vertex_on_boundary(center).expect("boundary"));
    }

    #[test]
    fn ring_of_boundary_vertex_walks_side_to_side() {
        let mesh = grid();
        let ring = mesh.vertex_ring(VertexId(1)).expect("ring");
        assert_eq!(ring.len(), 3);
        assert!(mesh.is_vertex_on_boundary(VertexId(1)).expect("boundary"));
        let ends = [ring[0], ring[2]];
        assert!(ends.contains(&VertexId(0)) && ends.contains(&VertexId(2)));
        assert_eq!(ring[1], VertexId(4));
    }

    #[test]
    fn halfedges_follow_orientation() {
        let mesh = grid();
        assert_eq!(mesh.halfedge_face(VertexId(0), VertexId(1)), Some(FaceId(0)));
        assert_eq!(mesh.halfedge_face(VertexId(1), VertexId(0)), None);
        assert_eq!(mesh.halfedge_face(VertexId(1), VertexId(4)), Some(FaceId(0)));
        assert_eq!(mesh.halfedge_face(VertexId(4), VertexId(1)), Some(FaceId(1)));
        assert!(mesh.is_edge_on_boundary(VertexId(0), VertexId(1)));
        assert!(!mesh.is_edge_on_boundary(VertexId(1), VertexId(4)));
    }

    #[test]
    fn face_neighbors_cross_shared_edges() {
        let mesh = grid();
        assert_eq!(mesh.face_neighbors(FaceId(0)).expect("nbrs"), vec![FaceId(1), FaceId(2)]);
        assert_eq!(mesh.face_neighbors(FaceId(3)).expect("nbrs").len(), 2);
    }

    #[test]
    fn isolated_vertex_has_empty_neighbors() {
        let mut mesh = grid();
        let lonely = mesh.insert_vertex(Attributes::new()).expect("vertex");
        assert!(mesh.vertex_neighbors(lonely).expect("nbrs").is_empty());
        assert!(mesh.vertex_ring(lonely).expect("ring").is_empty());
        assert!(!mesh.is_vertex_on_boundary(lonely).expect("boundary"));
    }

    #[test]
    fn delete_vertex_cascades_to_faces_and_edge_records() {
        let mut mesh = grid();
        mesh.set_edge_attribute(VertexId(4), VertexId(5), "crease", json!(true))
            .expect("set");
        mesh.set_edge_attribute(VertexId(0), VertexId(1), "crease", json!(true))
            .expect("set");

        mesh.delete_vertex(VertexId(4)).expect("delete");

        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.vertex_count(), 8);
        assert!(mesh.edge_store().overrides(&EdgeKey::new(VertexId(4), VertexId(5))).is_none());
        assert!(mesh.edge_store().overrides(&EdgeKey::new(VertexId(0), VertexId(1))).is_some());
        assert!(mesh.vertex_neighbors(VertexId(1)).expect("nbrs").is_empty());
        assert!(matches!(
            mesh.delete_vertex(VertexId(4)),
            Err(MeshError::NotFound { .. })
        ));
    }

    #[test]
    fn delete_face_keeps_vertices_and_shared_edges() {
        let mut mesh = grid();
        mesh.delete_face(FaceId(0)).expect("delete");

        assert_eq!(mesh.vertex_count(), 9);
        assert!(!mesh.has_edge(VertexId(0), VertexId(1)));
        assert!(mesh.has_edge(VertexId(1), VertexId(4)));
        assert!(mesh.is_edge_on_boundary(VertexId(1), VertexId(4)));
        assert!(mesh.vertex_neighbors(VertexId(0)).expect("nbrs").is_empty());
        assert!(matches!(
            mesh.delete_face(FaceId(0)),
            Err(MeshError::NotFound { .. })
        ));
    }

    #[test]
    fn deleted_ids_are_not_reissued() {
        let mut mesh = grid();
        mesh.delete_face(FaceId(3)).expect("delete");
        let fresh = mesh.insert_face(&vid(&[4, 5, 8, 7])).expect("face");
        assert_eq!(fresh, FaceId(4));

        mesh.delete_vertex(VertexId(8)).expect("delete");
        assert_eq!(mesh.insert_vertex(Attributes::new()), Ok(VertexId(9)));
    }

    #[test]
    fn edge_attributes_ignore_direction() {
        let mut mesh = grid();
        mesh.set_default_edge_attribute("weight", json!(1));
        mesh.set_edge_attribute(VertexId(5), VertexId(4), "weight", json!(3))
            .expect("set");
        assert_eq!(mesh.edge_attribute(VertexId(4), VertexId(5), "weight"), Some(&json!(3)));
        assert_eq!(mesh.edge_attribute(VertexId(0), VertexId(1), "weight"), Some(&json!(1)));
        assert!(mesh
            .set_edge_attribute(VertexId(0), VertexId(42), "weight", json!(0))
            .is_err());
    }

    #[test]
    fn vertex_attributes_fall_back_to_defaults() {
        let mut mesh = HalfedgeMesh::new();
        let mut attrs = Attributes::new();
        attrs.insert("x".into(), json!(2.5));
        let v = mesh.insert_vertex(attrs).expect("vertex");

        assert_eq!(mesh.vertex_attribute(v, "x"), Some(&json!(2.5)));
        assert_eq!(mesh.vertex_attribute(v, "y"), Some(&json!(0.0)));
        assert_eq!(mesh.vertex_attribute(v, "color"), None);
        assert_eq!(mesh.vertex_attribute(VertexId(7), "x"), None);

        mesh.unset_vertex_attribute(v, "x").expect("unset");
        assert_eq!(mesh.vertex_attribute(v, "x"), Some(&json!(0.0)));
    }

    #[test]
    fn face_attributes_are_dropped_with_face() {
        let mut mesh = grid();
        mesh.set_face_attribute(FaceId(2), "material", json!("steel"))
            .expect("set");
        assert_eq!(mesh.face_attribute(FaceId(2), "material"), Some(&json!("steel")));
        mesh.delete_face(FaceId(2)).expect("delete");
        assert!(mesh.face_store().overrides(&FaceId(2)).is_none());
        assert_eq!(mesh.face_attribute(FaceId(2), "material"), None);
    }

    #[test]
    fn substitute_rewrites_faces_in_place() {
        let mut mesh = grid();
        let extra = mesh.insert_vertex(Attributes::new()).expect("vertex");
        let changed = mesh
            .substitute_vertex_in_faces(VertexId(4), extra, None)
            .expect("substitute");

        assert_eq!(changed, vec![FaceId(0), FaceId(1), FaceId(2), FaceId(3)]);
        assert_eq!(mesh.face_vertices(FaceId(0)).expect("face"), vid(&[0, 1, 9, 3]).as_slice());
        assert!(mesh.vertex_neighbors(VertexId(4)).expect("nbrs").is_empty());
        assert_eq!(mesh.vertex_degree(extra).expect("degree"), 4);
    }

    #[test]
    fn substitute_is_atomic_on_invalid_cycle() {
        let mut mesh = grid();
        let before = mesh.clone();
        let err = mesh.substitute_vertex_in_faces(VertexId(4), VertexId(1), None);
        assert!(matches!(err, Err(MeshError::InvalidLoop(_))));
        assert_eq!(mesh, before);
    }

    #[test]
    fn neighbors_follow_face_traversal() {
        let mut mesh = HalfedgeMesh::new();
        for _ in 0..4 {
            mesh.insert_vertex(Attributes::new()).expect("vertex");
        }
        mesh.insert_face(&vid(&[0, 1, 2])).expect("face");
        mesh.insert_face(&vid(&[2, 1, 3])).expect("face");
        // face 0 gives 2 then 0, face 1 adds 3
        assert_eq!(mesh.vertex_neighbors(VertexId(1)).expect("nbrs"), vid(&[2, 0, 3]));
        assert_eq!(mesh.vertex_neighbors(VertexId(3)).expect("nbrs"), vid(&[2, 1]));
    }

    #[test]
    fn self_loop_edge_attribute_is_rejected() {
        let mut mesh = grid();
        let v = VertexId(4);
        assert!(matches!(
            mesh.set_edge_attribute(v, v, "w", json!(1)),
            Err(MeshError::InvalidLoop(_))
        ));
        assert!(mesh.unset_edge_attribute(v, v, "w").is_err());
        assert!(mesh.edge_store().is_empty());
    }

    #[test]
    fn coordinates_stay_numeric() {
        let mut mesh = grid();
        let v = VertexId(0);
        let err = mesh.set_vertex_attribute(v, "x", json!("left"));
        assert!(matches!(err, Err(MeshError::InvalidAttribute(_))));
        assert_eq!(mesh.vertex_attribute(v, "x"), Some(&json!(0.0)));
        assert!(mesh.set_default_vertex_attribute("z", json!(null)).is_err());
        mesh.set_vertex_attribute(v, "label", json!("left")).expect("free-form");

        let mut attrs = Attributes::new();
        attrs.insert("y".into(), json!("up"));
        assert!(mesh.insert_vertex(attrs).is_err());
        assert_eq!(mesh.ids().peek_max(EntityKind::Vertex), 8);
    }

    #[test]
    fn exhausted_face_ids_refuse_insert() {
        let mut mesh = grid();
        mesh.ids_mut()
            .restore(EntityKind::Face, i64::MAX)
            .expect("restore");
        let err = mesh.insert_face(&vid(&[2, 5, 1]));
        assert_eq!(err, Err(MeshError::IdsExhausted(EntityKind::Face)));
        assert_eq!(mesh.face_count(), 4);
    }
}
