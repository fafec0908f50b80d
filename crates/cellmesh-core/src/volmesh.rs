//! # Halfface Volume Mesh
//!
//! Volumetric cell complex: vertices plus cells, where each cell owns its
//! bounding faces as oriented loops ("half-faces"). Faces are never shared
//! by identity: two cells touching along a geometric face each hold their
//! own loop, one the reverse of the other.
//!
//! Each cell indexes its loops by directed edge in a plane map
//! `u -> v -> loop`, so "which face of this cell contains `u -> v`" is a
//! direct lookup. Cell adjacency follows from it: a neighbor across the
//! face containing `u -> v` stores the reversed loop under `v -> u`.

use crate::attributes::{AttributeStore, check_vertex_record, check_vertex_value};
use crate::ids::IdAllocator;
use crate::keys::{EdgeKey, FaceKey, check_edge_endpoints};
use crate::loops::{self, directed_edges};
use crate::{Attributes, CellId, EntityKind, MeshError, VertexId};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};

/// Minimum number of faces bounding a cell.
pub const MIN_CELL_FACES: usize = 4;

// =============================================================================
// CELL
// =============================================================================

/// One cell: its half-face loops and the plane map indexing them.
#[derive(Debug, Clone)]
pub struct Cell {
    /// Distinct loops, in the order they were supplied.
    faces: Vec<Vec<VertexId>>,

    /// `u -> v -> index into faces` of the loop containing `u -> v`.
    plane: BTreeMap<VertexId, BTreeMap<VertexId, usize>>,
}

/// Cells compare by their set of loops; supply order does not matter.
impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        let mut mine: Vec<&Vec<VertexId>> = self.faces.iter().collect();
        let mut theirs: Vec<&Vec<VertexId>> = other.faces.iter().collect();
        mine.sort();
        theirs.sort();
        mine == theirs
    }
}

impl Cell {
    /// Build a cell from already validated loops.
    ///
    /// Fails with `DegenerateCell` when there are fewer than four loops or a
    /// directed edge appears in more than one of them.
    pub fn build(faces: Vec<Vec<VertexId>>) -> Result<Self, MeshError> {
        if faces.len() < MIN_CELL_FACES {
            return Err(MeshError::DegenerateCell(format!(
                "cell has {} faces, need at least {}",
                faces.len(),
                MIN_CELL_FACES
            )));
        }
        let mut plane: BTreeMap<VertexId, BTreeMap<VertexId, usize>> = BTreeMap::new();
        for (index, face) in faces.iter().enumerate() {
            for (u, v) in directed_edges(face) {
                if plane.entry(u).or_default().insert(v, index).is_some() {
                    return Err(MeshError::DegenerateCell(format!(
                        "directed edge {}->{} appears in more than one face",
                        u, v
                    )));
                }
            }
        }
        Ok(Self { faces, plane })
    }

    /// The loop containing the directed edge `u -> v`.
    #[must_use]
    pub fn face(&self, u: VertexId, v: VertexId) -> Option<&[VertexId]> {
        let index = *self.plane.get(&u)?.get(&v)?;
        self.faces.get(index).map(Vec::as_slice)
    }

    /// Distinct loops of the cell.
    pub fn faces(&self) -> impl Iterator<Item = &[VertexId]> {
        self.faces.iter().map(Vec::as_slice)
    }

    /// Every plane entry `(u, v, loop)` in key order.
    pub fn plane(&self) -> impl Iterator<Item = (VertexId, VertexId, &[VertexId])> {
        self.plane.iter().flat_map(move |(u, row)| {
            row.iter().filter_map(move |(v, index)| {
                self.faces.get(*index).map(|face| (*u, *v, face.as_slice()))
            })
        })
    }

    /// Union of the vertices of all loops.
    #[must_use]
    pub fn vertices(&self) -> BTreeSet<VertexId> {
        self.faces.iter().flatten().copied().collect()
    }
}

// =============================================================================
// VOLMESH
// =============================================================================

/// A halfface volumetric mesh.
#[derive(Debug, Clone)]
pub struct HalffaceVolMesh {
    /// Mesh-level metadata.
    attributes: Attributes,

    /// Vertex records. Every live vertex has a record, possibly empty.
    vertex: AttributeStore<VertexId>,

    cell: BTreeMap<CellId, Cell>,

    /// Face attribute overrides, keyed by the sorted vertex set of a loop.
    face_data: AttributeStore<FaceKey>,

    edge_data: AttributeStore<EdgeKey>,

    /// Cell attribute overrides. Every live cell has a record.
    cell_data: AttributeStore<CellId>,

    /// Derived: vertex -> cells using it.
    incidence: BTreeMap<VertexId, BTreeSet<CellId>>,

    ids: IdAllocator,
}

impl Default for HalffaceVolMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for HalffaceVolMesh {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
            && self.vertex == other.vertex
            && self.cell == other.cell
            && self.face_data == other.face_data
            && self.edge_data == other.edge_data
            && self.cell_data == other.cell_data
            && self.ids == other.ids
    }
}

impl HalffaceVolMesh {
    /// Create an empty volmesh. Vertices default to `x = y = z = 0.0`.
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
            AttributeStore::new(),
        )
    }

    pub(crate) fn with_defaults(
        attributes: Attributes,
        vertex: AttributeStore<VertexId>,
        face_data: AttributeStore<FaceKey>,
        edge_data: AttributeStore<EdgeKey>,
        cell_data: AttributeStore<CellId>,
    ) -> Self {
        Self {
            attributes,
            vertex,
            cell: BTreeMap::new(),
            face_data,
            edge_data,
            cell_data,
            incidence: BTreeMap::new(),
            ids: IdAllocator::new(),
        }
    }

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

    #[must_use]
    pub fn vertex_store(&self) -> &AttributeStore<VertexId> {
        &self.vertex
    }

    #[must_use]
    pub fn face_store(&self) -> &AttributeStore<FaceKey> {
        &self.face_data
    }

    #[must_use]
    pub fn edge_store(&self) -> &AttributeStore<EdgeKey> {
        &self.edge_data
    }

    #[must_use]
    pub fn cell_store(&self) -> &AttributeStore<CellId> {
        &self.cell_data
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
        self.incidence.entry(id).or_default();
    }

    /// Delete a vertex, every cell that uses it, and every edge and face
    /// record that names it.
    pub fn delete_vertex(&mut self, id: VertexId) -> Result<(), MeshError> {
        if !self.has_vertex(id) {
            return Err(MeshError::vertex_not_found(id));
        }
        let cells = self.vertex_cells(id)?;
        for cell in &cells {
            self.delete_cell(*cell)?;
        }
        self.incidence.remove(&id);
        self.vertex.remove(&id);
        self.edge_data.retain(|key| !key.contains(id));
        self.face_data.retain(|key| !key.contains(id));

        tracing::debug!(vertex = id.0, cells = cells.len(), "deleted vertex");
        Ok(())
    }

    #[must_use]
    pub fn has_vertex(&self, id: VertexId) -> bool {
        self.vertex.contains(&id)
    }

    /// Live vertices in identifier order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertex.iter().map(|(id, _)| *id)
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex.len()
    }

    /// Cells using vertex `id`, in identifier order.
    pub fn vertex_cells(&self, id: VertexId) -> Result<Vec<CellId>, MeshError> {
        self.incidence
            .get(&id)
            .map(|cells| cells.iter().copied().collect())
            .ok_or(MeshError::vertex_not_found(id))
    }

    // =========================================================================
    // CELLS
    // =========================================================================

    /// Add a cell bounded by the given oriented loops.
    ///
    /// Every loop must satisfy the face rules (`InvalidLoop`); the cell
    /// needs at least four loops and no directed edge may repeat across
    /// them (`DegenerateCell`). Each loop issues one face identifier.
    pub fn insert_cell(&mut self, faces: &[Vec<VertexId>]) -> Result<CellId, MeshError> {
        if faces.len() < MIN_CELL_FACES {
            return Err(MeshError::DegenerateCell(format!(
                "cell has {} faces, need at least {}",
                faces.len(),
                MIN_CELL_FACES
            )));
        }
        for face in faces {
            loops::validate_loop(face, |v| self.has_vertex(v))?;
        }
        let cell = Cell::build(faces.to_vec())?;

        let mut ids = self.ids;
        let id = ids.next_cell()?;
        for _ in faces {
            ids.next_face()?;
        }
        self.ids = ids;
        self.place_cell(id, cell);
        self.cell_data.ensure(id);
        Ok(id)
    }

    pub(crate) fn place_cell(&mut self, id: CellId, cell: Cell) {
        self.ids.observe(EntityKind::Cell, id.0);
        for vertex in cell.vertices() {
            self.incidence.entry(vertex).or_default().insert(id);
        }
        self.cell.insert(id, cell);
    }

    /// Delete a cell and its attribute record. Vertices stay.
    pub fn delete_cell(&mut self, id: CellId) -> Result<(), MeshError> {
        let cell = self.cell.remove(&id).ok_or(MeshError::cell_not_found(id))?;
        for vertex in cell.vertices() {
            if let Some(cells) = self.incidence.get_mut(&vertex) {
                cells.remove(&id);
            }
        }
        self.cell_data.remove(&id);
        Ok(())
    }

    #[must_use]
    pub fn has_cell(&self, id: CellId) -> bool {
        self.cell.contains_key(&id)
    }

    /// Live cells in identifier order.
    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cell.keys().copied()
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cell.len()
    }

    /// The stored cell.
    pub fn cell(&self, id: CellId) -> Result<&Cell, MeshError> {
        self.cell.get(&id).ok_or(MeshError::cell_not_found(id))
    }

    /// The loop of `cell` containing the directed edge `u -> v`.
    ///
    /// `None` when the cell is unknown or has no such face.
    #[must_use]
    pub fn cell_face(&self, cell: CellId, u: VertexId, v: VertexId) -> Option<&[VertexId]> {
        self.cell.get(&cell)?.face(u, v)
    }

    /// Distinct loops of a cell.
    pub fn cell_faces(&self, id: CellId) -> Result<Vec<&[VertexId]>, MeshError> {
        Ok(self.cell(id)?.faces().collect())
    }

    /// Vertices of a cell, in identifier order.
    pub fn cell_vertices(&self, id: CellId) -> Result<BTreeSet<VertexId>, MeshError> {
        Ok(self.cell(id)?.vertices())
    }

    /// The loop of `a` whose reverse bounds `b`, if the cells touch along
    /// a face.
    pub fn cell_shared_face(&self, a: CellId, b: CellId) -> Result<Option<&[VertexId]>, MeshError> {
        let first = self.cell(a)?;
        let second = self.cell(b)?;
        Ok(first.faces().find(|face| Self::reversed_in(face, second)))
    }

    /// Cells sharing a face with `id`, in identifier order.
    pub fn cell_neighbors(&self, id: CellId) -> Result<Vec<CellId>, MeshError> {
        let cell = self.cell(id)?;
        let mut nbrs = BTreeSet::new();
        for face in cell.faces() {
            if let Some(other) = self.face_opposite(id, face) {
                nbrs.insert(other);
            }
        }
        Ok(nbrs.into_iter().collect())
    }

    /// Whether some face of `id` has no neighboring cell behind it.
    pub fn is_cell_on_boundary(&self, id: CellId) -> Result<bool, MeshError> {
        let cell = self.cell(id)?;
        Ok(cell
            .faces()
            .any(|face| self.face_opposite(id, face).is_none()))
    }

    /// The other cell holding the reverse of `face`, if any.
    fn face_opposite(&self, owner: CellId, face: &[VertexId]) -> Option<CellId> {
        let (&u, &v) = (face.first()?, face.get(1)?);
        let shared: BTreeSet<CellId> = self
            .incidence
            .get(&u)?
            .intersection(self.incidence.get(&v)?)
            .copied()
            .collect();
        shared.into_iter().find(|&other| {
            other != owner
                && self
                    .cell
                    .get(&other)
                    .is_some_and(|cell| Self::reversed_in(face, cell))
        })
    }

    /// Whether `cell` stores the reverse of `face` under a reversed key.
    fn reversed_in(face: &[VertexId], cell: &Cell) -> bool {
        match (face.first(), face.get(1)) {
            (Some(&u), Some(&v)) => cell
                .face(v, u)
                .is_some_and(|other| loops::is_reversed(face, other)),
            _ => false,
        }
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

    /// Cell attribute with default fallback. `None` for unknown cells.
    #[must_use]
    pub fn cell_attribute(&self, id: CellId, key: &str) -> Option<&Value> {
        if !self.has_cell(id) {
            return None;
        }
        self.cell_data.get(&id, key)
    }

    pub fn set_cell_attribute(
        &mut self,
        id: CellId,
        key: &str,
        value: Value,
    ) -> Result<(), MeshError> {
        if !self.has_cell(id) {
            return Err(MeshError::cell_not_found(id));
        }
        self.cell_data.set(id, key, value);
        Ok(())
    }

    pub fn unset_cell_attribute(
        &mut self,
        id: CellId,
        key: &str,
    ) -> Result<Option<Value>, MeshError> {
        if !self.has_cell(id) {
            return Err(MeshError::cell_not_found(id));
        }
        Ok(self.cell_data.unset(&id, key))
    }

    /// Set a default cell attribute (`dca`).
    pub fn set_default_cell_attribute(&mut self, key: &str, value: Value) {
        self.cell_data.set_default(key, value);
    }

    /// Edge attribute with default fallback, reachable from either direction.
    #[must_use]
    pub fn edge_attribute(&self, u: VertexId, v: VertexId, key: &str) -> Option<&Value> {
        if !self.has_vertex(u) || !self.has_vertex(v) {
            return None;
        }
        self.edge_data.get(&EdgeKey::new(u, v), key)
    }

    pub fn set_edge_attribute(
        &mut self,
        u: VertexId,
        v: VertexId,
        key: &str,
        value: Value,
    ) -> Result<(), MeshError> {
        check_edge_endpoints(u, v, |end| self.has_vertex(end))?;
        self.edge_data.set(EdgeKey::new(u, v), key, value);
        Ok(())
    }

    pub fn unset_edge_attribute(
        &mut self,
        u: VertexId,
        v: VertexId,
        key: &str,
    ) -> Result<Option<Value>, MeshError> {
        check_edge_endpoints(u, v, |end| self.has_vertex(end))?;
        Ok(self.edge_data.unset(&EdgeKey::new(u, v), key))
    }

    /// Set a default edge attribute (`dea`).
    pub fn set_default_edge_attribute(&mut self, key: &str, value: Value) {
        self.edge_data.set_default(key, value);
    }

    /// Face attribute addressed by a loop in either orientation.
    #[must_use]
    pub fn face_attribute(&self, face: &[VertexId], key: &str) -> Option<&Value> {
        if !face.iter().all(|v| self.has_vertex(*v)) {
            return None;
        }
        self.face_data.get(&FaceKey::from_loop(face), key)
    }

    /// Set a face attribute. The loop must be a valid loop of known vertices.
    pub fn set_face_attribute(
        &mut self,
        face: &[VertexId],
        key: &str,
        value: Value,
    ) -> Result<(), MeshError> {
        loops::validate_loop(face, |v| self.has_vertex(v))?;
        self.face_data.set(FaceKey::from_loop(face), key, value);
        Ok(())
    }

    pub fn unset_face_attribute(
        &mut self,
        face: &[VertexId],
        key: &str,
    ) -> Result<Option<Value>, MeshError> {
        loops::validate_loop(face, |v| self.has_vertex(v))?;
        Ok(self.face_data.unset(&FaceKey::from_loop(face), key))
    }

    /// Set a default face attribute (`dfa`).
    pub fn set_default_face_attribute(&mut self, key: &str, value: Value) {
        self.face_data.set_default(key, value);
    }

    pub(crate) fn place_cell_record(&mut self, id: CellId, record: Attributes) {
        self.cell_data.insert_record(id, record);
    }

    pub(crate) fn place_edge_record(&mut self, key: EdgeKey, record: Attributes) {
        self.edge_data.insert_record(key, record);
    }

    pub(crate) fn place_face_record(&mut self, key: FaceKey, record: Attributes) {
        self.face_data.insert_record(key, record);
    }
}

// =============================================================================
// TESTS
// =============================================================================
