//! # Wire Documents
//!
//! Typed mirrors of the two JSON documents (schema version 1.7.1) and the
//! conversions between them and the kernel structures.
//!
//! Object keys that carry identifiers are parsed strictly on read (plain
//! decimal, no sign, no leading zeros) and written back in numeric order.
//! Loading either produces a structure satisfying every kernel invariant
//! or fails with `MalformedDocument`; nothing partial is returned.

use crate::attributes::{AttributeStore, check_vertex_record};
use crate::keys::{EdgeKey, FaceKey, parse_decimal};
use crate::loops;
use crate::volmesh::Cell;
use crate::{
    Attributes, CellId, EntityKind, FaceId, HalfedgeMesh, HalffaceVolMesh, MeshError, VertexId,
};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

// =============================================================================
// KEYED MAPS
// =============================================================================

/// Identifier as it appears in an object key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WireId(pub u64);

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WireId {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s).map(WireId)
    }
}

/// JSON object whose keys parse into `K`. Keys are written in `K` order;
/// two keys that parse to the same `K` are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedMap<K: Ord, T>(pub BTreeMap<K, T>);

impl<K: Ord, T> Default for KeyedMap<K, T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<K: Ord + fmt::Display, T: Serialize> Serialize for KeyedMap<K, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(&key.to_string(), value)?;
        }
        map.end()
    }
}

struct KeyedMapVisitor<K, T>(PhantomData<(K, T)>);

impl<'de, K, T> Visitor<'de> for KeyedMapVisitor<K, T>
where
    K: Ord + FromStr<Err = MeshError>,
    T: Deserialize<'de>,
{
    type Value = KeyedMap<K, T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object with identifier keys")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut out = BTreeMap::new();
        while let Some(raw) = access.next_key::<String>()? {
            let key = raw.parse::<K>().map_err(de::Error::custom)?;
            let value = access.next_value::<T>()?;
            if out.insert(key, value).is_some() {
                return Err(de::Error::custom(format!("duplicate key '{}'", raw)));
            }
        }
        Ok(KeyedMap(out))
    }
}

impl<'de, K, T> Deserialize<'de> for KeyedMap<K, T>
where
    K: Ord + FromStr<Err = MeshError>,
    T: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(KeyedMapVisitor(PhantomData))
    }
}

/// Wire form of a plane map: `u -> v -> loop`.
pub type PlaneData = KeyedMap<WireId, KeyedMap<WireId, Vec<u64>>>;

// =============================================================================
// DOCUMENTS
// =============================================================================

/// Halfedge mesh document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub attributes: Attributes,
    pub dva: Attributes,
    pub dea: Attributes,
    pub dfa: Attributes,
    pub vertex: KeyedMap<WireId, Attributes>,
    pub face: KeyedMap<WireId, Vec<u64>>,
    pub facedata: KeyedMap<WireId, Attributes>,
    pub edgedata: KeyedMap<EdgeKey, Attributes>,
    pub max_vertex: i64,
    pub max_face: i64,
}

/// Halfface volmesh document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolMeshData {
    pub attributes: Attributes,
    pub dva: Attributes,
    pub dea: Attributes,
    pub dfa: Attributes,
    pub dca: Attributes,
    pub vertex: KeyedMap<WireId, Attributes>,
    pub cell: KeyedMap<WireId, PlaneData>,
    pub face_data: KeyedMap<FaceKey, Attributes>,
    pub edge_data: KeyedMap<EdgeKey, Attributes>,
    pub cell_data: KeyedMap<WireId, Attributes>,
    pub max_vertex: i64,
    pub max_face: i64,
    pub max_cell: i64,
}

// =============================================================================
// SHARED CHECKS
// =============================================================================

/// Re-label any kernel error raised while loading as `MalformedDocument`.
fn malformed(context: String) -> impl FnOnce(MeshError) -> MeshError {
    move |err| match err {
        MeshError::MalformedDocument(msg) => {
            MeshError::MalformedDocument(format!("{}: {}", context, msg))
        }
        other => MeshError::MalformedDocument(format!("{}: {}", context, other)),
    }
}

/// `x`, `y`, `z` are optional on a vertex, but numeric when present.
fn check_coordinates(id: u64, attrs: &Attributes) -> Result<(), MeshError> {
    check_vertex_record(attrs).map_err(malformed(format!("vertex {}", id)))
}

fn to_vertices(raw: &[u64]) -> Vec<VertexId> {
    raw.iter().copied().map(VertexId).collect()
}

fn to_raw(vertices: &[VertexId]) -> Vec<u64> {
    vertices.iter().map(|v| v.0).collect()
}

fn vertex_records(store: &AttributeStore<VertexId>) -> KeyedMap<WireId, Attributes> {
    KeyedMap(
        store
            .iter()
            .map(|(id, attrs)| (WireId(id.0), attrs.clone()))
            .collect(),
    )
}

fn edge_records(store: &AttributeStore<EdgeKey>) -> KeyedMap<EdgeKey, Attributes> {
    KeyedMap(store.iter().map(|(k, a)| (*k, a.clone())).collect())
}

fn vertex_store(dva: Attributes) -> Result<AttributeStore<VertexId>, MeshError> {
    check_vertex_record(&dva).map_err(malformed("dva".to_string()))?;
    Ok(AttributeStore::with_defaults(dva))
}

// =============================================================================
// HALFEDGE MESH
// =============================================================================

impl From<&HalfedgeMesh> for MeshData {
    fn from(mesh: &HalfedgeMesh) -> Self {
        let face = mesh
            .faces()
            .filter_map(|id| {
                mesh.face_vertices(id)
                    .ok()
                    .map(|cycle| (WireId(id.0), to_raw(cycle)))
            })
            .collect();
        let facedata = mesh
            .face_store()
            .iter()
            .map(|(id, attrs)| (WireId(id.0), attrs.clone()))
            .collect();

        Self {
            attributes: mesh.attributes().clone(),
            dva: mesh.vertex_store().defaults().clone(),
            dea: mesh.edge_store().defaults().clone(),
            dfa: mesh.face_store().defaults().clone(),
            vertex: vertex_records(mesh.vertex_store()),
            face: KeyedMap(face),
            facedata: KeyedMap(facedata),
            edgedata: edge_records(mesh.edge_store()),
            max_vertex: mesh.ids().peek_max(EntityKind::Vertex),
            max_face: mesh.ids().peek_max(EntityKind::Face),
        }
    }
}

impl TryFrom<MeshData> for HalfedgeMesh {
    type Error = MeshError;

    fn try_from(data: MeshData) -> Result<Self, Self::Error> {
        let mut mesh = HalfedgeMesh::with_defaults(
            data.attributes,
            vertex_store(data.dva)?,
            AttributeStore::with_defaults(data.dfa),
            AttributeStore::with_defaults(data.dea),
        );

        for (id, attrs) in data.vertex.0 {
            check_coordinates(id.0, &attrs)?;
            mesh.place_vertex(VertexId(id.0), attrs);
        }

        for (id, raw) in data.face.0 {
            let cycle = to_vertices(&raw);
            loops::validate_loop(&cycle, |v| mesh.has_vertex(v))
                .map_err(malformed(format!("face {}", id)))?;
            mesh.place_face(FaceId(id.0), cycle);
        }

        let faces: Vec<FaceId> = mesh.faces().collect();
        let mut facedata = data.facedata.0;
        for id in facedata.keys() {
            if !mesh.has_face(FaceId(id.0)) {
                return Err(MeshError::MalformedDocument(format!(
                    "facedata refers to unknown face {}",
                    id
                )));
            }
        }
        for face in faces {
            let record = facedata.remove(&WireId(face.0)).unwrap_or_default();
            mesh.place_face_record(face, record);
        }

        for (key, attrs) in data.edgedata.0 {
            let (u, v) = key.vertices();
            if !mesh.has_vertex(u) || !mesh.has_vertex(v) {
                return Err(MeshError::MalformedDocument(format!(
                    "edgedata refers to unknown vertex in '{}'",
                    key
                )));
            }
            mesh.place_edge_record(key, attrs);
        }

        let ids = mesh.ids_mut();
        ids.restore(EntityKind::Vertex, data.max_vertex)?;
        ids.restore(EntityKind::Face, data.max_face)?;

        tracing::debug!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "loaded halfedge mesh"
        );
        Ok(mesh)
    }
}

// =============================================================================
// HALFFACE VOLMESH
// =============================================================================

fn plane_data(cell: &Cell) -> PlaneData {
    let mut rows: BTreeMap<WireId, KeyedMap<WireId, Vec<u64>>> = BTreeMap::new();
    for (u, v, face) in cell.plane() {
        rows.entry(WireId(u.0))
            .or_default()
            .0
            .insert(WireId(v.0), to_raw(face));
    }
    KeyedMap(rows)
}

/// Rebuild a cell from its wire plane map.
///
/// Every entry must name a loop containing `u -> v`; loops repeated under
/// several keys (in any rotation) collapse to one face, and the rebuilt
/// plane map must cover exactly the entries of the document.
fn cell_from_plane(plane: PlaneData, is_known: impl Fn(VertexId) -> bool) -> Result<Cell, MeshError> {
    let mut faces: Vec<Vec<VertexId>> = Vec::new();
    let mut seen: Vec<Vec<VertexId>> = Vec::new();
    let mut entries = 0usize;

    for (u, row) in plane.0 {
        for (v, raw) in row.0 {
            entries += 1;
            let face = to_vertices(&raw);
            loops::validate_loop(&face, &is_known)?;
            if loops::successor(&face, VertexId(u.0)) != Some(VertexId(v.0)) {
                return Err(MeshError::MalformedDocument(format!(
                    "plane entry {}->{} names a loop without that edge",
                    u, v
                )));
            }
            let rotated = loops::rotated_to_min(&face);
            if !seen.contains(&rotated) {
                seen.push(rotated);
                faces.push(face);
            }
        }
    }

    let cell = Cell::build(faces)?;
    if cell.plane().count() != entries {
        return Err(MeshError::MalformedDocument(format!(
            "plane map has {} entries, its loops have {} directed edges",
            entries,
            cell.plane().count()
        )));
    }
    Ok(cell)
}

impl From<&HalffaceVolMesh> for VolMeshData {
    fn from(mesh: &HalffaceVolMesh) -> Self {
        let cell = mesh
            .cells()
            .filter_map(|id| mesh.cell(id).ok().map(|c| (WireId(id.0), plane_data(c))))
            .collect();

        Self {
            attributes: mesh.attributes().clone(),
            dva: mesh.vertex_store().defaults().clone(),
            dea: mesh.edge_store().defaults().clone(),
            dfa: mesh.face_store().defaults().clone(),
            dca: mesh.cell_store().defaults().clone(),
            vertex: vertex_records(mesh.vertex_store()),
            cell: KeyedMap(cell),
            face_data: KeyedMap(
                mesh.face_store()
                    .iter()
                    .map(|(k, a)| (k.clone(), a.clone()))
                    .collect(),
            ),
            edge_data: edge_records(mesh.edge_store()),
            cell_data: KeyedMap(
                mesh.cell_store()
                    .iter()
                    .map(|(id, a)| (WireId(id.0), a.clone()))
                    .collect(),
            ),
            max_vertex: mesh.ids().peek_max(EntityKind::Vertex),
            max_face: mesh.ids().peek_max(EntityKind::Face),
            max_cell: mesh.ids().peek_max(EntityKind::Cell),
        }
    }
}

impl TryFrom<VolMeshData> for HalffaceVolMesh {
    type Error = MeshError;

    fn try_from(data: VolMeshData) -> Result<Self, Self::Error> {
        let mut mesh = HalffaceVolMesh::with_defaults(
            data.attributes,
            vertex_store(data.dva)?,
            AttributeStore::with_defaults(data.dfa),
            AttributeStore::with_defaults(data.dea),
            AttributeStore::with_defaults(data.dca),
        );

        for (id, attrs) in data.vertex.0 {
            check_coordinates(id.0, &attrs)?;
            mesh.place_vertex(VertexId(id.0), attrs);
        }

        for (id, plane) in data.cell.0 {
            let cell = cell_from_plane(plane, |v| mesh.has_vertex(v))
                .map_err(malformed(format!("cell {}", id)))?;
            mesh.place_cell(CellId(id.0), cell);
        }

        let mut cell_data = data.cell_data.0;
        if let Some((id, _)) = cell_data.iter().find(|(id, _)| !mesh.has_cell(CellId(id.0))) {
            return Err(MeshError::MalformedDocument(format!(
                "cell_data refers to unknown cell {}",
                id
            )));
        }
        let cells: Vec<CellId> = mesh.cells().collect();
        for cell in cells {
            let record = cell_data.remove(&WireId(cell.0)).unwrap_or_default();
            mesh.place_cell_record(cell, record);
        }

        for (key, attrs) in data.face_data.0 {
            if !key.vertices().iter().all(|v| mesh.has_vertex(*v)) {
                return Err(MeshError::MalformedDocument(format!(
                    "face_data refers to unknown vertex in '{}'",
                    key
                )));
            }
            mesh.place_face_record(key, attrs);
        }

        for (key, attrs) in data.edge_data.0 {
            let (u, v) = key.vertices();
            if !mesh.has_vertex(u) || !mesh.has_vertex(v) {
                return Err(MeshError::MalformedDocument(format!(
                    "edge_data refers to unknown vertex in '{}'",
                    key
                )));
            }
            mesh.place_edge_record(key, attrs);
        }

        let ids = mesh.ids_mut();
        ids.restore(EntityKind::Vertex, data.max_vertex)?;
        ids.restore(EntityKind::Face, data.max_face)?;
        ids.restore(EntityKind::Cell, data.max_cell)?;

        tracing::debug!(
            vertices = mesh.vertex_count(),
            cells = mesh.cell_count(),
            "loaded halfface volmesh"
        );
        Ok(mesh)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keyed_map_rejects_non_canonical_keys() {
        for bad in [r#"{"01": 1}"#, r#"{"-1": 1}"#, r#"{"x": 1}"#, r#"{"": 1}"#] {
            let parsed: Result<KeyedMap<WireId, u64>, _> = serde_json::from_str(bad);
            assert!(parsed.is_err(), "accepted {}", bad);
        }
    }

    #[test]
    fn keyed_map_writes_numeric_order() {
        let parsed: KeyedMap<WireId, u64> =
            serde_json::from_str(r#"{"10": 1, "2": 2, "0": 3}"#).expect("parse");
        let text = serde_json::to_string(&parsed).expect("write");
        assert_eq!(text, r#"{"0":3,"2":2,"10":1}"#);
    }

    #[test]
    fn edge_keys_collapse_and_collide() {
        let parsed: KeyedMap<EdgeKey, u64> =
            serde_json::from_str(r#"{"5-2": 1}"#).expect("parse");
        assert_eq!(serde_json::to_string(&parsed).expect("write"), r#"{"2-5":1}"#);

        let clash: Result<KeyedMap<EdgeKey, u64>, _> =
            serde_json::from_str(r#"{"5-2": 1, "2-5": 2}"#);
        assert!(clash.is_err());
    }

    #[test]
    fn plane_entry_must_contain_its_edge() {
        let plane: PlaneData = serde_json::from_value(json!({
            "0": {"1": [0, 2, 1]}
        }))
        .expect("parse");
        let err = cell_from_plane(plane, |_| true);
        assert!(matches!(err, Err(MeshError::MalformedDocument(_))));
    }

    #[test]
    fn plane_accepts_rotated_copies_of_one_loop() {
        let plane: PlaneData = serde_json::from_value(json!({
            "0": {"1": [0, 1, 2], "2": [0, 2, 3], "3": [0, 3, 1]},
            "1": {"0": [1, 0, 3], "2": [1, 2, 0], "3": [1, 3, 2]},
            "2": {"0": [2, 0, 1], "1": [2, 1, 3], "3": [2, 3, 0]},
            "3": {"0": [3, 0, 2], "1": [3, 1, 0], "2": [3, 2, 1]}
        }))
        .expect("parse");
        let cell = cell_from_plane(plane, |_| true).expect("tetrahedron");
        assert_eq!(cell.faces().count(), 4);
        assert_eq!(cell.plane().count(), 12);
        assert_eq!(
            cell.face(VertexId(1), VertexId(2)),
            Some(&[VertexId(0), VertexId(1), VertexId(2)][..])
        );
    }

    #[test]
    fn plane_missing_entries_is_rejected() {
        let plane: PlaneData = serde_json::from_value(json!({
            "0": {"1": [0, 1, 2], "2": [0, 2, 3], "3": [0, 3, 1]},
            "1": {"3": [1, 3, 2]}
        }))
        .expect("parse");
        let err = cell_from_plane(plane, |_| true);
        assert!(matches!(err, Err(MeshError::MalformedDocument(_))));
    }

    #[test]
    fn coordinates_must_be_numeric() {
        let mut attrs = Attributes::new();
        attrs.insert("x".into(), json!("1.0"));
        assert!(matches!(
            check_coordinates(0, &attrs),
            Err(MeshError::MalformedDocument(msg)) if msg.starts_with("vertex 0")
        ));
        attrs.insert("x".into(), json!(1));
        attrs.insert("label".into(), json!("free-form"));
        assert!(check_coordinates(0, &attrs).is_ok());
    }
}
