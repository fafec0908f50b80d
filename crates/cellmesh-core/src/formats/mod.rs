//! # Document Formats
//!
//! JSON text for halfedge meshes and halfface volmeshes.
//!
//! This is a pure transformation layer; file I/O lives in the app layer.
//! The document size is validated before any parsing takes place.

pub mod wire;

pub use wire::{KeyedMap, MeshData, PlaneData, VolMeshData, WireId};

use crate::{HalfedgeMesh, HalffaceVolMesh, MeshError};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Schema version of the documents read and written here.
pub const SCHEMA_VERSION: &str = "1.7.1";

/// Maximum accepted document size in bytes (500 MB).
pub const MAX_DOCUMENT_SIZE: usize = 500 * 1024 * 1024;

// =============================================================================
// DOCUMENT KIND
// =============================================================================

/// Which structure a document describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Mesh,
    VolMesh,
}

impl DocumentKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::VolMesh => "volmesh",
        }
    }

    /// Classify a parsed document: a `cell` key marks a volmesh, a `face`
    /// key a halfedge mesh.
    pub fn detect(value: &Value) -> Result<Self, MeshError> {
        let object = value.as_object().ok_or_else(|| {
            MeshError::MalformedDocument("document is not a JSON object".to_string())
        })?;
        if object.contains_key("cell") {
            Ok(Self::VolMesh)
        } else if object.contains_key("face") {
            Ok(Self::Mesh)
        } else {
            Err(MeshError::MalformedDocument(
                "document has neither 'face' nor 'cell'".to_string(),
            ))
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// TEXT CONVERSIONS
// =============================================================================

fn check_size(len: usize) -> Result<(), MeshError> {
    if len > MAX_DOCUMENT_SIZE {
        return Err(MeshError::MalformedDocument(format!(
            "document size {} bytes exceeds maximum allowed {} bytes",
            len, MAX_DOCUMENT_SIZE
        )));
    }
    Ok(())
}

fn parse_error(err: serde_json::Error) -> MeshError {
    MeshError::MalformedDocument(format!("invalid document: {}", err))
}

fn render<T: Serialize>(data: &T, pretty: bool) -> Result<String, MeshError> {
    let text = if pretty {
        serde_json::to_string_pretty(data)
    } else {
        serde_json::to_string(data)
    };
    text.map_err(|e| MeshError::MalformedDocument(format!("failed to serialize: {}", e)))
}

/// Serialize a halfedge mesh.
pub fn mesh_to_json(mesh: &HalfedgeMesh, pretty: bool) -> Result<String, MeshError> {
    render(&MeshData::from(mesh), pretty)
}

/// Parse a halfedge mesh document.
pub fn mesh_from_json(text: &str) -> Result<HalfedgeMesh, MeshError> {
    check_size(text.len())?;
    let data: MeshData = serde_json::from_str(text).map_err(parse_error)?;
    HalfedgeMesh::try_from(data)
}

/// Serialize a halfface volmesh.
pub fn volmesh_to_json(mesh: &HalffaceVolMesh, pretty: bool) -> Result<String, MeshError> {
    render(&VolMeshData::from(mesh), pretty)
}

/// Parse a halfface volmesh document.
pub fn volmesh_from_json(text: &str) -> Result<HalffaceVolMesh, MeshError> {
    check_size(text.len())?;
    let data: VolMeshData = serde_json::from_str(text).map_err(parse_error)?;
    HalffaceVolMesh::try_from(data)
}

// =============================================================================
// EITHER DOCUMENT
// =============================================================================

/// A loaded document of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Mesh(HalfedgeMesh),
    VolMesh(HalffaceVolMesh),
}

impl Document {
    /// Parse a document, picking the structure from its keys.
    pub fn from_json(text: &str) -> Result<Self, MeshError> {
        check_size(text.len())?;
        let value: Value = serde_json::from_str(text).map_err(parse_error)?;
        match DocumentKind::detect(&value)? {
            DocumentKind::Mesh => {
                let data: MeshData = serde_json::from_value(value).map_err(parse_error)?;
                HalfedgeMesh::try_from(data).map(Self::Mesh)
            }
            DocumentKind::VolMesh => {
                let data: VolMeshData = serde_json::from_value(value).map_err(parse_error)?;
                HalffaceVolMesh::try_from(data).map(Self::VolMesh)
            }
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, MeshError> {
        match self {
            Self::Mesh(mesh) => mesh_to_json(mesh, pretty),
            Self::VolMesh(mesh) => volmesh_to_json(mesh, pretty),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> DocumentKind {
        match self {
            Self::Mesh(_) => DocumentKind::Mesh,
            Self::VolMesh(_) => DocumentKind::VolMesh,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
