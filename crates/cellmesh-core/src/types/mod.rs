//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the cellmesh kernel:
//! - Entity identifiers (`VertexId`, `FaceId`, `CellId`)
//! - Entity kinds (`EntityKind`)
//! - Attribute dictionaries (`Attributes`)
//! - Error types (`MeshError`)
//!
//! ## Identifier Guarantees
//!
//! Identifiers are plain integers issued from per-kind high-water marks.
//! They implement `Ord` so every container in the kernel can be a
//! `BTreeMap`/`BTreeSet` with deterministic iteration order.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Free-form attribute dictionary attached to an entity, a default table,
/// or a whole mesh. Key order is preserved across a round trip.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// ENTITY IDENTIFIERS
// =============================================================================

/// Identifier of a vertex, unique within one mesh instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub u64);

/// Identifier of a face of a halfedge mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaceId(pub u64);

/// Identifier of a cell of a halfface volmesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId(pub u64);

macro_rules! id_display {
    ($($name:ident),*) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )*
    };
}

id_display!(VertexId, FaceId, CellId);

// =============================================================================
// ENTITY KIND
// =============================================================================

/// The kinds of entity that carry attributes or identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Vertex,
    Edge,
    Face,
    Cell,
}

impl EntityKind {
    /// Lowercase name used in error messages and CLI output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Edge => "edge",
            Self::Face => "face",
            Self::Cell => "cell",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors reported by the kernel.
///
/// Every failure is explicit. A failed operation leaves the structure it
/// was called on unchanged, and a failed load produces no structure at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    /// The operation referenced an entity id absent from the structure.
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: u64 },

    /// A face or half-face loop is too short, repeats a vertex, or
    /// references an unknown vertex. Also raised for an edge from a vertex
    /// to itself.
    #[error("Invalid loop: {0}")]
    InvalidLoop(String),

    /// A vertex coordinate (`x`, `y`, `z`) was given a non-numeric value.
    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    /// The high-water mark of a kind has no identifier left to issue.
    #[error("{0} identifiers exhausted")]
    IdsExhausted(EntityKind),

    /// A cell has too few faces or repeats a directed edge across its faces.
    #[error("Degenerate cell: {0}")]
    DegenerateCell(String),

    /// A wire document violates the schema: missing key, bad key pattern,
    /// type mismatch, or broken topology.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Reading or writing a document on disk failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl MeshError {
    /// Shorthand for a missing vertex.
    #[must_use]
    pub const fn vertex_not_found(id: VertexId) -> Self {
        Self::NotFound {
            kind: EntityKind::Vertex,
            id: id.0,
        }
    }

    /// Shorthand for a missing face.
    #[must_use]
    pub const fn face_not_found(id: FaceId) -> Self {
        Self::NotFound {
            kind: EntityKind::Face,
            id: id.0,
        }
    }

    /// Shorthand for a missing cell.
    #[must_use]
    pub const fn cell_not_found(id: CellId) -> Self {
        Self::NotFound {
            kind: EntityKind::Cell,
            id: id.0,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_as_plain_decimal() {
        assert_eq!(VertexId(0).to_string(), "0");
        assert_eq!(FaceId(42).to_string(), "42");
        assert_eq!(CellId(7).to_string(), "7");
    }

    #[test]
    fn ids_order_numerically() {
        let mut ids = vec![VertexId(10), VertexId(2), VertexId(33)];
        ids.sort();
        assert_eq!(ids, vec![VertexId(2), VertexId(10), VertexId(33)]);
    }

    #[test]
    fn not_found_message_names_kind() {
        let err = MeshError::face_not_found(FaceId(3));
        assert_eq!(err.to_string(), "face not found: 3");
        assert!(matches!(
            err,
            MeshError::NotFound {
                kind: EntityKind::Face,
                id: 3
            }
        ));
    }

    #[test]
    fn exhausted_message_names_kind() {
        let err = MeshError::IdsExhausted(EntityKind::Cell);
        assert_eq!(err.to_string(), "cell identifiers exhausted");
    }
}
