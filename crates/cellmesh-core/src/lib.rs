//! # cellmesh-core
//!
//! The topological kernel for cellmesh.
//!
//! Two mesh structures share one vocabulary of identifiers, attribute
//! stores and vertex loops:
//! - `HalfedgeMesh`: polygonal surfaces, faces as oriented vertex cycles
//! - `HalffaceVolMesh`: polyhedral volumes, cells as closed sets of
//!   oriented half-face loops
//!
//! Both read and write an exact JSON document format (`formats` module).
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: NO async, NO network, NO file I/O (the app layer does that)
//! - Deterministic: every container is a `BTreeMap`/`BTreeSet`
//! - Stable identifiers: issued from per-kind high-water marks, never reused
//! - Single-threaded: callers wrap a mesh in their own lock if they share it

// =============================================================================
// MODULES
// =============================================================================

pub mod attributes;
pub mod formats;
pub mod ids;
pub mod keys;
pub mod loops;
pub mod mesh;
pub mod types;
pub mod volmesh;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Attributes, CellId, EntityKind, FaceId, MeshError, VertexId};

// =============================================================================
// RE-EXPORTS: Kernel
// =============================================================================

pub use attributes::AttributeStore;
pub use ids::{IdAllocator, NO_ID};
pub use keys::{EdgeKey, FaceKey};
pub use mesh::HalfedgeMesh;
pub use volmesh::{Cell, HalffaceVolMesh};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{
    Document, DocumentKind, MAX_DOCUMENT_SIZE, MeshData, SCHEMA_VERSION, VolMeshData,
    mesh_from_json, mesh_to_json, volmesh_from_json, volmesh_to_json,
};
