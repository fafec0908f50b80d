//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands, plus
//! the file I/O the kernel leaves to the app layer.

use super::{Context, QueryKind};
use cellmesh_core::{
    CellId, Document, EntityKind, FaceId, HalfedgeMesh, HalffaceVolMesh, MeshError, VertexId,
};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), MeshError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| MeshError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(MeshError::MalformedDocument(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path and make sure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, MeshError> {
    let canonical = path.canonicalize().map_err(|e| {
        MeshError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(MeshError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path: its parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, MeshError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        MeshError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(MeshError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| MeshError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// DOCUMENT I/O
// =============================================================================

/// Read and parse a document of either kind.
pub fn load_document(path: &Path, max_size: u64) -> Result<Document, MeshError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, max_size)?;

    let text = std::fs::read_to_string(&path)
        .map_err(|e| MeshError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;
    let document = Document::from_json(&text)?;

    tracing::debug!(path = %path.display(), kind = %document.kind(), "loaded document");
    Ok(document)
}

/// Serialize a document to `path`.
pub fn save_document(path: &Path, document: &Document, pretty: bool) -> Result<(), MeshError> {
    let path = validate_output_path(path)?;
    let text = document.to_json(pretty)?;

    std::fs::write(&path, text)
        .map_err(|e| MeshError::Io(format!("Cannot write '{}': {}", path.display(), e)))?;

    tracing::info!(path = %path.display(), kind = %document.kind(), "wrote document");
    Ok(())
}

// =============================================================================
// REPORTS
// =============================================================================

/// Kind, live counts and identifier marks of a document.
pub fn document_info(document: &Document) -> Value {
    match document {
        Document::Mesh(mesh) => json!({
            "kind": document.kind().name(),
            "vertices": mesh.vertex_count(),
            "edges": mesh.edge_count(),
            "faces": mesh.face_count(),
            "max_vertex": mesh.ids().peek_max(EntityKind::Vertex),
            "max_face": mesh.ids().peek_max(EntityKind::Face),
        }),
        Document::VolMesh(mesh) => json!({
            "kind": document.kind().name(),
            "vertices": mesh.vertex_count(),
            "cells": mesh.cell_count(),
            "max_vertex": mesh.ids().peek_max(EntityKind::Vertex),
            "max_face": mesh.ids().peek_max(EntityKind::Face),
            "max_cell": mesh.ids().peek_max(EntityKind::Cell),
        }),
    }
}

fn vertex_list<'a>(vertices: impl IntoIterator<Item = &'a VertexId>) -> Value {
    json!(vertices.into_iter().map(|v| v.0).collect::<Vec<_>>())
}

fn wrong_kind(query: &QueryKind, needed: &str) -> MeshError {
    MeshError::MalformedDocument(format!(
        "query '{}' needs a {} document",
        query.name(),
        needed
    ))
}

fn mesh_query(mesh: &HalfedgeMesh, query: &QueryKind) -> Result<Value, MeshError> {
    match *query {
        QueryKind::VertexNeighbors { vertex } => {
            Ok(vertex_list(&mesh.vertex_neighbors(VertexId(vertex))?))
        }
        QueryKind::VertexRing { vertex } => Ok(vertex_list(&mesh.vertex_ring(VertexId(vertex))?)),
        QueryKind::FaceVertices { face } => Ok(vertex_list(mesh.face_vertices(FaceId(face))?)),
        _ => Err(wrong_kind(query, "volmesh")),
    }
}

fn volmesh_query(mesh: &HalffaceVolMesh, query: &QueryKind) -> Result<Value, MeshError> {
    match *query {
        QueryKind::CellFace { cell, u, v } => {
            let cell = CellId(cell);
            mesh.cell(cell)?;
            Ok(mesh
                .cell_face(cell, VertexId(u), VertexId(v))
                .map_or(Value::Null, |face| vertex_list(face)))
        }
        QueryKind::CellFaces { cell } => {
            let faces = mesh.cell_faces(CellId(cell))?;
            Ok(Value::Array(faces.into_iter().map(|face| vertex_list(face)).collect()))
        }
        QueryKind::CellVertices { cell } => {
            Ok(vertex_list(&mesh.cell_vertices(CellId(cell))?))
        }
        QueryKind::CellNeighbors { cell } => {
            let cells = mesh.cell_neighbors(CellId(cell))?;
            Ok(json!(cells.iter().map(|c| c.0).collect::<Vec<_>>()))
        }
        _ => Err(wrong_kind(query, "mesh")),
    }
}

/// Answer a query against a loaded document.
pub fn run_query(document: &Document, query: &QueryKind) -> Result<Value, MeshError> {
    match document {
        Document::Mesh(mesh) => mesh_query(mesh, query),
        Document::VolMesh(mesh) => volmesh_query(mesh, query),
    }
}

fn print_value(ctx: &Context, value: &Value) {
    if ctx.json {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", value),
        }
    } else {
        println!("{}", value);
    }
}

// =============================================================================
// INFO COMMAND
// =============================================================================

/// Show document kind, live counts and identifier marks.
pub fn cmd_info(ctx: &Context, file: &Path) -> Result<(), MeshError> {
    let document = load_document(file, ctx.max_file_size)?;
    let info = document_info(&document);

    if ctx.json {
        print_value(ctx, &info);
        return Ok(());
    }

    println!("Document: {}", file.display());
    if let Some(fields) = info.as_object() {
        for (key, value) in fields {
            println!("  {:<11} {}", format!("{}:", key), value);
        }
    }
    Ok(())
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Load a document and report the outcome.
pub fn cmd_validate(ctx: &Context, file: &Path) -> Result<(), MeshError> {
    match load_document(file, ctx.max_file_size) {
        Ok(document) => {
            if ctx.json {
                print_value(ctx, &json!({"valid": true, "kind": document.kind().name()}));
            } else if !ctx.quiet {
                println!("ok: {} ({})", file.display(), document.kind());
            }
            Ok(())
        }
        Err(e) => {
            if ctx.json {
                print_value(ctx, &json!({"valid": false, "error": e.to_string()}));
            }
            Err(e)
        }
    }
}

// =============================================================================
// FORMAT COMMAND
// =============================================================================

/// Rewrite a document in canonical form.
pub fn cmd_format(
    ctx: &Context,
    file: &Path,
    output: Option<&Path>,
    pretty: bool,
) -> Result<(), MeshError> {
    let document = load_document(file, ctx.max_file_size)?;
    let pretty = pretty || ctx.pretty;

    match output {
        Some(path) => {
            save_document(path, &document, pretty)?;
            if !ctx.quiet && !ctx.json {
                println!("Formatted {} -> {}", file.display(), path.display());
            }
        }
        None => println!("{}", document.to_json(pretty)?),
    }
    Ok(())
}

// =============================================================================
// QUERY COMMAND
// =============================================================================

/// Run an adjacency query.
pub fn cmd_query(ctx: &Context, file: &Path, query: &QueryKind) -> Result<(), MeshError> {
    let document = load_document(file, ctx.max_file_size)?;
    let result = run_query(&document, query)?;

    if ctx.json {
        print_value(ctx, &json!({"query": query.name(), "result": result}));
    } else {
        println!("{}: {}", query.name(), result);
    }
    Ok(())
}
