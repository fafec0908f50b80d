//! # Vertex Loops
//!
//! Helpers shared by faces and half-faces: both are oriented cycles of
//! distinct vertex ids.

use crate::{MeshError, VertexId};
use std::collections::BTreeSet;

/// Minimum number of vertices in a face or half-face loop.
pub const MIN_LOOP_LEN: usize = 3;

/// Check a loop against the rules shared by faces and half-faces:
/// at least three entries, no repeated vertex, every vertex known.
pub fn validate_loop(
    vertices: &[VertexId],
    is_known: impl Fn(VertexId) -> bool,
) -> Result<(), MeshError> {
    if vertices.len() < MIN_LOOP_LEN {
        return Err(MeshError::InvalidLoop(format!(
            "loop has {} vertices, need at least {}",
            vertices.len(),
            MIN_LOOP_LEN
        )));
    }
    let mut seen = BTreeSet::new();
    for &vertex in vertices {
        if !seen.insert(vertex) {
            return Err(MeshError::InvalidLoop(format!(
                "vertex {} repeats in loop",
                vertex
            )));
        }
        if !is_known(vertex) {
            return Err(MeshError::InvalidLoop(format!(
                "loop references unknown vertex {}",
                vertex
            )));
        }
    }
    Ok(())
}

/// Directed edges of a loop, wrap-around included.
pub fn directed_edges(vertices: &[VertexId]) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
    let n = vertices.len();
    (0..n).map(move |i| (vertices[i], vertices[(i + 1) % n]))
}

/// The vertex following `vertex` in the loop.
#[must_use]
pub fn successor(vertices: &[VertexId], vertex: VertexId) -> Option<VertexId> {
    let i = vertices.iter().position(|&v| v == vertex)?;
    vertices.get((i + 1) % vertices.len()).copied()
}

/// The vertex preceding `vertex` in the loop.
#[must_use]
pub fn predecessor(vertices: &[VertexId], vertex: VertexId) -> Option<VertexId> {
    let n = vertices.len();
    let i = vertices.iter().position(|&v| v == vertex)?;
    vertices.get((i + n - 1) % n).copied()
}

/// Rotate a loop so that its smallest vertex comes first.
///
/// Two loops describe the same oriented cycle exactly when their rotated
/// forms are equal.
#[must_use]
pub fn rotated_to_min(vertices: &[VertexId]) -> Vec<VertexId> {
    let start = vertices
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| **v)
        .map(|(i, _)| i)
        .unwrap_or(0);
    vertices[start..]
        .iter()
        .chain(&vertices[..start])
        .copied()
        .collect()
}

/// Whether `b` is the same cycle as `a` traversed in the opposite direction.
#[must_use]
pub fn is_reversed(a: &[VertexId], b: &[VertexId]) -> bool {
    let reversed: Vec<VertexId> = b.iter().rev().copied().collect();
    a.len() == b.len() && rotated_to_min(a) == rotated_to_min(&reversed)
}

// =============================================================================
// TESTS
// =============================================================================
