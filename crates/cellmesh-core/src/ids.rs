//! # Identifier Allocator
//!
//! Monotonic identifier issuance with one high-water mark per kind.
//!
//! Each mark starts at `-1` ("nothing issued yet"). Issuing an identifier
//! increments the mark and returns the new value. The allocator has no
//! notion of deletion, so an identifier is never handed out twice.

use crate::{CellId, EntityKind, FaceId, MeshError, VertexId};

/// Value of a high-water mark before any identifier has been issued.
pub const NO_ID: i64 = -1;

/// Per-kind high-water marks for vertices, faces and cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdAllocator {
    max_vertex: i64,
    max_face: i64,
    max_cell: i64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self {
            max_vertex: NO_ID,
            max_face: NO_ID,
            max_cell: NO_ID,
        }
    }
}

impl IdAllocator {
    /// Create an allocator with nothing issued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: EntityKind) -> Option<i64> {
        match kind {
            EntityKind::Vertex => Some(self.max_vertex),
            EntityKind::Face => Some(self.max_face),
            EntityKind::Cell => Some(self.max_cell),
            EntityKind::Edge => None,
        }
    }

    fn slot_mut(&mut self, kind: EntityKind) -> Result<&mut i64, MeshError> {
        match kind {
            EntityKind::Vertex => Ok(&mut self.max_vertex),
            EntityKind::Face => Ok(&mut self.max_face),
            EntityKind::Cell => Ok(&mut self.max_cell),
            EntityKind::Edge => Err(MeshError::MalformedDocument(
                "edges carry no identifiers".to_string(),
            )),
        }
    }

    fn bump(slot: &mut i64, kind: EntityKind) -> Result<u64, MeshError> {
        let next = slot.checked_add(1).ok_or(MeshError::IdsExhausted(kind))?;
        *slot = next;
        Ok(next as u64)
    }

    /// Issue the next identifier of `kind`.
    ///
    /// Fails once the mark reaches `i64::MAX`. Edges are keyed by their
    /// endpoints and never consume identifiers.
    pub fn next(&mut self, kind: EntityKind) -> Result<u64, MeshError> {
        Self::bump(self.slot_mut(kind)?, kind)
    }

    /// Issue the next vertex identifier.
    pub fn next_vertex(&mut self) -> Result<VertexId, MeshError> {
        Self::bump(&mut self.max_vertex, EntityKind::Vertex).map(VertexId)
    }

    /// Issue the next face identifier.
    pub fn next_face(&mut self) -> Result<FaceId, MeshError> {
        Self::bump(&mut self.max_face, EntityKind::Face).map(FaceId)
    }

    /// Issue the next cell identifier.
    pub fn next_cell(&mut self) -> Result<CellId, MeshError> {
        Self::bump(&mut self.max_cell, EntityKind::Cell).map(CellId)
    }

    /// Current high-water mark of `kind`, `-1` if nothing was issued.
    #[must_use]
    pub fn peek_max(&self, kind: EntityKind) -> i64 {
        self.slot(kind).unwrap_or(NO_ID)
    }

    /// Restore a high-water mark read from a document.
    ///
    /// The mark may only move forward: values below `-1` or below the
    /// current mark are rejected, which keeps restored marks at or above
    /// every identifier already present.
    pub fn restore(&mut self, kind: EntityKind, max: i64) -> Result<(), MeshError> {
        if max < NO_ID {
            return Err(MeshError::MalformedDocument(format!(
                "max_{} must be >= -1, got {}",
                kind, max
            )));
        }
        let slot = self.slot_mut(kind)?;
        if max < *slot {
            return Err(MeshError::MalformedDocument(format!(
                "max_{} = {} is below existing identifier {}",
                kind, max, *slot
            )));
        }
        *slot = max;
        Ok(())
    }

    /// Raise the mark of `kind` so that `id` counts as issued.
    pub(crate) fn observe(&mut self, kind: EntityKind, id: u64) {
        if let Ok(slot) = self.slot_mut(kind) {
            let id = i64::try_from(id).unwrap_or(i64::MAX);
            if id > *slot {
                *slot = id;
            }
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
    fn starts_at_minus_one() {
        let ids = IdAllocator::new();
        assert_eq!(ids.peek_max(EntityKind::Vertex), -1);
        assert_eq!(ids.peek_max(EntityKind::Face), -1);
        assert_eq!(ids.peek_max(EntityKind::Cell), -1);
    }

    #[test]
    fn kinds_count_independently() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next(EntityKind::Vertex), Ok(0));
        assert_eq!(ids.next(EntityKind::Vertex), Ok(1));
        assert_eq!(ids.next_face(), Ok(FaceId(0)));
        assert_eq!(ids.peek_max(EntityKind::Vertex), 1);
        assert_eq!(ids.peek_max(EntityKind::Face), 0);
        assert_eq!(ids.peek_max(EntityKind::Cell), -1);
    }

    #[test]
    fn edges_have_no_counter() {
        let mut ids = IdAllocator::new();
        assert!(ids.next(EntityKind::Edge).is_err());
        assert_eq!(ids.peek_max(EntityKind::Edge), -1);
    }

    #[test]
    fn restore_only_moves_forward() {
        let mut ids = IdAllocator::new();
        ids.observe(EntityKind::Cell, 4);
        assert!(ids.restore(EntityKind::Cell, 3).is_err());
        assert!(ids.restore(EntityKind::Cell, 9).is_ok());
        assert_eq!(ids.next(EntityKind::Cell), Ok(10));
    }

    #[test]
    fn restore_rejects_below_minus_one() {
        let mut ids = IdAllocator::new();
        let err = ids.restore(EntityKind::Vertex, -2);
        assert!(matches!(err, Err(MeshError::MalformedDocument(_))));
    }

    #[test]
    fn observe_never_lowers() {
        let mut ids = IdAllocator::new();
        ids.observe(EntityKind::Vertex, 7);
        ids.observe(EntityKind::Vertex, 2);
        assert_eq!(ids.peek_max(EntityKind::Vertex), 7);
    }

    #[test]
    fn exhausted_mark_issues_nothing() {
        let mut ids = IdAllocator::new();
        ids.restore(EntityKind::Vertex, i64::MAX - 1).expect("restore");
        assert_eq!(ids.next_vertex(), Ok(VertexId(i64::MAX as u64)));
        assert_eq!(
            ids.next_vertex(),
            Err(MeshError::IdsExhausted(EntityKind::Vertex))
        );
        assert_eq!(ids.peek_max(EntityKind::Vertex), i64::MAX);
        assert!(ids.next_face().is_ok());
    }
}
