//! # Attribute Keys
//!
//! Direction-independent keys for entities that have no identifier of
//! their own:
//! - `EdgeKey`: an unordered vertex pair, wire form `"u-v"`.
//! - `FaceKey`: the vertex set of a volmesh face, wire form `"a-b-c..."`.
//!
//! These keys address attributes only. Orientation lives in the stored
//! loops (face cycles, half-face loops), which are never looked up through
//! these keys.

use crate::{MeshError, VertexId};
use std::fmt;
use std::str::FromStr;

/// Parse a decimal identifier as it appears in a wire object key.
///
/// Only the canonical rendering is accepted: ASCII digits, no sign, no
/// leading zeros (except `"0"` itself).
pub fn parse_decimal(text: &str) -> Result<u64, MeshError> {
    let canonical = !text.is_empty()
        && text.bytes().all(|b| b.is_ascii_digit())
        && (text == "0" || !text.starts_with('0'));
    if !canonical {
        return Err(MeshError::MalformedDocument(format!(
            "'{}' is not a decimal identifier",
            text
        )));
    }
    text.parse::<u64>()
        .map_err(|e| MeshError::MalformedDocument(format!("'{}': {}", text, e)))
}

fn parse_vertex_list(text: &str) -> Result<Vec<VertexId>, MeshError> {
    text.split('-')
        .map(|part| parse_decimal(part).map(VertexId))
        .collect()
}

// =============================================================================
// EDGE KEY
// =============================================================================

/// Canonical key of an undirected edge.
///
/// `EdgeKey::new(u, v) == EdgeKey::new(v, u)`; the smaller id is stored first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    lo: VertexId,
    hi: VertexId,
}

impl EdgeKey {
    /// Canonicalize the unordered pair `(u, v)`.
    #[must_use]
    pub fn new(u: VertexId, v: VertexId) -> Self {
        if u <= v {
            Self { lo: u, hi: v }
        } else {
            Self { lo: v, hi: u }
        }
    }

    /// The endpoints in canonical (ascending) order.
    #[must_use]
    pub const fn vertices(&self) -> (VertexId, VertexId) {
        (self.lo, self.hi)
    }

    /// Whether `vertex` is one of the endpoints.
    #[must_use]
    pub fn contains(&self, vertex: VertexId) -> bool {
        self.lo == vertex || self.hi == vertex
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lo, self.hi)
    }
}

impl FromStr for EdgeKey {
    type Err = MeshError;

    /// Accepts `"u-v"` in either direction and canonicalizes it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_vertex_list(s)?.as_slice() {
            [u, v] if u != v => Ok(Self::new(*u, *v)),
            _ => Err(MeshError::MalformedDocument(format!(
                "'{}' is not an edge key of the form u-v",
                s
            ))),
        }
    }
}

/// Endpoints an edge attribute may be attached to: two distinct, live
/// vertices. `u-u` has no wire form, so it is refused up front.
pub fn check_edge_endpoints(
    u: VertexId,
    v: VertexId,
    has_vertex: impl Fn(VertexId) -> bool,
) -> Result<(), MeshError> {
    for end in [u, v] {
        if !has_vertex(end) {
            return Err(MeshError::vertex_not_found(end));
        }
    }
    if u == v {
        return Err(MeshError::InvalidLoop(format!(
            "edge {}-{} joins a vertex to itself",
            u, v
        )));
    }
    Ok(())
}

// =============================================================================
// FACE KEY
// =============================================================================

/// Canonical key of a volmesh face: its sorted vertex set.
///
/// Both half-faces of a geometric face shared by two cells map to the same
/// key, so they share one attribute record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaceKey(Vec<VertexId>);

impl FaceKey {
    /// Build the key of a face loop.
    #[must_use]
    pub fn from_loop(vertices: &[VertexId]) -> Self {
        let mut sorted = vertices.to_vec();
        sorted.sort();
        sorted.dedup();
        Self(sorted)
    }

    /// The sorted vertex ids.
    #[must_use]
    pub fn vertices(&self) -> &[VertexId] {
        &self.0
    }

    /// Whether `vertex` belongs to the face.
    #[must_use]
    pub fn contains(&self, vertex: VertexId) -> bool {
        self.0.binary_search(&vertex).is_ok()
    }
}

impl fmt::Display for FaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, vertex) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{}", vertex)?;
        }
        Ok(())
    }
}

impl FromStr for FaceKey {
    type Err = MeshError;

    /// Accepts `id(-id)+` in any order; repeated ids are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let vertices = parse_vertex_list(s)?;
        let key = Self::from_loop(&vertices);
        if vertices.len() < 2 || key.0.len() != vertices.len() {
            return Err(MeshError::MalformedDocument(format!(
                "'{}' is not a face key of the form id(-id)+",
                s
            )));
        }
        Ok(key)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_key_is_direction_independent() {
        let a = EdgeKey::new(VertexId(5), VertexId(2));
        let b = EdgeKey::new(VertexId(2), VertexId(5));
        assert_eq!(a, b);
        assert_eq!(a.vertices(), (VertexId(2), VertexId(5)));
        assert_eq!(a.to_string(), "2-5");
    }

    #[test]
    fn edge_key_parses_either_direction() {
        let forward: EdgeKey = "3-9".parse().expect("parse");
        let backward: EdgeKey = "9-3".parse().expect("parse");
        assert_eq!(forward, backward);
        assert_eq!(backward.to_string(), "3-9");
    }

    #[test]
    fn edge_key_rejects_bad_forms() {
        for bad in ["", "3", "3-", "-3", "3-3", "1-2-3", "01-2", "+1-2", "a-b"] {
            assert!(bad.parse::<EdgeKey>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn decimal_keys_are_strict() {
        assert_eq!(parse_decimal("0").ok(), Some(0));
        assert_eq!(parse_decimal("120").ok(), Some(120));
        assert!(parse_decimal("007").is_err());
        assert!(parse_decimal("-1").is_err());
        assert!(parse_decimal(" 1").is_err());
        assert!(parse_decimal("").is_err());
    }

    #[test]
    fn face_key_sorts_vertices() {
        let key = FaceKey::from_loop(&[VertexId(3), VertexId(0), VertexId(1)]);
        assert_eq!(key.to_string(), "0-1-3");
        assert!(key.contains(VertexId(3)));
        assert!(!key.contains(VertexId(2)));
    }

    #[test]
    fn face_key_parse_round_trips_to_sorted_form() {
        let key: FaceKey = "4-1-2".parse().expect("parse");
        assert_eq!(key.to_string(), "1-2-4");
        assert!("4".parse::<FaceKey>().is_err());
        assert!("1-1".parse::<FaceKey>().is_err());
    }

    #[test]
    fn edge_endpoints_must_be_distinct_and_live() {
        let live = |v: VertexId| v.0 < 3;
        assert!(check_edge_endpoints(VertexId(0), VertexId(2), live).is_ok());
        assert!(matches!(
            check_edge_endpoints(VertexId(1), VertexId(1), live),
            Err(MeshError::InvalidLoop(_))
        ));
        assert!(matches!(
            check_edge_endpoints(VertexId(0), VertexId(7), live),
            Err(MeshError::NotFound { id: 7, .. })
        ));
    }
}
