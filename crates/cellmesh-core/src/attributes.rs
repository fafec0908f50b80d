//! # Attribute Store
//!
//! Per-entity key/value dictionaries with a shared default table.
//!
//! One store exists per entity kind of a mesh (vertex, edge, face, cell).
//! A lookup returns the entity's override if present, else the default,
//! else nothing. Absence is a normal outcome and never an error.
//!
//! Changing a default never writes into existing override records, so an
//! entity that never overrode a key follows the default as it changes.

use crate::{Attributes, MeshError};
use serde_json::Value;
use std::collections::BTreeMap;

/// Two-level attribute storage: a default table plus per-entity overrides.
///
/// `K` is the entity key: a typed id for vertices, faces and cells, or a
/// canonical key for edges and volmesh faces.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeStore<K: Ord> {
    /// Fallback values shared by every entity of this kind.
    defaults: Attributes,

    /// Override records: entity -> key -> value.
    overrides: BTreeMap<K, Attributes>,
}

impl<K: Ord> Default for AttributeStore<K> {
    fn default() -> Self {
        Self {
            defaults: Attributes::new(),
            overrides: BTreeMap::new(),
        }
    }
}

impl<K: Ord> AttributeStore<K> {
    /// Create an empty store with no defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a default table.
    #[must_use]
    pub fn with_defaults(defaults: Attributes) -> Self {
        Self {
            defaults,
            overrides: BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Resolve `key` for entity `id`: override, then default, then `None`.
    #[must_use]
    pub fn get(&self, id: &K, key: &str) -> Option<&Value> {
        self.overrides
            .get(id)
            .and_then(|record| record.get(key))
            .or_else(|| self.defaults.get(key))
    }

    /// Default value for `key`, ignoring any override.
    #[must_use]
    pub fn get_default(&self, key: &str) -> Option<&Value> {
        self.defaults.get(key)
    }

    /// The full default table.
    #[must_use]
    pub fn defaults(&self) -> &Attributes {
        &self.defaults
    }

    /// The raw override record of `id`, without defaults.
    #[must_use]
    pub fn overrides(&self, id: &K) -> Option<&Attributes> {
        self.overrides.get(id)
    }

    /// Merged view of `id`: the default table overlaid by the override record.
    #[must_use]
    pub fn attributes(&self, id: &K) -> Attributes {
        let mut merged = self.defaults.clone();
        if let Some(record) = self.overrides.get(id) {
            for (key, value) in record {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }

    /// Whether `id` has an override record (possibly empty).
    #[must_use]
    pub fn contains(&self, id: &K) -> bool {
        self.overrides.contains_key(id)
    }

    /// Override records in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Attributes)> {
        self.overrides.iter()
    }

    /// Number of override records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Whether there are no override records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Set an override for `id`, creating its record if needed.
    pub fn set(&mut self, id: K, key: impl Into<String>, value: Value) {
        self.overrides
            .entry(id)
            .or_default()
            .insert(key.into(), value);
    }

    /// Remove an override from `id`. The record itself stays, even if empty.
    pub fn unset(&mut self, id: &K, key: &str) -> Option<Value> {
        self.overrides
            .get_mut(id)
            .and_then(|record| record.remove(key))
    }

    /// Set a default value. Existing override records are left untouched.
    pub fn set_default(&mut self, key: impl Into<String>, value: Value) {
        self.defaults.insert(key.into(), value);
    }

    /// Replace the whole override record of `id`.
    pub fn insert_record(&mut self, id: K, record: Attributes) {
        self.overrides.insert(id, record);
    }

    /// Make sure `id` has a record, leaving an existing one untouched.
    pub fn ensure(&mut self, id: K) {
        self.overrides.entry(id).or_default();
    }

    /// Drop the override record of `id`.
    pub fn remove(&mut self, id: &K) -> Option<Attributes> {
        self.overrides.remove(id)
    }

    /// Keep only the records whose key satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.overrides.retain(|id, _| keep(id));
    }
}

// =============================================================================
// VERTEX COORDINATES
// =============================================================================

/// Vertex keys that must hold numbers whenever they are present.
pub const COORDINATE_KEYS: [&str; 3] = ["x", "y", "z"];

/// Reject a non-numeric value for a coordinate key. Other keys are free-form.
pub fn check_vertex_value(key: &str, value: &Value) -> Result<(), MeshError> {
    if COORDINATE_KEYS.contains(&key) && !value.is_number() {
        return Err(MeshError::InvalidAttribute(format!(
            "'{}' is not a number: {}",
            key, value
        )));
    }
    Ok(())
}

/// Check every entry of a vertex record (or of the vertex defaults).
pub fn check_vertex_record(attrs: &Attributes) -> Result<(), MeshError> {
    attrs
        .iter()
        .try_for_each(|(key, value)| check_vertex_value(key, value))
}

// =============================================================================
// TESTS
// =============================================================================
