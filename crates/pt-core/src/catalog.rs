//! Immutable keyed registries for reference data.
//!
//! Cell, motor and propeller libraries are built once, then shared by
//! reference into solver calls. There is no mutation after construction.

use crate::error::{CoreError, CoreResult};
use std::collections::BTreeMap;

/// Read-only map from identifier to record.
#[derive(Debug, Clone)]
pub struct Catalog<T> {
    what: &'static str,
    entries: BTreeMap<String, T>,
}

impl<T> Catalog<T> {
    /// Build a catalog named `what` (used in `NotFound` errors).
    ///
    /// Later duplicates of an identifier replace earlier ones.
    pub fn from_entries<I, K>(what: &'static str, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
    {
        Self {
            what,
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Look up a record.
    pub fn get(&self, id: &str) -> CoreResult<&T> {
        self.entries.get(id).ok_or_else(|| CoreError::NotFound {
            what: self.what,
            id: id.to_string(),
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
