//! Bidirectional old→new node id mapping.
//!
//! Produced by one reconciliation or renumbering run and consumed by whoever
//! has to patch references to the renamed ids (edge idrefs inside the
//! sentence, node ids in an alignment document).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{AlignError, AlignResult};

/// One-to-one mapping between original and new node ids.
///
/// Forward and inverse lookups are kept in one structure so they cannot
/// drift apart; insertion order is preserved for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierMapping {
    pairs: Vec<(String, String)>,
    forward: HashMap<String, usize>,
    inverse: HashMap<String, usize>,
}

impl IdentifierMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `old → new`.
    ///
    /// Re-inserting an identical pair is a no-op. Mapping an old id to a
    /// second new id, or two old ids to the same new id, fails with
    /// [`AlignError::MappingConflict`].
    pub fn insert(&mut self, old: impl Into<String>, new: impl Into<String>) -> AlignResult<()> {
        let old = old.into();
        let new = new.into();

        if let Some(&idx) = self.forward.get(&old) {
            let existing = &self.pairs[idx].1;
            if *existing == new {
                return Ok(());
            }
            return Err(AlignError::MappingConflict {
                old,
                new,
                existing: existing.clone(),
            });
        }
        if let Some(&idx) = self.inverse.get(&new) {
            return Err(AlignError::MappingConflict {
                old,
                new,
                existing: self.pairs[idx].0.clone(),
            });
        }

        let idx = self.pairs.len();
        self.forward.insert(old.clone(), idx);
        self.inverse.insert(new.clone(), idx);
        self.pairs.push((old, new));
        Ok(())
    }

    /// New id for `old`, if it was renamed.
    pub fn get(&self, old: &str) -> Option<&str> {
        self.forward.get(old).map(|&idx| self.pairs[idx].1.as_str())
    }

    /// Original id of a renamed node.
    pub fn original_of(&self, new: &str) -> Option<&str> {
        self.inverse.get(new).map(|&idx| self.pairs[idx].0.as_str())
    }

    /// `new` if it was renamed, `id` unchanged otherwise.
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).unwrap_or(id)
    }

    pub fn contains_source(&self, old: &str) -> bool {
        self.forward.contains_key(old)
    }

    /// Whether `id` is already the result of a rename.
    pub fn is_target(&self, id: &str) -> bool {
        self.inverse.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `(old, new)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(o, n)| (o.as_str(), n.as_str()))
    }

    /// Fold another mapping into this one.
    pub fn merge(&mut self, other: IdentifierMapping) -> AlignResult<()> {
        for (old, new) in other.pairs {
            self.insert(old, new)?;
        }
        Ok(())
    }

    /// The reversed mapping.
    pub fn inverted(&self) -> IdentifierMapping {
        IdentifierMapping {
            pairs: self
                .pairs
                .iter()
                .map(|(o, n)| (n.clone(), o.clone()))
                .collect(),
            forward: self.inverse.clone(),
            inverse: self.forward.clone(),
        }
    }
}
