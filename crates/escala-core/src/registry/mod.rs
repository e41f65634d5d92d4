mod matcher;

pub use matcher::{
    ExactLabelResolver, LabelResolver, MatchKind, MatchResult, RegistryMatcher,
    TailLabelResolver, SUGGESTION_THRESHOLD,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::person::normalize_label;
use crate::{Error, Result};

/// Messaging endpoint handle of an enrolled person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(pub i64);

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ExternalId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub canonical_label: String,
    pub external_id: ExternalId,
    pub display_name: String,
    pub registered_at: DateTime<Utc>,
}

impl RegistryEntry {
    #[must_use]
    pub fn new(label: &str, external_id: ExternalId) -> Self {
        Self {
            canonical_label: normalize_label(label),
            external_id,
            display_name: label.trim().to_string(),
            registered_at: Utc::now(),
        }
    }
}

/// Read side of the recipient registry, as seen by the matcher.
pub trait RegistryStore: Send + Sync {
    fn lookup_exact(&self, label: &str) -> Option<&RegistryEntry>;

    /// Entries in registration order.
    fn iter_entries(&self) -> Box<dyn Iterator<Item = &RegistryEntry> + '_>;

    fn len(&self) -> usize {
        self.iter_entries().count()
    }

    fn is_empty(&self) -> bool {
        self.iter_entries().next().is_none()
    }
}

/// In-memory registry keyed by canonical label, kept in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<RegistryEntry>", into = "Vec<RegistryEntry>")]
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the label is already taken.
    pub fn register(&mut self, label: &str, external_id: ExternalId) -> Result<bool> {
        let entry = RegistryEntry::new(label, external_id);
        if entry.canonical_label.is_empty() {
            return Err(Error::InvalidLabel(label.to_string()));
        }
        if self.lookup_exact(&entry.canonical_label).is_some() {
            return Ok(false);
        }

        tracing::info!(
            "Registered {} for {}",
            entry.canonical_label,
            entry.external_id
        );
        self.entries.push(entry);
        Ok(true)
    }

    pub fn remove_by_external_id(&mut self, external_id: ExternalId) -> Option<RegistryEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.external_id == external_id)?;
        let removed = self.entries.remove(index);
        tracing::info!("Removed {} for {}", removed.canonical_label, external_id);
        Some(removed)
    }

    pub fn find_by_external_id(&self, external_id: ExternalId) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.external_id == external_id)
    }
}

impl RegistryStore for Registry {
    fn lookup_exact(&self, label: &str) -> Option<&RegistryEntry> {
        let label = normalize_label(label);
        self.entries.iter().find(|e| e.canonical_label == label)
    }

    fn iter_entries(&self) -> Box<dyn Iterator<Item = &RegistryEntry> + '_> {
        Box::new(self.entries.iter())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

impl From<Vec<RegistryEntry>> for Registry {
    /// Re-normalizes labels and keeps the first entry per label.
    fn from(entries: Vec<RegistryEntry>) -> Self {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .map(|mut e| {
                e.canonical_label = normalize_label(&e.canonical_label);
                e
            })
            .filter(|e| {
                let unique = !e.canonical_label.is_empty() && seen.insert(e.canonical_label.clone());
                if !unique {
                    tracing::warn!("Dropping duplicate registry entry {:?}", e.canonical_label);
                }
                unique
            })
            .collect();
        Self { entries }
    }
}

impl From<Registry> for Vec<RegistryEntry> {
    fn from(registry: Registry) -> Self {
        registry.entries
    }
}
