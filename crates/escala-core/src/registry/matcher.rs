use serde::{Deserialize, Serialize};

use super::{RegistryEntry, RegistryStore};
use crate::ingest::RankVocabulary;
use crate::person::normalize_label;

/// Minimum Jaro-Winkler similarity for a "did you mean" hint.
pub const SUGGESTION_THRESHOLD: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Tail,
}

impl MatchKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Tail => "tail",
        }
    }
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult<'r> {
    Resolved {
        entry: &'r RegistryEntry,
        kind: MatchKind,
    },
    NoMatch,
}

impl<'r> MatchResult<'r> {
    pub const fn entry(&self) -> Option<&'r RegistryEntry> {
        match self {
            Self::Resolved { entry, .. } => Some(*entry),
            Self::NoMatch => None,
        }
    }

    pub const fn kind(&self) -> Option<MatchKind> {
        match self {
            Self::Resolved { kind, .. } => Some(*kind),
            Self::NoMatch => None,
        }
    }

    pub const fn is_no_match(&self) -> bool {
        matches!(self, Self::NoMatch)
    }
}

pub trait LabelResolver: Send + Sync {
    fn kind(&self) -> MatchKind;

    /// `label` is already normalized.
    fn find_match<'r>(
        &self,
        label: &str,
        registry: &'r dyn RegistryStore,
    ) -> Option<&'r RegistryEntry>;
}

pub struct ExactLabelResolver;

impl LabelResolver for ExactLabelResolver {
    fn kind(&self) -> MatchKind {
        MatchKind::Exact
    }

    fn find_match<'r>(
        &self,
        label: &str,
        registry: &'r dyn RegistryStore,
    ) -> Option<&'r RegistryEntry> {
        registry.lookup_exact(label)
    }
}

/// Matches on the name alone; ranks drift between rosters and registrations.
pub struct TailLabelResolver {
    vocabulary: RankVocabulary,
}

impl TailLabelResolver {
    #[must_use]
    pub const fn new(vocabulary: RankVocabulary) -> Self {
        Self { vocabulary }
    }

    /// Words after the leading rank. A known rank is stripped whole
    /// (`SUB TEN SILVA` -> `SILVA`); otherwise the first word is dropped.
    pub fn tail<'a>(&self, label: &'a str) -> Vec<&'a str> {
        match self.vocabulary.split_rank(label) {
            Some((_, tail)) => tail,
            None => label.split_whitespace().skip(1).collect(),
        }
    }
}

impl LabelResolver for TailLabelResolver {
    fn kind(&self) -> MatchKind {
        MatchKind::Tail
    }

    fn find_match<'r>(
        &self,
        label: &str,
        registry: &'r dyn RegistryStore,
    ) -> Option<&'r RegistryEntry> {
        let query = self.tail(label);
        if query.is_empty() {
            return None;
        }

        registry
            .iter_entries()
            .find(|entry| self.tail(&entry.canonical_label) == query)
    }
}

/// Exact label first, then name tail. First hit in registry order wins.
pub struct RegistryMatcher {
    resolvers: Vec<Box<dyn LabelResolver>>,
    tail: TailLabelResolver,
}

impl RegistryMatcher {
    #[must_use]
    pub fn new(vocabulary: RankVocabulary) -> Self {
        Self {
            resolvers: vec![
                Box::new(ExactLabelResolver),
                Box::new(TailLabelResolver::new(vocabulary.clone())),
            ],
            tail: TailLabelResolver::new(vocabulary),
        }
    }

    pub fn resolve<'r>(&self, label: &str, registry: &'r dyn RegistryStore) -> MatchResult<'r> {
        let label = normalize_label(label);
        if label.is_empty() {
            return MatchResult::NoMatch;
        }

        for resolver in &self.resolvers {
            if let Some(entry) = resolver.find_match(&label, registry) {
                tracing::debug!(
                    "{} resolved to {} ({})",
                    label,
                    entry.canonical_label,
                    resolver.kind()
                );
                return MatchResult::Resolved {
                    entry,
                    kind: resolver.kind(),
                };
            }
        }

        tracing::debug!("{} is not registered", label);
        MatchResult::NoMatch
    }

    /// Most similar registered name at or above `threshold`; a hint only.
    pub fn closest<'r>(
        &self,
        label: &str,
        registry: &'r dyn RegistryStore,
        threshold: f64,
    ) -> Option<(&'r RegistryEntry, f64)> {
        let label = normalize_label(label);
        let query = self.tail.tail(&label).join(" ");
        if query.is_empty() {
            return None;
        }

        let mut best: Option<(&RegistryEntry, f64)> = None;
        for entry in registry.iter_entries() {
            let candidate = self.tail.tail(&entry.canonical_label).join(" ");
            if candidate.is_empty() {
                continue;
            }
            let score = strsim::jaro_winkler(&query, &candidate);
            if score >= threshold && best.map_or(true, |(_, s)| score > s) {
                best = Some((entry, score));
            }
        }

        best
    }
}

impl Default for RegistryMatcher {
    fn default() -> Self {
        Self::new(RankVocabulary::military())
    }
}
