use serde::{Deserialize, Serialize};

/// A rank + name pair read from a roster. Identity is `full_label`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtractedPerson {
    rank: String,
    name: String,
    full_label: String,
}

impl ExtractedPerson {
    #[must_use]
    pub fn new(rank: &str, name: &str) -> Self {
        let rank = normalize_label(rank);
        let name = normalize_label(name);
        let full_label = format!("{rank} {name}");
        Self {
            rank,
            name,
            full_label,
        }
    }

    pub fn rank(&self) -> &str {
        &self.rank
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_label(&self) -> &str {
        &self.full_label
    }
}

impl std::fmt::Display for ExtractedPerson {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_label)
    }
}

/// Uppercase, trimmed, single-spaced. The registry key form of a label.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}
