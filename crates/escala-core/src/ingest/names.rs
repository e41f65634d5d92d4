use regex::Regex;
use std::collections::HashSet;

use super::text::ExtractionResult;
use crate::person::{normalize_label, ExtractedPerson};

pub const MIN_NAME_CHARS: usize = 2;

/// Structural roster vocabulary; a captured "name" containing one of these is boilerplate.
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "ESCALA", "PLANTAO", "PLANTÃO", "DATA", "HORA", "LOCAL", "SERVICO", "SERVIÇO",
];

/// Military police ranks, senior officer down to private.
pub const MILITARY_RANKS: &[&str] = &[
    "CEL", "TC", "MAJ", "CAP", "1º TEN", "2º TEN", "TEN", "ASP OF", "ASP", "SUB TEN", "1º SGT",
    "2º SGT", "3º SGT", "SGT", "CB", "SD EV", "SD EP", "SD",
];

const ORDINAL_MARKS: &[char] = &['º', '°'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankToken {
    canonical: String,
    key: String,
}

impl RankToken {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let canonical = normalize_label(text).replace('°', "º");
        let key = rank_key(&canonical);
        Self { canonical, key }
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn word_count(&self) -> usize {
        self.canonical.split(' ').count()
    }

    /// Words may run together (`SUBTEN`) and the ordinal mark is optional.
    fn pattern(&self) -> String {
        self.canonical
            .split(' ')
            .map(word_pattern)
            .collect::<Vec<_>>()
            .join(r"\s*")
    }
}

fn word_pattern(word: &str) -> String {
    let mut pattern = String::new();
    for ch in word.chars() {
        if ORDINAL_MARKS.contains(&ch) {
            pattern.push_str("[º°]?");
        } else {
            pattern.push_str(&regex::escape(ch.encode_utf8(&mut [0; 4])));
        }
    }
    pattern
}

/// Spelling-insensitive identity of a rank: no spaces, no ordinal marks.
fn rank_key(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && !ORDINAL_MARKS.contains(c))
        .flat_map(char::to_uppercase)
        .collect()
}

/// Rank tokens ordered longest-first so compound ranks win over their parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankVocabulary {
    tokens: Vec<RankToken>,
}

impl RankVocabulary {
    pub fn new<I, S>(ranks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut tokens: Vec<RankToken> = ranks
            .into_iter()
            .map(|r| RankToken::new(r.as_ref()))
            .filter(|t| !t.key.is_empty() && seen.insert(t.key.clone()))
            .collect();

        tokens.sort_by(|a, b| {
            b.word_count()
                .cmp(&a.word_count())
                .then_with(|| b.key.len().cmp(&a.key.len()))
        });

        Self { tokens }
    }

    pub fn military() -> Self {
        Self::new(MILITARY_RANKS)
    }

    pub fn tokens(&self) -> &[RankToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Regex alternation in priority order.
    pub fn alternation(&self) -> String {
        self.tokens
            .iter()
            .map(|t| format!("(?:{})", t.pattern()))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Maps a spelling seen in a document (`SUBTEN`, `1°SGT`) to its token.
    pub fn canonicalize(&self, text: &str) -> Option<&RankToken> {
        let key = rank_key(text);
        self.tokens.iter().find(|t| t.key == key)
    }

    /// Splits a leading rank (all of its words) off a label.
    pub fn split_rank<'a>(&self, label: &'a str) -> Option<(&RankToken, Vec<&'a str>)> {
        let words: Vec<&str> = label.split_whitespace().collect();

        self.tokens.iter().find_map(|token| {
            (1..=token.word_count().min(words.len()))
                .find(|&n| rank_key(&words[..n].concat()) == token.key)
                .map(|n| (token, words[n..].to_vec()))
        })
    }
}

impl Default for RankVocabulary {
    fn default() -> Self {
        Self::military()
    }
}

pub struct NameExtractor {
    vocabulary: RankVocabulary,
    pattern: Regex,
    stop_words: HashSet<String>,
    min_name_chars: usize,
}

impl NameExtractor {
    pub fn new(vocabulary: RankVocabulary) -> ExtractionResult<Self> {
        let pattern = Regex::new(&format!(
            r"\b({})\b\s+([\p{{Lu}} ]+?)(?:;|,|\.|\n|$)",
            vocabulary.alternation()
        ))?;

        Ok(Self {
            vocabulary,
            pattern,
            stop_words: DEFAULT_STOP_WORDS.iter().map(|w| (*w).to_string()).collect(),
            min_name_chars: MIN_NAME_CHARS,
        })
    }

    pub fn military() -> ExtractionResult<Self> {
        Self::new(RankVocabulary::military())
    }

    #[must_use]
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_words = words.into_iter().map(|w| normalize_label(w.as_ref())).collect();
        self
    }

    #[must_use]
    pub const fn with_min_name_chars(mut self, min: usize) -> Self {
        self.min_name_chars = min;
        self
    }

    pub const fn vocabulary(&self) -> &RankVocabulary {
        &self.vocabulary
    }

    /// People in first-occurrence order, one per `full_label`.
    pub fn extract_names(&self, text: &str) -> Vec<ExtractedPerson> {
        let normalized = normalize_text(text);
        let mut seen = HashSet::new();
        let mut people = Vec::new();

        for captures in self.pattern.captures_iter(&normalized) {
            let (Some(rank), Some(name)) = (captures.get(1), captures.get(2)) else {
                continue;
            };

            let name = normalize_label(name.as_str());
            if name.chars().count() < self.min_name_chars {
                tracing::trace!("Rejecting short name {:?} after {}", name, rank.as_str());
                continue;
            }
            if let Some(word) = self.stop_word_in(&name) {
                tracing::debug!("Rejecting {:?}: structural word {}", name, word);
                continue;
            }

            let rank = self
                .vocabulary
                .canonicalize(rank.as_str())
                .map_or_else(|| normalize_label(rank.as_str()), |t| t.canonical.clone());

            let person = ExtractedPerson::new(&rank, &name);
            if !seen.insert(person.full_label().to_string()) {
                tracing::trace!("Skipping repeated {}", person);
                continue;
            }

            tracing::debug!("Identified {}", person);
            people.push(person);
        }

        tracing::info!("Identified {} people", people.len());
        people
    }

    fn stop_word_in<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.split(' ').find(|w| self.stop_words.contains(*w))
    }
}

/// Uppercase with every whitespace run (newlines included) reduced to one space.
fn normalize_text(text: &str) -> String {
    text.to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
