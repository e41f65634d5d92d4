use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt::Write as _;

use crate::ingest::ExtractionResult;
use crate::person::ExtractedPerson;
use crate::registry::{
    MatchKind, MatchResult, RegistryEntry, RegistryMatcher, RegistryStore, SUGGESTION_THRESHOLD,
};

/// Unregistered labels listed by name in a summary before the rest are counted.
pub const SUMMARY_LIST_LIMIT: usize = 10;

pub const ACK_PREFIX: &str = "confirm";

#[derive(Debug, Clone)]
pub struct Recipient<'r> {
    pub person: ExtractedPerson,
    pub entry: &'r RegistryEntry,
    pub kind: MatchKind,
}

#[derive(Debug, Clone)]
pub struct Unregistered<'r> {
    pub person: ExtractedPerson,
    pub suggestion: Option<&'r RegistryEntry>,
}

/// Who to notify for one roster, and who could not be reached.
#[derive(Debug, Clone)]
pub struct NotificationPlan<'r> {
    pub document_name: String,
    pub total: usize,
    pub recipients: Vec<Recipient<'r>>,
    pub unregistered: Vec<Unregistered<'r>>,
}

impl<'r> NotificationPlan<'r> {
    /// Keeps extraction order. Each registered recipient appears once even if
    /// several roster lines resolve to them.
    pub fn build(
        document_name: &str,
        persons: &[ExtractedPerson],
        registry: &'r dyn RegistryStore,
        matcher: &RegistryMatcher,
    ) -> Self {
        let mut recipients = Vec::new();
        let mut unregistered = Vec::new();
        let mut notified = HashSet::new();

        for person in persons {
            match matcher.resolve(person.full_label(), registry) {
                MatchResult::Resolved { entry, kind } => {
                    if notified.insert(entry.external_id) {
                        recipients.push(Recipient {
                            person: person.clone(),
                            entry,
                            kind,
                        });
                    } else {
                        tracing::debug!(
                            "{} already notified as {}",
                            person,
                            entry.canonical_label
                        );
                    }
                }
                MatchResult::NoMatch => {
                    let suggestion = matcher
                        .closest(person.full_label(), registry, SUGGESTION_THRESHOLD)
                        .map(|(entry, _)| entry);
                    unregistered.push(Unregistered {
                        person: person.clone(),
                        suggestion,
                    });
                }
            }
        }

        tracing::info!(
            "Plan for {}: {} on roster, {} to notify, {} unregistered",
            document_name,
            persons.len(),
            recipients.len(),
            unregistered.len()
        );

        Self {
            document_name: document_name.to_string(),
            total: persons.len(),
            recipients,
            unregistered,
        }
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Roster processed: {}", self.document_name);
        let _ = writeln!(out, "Total on roster: {}", self.total);
        let _ = writeln!(out, "To notify: {}", self.recipients.len());

        if self.unregistered.is_empty() {
            return out;
        }

        let _ = writeln!(out, "Unregistered: {}", self.unregistered.len());
        for missing in self.unregistered.iter().take(SUMMARY_LIST_LIMIT) {
            match missing.suggestion {
                Some(entry) => {
                    let _ = writeln!(
                        out,
                        "  - {} (did you mean {}?)",
                        missing.person, entry.canonical_label
                    );
                }
                None => {
                    let _ = writeln!(out, "  - {}", missing.person);
                }
            }
        }
        if self.unregistered.len() > SUMMARY_LIST_LIMIT {
            let _ = writeln!(
                out,
                "... and {} more",
                self.unregistered.len() - SUMMARY_LIST_LIMIT
            );
        }
        out
    }
}

pub fn notification_text(person: &ExtractedPerson, document_name: &str, date: NaiveDate) -> String {
    format!(
        "NEW DUTY ROSTER\n\n\
         Hello, {person}!\n\n\
         You have been scheduled for the next shift.\n\n\
         Roster: {document_name}\n\
         Date: {}\n\n\
         Please confirm that you received this message.",
        date.format("%d/%m/%Y")
    )
}

/// Acknowledgement callback payload. The document id must not contain `_`;
/// the label may.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckToken {
    pub document: String,
    pub label: String,
}

impl AckToken {
    pub fn new(document: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            label: label.into(),
        }
    }

    pub fn encode(&self) -> String {
        format!("{ACK_PREFIX}_{}_{}", self.document, self.label)
    }

    pub fn parse(token: &str) -> Option<Self> {
        let mut parts = token.splitn(3, '_');
        if parts.next()? != ACK_PREFIX {
            return None;
        }
        let document = parts.next().filter(|d| !d.is_empty())?;
        let label = parts.next().filter(|l| !l.is_empty())?;
        Some(Self::new(document, label))
    }
}

/// What a roster submission produced. Failure and "nobody found" are reported
/// differently.
#[derive(Debug)]
pub enum RosterOutcome<'r> {
    Failed(String),
    Empty,
    Found(NotificationPlan<'r>),
}

impl<'r> RosterOutcome<'r> {
    pub fn from_extraction(
        document_name: &str,
        result: ExtractionResult<Vec<ExtractedPerson>>,
        registry: &'r dyn RegistryStore,
        matcher: &RegistryMatcher,
    ) -> Self {
        match result {
            Err(e) => {
                tracing::warn!("Failed to process {}: {}", document_name, e);
                Self::Failed(e.to_string())
            }
            Ok(persons) if persons.is_empty() => Self::Empty,
            Ok(persons) => Self::Found(NotificationPlan::build(
                document_name,
                &persons,
                registry,
                matcher,
            )),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Failed(reason) => format!("Could not process this document: {reason}"),
            Self::Empty => "No recognizable names found in this roster. \
                 Check that the document is correct."
                .to_string(),
            Self::Found(plan) => plan.summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ExtractionError;
    use crate::registry::{ExternalId, Registry};

    fn people(labels: &[(&str, &str)]) -> Vec<ExtractedPerson> {
        labels
            .iter()
            .map(|(rank, name)| ExtractedPerson::new(rank, name))
            .collect()
    }

    #[test]
    fn test_plan_splits_recipients_and_unregistered() {
        let mut registry = Registry::new();
        registry.register("SGT FIALHO", ExternalId(1)).unwrap();
        registry.register("CB JOAO VICTOR", ExternalId(2)).unwrap();

        let persons = people(&[
            ("SD", "JOAO VICTOR"),
            ("SUB TEN", "SILVA"),
            ("SGT", "FIALHO"),
        ]);
        let plan =
            NotificationPlan::build("escala.pdf", &persons, &registry, &RegistryMatcher::default());

        assert_eq!(plan.total, 3);
        let ids: Vec<_> = plan.recipients.iter().map(|r| r.entry.external_id).collect();
        assert_eq!(ids, vec![ExternalId(2), ExternalId(1)]);
        assert_eq!(plan.recipients[0].kind, MatchKind::Tail);
        assert_eq!(plan.unregistered.len(), 1);
        assert_eq!(plan.unregistered[0].person.full_label(), "SUB TEN SILVA");
    }

    #[test]
    fn test_plan_notifies_each_entry_once() {
        let mut registry = Registry::new();
        registry.register("SGT JOAO SILVA", ExternalId(1)).unwrap();

        let persons = people(&[("SD", "JOAO SILVA"), ("CB", "JOAO SILVA")]);
        let plan = NotificationPlan::build("x", &persons, &registry, &RegistryMatcher::default());

        assert_eq!(plan.recipients.len(), 1);
        assert!(plan.unregistered.is_empty());
    }

    #[test]
    fn test_summary_truncates_unregistered() {
        let registry = Registry::new();
        let persons: Vec<_> = (0..13)
            .map(|i| ExtractedPerson::new("SD", &format!("NOME {}", char::from(b'A' + i))))
            .collect();
        let plan = NotificationPlan::build("doc", &persons, &registry, &RegistryMatcher::default());

        let summary = plan.summary();
        assert!(summary.contains("Total on roster: 13"));
        assert!(summary.contains("To notify: 0"));
        assert!(summary.contains("Unregistered: 13"));
        assert!(summary.contains("  - SD NOME J\n"));
        assert!(!summary.contains("SD NOME K"));
        assert!(summary.contains("... and 3 more"));
    }

    #[test]
    fn test_summary_suggests_close_names() {
        let mut registry = Registry::new();
        registry.register("SD JOAO SILVA", ExternalId(1)).unwrap();

        let persons = people(&[("SGT", "JOAO SILVAA")]);
        let plan = NotificationPlan::build("doc", &persons, &registry, &RegistryMatcher::default());

        assert!(plan
            .summary()
            .contains("SGT JOAO SILVAA (did you mean SD JOAO SILVA?)"));
    }

    #[test]
    fn test_notification_text() {
        let person = ExtractedPerson::new("SGT", "FIALHO");
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();

        let text = notification_text(&person, "escala_marco.pdf", date);

        assert!(text.contains("Hello, SGT FIALHO!"));
        assert!(text.contains("Roster: escala_marco.pdf"));
        assert!(text.contains("Date: 07/03/2025"));
    }

    #[test]
    fn test_ack_token_label_may_contain_underscore() {
        let token = AckToken::new("1001", "SD JOAO_VICTOR");
        let encoded = token.encode();

        assert_eq!(encoded, "confirm_1001_SD JOAO_VICTOR");
        assert_eq!(AckToken::parse(&encoded), Some(token));
    }

    #[test]
    fn test_ack_token_rejects_malformed() {
        assert!(AckToken::parse("confirm_1001").is_none());
        assert!(AckToken::parse("confirm__SGT X").is_none());
        assert!(AckToken::parse("decline_1001_SGT X").is_none());
        assert!(AckToken::parse("").is_none());
    }

    #[test]
    fn test_outcome_messages_are_distinct() {
        let registry = Registry::new();
        let matcher = RegistryMatcher::default();

        let failed = RosterOutcome::from_extraction(
            "doc",
            Err(ExtractionError::Failed("corrupt".to_string())),
            &registry,
            &matcher,
        );
        let empty = RosterOutcome::from_extraction("doc", Ok(Vec::new()), &registry, &matcher);
        let found = RosterOutcome::from_extraction(
            "doc",
            Ok(people(&[("SD", "ZECA")])),
            &registry,
            &matcher,
        );

        assert!(matches!(failed, RosterOutcome::Failed(_)));
        assert!(failed.message().contains("corrupt"));
        assert!(matches!(empty, RosterOutcome::Empty));
        assert!(empty.message().starts_with("No recognizable names"));
        assert!(found.message().contains("Unregistered: 1"));
    }
}
