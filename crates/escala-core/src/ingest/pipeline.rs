use std::path::Path;
use std::time::Instant;

use super::names::NameExtractor;
use super::text::{ExtractedText, ExtractionResult, TextExtractor};
use crate::config::EscalaConfig;
use crate::person::ExtractedPerson;
use crate::registry::{MatchResult, RegistryMatcher, RegistryStore};

pub struct RosterOutput {
    pub people: Vec<ExtractedPerson>,
    pub text: ExtractedText,
    pub duration_ms: u64,
}

impl RosterOutput {
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}

/// Document path in, roster people out.
pub struct RosterPipeline {
    text: TextExtractor,
    names: NameExtractor,
    matcher: RegistryMatcher,
    force_optical: bool,
}

impl RosterPipeline {
    #[must_use]
    pub fn new(text: TextExtractor, names: NameExtractor) -> Self {
        let matcher = RegistryMatcher::new(names.vocabulary().clone());
        Self {
            text,
            names,
            matcher,
            force_optical: false,
        }
    }

    pub fn from_config(config: &EscalaConfig) -> ExtractionResult<Self> {
        Ok(Self::new(
            TextExtractor::from_config(config),
            NameExtractor::military()?,
        ))
    }

    #[must_use]
    pub const fn with_force_optical(mut self, force: bool) -> Self {
        self.force_optical = force;
        self
    }

    pub const fn matcher(&self) -> &RegistryMatcher {
        &self.matcher
    }

    pub async fn process(&self, path: &Path) -> ExtractionResult<Vec<ExtractedPerson>> {
        self.process_with(path, self.force_optical).await
    }

    pub async fn process_with(
        &self,
        path: &Path,
        force_optical: bool,
    ) -> ExtractionResult<Vec<ExtractedPerson>> {
        Ok(self.process_document(path, force_optical).await?.people)
    }

    pub async fn process_document(
        &self,
        path: &Path,
        force_optical: bool,
    ) -> ExtractionResult<RosterOutput> {
        let start = Instant::now();
        tracing::info!("Processing roster {}", path.display());

        let text = self.text.extract(path, force_optical).await?;
        tracing::debug!(
            "Extracted text ({} characters): {:.500}",
            text.content_chars(),
            text.text
        );

        let people = self.names.extract_names(&text.text);

        Ok(RosterOutput {
            people,
            text,
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }

    pub fn resolve_all<'r>(
        &self,
        people: &[ExtractedPerson],
        registry: &'r dyn RegistryStore,
    ) -> Vec<(ExtractedPerson, MatchResult<'r>)> {
        people
            .iter()
            .map(|person| {
                (
                    person.clone(),
                    self.matcher.resolve(person.full_label(), registry),
                )
            })
            .collect()
    }
}
