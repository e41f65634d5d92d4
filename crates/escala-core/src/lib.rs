pub mod config;
pub mod dispatch;
pub mod error;
pub mod ingest;
pub mod person;
pub mod registry;
pub mod store;

pub use config::EscalaConfig;
pub use dispatch::{notification_text, AckToken, NotificationPlan, RosterOutcome};
pub use error::{Error, Result};
pub use ingest::{
    ExtractedText, ExtractionError, NameExtractor, RankVocabulary, RosterPipeline, TextExtractor,
};
pub use person::{normalize_label, ExtractedPerson};
pub use registry::{
    ExternalId, MatchKind, MatchResult, Registry, RegistryEntry, RegistryMatcher, RegistryStore,
};
pub use store::{Acknowledgement, RosterStore};
