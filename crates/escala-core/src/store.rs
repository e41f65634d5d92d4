use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::config::DEFAULT_PROCESSED_HISTORY;
use crate::registry::{ExternalId, Registry, RegistryStore};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub document: String,
    pub external_id: ExternalId,
    pub confirmed: bool,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    registry: Registry,
    #[serde(default)]
    processed: VecDeque<String>,
    #[serde(default)]
    acknowledgements: Vec<Acknowledgement>,
}

/// Registry, processed-document guard and acknowledgement ledger in one JSON file.
pub struct RosterStore {
    path: PathBuf,
    state: StoreState,
    history_limit: usize,
}

impl RosterStore {
    /// Loads `path`, writing a fresh empty store when it does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let (state, fresh) = match tokio::fs::read(&path).await {
            Ok(bytes) => (serde_json::from_slice(&bytes)?, false),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (StoreState::default(), true),
            Err(e) => return Err(e.into()),
        };

        let store = Self {
            path,
            state,
            history_limit: DEFAULT_PROCESSED_HISTORY,
        };

        if fresh {
            tracing::info!("Creating roster store at {}", store.path.display());
            store.save().await?;
        } else {
            tracing::debug!(
                "Loaded roster store {} ({} registered)",
                store.path.display(),
                store.state.registry.len()
            );
        }

        Ok(store)
    }

    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self.trim_history();
        self
    }

    /// Writes a sibling temp file and renames it over the store, so the file
    /// on disk is always either the old or the new state.
    pub async fn save(&self) -> Result<()> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                tokio::fs::create_dir_all(parent).await?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };
        let json = serde_json::to_vec_pretty(&self.state)?;

        let temp = tempfile::Builder::new()
            .prefix(".escala-")
            .suffix(".tmp")
            .tempfile_in(&dir)?
            .into_temp_path();
        tokio::fs::write(&temp, json).await?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        tracing::debug!("Saved roster store {}", self.path.display());
        Ok(())
    }

    pub const fn registry(&self) -> &Registry {
        &self.state.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.state.registry
    }

    pub fn is_processed(&self, document: &str) -> bool {
        self.state.processed.iter().any(|d| d == document)
    }

    /// Returns `false` if the document was already recorded.
    pub fn mark_processed(&mut self, document: &str) -> bool {
        if self.is_processed(document) {
            return false;
        }
        self.state.processed.push_back(document.to_string());
        self.trim_history();
        true
    }

    fn trim_history(&mut self) {
        while self.state.processed.len() > self.history_limit {
            self.state.processed.pop_front();
        }
    }

    /// Latest answer per recipient wins.
    pub fn record_acknowledgement(
        &mut self,
        document: &str,
        external_id: ExternalId,
        confirmed: bool,
    ) -> &Acknowledgement {
        let ack = Acknowledgement {
            document: document.to_string(),
            external_id,
            confirmed,
            recorded_at: Utc::now(),
        };

        let acks = &mut self.state.acknowledgements;
        let index = match acks
            .iter()
            .position(|a| a.document == document && a.external_id == external_id)
        {
            Some(index) => {
                acks[index] = ack;
                index
            }
            None => {
                acks.push(ack);
                acks.len() - 1
            }
        };

        tracing::info!(
            "Acknowledgement for {} from {}: {}",
            document,
            external_id,
            if confirmed { "confirmed" } else { "declined" }
        );
        &acks[index]
    }

    pub fn acknowledgements(&self, document: &str) -> Vec<&Acknowledgement> {
        self.state
            .acknowledgements
            .iter()
            .filter(|a| a.document == document)
            .collect()
    }
}
