pub mod ack;
pub mod parse;
pub mod plan;
pub mod registry;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use escala_core::{EscalaConfig, ExternalId, RosterStore};

#[derive(Parser)]
#[command(
    name = "escala",
    about = "Duty roster extraction and notification planning",
    version
)]
pub struct Cli {
    /// Registry file (defaults to ESCALA_REGISTRY_PATH or the user data dir)
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract the people listed in a roster document
    Parse {
        /// Roster file (PDF or plain text)
        file: PathBuf,
        /// Skip the text layer and go straight to OCR
        #[arg(long)]
        ocr: bool,
        /// Print people as JSON
        #[arg(long)]
        json: bool,
    },
    /// Register a roster label for a recipient
    Register {
        /// Label as it appears on rosters (e.g. SGT FIALHO)
        #[arg(required = true)]
        label: Vec<String>,
        /// Recipient handle
        #[arg(long, allow_negative_numbers = true)]
        id: ExternalId,
    },
    /// Remove a recipient's registration
    Unregister {
        #[arg(long, allow_negative_numbers = true)]
        id: ExternalId,
    },
    /// Show what a recipient is registered as
    Status {
        #[arg(long, allow_negative_numbers = true)]
        id: ExternalId,
    },
    /// Look a roster label up in the registry
    Resolve {
        #[arg(required = true)]
        label: Vec<String>,
    },
    /// Plan notifications for a roster
    Plan {
        /// Roster file (PDF or plain text)
        file: PathBuf,
        /// Document id used by the processed guard and acknowledgements
        #[arg(long)]
        document: String,
        /// Skip the text layer and go straight to OCR
        #[arg(long)]
        ocr: bool,
        /// Plan again even if the document was already processed
        #[arg(long)]
        force: bool,
        /// Print each recipient's message and acknowledgement token
        #[arg(long)]
        messages: bool,
    },
    /// Record a recipient's acknowledgement of a roster
    Ack {
        /// Document id or acknowledgement token
        target: String,
        #[arg(long, allow_negative_numbers = true)]
        id: ExternalId,
        /// Record a decline instead of a confirmation
        #[arg(long)]
        declined: bool,
    },
    /// List acknowledgements recorded for a document
    Acks { document: String },
}

pub(crate) async fn open_store(config: &EscalaConfig) -> Result<RosterStore> {
    let store = RosterStore::open(&config.registry_path)
        .await?
        .with_history_limit(config.processed_history_limit);
    Ok(store)
}
