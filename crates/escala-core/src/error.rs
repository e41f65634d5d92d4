use thiserror::Error;

use crate::ingest::ExtractionError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid label: {0:?}")]
    InvalidLabel(String),

    #[error("Document extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
