use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ingest::MIN_CONTENT_CHARS;

pub const DEFAULT_OCR_LANGUAGE: &str = "por";
pub const DEFAULT_OCR_DPI: u32 = 300;
pub const DEFAULT_PROCESSED_HISTORY: usize = 100;

/// Runtime configuration shared by the pipeline, the store and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalaConfig {
    /// Digital text shorter than this (after trimming) triggers the optical fallback
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
    /// Tesseract language code
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
    /// Page rasterization resolution for OCR
    #[serde(default = "default_ocr_dpi")]
    pub ocr_dpi: u32,
    /// Location of the JSON registry file
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,
    /// How many processed document ids the guard remembers
    #[serde(default = "default_processed_history")]
    pub processed_history_limit: usize,
}

impl Default for EscalaConfig {
    fn default() -> Self {
        Self {
            min_content_chars: default_min_content_chars(),
            ocr_language: default_ocr_language(),
            ocr_dpi: default_ocr_dpi(),
            registry_path: default_registry_path(),
            processed_history_limit: default_processed_history(),
        }
    }
}

impl EscalaConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_content_chars: env_parse("ESCALA_MIN_CONTENT_CHARS")
                .unwrap_or(defaults.min_content_chars),
            ocr_language: std::env::var("ESCALA_OCR_LANG")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.ocr_language),
            ocr_dpi: env_parse("ESCALA_OCR_DPI").unwrap_or(defaults.ocr_dpi),
            registry_path: std::env::var_os("ESCALA_REGISTRY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.registry_path),
            processed_history_limit: env_parse("ESCALA_PROCESSED_HISTORY")
                .unwrap_or(defaults.processed_history_limit),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparseable {}={:?}", key, raw);
            None
        }
    }
}

const fn default_min_content_chars() -> usize {
    MIN_CONTENT_CHARS
}

fn default_ocr_language() -> String {
    DEFAULT_OCR_LANGUAGE.to_string()
}

const fn default_ocr_dpi() -> u32 {
    DEFAULT_OCR_DPI
}

fn default_registry_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("escala")
        .join("registry.json")
}

const fn default_processed_history() -> usize {
    DEFAULT_PROCESSED_HISTORY
}
