use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::format::DocumentFormat;
use super::ocr::TesseractOcr;
use super::pdf::{PdfTextLayer, PlainTextFile};
use crate::config::EscalaConfig;

/// Digital text shorter than this is treated as a missing text layer.
pub const MIN_CONTENT_CHARS: usize = 50;

pub const PAGE_SEPARATOR: &str = "\n";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Extraction failed: {0}")]
    Failed(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("{tool} exited with {status}: {stderr}")]
    Tool {
        tool: &'static str,
        status: String,
        stderr: String,
    },
    #[error("Required tool not found: {0}")]
    ToolNotFound(&'static str),
    #[error("No optical recognition backend available")]
    OpticalBackendUnavailable,
    #[error("Invalid rank pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Digital,
    Optical,
}

impl ExtractionMethod {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Digital => "digital",
            Self::Optical => "optical",
        }
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a returned text is less trustworthy than a clean first-strategy hit.
///
/// A skipped digital strategy is reported as `StrategyUnavailable`; a missing
/// optical backend is reported once as `OpticalBackendUnavailable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    InsufficientContent {
        method: ExtractionMethod,
        chars: usize,
    },
    StrategyFailed {
        method: ExtractionMethod,
        reason: String,
    },
    StrategyUnavailable {
        method: ExtractionMethod,
    },
    OpticalBackendUnavailable,
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientContent { method, chars } => {
                write!(f, "{method} extraction yielded only {chars} characters")
            }
            Self::StrategyFailed { method, reason } => {
                write!(f, "{method} extraction failed: {reason}")
            }
            Self::StrategyUnavailable { method } => write!(f, "{method} extraction unavailable"),
            Self::OpticalBackendUnavailable => f.write_str("optical recognition unavailable"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub method: Option<ExtractionMethod>,
    pub page_count: usize,
    pub degradations: Vec<Degradation>,
}

impl ExtractedText {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }

    pub fn content_chars(&self) -> usize {
        content_chars(&self.text)
    }
}

pub fn content_chars(text: &str) -> usize {
    text.trim().chars().count()
}

/// Acceptance predicate shared by every strategy in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentThreshold {
    pub min_chars: usize,
}

impl ContentThreshold {
    #[must_use]
    pub const fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    pub fn accepts(&self, text: &str) -> bool {
        content_chars(text) >= self.min_chars
    }
}

impl Default for ContentThreshold {
    fn default() -> Self {
        Self::new(MIN_CONTENT_CHARS)
    }
}

#[async_trait::async_trait]
pub trait TextStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn method(&self) -> ExtractionMethod;

    fn supported_formats(&self) -> &[DocumentFormat];

    fn can_read(&self, format: DocumentFormat) -> bool {
        self.supported_formats().contains(&format)
    }

    /// Whether the backing tools are installed.
    fn is_available(&self) -> bool {
        true
    }

    /// Text of each page, in page order.
    async fn extract_pages(&self, path: &Path) -> ExtractionResult<Vec<String>>;
}

/// Ordered fallback chain of text strategies.
pub struct TextExtractor {
    strategies: Vec<Box<dyn TextStrategy>>,
    threshold: ContentThreshold,
}

impl TextExtractor {
    /// An empty chain; add strategies with [`Self::with_strategy`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
            threshold: ContentThreshold::default(),
        }
    }

    /// The installed chain: `pdftotext`, plain text files, then tesseract.
    pub fn from_config(config: &EscalaConfig) -> Self {
        Self::new()
            .with_strategy(Box::new(PdfTextLayer::new()))
            .with_strategy(Box::new(PlainTextFile::new()))
            .with_strategy(Box::new(TesseractOcr::new(
                config.ocr_language.clone(),
                config.ocr_dpi,
            )))
            .with_threshold(ContentThreshold::new(config.min_content_chars))
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Box<dyn TextStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    #[must_use]
    pub const fn with_threshold(mut self, threshold: ContentThreshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub async fn extract(&self, path: &Path, force_optical: bool) -> ExtractionResult<ExtractedText> {
        let format = DocumentFormat::detect(path)
            .await?
            .ok_or_else(|| ExtractionError::UnsupportedFormat(path.display().to_string()))?;

        if force_optical {
            tracing::info!("Optical recognition forced for {}", path.display());
        }

        let candidates: Vec<&dyn TextStrategy> = self
            .strategies
            .iter()
            .map(AsRef::as_ref)
            .filter(|s| s.can_read(format))
            .filter(|s| !force_optical || s.method() == ExtractionMethod::Optical)
            .collect();

        if candidates.is_empty() {
            if !force_optical {
                return Err(ExtractionError::UnsupportedFormat(format.to_string()));
            }
            // Optical strategies exist but none reads this format.
            if self
                .strategies
                .iter()
                .any(|s| s.method() == ExtractionMethod::Optical)
            {
                return Err(ExtractionError::UnsupportedFormat(format!(
                    "{format} cannot be read by optical recognition"
                )));
            }
        }

        let mut degradations = Vec::new();
        let mut best: Option<ExtractedText> = None;
        let mut last_error: Option<ExtractionError> = None;
        let mut optical_ran = false;
        let mut optical_skipped = false;
        let mut skipped = 0_usize;

        for strategy in candidates {
            let method = strategy.method();

            if !strategy.is_available() {
                tracing::warn!("{} is not available, skipping", strategy.name());
                skipped += 1;
                if method == ExtractionMethod::Optical {
                    optical_skipped = true;
                } else {
                    degradations.push(Degradation::StrategyUnavailable { method });
                }
                continue;
            }

            if method == ExtractionMethod::Optical {
                optical_ran = true;
            }

            match strategy.extract_pages(path).await {
                Ok(pages) => {
                    let page_count = pages.len();
                    let text = join_pages(strategy.name(), &pages);

                    if self.threshold.accepts(&text) {
                        tracing::info!(
                            "{}: {} characters from {} page(s) via {}",
                            path.display(),
                            content_chars(&text),
                            page_count,
                            strategy.name()
                        );
                        return Ok(ExtractedText {
                            text,
                            method: Some(method),
                            page_count,
                            degradations,
                        });
                    }

                    let chars = content_chars(&text);
                    tracing::warn!(
                        "{} returned {} characters (minimum {}), trying next strategy",
                        strategy.name(),
                        chars,
                        self.threshold.min_chars
                    );
                    degradations.push(Degradation::InsufficientContent { method, chars });
                    best = Some(ExtractedText {
                        text,
                        method: Some(method),
                        page_count,
                        degradations: Vec::new(),
                    });
                }
                Err(e) => {
                    tracing::warn!("{} failed on {}: {}", strategy.name(), path.display(), e);
                    degradations.push(Degradation::StrategyFailed {
                        method,
                        reason: e.to_string(),
                    });
                    last_error = Some(e);
                }
            }
        }

        if (force_optical || optical_skipped) && !optical_ran {
            tracing::warn!("Optical recognition needed for {} but unavailable", path.display());
            degradations.push(Degradation::OpticalBackendUnavailable);
        }

        match (best, last_error) {
            (Some(mut text), _) => {
                text.degradations = degradations;
                Ok(text)
            }
            (None, Some(e)) => Err(ExtractionError::Failed(format!("{}: {e}", path.display()))),
            (None, None) if !force_optical => Err(ExtractionError::Failed(format!(
                "{}: none of the {skipped} {format} reader(s) is installed",
                path.display()
            ))),
            (None, None) => Ok(ExtractedText {
                degradations,
                ..ExtractedText::default()
            }),
        }
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn join_pages(strategy: &str, pages: &[String]) -> String {
    let mut kept = Vec::with_capacity(pages.len());

    for (index, page) in pages.iter().enumerate() {
        if page.trim().is_empty() {
            tracing::warn!("{}: page {} yielded no text", strategy, index + 1);
            continue;
        }
        tracing::debug!(
            "{}: page {} has {} characters",
            strategy,
            index + 1,
            page.chars().count()
        );
        kept.push(page.as_str());
    }

    kept.join(PAGE_SEPARATOR)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    pub(crate) struct StaticStrategy {
        pub method: ExtractionMethod,
        pub available: bool,
        pub result: Result<Vec<String>, String>,
        pub formats: &'static [DocumentFormat],
        pub calls: Arc<AtomicUsize>,
    }

    impl StaticStrategy {
        pub fn pages(method: ExtractionMethod, pages: &[&str]) -> Self {
            Self {
                method,
                available: true,
                result: Ok(pages.iter().map(|p| (*p).to_string()).collect()),
                formats: &[DocumentFormat::Pdf],
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn failing(method: ExtractionMethod, reason: &str) -> Self {
            Self {
                result: Err(reason.to_string()),
                ..Self::pages(method, &[])
            }
        }

        pub fn unavailable(mut self) -> Self {
            self.available = false;
            self
        }

        pub fn reading(mut self, formats: &'static [DocumentFormat]) -> Self {
            self.formats = formats;
            self
        }
    }

    #[async_trait::async_trait]
    impl TextStrategy for StaticStrategy {
        fn name(&self) -> &'static str {
            match self.method {
                ExtractionMethod::Digital => "static-digital",
                ExtractionMethod::Optical => "static-optical",
            }
        }

        fn method(&self) -> ExtractionMethod {
            self.method
        }

        fn supported_formats(&self) -> &[DocumentFormat] {
            self.formats
        }

        fn is_available(&self) -> bool {
            self.available
        }

        async fn extract_pages(&self, _path: &Path) -> ExtractionResult<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone().map_err(ExtractionError::Failed)
        }
    }

    const ROSTER: &str = "ESCALA DE SERVICO ORDINARIO: SUB TEN SILVA; SGT FIALHO; SD JOAO VICTOR.";

    fn pdf() -> &'static Path {
        Path::new("escala.pdf")
    }

    #[tokio::test]
    async fn test_digital_text_accepted() {
        let optical = StaticStrategy::pages(ExtractionMethod::Optical, &["OCR"]);
        let optical_calls = optical.calls.clone();
        let extractor = TextExtractor::new()
            .with_strategy(Box::new(StaticStrategy::pages(
                ExtractionMethod::Digital,
                &[ROSTER],
            )))
            .with_strategy(Box::new(optical));

        let text = extractor.extract(pdf(), false).await.unwrap();

        assert_eq!(text.text, ROSTER);
        assert_eq!(text.method, Some(ExtractionMethod::Digital));
        assert!(!text.is_degraded());
        assert_eq!(optical_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_short_digital_text_falls_back_to_optical() {
        let optical = StaticStrategy::pages(ExtractionMethod::Optical, &[ROSTER]);
        let optical_calls = optical.calls.clone();
        let extractor = TextExtractor::new()
            .with_strategy(Box::new(StaticStrategy::pages(
                ExtractionMethod::Digital,
                &["  SD A  "],
            )))
            .with_strategy(Box::new(optical));

        let text = extractor.extract(pdf(), false).await.unwrap();

        assert_eq!(optical_calls.load(Ordering::SeqCst), 1);
        assert_eq!(text.text, ROSTER);
        assert_eq!(text.method, Some(ExtractionMethod::Optical));
        assert_eq!(
            text.degradations,
            vec![Degradation::InsufficientContent {
                method: ExtractionMethod::Digital,
                chars: 4,
            }]
        );
    }

    #[tokio::test]
    async fn test_short_digital_text_without_optical_backend() {
        let extractor = TextExtractor::new()
            .with_strategy(Box::new(StaticStrategy::pages(
                ExtractionMethod::Digital,
                &["SD A"],
            )))
            .with_strategy(Box::new(
                StaticStrategy::pages(ExtractionMethod::Optical, &[ROSTER]).unavailable(),
            ));

        let text = extractor.extract(pdf(), false).await.unwrap();

        assert_eq!(text.text, "SD A");
        assert_eq!(text.method, Some(ExtractionMethod::Digital));
        assert!(text
            .degradations
            .contains(&Degradation::OpticalBackendUnavailable));
    }

    #[tokio::test]
    async fn test_digital_failure_without_optical_backend_is_error() {
        let extractor = TextExtractor::new()
            .with_strategy(Box::new(StaticStrategy::failing(
                ExtractionMethod::Digital,
                "corrupt xref table",
            )))
            .with_strategy(Box::new(
                StaticStrategy::pages(ExtractionMethod::Optical, &[ROSTER]).unavailable(),
            ));

        let err = extractor.extract(pdf(), false).await.unwrap_err();

        assert!(matches!(err, ExtractionError::Failed(ref m) if m.contains("corrupt xref")));
    }

    #[tokio::test]
    async fn test_digital_failure_falls_back_to_optical() {
        let extractor = TextExtractor::new()
            .with_strategy(Box::new(StaticStrategy::failing(
                ExtractionMethod::Digital,
                "corrupt xref table",
            )))
            .with_strategy(Box::new(StaticStrategy::pages(
                ExtractionMethod::Optical,
                &[ROSTER],
            )));

        let text = extractor.extract(pdf(), false).await.unwrap();

        assert_eq!(text.method, Some(ExtractionMethod::Optical));
        assert!(matches!(
            text.degradations.as_slice(),
            [Degradation::StrategyFailed { method: ExtractionMethod::Digital, .. }]
        ));
    }

    #[tokio::test]
    async fn test_short_optical_text_is_returned_as_best_effort() {
        let extractor = TextExtractor::new()
            .with_strategy(Box::new(StaticStrategy::pages(
                ExtractionMethod::Digital,
                &[""],
            )))
            .with_strategy(Box::new(StaticStrategy::pages(
                ExtractionMethod::Optical,
                &["SD JOAO"],
            )));

        let text = extractor.extract(pdf(), false).await.unwrap();

        assert_eq!(text.text, "SD JOAO");
        assert_eq!(text.method, Some(ExtractionMethod::Optical));
        assert_eq!(text.degradations.len(), 2);
    }

    #[tokio::test]
    async fn test_force_optical_skips_digital() {
        let digital = StaticStrategy::pages(ExtractionMethod::Digital, &[ROSTER]);
        let digital_calls = digital.calls.clone();
        let extractor = TextExtractor::new()
            .with_strategy(Box::new(digital))
            .with_strategy(Box::new(StaticStrategy::pages(
                ExtractionMethod::Optical,
                &["SGT FIALHO; ", ROSTER],
            )));

        let text = extractor.extract(pdf(), true).await.unwrap();

        assert_eq!(digital_calls.load(Ordering::SeqCst), 0);
        assert_eq!(text.method, Some(ExtractionMethod::Optical));
        assert_eq!(text.page_count, 2);
    }

    #[tokio::test]
    async fn test_force_optical_without_backend_is_degraded_not_failed() {
        let extractor = TextExtractor::new()
            .with_strategy(Box::new(StaticStrategy::pages(
                ExtractionMethod::Digital,
                &[ROSTER],
            )))
            .with_strategy(Box::new(
                StaticStrategy::pages(ExtractionMethod::Optical, &[ROSTER]).unavailable(),
            ));

        let text = extractor.extract(pdf(), true).await.unwrap();

        assert!(text.is_empty());
        assert_eq!(text.method, None);
        assert_eq!(text.degradations, vec![Degradation::OpticalBackendUnavailable]);
    }

    #[tokio::test]
    async fn test_force_optical_with_empty_chain_is_degraded() {
        let text = TextExtractor::default().extract(pdf(), true).await.unwrap();

        assert!(text.is_empty());
        assert_eq!(text.degradations, vec![Degradation::OpticalBackendUnavailable]);
    }

    #[tokio::test]
    async fn test_force_optical_on_format_optical_cannot_read() {
        let digital = StaticStrategy::pages(ExtractionMethod::Digital, &[ROSTER])
            .reading(&[DocumentFormat::Pdf, DocumentFormat::PlainText]);
        let extractor = TextExtractor::new()
            .with_strategy(Box::new(digital))
            .with_strategy(Box::new(StaticStrategy::pages(
                ExtractionMethod::Optical,
                &[ROSTER],
            )));

        let err = extractor
            .extract(Path::new("escala.txt"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat(ref m) if m.contains("optical")));

        let text = extractor
            .extract(Path::new("escala.txt"), false)
            .await
            .unwrap();
        assert_eq!(text.method, Some(ExtractionMethod::Digital));
    }

    #[tokio::test]
    async fn test_no_installed_reader_is_error() {
        let digital = StaticStrategy::pages(ExtractionMethod::Digital, &[ROSTER]).unavailable();
        let digital_calls = digital.calls.clone();
        let extractor = TextExtractor::new()
            .with_strategy(Box::new(digital))
            .with_strategy(Box::new(
                StaticStrategy::pages(ExtractionMethod::Optical, &[ROSTER]).unavailable(),
            ));

        let err = extractor.extract(pdf(), false).await.unwrap_err();

        assert!(matches!(err, ExtractionError::Failed(ref m) if m.contains("installed")));
        assert_eq!(digital_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unavailable_digital_is_reported() {
        let extractor = TextExtractor::new()
            .with_strategy(Box::new(
                StaticStrategy::pages(ExtractionMethod::Digital, &[ROSTER]).unavailable(),
            ))
            .with_strategy(Box::new(StaticStrategy::pages(
                ExtractionMethod::Optical,
                &[ROSTER],
            )));

        let text = extractor.extract(pdf(), false).await.unwrap();

        assert_eq!(text.text, ROSTER);
        assert_eq!(text.method, Some(ExtractionMethod::Optical));
        assert!(text.is_degraded());
        assert_eq!(
            text.degradations,
            vec![Degradation::StrategyUnavailable {
                method: ExtractionMethod::Digital
            }]
        );
        assert_eq!(
            text.degradations[0].to_string(),
            "digital extraction unavailable"
        );
    }

    #[tokio::test]
    async fn test_empty_pages_skipped_and_order_kept() {
        let extractor = TextExtractor::new()
            .with_threshold(ContentThreshold::new(1))
            .with_strategy(Box::new(StaticStrategy::pages(
                ExtractionMethod::Digital,
                &["SD JOAO;", "   ", "SGT FIALHO;"],
            )));

        let text = extractor.extract(pdf(), false).await.unwrap();

        assert_eq!(text.text, "SD JOAO;\nSGT FIALHO;");
        assert_eq!(text.page_count, 3);
    }

    #[tokio::test]
    async fn test_no_reader_for_format() {
        let extractor = TextExtractor::new().with_strategy(Box::new(StaticStrategy::pages(
            ExtractionMethod::Digital,
            &[ROSTER],
        )));

        let err = extractor
            .extract(Path::new("escala.txt"), false)
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractionError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_content_threshold() {
        let threshold = ContentThreshold::default();
        assert!(!threshold.accepts(&format!("   {}   ", "x".repeat(49))));
        assert!(threshold.accepts(&"x".repeat(50)));
    }
}
