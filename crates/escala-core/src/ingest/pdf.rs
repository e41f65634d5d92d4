use std::ffi::OsStr;
use std::path::Path;

use super::command::{run_tool, tool_available, PDFTOTEXT};
use super::format::DocumentFormat;
use super::text::{ExtractionError, ExtractionMethod, ExtractionResult, TextStrategy};

const FORM_FEED: char = '\u{c}';

/// Native text layer of a PDF, read with Poppler's `pdftotext`.
pub struct PdfTextLayer;

impl PdfTextLayer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for PdfTextLayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TextStrategy for PdfTextLayer {
    fn name(&self) -> &'static str {
        PDFTOTEXT
    }

    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Digital
    }

    fn supported_formats(&self) -> &[DocumentFormat] {
        &[DocumentFormat::Pdf]
    }

    fn is_available(&self) -> bool {
        tool_available(PDFTOTEXT)
    }

    async fn extract_pages(&self, path: &Path) -> ExtractionResult<Vec<String>> {
        let stdout = run_tool(
            PDFTOTEXT,
            &[
                OsStr::new("-enc"),
                OsStr::new("UTF-8"),
                path.as_os_str(),
                OsStr::new("-"),
            ],
        )
        .await?;

        let pages = split_pages(&String::from_utf8_lossy(&stdout));
        tracing::info!("{} has {} page(s)", path.display(), pages.len());
        Ok(pages)
    }
}

/// Already-extracted roster text saved as a UTF-8 file.
pub struct PlainTextFile;

impl PlainTextFile {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for PlainTextFile {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TextStrategy for PlainTextFile {
    fn name(&self) -> &'static str {
        "plain-text"
    }

    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Digital
    }

    fn supported_formats(&self) -> &[DocumentFormat] {
        &[DocumentFormat::PlainText]
    }

    async fn extract_pages(&self, path: &Path) -> ExtractionResult<Vec<String>> {
        let data = tokio::fs::read(path).await?;
        let text = String::from_utf8(data)
            .map_err(|e| ExtractionError::Failed(format!("{}: {e}", path.display())))?;
        Ok(split_pages(&text))
    }
}

/// Splits on form feeds; `pdftotext` terminates every page with one.
fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split(FORM_FEED).map(str::to_string).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pages_drops_trailing_feed() {
        let pages = split_pages("SD JOAO;\n\u{c}SGT FIALHO;\n\u{c}");
        assert_eq!(pages, vec!["SD JOAO;\n", "SGT FIALHO;\n"]);
    }

    #[test]
    fn test_split_pages_keeps_blank_inner_page() {
        let pages = split_pages("CAPA\u{c}\u{c}SD JOAO");
        assert_eq!(pages, vec!["CAPA", "", "SD JOAO"]);
    }

    #[test]
    fn test_split_pages_single() {
        assert_eq!(split_pages("SD JOAO"), vec!["SD JOAO"]);
        assert_eq!(split_pages(""), vec![""]);
    }

    #[tokio::test]
    async fn test_plain_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("escala.txt");
        std::fs::write(&path, "SD JOAO VICTOR; CB PEREIRA").unwrap();

        let pages = PlainTextFile::new().extract_pages(&path).await.unwrap();

        assert_eq!(pages, vec!["SD JOAO VICTOR; CB PEREIRA"]);
    }

    #[tokio::test]
    async fn test_plain_text_file_rejects_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("escala.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = PlainTextFile::new().extract_pages(&path).await.unwrap_err();

        assert!(matches!(err, ExtractionError::Failed(_)));
    }
}
