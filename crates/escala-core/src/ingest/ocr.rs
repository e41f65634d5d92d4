use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::command::{run_tool, tool_available, PDFTOPPM, TESSERACT};
use super::format::DocumentFormat;
use super::text::{ExtractionError, ExtractionMethod, ExtractionResult, TextStrategy};
use crate::config::{DEFAULT_OCR_DPI, DEFAULT_OCR_LANGUAGE};

const PAGE_PREFIX: &str = "page";

/// Scanned-roster fallback: `pdftoppm` rasterizes, `tesseract` recognizes.
pub struct TesseractOcr {
    language: String,
    dpi: u32,
}

impl TesseractOcr {
    #[must_use]
    pub const fn new(language: String, dpi: u32) -> Self {
        Self { language, dpi }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub const fn dpi(&self) -> u32 {
        self.dpi
    }

    async fn render_pages(&self, path: &Path, workdir: &Path) -> ExtractionResult<Vec<PathBuf>> {
        let dpi = self.dpi.to_string();
        let prefix = workdir.join(PAGE_PREFIX);

        run_tool(
            PDFTOPPM,
            &[
                OsStr::new("-r"),
                OsStr::new(&dpi),
                OsStr::new("-png"),
                path.as_os_str(),
                prefix.as_os_str(),
            ],
        )
        .await?;

        let mut rendered = Vec::new();
        let mut entries = tokio::fs::read_dir(workdir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let image = entry.path();
            if let Some(number) = page_number(&image) {
                rendered.push((number, image));
            }
        }
        rendered.sort_by_key(|(number, _)| *number);

        Ok(rendered.into_iter().map(|(_, image)| image).collect())
    }

    async fn recognize(&self, image: &Path) -> ExtractionResult<String> {
        let stdout = run_tool(
            TESSERACT,
            &[
                image.as_os_str(),
                OsStr::new("stdout"),
                OsStr::new("-l"),
                OsStr::new(&self.language),
            ],
        )
        .await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new(DEFAULT_OCR_LANGUAGE.to_string(), DEFAULT_OCR_DPI)
    }
}

#[async_trait::async_trait]
impl TextStrategy for TesseractOcr {
    fn name(&self) -> &'static str {
        TESSERACT
    }

    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Optical
    }

    fn supported_formats(&self) -> &[DocumentFormat] {
        &[DocumentFormat::Pdf]
    }

    fn is_available(&self) -> bool {
        tool_available(PDFTOPPM) && tool_available(TESSERACT)
    }

    async fn extract_pages(&self, path: &Path) -> ExtractionResult<Vec<String>> {
        if !self.is_available() {
            return Err(ExtractionError::OpticalBackendUnavailable);
        }

        let workdir = tempfile::tempdir()?;

        tracing::info!("Rendering {} at {} DPI for OCR", path.display(), self.dpi);
        let images = self.render_pages(path, workdir.path()).await?;
        if images.is_empty() {
            return Err(ExtractionError::Failed(format!(
                "{PDFTOPPM} rendered no pages from {}",
                path.display()
            )));
        }

        tracing::info!("Recognizing {} page(s) with lang={}", images.len(), self.language);
        let mut pages = Vec::with_capacity(images.len());
        for (index, image) in images.iter().enumerate() {
            let text = self.recognize(image).await?;
            tracing::debug!(
                "OCR page {}: {} characters recognized",
                index + 1,
                text.chars().count()
            );
            pages.push(text);
        }

        Ok(pages)
    }
}

/// `page-7.png` / `page-07.png` -> 7. Zero padding depends on the page count.
fn page_number(image: &Path) -> Option<u32> {
    if image.extension().and_then(|e| e.to_str()) != Some("png") {
        return None;
    }
    let stem = image.file_stem()?.to_str()?;
    let digits = stem.strip_prefix(PAGE_PREFIX)?.strip_prefix('-')?;
    digits.parse().ok()
}
