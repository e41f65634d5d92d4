use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::AsyncReadExt;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    PlainText,
    Pdf,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "txt" | "text" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Extension first, then the `%PDF-` magic for attachments saved without one.
    pub async fn detect(path: &Path) -> std::io::Result<Option<Self>> {
        if let Some(format) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
        {
            return Ok(Some(format));
        }

        let mut file = tokio::fs::File::open(path).await?;
        let mut head = [0u8; PDF_MAGIC.len()];
        let read = file.read(&mut head).await?;
        Ok((&head[..read] == PDF_MAGIC).then_some(Self::Pdf))
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "plain_text",
            Self::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
