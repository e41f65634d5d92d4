use std::ffi::OsStr;
use std::process::Stdio;

use tokio::process::Command;

use super::text::{ExtractionError, ExtractionResult};

pub const PDFTOTEXT: &str = "pdftotext";
pub const PDFTOPPM: &str = "pdftoppm";
pub const TESSERACT: &str = "tesseract";

pub fn tool_available(tool: &str) -> bool {
    which::which(tool).is_ok()
}

/// Runs an external tool to completion and returns its stdout.
pub async fn run_tool(tool: &'static str, args: &[&OsStr]) -> ExtractionResult<Vec<u8>> {
    let binary = which::which(tool).map_err(|_| ExtractionError::ToolNotFound(tool))?;

    tracing::debug!("Running {} {:?}", tool, args);

    let output = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        return Err(ExtractionError::Tool {
            tool,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output.stdout)
}
