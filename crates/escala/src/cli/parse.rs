use std::path::Path;

use anyhow::{bail, Result};
use console::style;

use escala_core::{EscalaConfig, ExtractedText, RosterOutcome, RosterPipeline};

pub async fn run(config: &EscalaConfig, file: &Path, ocr: bool, json: bool) -> Result<()> {
    if !file.exists() {
        bail!("File not found: {}", file.display());
    }

    let pipeline = RosterPipeline::from_config(config)?;
    let output = match pipeline.process_document(file, ocr).await {
        Ok(output) => output,
        Err(e) => bail!(RosterOutcome::Failed(e.to_string()).message()),
    };

    print_extraction(&output.text);

    if json {
        println!("{}", serde_json::to_string_pretty(&output.people)?);
        return Ok(());
    }

    if output.is_empty() {
        eprintln!("{} {}", style("!").yellow(), RosterOutcome::Empty.message());
        return Ok(());
    }

    for person in &output.people {
        println!("{person}");
    }
    eprintln!(
        "{} {} people in {} ms",
        style("●").green(),
        output.people.len(),
        output.duration_ms
    );

    Ok(())
}

fn print_extraction(text: &ExtractedText) {
    let method = text
        .method
        .map_or_else(|| "none".to_string(), |m| m.to_string());
    eprintln!(
        "  Text: {} characters from {} page(s) via {}",
        text.content_chars(),
        text.page_count,
        method
    );
    for degradation in &text.degradations {
        eprintln!("  {} {}", style("!").yellow(), degradation);
    }
}
