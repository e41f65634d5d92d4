use std::path::Path;

use anyhow::{bail, Result};
use chrono::Local;
use console::style;

use escala_core::{notification_text, AckToken, EscalaConfig, RosterOutcome, RosterPipeline};

use super::open_store;

pub struct PlanOptions<'a> {
    pub document: &'a str,
    pub ocr: bool,
    pub force: bool,
    pub messages: bool,
}

pub async fn run(config: &EscalaConfig, file: &Path, options: &PlanOptions<'_>) -> Result<()> {
    let document = options.document;
    if document.is_empty() || document.contains('_') {
        bail!("Document id must be non-empty and must not contain '_': {document:?}");
    }
    if !file.exists() {
        bail!("File not found: {}", file.display());
    }

    let mut store = open_store(config).await?;
    if store.is_processed(document) && !options.force {
        eprintln!(
            "{} Document {} was already processed (use --force to plan again)",
            style("○").dim(),
            document
        );
        return Ok(());
    }

    let pipeline = RosterPipeline::from_config(config)?.with_force_optical(options.ocr);
    let document_name = file.file_name().map_or_else(
        || file.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    );

    let result = pipeline.process(file).await;
    let found = {
        let outcome = RosterOutcome::from_extraction(
            &document_name,
            result,
            store.registry(),
            pipeline.matcher(),
        );

        match &outcome {
            RosterOutcome::Failed(_) => bail!(outcome.message()),
            RosterOutcome::Empty => {
                println!("{}", outcome.message());
                false
            }
            RosterOutcome::Found(plan) => {
                print!("{}", plan.summary());
                let today = Local::now().date_naive();
                for recipient in &plan.recipients {
                    println!(
                        "{} {} {} ({})",
                        style("→").green(),
                        recipient.entry.external_id,
                        recipient.person,
                        recipient.kind
                    );
                    if options.messages {
                        let token = AckToken::new(document, recipient.person.full_label());
                        println!();
                        println!(
                            "{}",
                            notification_text(&recipient.person, &document_name, today)
                        );
                        println!("[ack: {}]", token.encode());
                        println!();
                    }
                }
                true
            }
        }
    };

    if found {
        store.mark_processed(document);
        store.save().await?;
    }
    Ok(())
}
