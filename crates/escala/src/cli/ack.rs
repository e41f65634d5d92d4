use anyhow::{bail, Result};

use escala_core::dispatch::ACK_PREFIX;
use escala_core::{AckToken, EscalaConfig, ExternalId};

use super::open_store;

/// `target` is either a bare document id or a full acknowledgement token.
pub async fn run(config: &EscalaConfig, target: &str, id: ExternalId, confirmed: bool) -> Result<()> {
    let document = match AckToken::parse(target) {
        Some(token) => {
            tracing::debug!("Acknowledgement token for {} ({})", token.document, token.label);
            token.document
        }
        None if target.starts_with(&format!("{ACK_PREFIX}_")) => {
            bail!("Malformed acknowledgement token: {target}")
        }
        None => target.to_string(),
    };

    let mut store = open_store(config).await?;
    store.record_acknowledgement(&document, id, confirmed);
    store.save().await?;

    println!(
        "Recorded {} from {} for {}",
        if confirmed { "confirmation" } else { "decline" },
        id,
        document
    );
    Ok(())
}

pub async fn run_list(config: &EscalaConfig, document: &str) -> Result<()> {
    let store = open_store(config).await?;
    let acks = store.acknowledgements(document);

    if acks.is_empty() {
        println!("No acknowledgements for {document}");
        return Ok(());
    }

    for ack in acks {
        let who = store
            .registry()
            .find_by_external_id(ack.external_id)
            .map_or("(unregistered)", |e| e.canonical_label.as_str());
        println!(
            "{} {} {} {}",
            ack.external_id,
            who,
            if ack.confirmed { "confirmed" } else { "declined" },
            ack.recorded_at.format("%d/%m/%Y %H:%M")
        );
    }
    Ok(())
}
