use anyhow::{bail, Result};
use console::style;

use escala_core::registry::SUGGESTION_THRESHOLD;
use escala_core::{normalize_label, EscalaConfig, ExternalId, MatchResult, RegistryMatcher};

use super::open_store;

pub async fn run_register(config: &EscalaConfig, label: &str, id: ExternalId) -> Result<()> {
    let mut store = open_store(config).await?;

    if !store.registry_mut().register(label, id)? {
        bail!("{} is already registered", normalize_label(label));
    }
    store.save().await?;

    println!("Registered {} for {}", normalize_label(label), id);
    Ok(())
}

pub async fn run_unregister(config: &EscalaConfig, id: ExternalId) -> Result<()> {
    let mut store = open_store(config).await?;

    match store.registry_mut().remove_by_external_id(id) {
        Some(entry) => {
            store.save().await?;
            println!("Removed {}", entry.canonical_label);
        }
        None => eprintln!("{} No registration for {}", style("○").dim(), id),
    }
    Ok(())
}

pub async fn run_status(config: &EscalaConfig, id: ExternalId) -> Result<()> {
    let store = open_store(config).await?;

    match store.registry().find_by_external_id(id) {
        Some(entry) => println!(
            "Registered as {} since {}",
            entry.canonical_label,
            entry.registered_at.format("%Y-%m-%d")
        ),
        None => println!("Not registered"),
    }
    Ok(())
}

pub async fn run_resolve(config: &EscalaConfig, label: &str) -> Result<()> {
    let store = open_store(config).await?;
    let matcher = RegistryMatcher::default();
    let label = normalize_label(label);

    match matcher.resolve(&label, store.registry()) {
        MatchResult::Resolved { entry, kind } => println!(
            "{label} -> {} ({}, {kind})",
            entry.canonical_label, entry.external_id
        ),
        MatchResult::NoMatch => {
            match matcher.closest(&label, store.registry(), SUGGESTION_THRESHOLD) {
                Some((entry, _)) => println!(
                    "{label} -> not registered (did you mean {}?)",
                    entry.canonical_label
                ),
                None => println!("{label} -> not registered"),
            }
        }
    }
    Ok(())
}
