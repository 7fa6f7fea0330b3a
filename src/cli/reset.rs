//! CLI `reset` command: delete every word after user confirmation.

use anyhow::{bail, Result};

use glossa::config::GlossaConfig;

/// Delete the whole dictionary after user confirmation.
pub fn reset(config: &GlossaConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    println!("WARNING: This will permanently delete ALL words and their review schedules.");
    println!("Database: {}", db_path.display());
    println!();

    let confirmed = super::prompt_line("Type YES to confirm: ")?;
    if confirmed.as_deref() != Some("YES") {
        bail!("reset cancelled");
    }

    let mut store = super::open_store(config)?;
    store.clear()?;

    println!("All words deleted. Dictionary reset complete.");
    Ok(())
}
