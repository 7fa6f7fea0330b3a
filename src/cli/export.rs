use anyhow::Result;

use glossa::config::GlossaConfig;
use glossa::dictionary::transfer::build_export;

/// Export the whole dictionary as JSON to stdout.
pub fn export(config: &GlossaConfig) -> Result<()> {
    let store = super::open_store(config)?;

    let data = build_export(&store, &chrono::Local::now().to_rfc3339())?;

    let json = serde_json::to_string_pretty(&data)?;
    println!("{json}");

    eprintln!("Exported {} words.", data.entries.len());

    Ok(())
}
