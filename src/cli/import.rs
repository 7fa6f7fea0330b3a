use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use glossa::config::GlossaConfig;
use glossa::dictionary::transfer::{decode_import_record, read_import};
use glossa::dictionary::types::now_millis;

/// Import words from a JSON file produced by `glossa export` (or a bare
/// array of records).
///
/// Words already in the dictionary are merged: meanings are appended, usage
/// counts summed, and the existing review schedule is kept.
pub fn import(config: &GlossaConfig, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;

    let records = read_import(&json)?;
    let mut store = super::open_store(config)?;
    let now = now_millis();

    println!("Importing {} records...", records.len());

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len}")
            .context("invalid progress template")?
            .progress_chars("##-"),
    );

    let mut entries = Vec::with_capacity(records.len());
    let mut skipped = 0u64;
    for record in &records {
        match decode_import_record(record, now) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "skipping import record");
                skipped += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let report = store.import_entries(entries)?;

    println!("Import complete:");
    println!("  Words imported: {}", report.imported);
    println!("  Words merged:   {} (already known)", report.merged);
    if skipped > 0 {
        println!("  Skipped:        {skipped} (unreadable)");
    }

    Ok(())
}
