use anyhow::Result;

use glossa::config::GlossaConfig;
use glossa::dictionary::types::now_millis;
use glossa::review::format_interval;

use super::format_timestamp;

/// List entries due for review, oldest-due first.
pub fn due(config: &GlossaConfig, limit: Option<usize>) -> Result<()> {
    let store = super::open_store(config)?;
    let now = now_millis();

    let due = store.due_entries(now);
    if due.is_empty() {
        println!("Nothing due. {} words in dictionary.", store.len());
        return Ok(());
    }

    let shown = limit.unwrap_or(due.len()).min(due.len());
    println!("{} words due", due.len());
    println!("{}", "=".repeat(50));
    for entry in due.iter().take(shown) {
        println!(
            "  {:<8} {:<16} {:<24} due {} (interval {})",
            entry.word,
            entry.romanization,
            entry.primary_meaning(),
            format_timestamp(entry.srs.next_review_at),
            format_interval(entry.srs.interval_days),
        );
    }
    if shown < due.len() {
        println!("  ... and {} more", due.len() - shown);
    }

    Ok(())
}
