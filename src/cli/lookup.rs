//! CLI `lookup` command: display everything stored for one word.

use anyhow::Result;

use glossa::config::GlossaConfig;
use glossa::dictionary::types::now_millis;
use glossa::review::{format_interval, preview_intervals};

use super::format_timestamp;

/// Look up a word by exact text and display its entry.
pub fn lookup(config: &GlossaConfig, word: &str) -> Result<()> {
    let store = super::open_store(config)?;

    let Some(entry) = store.lookup(word) else {
        println!("{word}: not in dictionary");
        return Ok(());
    };

    let srs = &entry.srs;
    println!("Word: {}", entry.word);
    println!("{}", "=".repeat(50));
    if !entry.romanization.is_empty() {
        println!("  Romanization:   {}", entry.romanization);
    }
    println!("  Added:          {}", format_timestamp(entry.added_at));
    println!("  Seen:           {} times", entry.usage_count);
    println!();
    println!("Meanings:");
    for (i, meaning) in entry.meanings.iter().enumerate() {
        println!("  {}. {meaning}", i + 1);
    }
    println!();
    println!("Review:");
    println!("  Reviews:        {}", srs.review_count);
    println!("  Ease factor:    {:.2}", srs.ease_factor);
    println!("  Interval:       {}", format_interval(srs.interval_days));
    println!("  Last reviewed:  {}", format_timestamp(srs.last_reviewed_at));
    if srs.is_due(now_millis()) {
        println!("  Next review:    due now");
    } else {
        println!("  Next review:    {}", format_timestamp(srs.next_review_at));
    }

    let preview: Vec<String> = preview_intervals(srs)
        .iter()
        .map(|(q, days)| format!("{q} {}", format_interval(*days)))
        .collect();
    println!("  If graded now:  {}", preview.join(" / "));

    Ok(())
}
