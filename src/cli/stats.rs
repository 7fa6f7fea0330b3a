use anyhow::Result;

use glossa::config::GlossaConfig;
use glossa::dictionary::types::now_millis;

/// Display dictionary and review statistics in the terminal.
pub fn stats(config: &GlossaConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let store = super::open_store(config)?;
    let stats = store.stats(now_millis());

    println!("Dictionary Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total words:         {}", stats.total);
    println!("  Due now:             {}", stats.due_now);
    println!("  Due by end of today: {}", stats.due_today);
    println!("  Reviewed today:      {}", stats.reviewed_today);
    println!();

    println!("By Stage:");
    println!("  {:<12} {}", "new", stats.new_words);
    println!("  {:<12} {}", "learning", stats.learning);
    println!("  {:<12} {}", "mature", stats.mature);
    println!();

    let db_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);
    println!("Database size:         {db_size} bytes");

    Ok(())
}
