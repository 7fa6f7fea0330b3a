//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};

use glossa::config::GlossaConfig;
use glossa::db;

/// Run database diagnostics and print a health report.
pub fn doctor(config: &GlossaConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `glossa segment <text>` or `glossa import <file>` to create it.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path).context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&conn).context("failed to run health check")?;

    println!("Glossa Health Report");
    println!("====================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!();
    println!("AI segmentation:");
    println!("  Endpoint:        {}", config.ai.endpoint);
    println!("  Model:           {}", config.ai.model);
    if config.ai.api_key.is_empty() {
        println!("  API key:         (not set) segment will fall back for unknown words");
    } else {
        println!("  API key:         set");
    }
    println!();
    println!("Row counts:");
    println!("  Words:           {}", report.entry_count);
    println!("  Review log:      {}", report.review_log_count);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
    }

    if !report.integrity_ok {
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db ~/.glossa/dictionary.db");
        println!("  2. Or export from a good copy and reimport:");
        println!("     glossa export > backup.json");
        println!("     glossa reset && glossa import backup.json");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
