pub mod doctor;
pub mod due;
pub mod export;
pub mod import;
pub mod lookup;
pub mod reset;
pub mod review;
pub mod segment;
pub mod stats;

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use std::io::{Read, Write};

use glossa::config::GlossaConfig;
use glossa::dictionary::types::now_millis;
use glossa::dictionary::{DictionaryStore, SqliteBackend, Timestamp};

/// Open the configured database and load the dictionary from it.
pub fn open_store(config: &GlossaConfig) -> Result<DictionaryStore> {
    let db_path = config.resolved_db_path();
    let conn = glossa::db::open_database(&db_path)?;
    Ok(DictionaryStore::open(
        Box::new(SqliteBackend::new(conn)),
        now_millis(),
    ))
}

/// Text from the argument, or all of stdin when none was given.
pub fn read_text(text: Option<String>) -> Result<String> {
    match text {
        Some(t) => Ok(t),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read text from stdin")?;
            Ok(buf)
        }
    }
}

/// Print `prompt` and read one line. `None` on end of input.
pub fn prompt_line(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    std::io::stdout().flush()?;

    let mut input = String::new();
    let read = std::io::stdin().read_line(&mut input)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

pub fn format_timestamp(ts: Timestamp) -> String {
    if ts == 0 {
        return "never".to_string();
    }
    Local
        .timestamp_millis_opt(ts)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
