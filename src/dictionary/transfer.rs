//! JSON export/import document.
//!
//! An export is a wrapper object holding every entry in the current record
//! format. Import accepts that wrapper or a bare array of records, and runs
//! each record through [`upgrade_record`] so older dumps load the same way the
//! store does.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::{encode_record, upgrade_record, RECORD_VERSION};
use super::types::{DictionaryEntry, Timestamp};
use super::DictionaryStore;

pub const EXPORT_FORMAT: &str = "glossa-dictionary";

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportDocument {
    pub format: String,
    pub version: u32,
    /// RFC 3339, informational only.
    pub exported_at: String,
    pub entries: Vec<Value>,
}

/// Snapshot every entry of `store`, oldest first.
pub fn build_export(store: &DictionaryStore, exported_at: &str) -> Result<ExportDocument> {
    let entries = store
        .export_entries()
        .iter()
        .map(|entry| {
            let raw = encode_record(entry)?;
            serde_json::from_str(&raw.json)
                .with_context(|| format!("failed to re-read record for {}", entry.word))
        })
        .collect::<Result<Vec<Value>>>()?;

    Ok(ExportDocument {
        format: EXPORT_FORMAT.to_string(),
        version: RECORD_VERSION,
        exported_at: exported_at.to_string(),
        entries,
    })
}

/// Pull the record list out of an import file.
pub fn read_import(json: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(json).context("failed to parse import JSON")?;
    match value {
        Value::Array(records) => Ok(records),
        Value::Object(mut doc) => match doc.remove("entries") {
            Some(Value::Array(records)) => Ok(records),
            _ => bail!("import document has no `entries` array"),
        },
        _ => bail!("import file must be a JSON array or an export document"),
    }
}

/// Decode one imported record, filling anything an older format lacks.
pub fn decode_import_record(record: &Value, now: Timestamp) -> Result<DictionaryEntry> {
    let (entry, _) = upgrade_record(&record.to_string(), now)?;
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: Timestamp = 1_700_000_000_000;

    #[test]
    fn export_document_carries_versioned_records() {
        let mut store = DictionaryStore::in_memory();
        store.upsert("二", "èr", "two", T0 + 1).unwrap();
        store.upsert("一", "yī", "one", T0).unwrap();

        let doc = build_export(&store, "2026-01-01T00:00:00Z").unwrap();
        assert_eq!(doc.format, EXPORT_FORMAT);
        assert_eq!(doc.entries.len(), 2);
        assert_eq!(doc.entries[0]["word"], "一");
        assert_eq!(doc.entries[0]["version"], RECORD_VERSION);
        assert_eq!(doc.entries[1]["easeFactor"], 2.5);
    }

    #[test]
    fn read_import_accepts_bare_array_and_document() {
        let bare = read_import(r#"[{"word":"猫","meaning":"cat"}]"#).unwrap();
        assert_eq!(bare.len(), 1);

        let doc = read_import(r#"{"format":"glossa-dictionary","entries":[{"word":"狗"}]}"#).unwrap();
        assert_eq!(doc.len(), 1);

        assert!(read_import(r#"{"words":[]}"#).is_err());
        assert!(read_import("42").is_err());
        assert!(read_import("not json").is_err());
    }

    #[test]
    fn decode_upgrades_legacy_record() {
        let value: Value = serde_json::from_str(r#"{"word":"猫","pinyin":"māo","meaning":"cat"}"#).unwrap();
        let entry = decode_import_record(&value, T0).unwrap();
        assert_eq!(entry.romanization, "māo");
        assert_eq!(entry.meanings, vec!["cat"]);
        assert_eq!(entry.srs.next_review_at, T0);

        let empty: Value = serde_json::from_str(r#"{"word":"空","meanings":[]}"#).unwrap();
        assert!(decode_import_record(&empty, T0).is_err());
    }
}
