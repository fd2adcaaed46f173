//! Human-readable and JSON rendering of recording listings.

use serde_json::Value;

use crate::recording::RecordingEntry;

/// Renders entries as a fixed-width table for terminal output.
#[must_use]
pub fn format_entries_human(entries: &[&RecordingEntry]) -> String {
    if entries.is_empty() {
        return "No recordings found".to_string();
    }
    let id_width = entries.iter().map(|e| e.id.len()).max().unwrap_or(2).max(2);
    let status_width =
        entries.iter().map(|e| e.status.as_str().len()).max().unwrap_or(6).max(6);

    let mut out = format!(
        "{:<id_width$}  {:<status_width$}  {:<20}  {}\n",
        "ID", "STATUS", "CREATED", "RUNTIME"
    );
    for entry in entries {
        out.push_str(&format!(
            "{:<id_width$}  {:<status_width$}  {:<20}  {}\n",
            entry.id,
            entry.status.as_str(),
            entry.create_time.format("%Y-%m-%d %H:%M:%S"),
            entry.runtime,
        ));
    }
    out.pop();
    out
}

/// Renders entries as a JSON array of their external representation.
#[must_use]
pub fn format_entries_json(entries: &[&RecordingEntry]) -> String {
    let values: Vec<Value> = entries.iter().map(|e| e.to_external_json()).collect();
    serde_json::to_string_pretty(&values).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entry(id: &str) -> RecordingEntry {
        RecordingEntry::new(
            id,
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap(),
            "chromium",
        )
    }

    #[test]
    fn empty_listing_reports_no_recordings() {
        assert_eq!(format_entries_human(&[]), "No recordings found");
    }

    #[test]
    fn human_table_lists_every_entry() {
        let a = entry("rec-aa");
        let b = entry("rec-bb");
        let table = format_entries_human(&[&a, &b]);
        assert!(table.starts_with("ID"));
        assert!(table.contains("rec-aa"));
        assert!(table.contains("rec-bb"));
        assert!(table.contains("unknown"));
        assert!(table.contains("2024-05-01 10:30:00"));
    }

    #[test]
    fn json_listing_uses_external_shape() {
        let mut a = entry("rec-aa");
        a.build_id = Some("internal".into());
        let json = format_entries_json(&[&a]);
        let parsed: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["id"], "rec-aa");
        assert!(parsed[0].get("buildId").is_none());
    }
}
