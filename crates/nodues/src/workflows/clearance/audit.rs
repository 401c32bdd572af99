use std::io::Write;

use serde::Deserialize;

use super::domain::ActionRecord;
use super::reconcile::parse_datetime;

/// Parse the action-history feed into chronological audit entries.
///
/// Unlike the reconciliation feeds, the history is display-only: a parse
/// failure is returned to the caller instead of degrading to an empty list.
pub fn parse_history(body: &str) -> Result<Vec<ActionRecord>, serde_json::Error> {
    let rows: Vec<HistoryRow> = serde_json::from_str(body)?;
    let mut records: Vec<ActionRecord> = rows.into_iter().map(HistoryRow::into_record).collect();
    // Entries without a usable timestamp sort to the end.
    records.sort_by_key(|record| match record.timestamp {
        Some(timestamp) => (0, timestamp),
        None => (1, chrono::DateTime::<chrono::Utc>::MAX_UTC),
    });
    Ok(records)
}

/// Export audit entries as CSV for office/admin download.
pub fn export_csv<W: Write>(records: &[ActionRecord], writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(default)]
    student_name: String,
    #[serde(default)]
    display_id: String,
    #[serde(default)]
    roll_number: String,
    #[serde(default)]
    action: String,
    #[serde(default)]
    remarks: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

impl HistoryRow {
    fn into_record(self) -> ActionRecord {
        ActionRecord {
            student_name: self.student_name,
            display_id: self.display_id,
            roll_number: self.roll_number,
            action: self.action,
            remarks: self.remarks.filter(|remarks| !remarks.trim().is_empty()),
            timestamp: self.timestamp.as_deref().and_then(parse_datetime),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn history_body() -> String {
        json!([
            {
                "student_name": "Rahul Nair",
                "display_id": "A-42",
                "roll_number": "23MEC002",
                "action": "approve",
                "remarks": "",
                "timestamp": "2026-07-03T11:00:00Z"
            },
            {
                "student_name": "Asha Verma",
                "display_id": "A-7",
                "roll_number": "23ICS014",
                "action": "reject",
                "remarks": "library dues outstanding",
                "timestamp": "2026-07-02T10:00:00Z"
            },
            {
                "student_name": "No Timestamp",
                "display_id": "A-9",
                "roll_number": "23ICS020",
                "action": "approve"
            }
        ])
        .to_string()
    }

    #[test]
    fn history_is_ordered_chronologically() {
        let records = parse_history(&history_body()).expect("history parses");
        let ids: Vec<&str> = records
            .iter()
            .map(|record| record.display_id.as_str())
            .collect();
        assert_eq!(ids, vec!["A-7", "A-42", "A-9"]);
    }

    #[test]
    fn blank_remarks_are_dropped() {
        let records = parse_history(&history_body()).expect("history parses");
        assert!(records[1].remarks.is_none());
        assert_eq!(
            records[0].remarks.as_deref(),
            Some("library dues outstanding")
        );
    }

    #[test]
    fn malformed_history_is_an_error_not_an_empty_list() {
        assert!(parse_history("<html>").is_err());
    }

    #[test]
    fn csv_export_includes_header_and_rows() {
        let records = parse_history(&history_body()).expect("history parses");
        let mut buffer = Vec::new();
        export_csv(&records, &mut buffer).expect("csv export");

        let rendered = String::from_utf8(buffer).expect("utf8");
        let mut lines = rendered.lines();
        assert_eq!(
            lines.next(),
            Some("student_name,display_id,roll_number,action,remarks,timestamp")
        );
        assert!(rendered.contains("library dues outstanding"));
        assert_eq!(rendered.lines().count(), 4);
    }
}
