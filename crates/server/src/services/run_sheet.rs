//! Run-sheet CSV export.
//!
//! One row per approved order, every field double-quoted with embedded
//! quotes doubled. Dates are `M/D/YYYY` in UTC.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

pub const HEADER: &str = "Order Number,Customer Name,Approval Date,Notes,Proof URL";

/// One exported order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSheetRow {
    pub order_number: String,
    pub customer_name: String,
    pub approved_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub proof_url: String,
}

/// Render the CSV document: header, `\n`, then rows joined by `\n`.
#[must_use]
pub fn render_csv(rows: &[RunSheetRow]) -> String {
    let lines: Vec<String> = rows
        .iter()
        .map(|row| {
            let date = row
                .approved_at
                .map(|at| at.format("%-m/%-d/%Y").to_string())
                .unwrap_or_default();
            [
                quote(&row.order_number),
                quote(&row.customer_name),
                quote(&date),
                quote(row.notes.as_deref().unwrap_or("")),
                quote(&row.proof_url),
            ]
            .join(",")
        })
        .collect();

    format!("{HEADER}\n{}", lines.join("\n"))
}

/// `run-sheet-YYYY-MM-DD.csv`.
#[must_use]
pub fn file_name(date: NaiveDate) -> String {
    format!("run-sheet-{}.csv", date.format("%Y-%m-%d"))
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn row(name: &str) -> RunSheetRow {
        RunSheetRow {
            order_number: "1042".into(),
            customer_name: name.into(),
            approved_at: Some(Utc.with_ymd_and_hms(2026, 3, 7, 23, 30, 0).unwrap()),
            notes: Some("Gift wrap, \"rush\"".into()),
            proof_url: "https://files.test/proofs/1042.png".into(),
        }
    }

    #[test]
    fn test_header_and_quoting() {
        let csv = render_csv(&[row("O'Brien \"Junior\"")]);
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), HEADER);
        assert_eq!(
            lines.next().unwrap(),
            r#""1042","O'Brien ""Junior""","3/7/2026","Gift wrap, ""rush""","https://files.test/proofs/1042.png""#
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_parses_back_with_csv_reader() {
        let original = "O'Brien \"Junior\"";
        let csv = render_csv(&[row(original), row("Ana, María")]);
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(1), Some("Customer Name"));

        let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get(1), Some(original));
        assert_eq!(records[0].get(3), Some("Gift wrap, \"rush\""));
        assert_eq!(records[1].get(1), Some("Ana, María"));
    }

    #[test]
    fn test_missing_date_and_notes_are_empty_fields() {
        let mut r = row("Jane");
        r.approved_at = None;
        r.notes = None;
        let csv = render_csv(&[r]);
        assert!(csv.ends_with(r#""1042","Jane","","","https://files.test/proofs/1042.png""#));
    }

    #[test]
    fn test_no_trailing_newline() {
        assert_eq!(render_csv(&[]), format!("{HEADER}\n"));
        assert!(!render_csv(&[row("Jane")]).ends_with('\n'));
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(file_name(date), "run-sheet-2026-03-07.csv");
    }
}
