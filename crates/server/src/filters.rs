//! Custom Askama template filters for the public proof pages.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// `30` becomes `30 minutes`, `1` becomes `1 minute`.
///
/// Usage in templates: `{{ undo_minutes|as_minutes }}`
#[askama::filter_fn]
pub fn as_minutes(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(count_label(&value.to_string(), "minute"))
}

/// `24` becomes `24 hours`, `1` becomes `1 hour`.
#[askama::filter_fn]
pub fn as_hours(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(count_label(&value.to_string(), "hour"))
}

fn count_label(count: &str, unit: &str) -> String {
    if count == "1" {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_label() {
        assert_eq!(count_label("30", "minute"), "30 minutes");
        assert_eq!(count_label("1", "minute"), "1 minute");
        assert_eq!(count_label("24", "hour"), "24 hours");
    }
}
