//! Display formatting helpers

use chrono::NaiveDate;

/// Format an ISO date as `January 5, 2024`; anything unparsable is returned unchanged
pub fn format_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
        Ok(parsed) => parsed.format("%B %-d, %Y").to_string(),
        Err(_) => date.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-01-05"), "January 5, 2024");
        assert_eq!(format_date("2023-12-31"), "December 31, 2023");
    }

    #[test]
    fn test_unparsable_date_is_unchanged() {
        assert_eq!(format_date("someday"), "someday");
        assert_eq!(format_date(""), "");
    }
}
