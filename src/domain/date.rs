use chrono::NaiveDate;

/// Calendar date format used on the wire and in summaries.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` string.
///
/// Blank input yields `Ok(None)`. Anything else must be an existing
/// calendar date in the exact format.
pub fn parse_date(s: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).map(Some)
}

/// Returns true if the string is a valid `YYYY-MM-DD` calendar date.
pub fn is_valid_date(s: &str) -> bool {
    matches!(parse_date(s), Ok(Some(_)))
}
