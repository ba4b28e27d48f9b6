/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Returns `true` when `value` is a non-empty run of ASCII digits.
///
/// Row identifiers arriving from form fields and grid cells are only
/// accepted in this shape; signs, whitespace and decimals are rejected.
pub fn is_all_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Parse an all-digit identifier into a [`DbId`].
///
/// Returns `None` for anything [`is_all_digits`] rejects or that overflows.
pub fn parse_db_id(value: &str) -> Option<DbId> {
    if is_all_digits(value) {
        value.parse().ok()
    } else {
        None
    }
}
