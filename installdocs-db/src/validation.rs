//! Input checks that run before a row is written.
//!
//! SQLite does not enforce declared text lengths, so the column bounds of the
//! schema are checked here instead.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_SHORT_LEN: usize = 50;
pub const MAX_TOKEN_LEN: usize = 255;
pub const MAX_SESSION_TOKEN_LEN: usize = 512;
pub const MAX_IP_ADDRESS_LEN: usize = 45;
/// 999999999 days less one second.
pub const MAX_DURATION_SECONDS: i64 = 999_999_999 * 86_400 + 86_399;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("email pattern is valid")
});

/// Checks that `email` looks like an address and fits the column.
pub fn validate_email(email: &str) -> DbResult<()> {
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(DbError::validation(
            "email",
            format!("must be at most {} characters", MAX_EMAIL_LEN),
        ));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(DbError::validation(
            "email",
            format!("'{}' is not a valid email address", email),
        ));
    }
    Ok(())
}

/// Required text: non-blank and at most `max` characters.
pub fn require_text(field: &'static str, value: &str, max: usize) -> DbResult<()> {
    if value.trim().is_empty() {
        return Err(DbError::validation(field, "must not be empty"));
    }
    limit_text(field, Some(value), max)
}

/// Optional text: at most `max` characters when present.
pub fn limit_text(field: &'static str, value: Option<&str>, max: usize) -> DbResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(DbError::validation(
            field,
            format!("must be at most {} characters", max),
        )),
        _ => Ok(()),
    }
}

/// Parses a textual UUID key.
pub fn parse_uuid(field: &'static str, value: &str) -> DbResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| DbError::validation(field, format!("'{}' is not a UUID: {}", value, e)))
}

/// Durations are stored as whole seconds, from zero to
/// [`MAX_DURATION_SECONDS`].
pub fn validate_duration(field: &'static str, seconds: Option<i64>) -> DbResult<()> {
    match seconds {
        Some(s) if s < 0 => Err(DbError::validation(field, "must not be negative")),
        Some(s) if s > MAX_DURATION_SECONDS => Err(DbError::validation(
            field,
            format!("must be at most {} seconds", MAX_DURATION_SECONDS),
        )),
        _ => Ok(()),
    }
}
