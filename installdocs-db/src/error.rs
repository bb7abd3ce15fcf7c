//! Error taxonomy for the data-access layer.
//!
//! Every operation in [`crate::orm`] returns [`DbResult`]. Store errors are
//! classified once, here, so callers can tell a constraint violation from a
//! missing row without inspecting diesel error kinds themselves.

use std::fmt;

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

/// Which kind of column-level constraint the store rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    Check,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::Unique => "unique",
            ConstraintKind::ForeignKey => "foreign key",
            ConstraintKind::NotNull => "not null",
            ConstraintKind::Check => "check",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{kind} constraint violated: {message}")]
    ConstraintViolation { kind: ConstraintKind, message: String },

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("record not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[source] DieselError),

    #[error("could not connect to database: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl DbError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        DbError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// The violated constraint, if this error is a constraint violation.
    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            DbError::ConstraintViolation { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        self.constraint_kind().is_some()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound)
    }
}

/// SQLite reports some constraint failures, such as a RESTRICT on delete,
/// without an extended result code. The message prefix still names the kind.
fn constraint_from_message(message: &str) -> Option<ConstraintKind> {
    const PREFIXES: [(&str, ConstraintKind); 4] = [
        ("FOREIGN KEY constraint failed", ConstraintKind::ForeignKey),
        ("UNIQUE constraint failed", ConstraintKind::Unique),
        ("NOT NULL constraint failed", ConstraintKind::NotNull),
        ("CHECK constraint failed", ConstraintKind::Check),
    ];
    PREFIXES
        .iter()
        .find(|(prefix, _)| message.starts_with(prefix))
        .map(|(_, kind)| *kind)
}

impl From<DieselError> for DbError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => DbError::NotFound,
            DieselError::DatabaseError(kind, info) => {
                let constraint = match kind {
                    DatabaseErrorKind::UniqueViolation => Some(ConstraintKind::Unique),
                    DatabaseErrorKind::ForeignKeyViolation => Some(ConstraintKind::ForeignKey),
                    DatabaseErrorKind::NotNullViolation => Some(ConstraintKind::NotNull),
                    DatabaseErrorKind::CheckViolation => Some(ConstraintKind::Check),
                    DatabaseErrorKind::Unknown => constraint_from_message(info.message()),
                    _ => None,
                };
                match constraint {
                    Some(kind) => DbError::ConstraintViolation {
                        kind,
                        message: info.message().to_string(),
                    },
                    None => DbError::Database(DieselError::DatabaseError(kind, info)),
                }
            }
            other => DbError::Database(other),
        }
    }
}

impl From<diesel::r2d2::PoolError> for DbError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        DbError::Pool(err.to_string())
    }
}
