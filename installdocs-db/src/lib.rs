//! Persistence layer for the installation-docs service: users and their
//! sessions, groups, buildings and devices, tickets with logged work,
//! notifications, alerts and the audit history.
//!
//! Storage is SQLite through diesel. Every connection handed out by this
//! crate has foreign key enforcement switched on; see [`orm::set_foreign_keys`]
//! and [`orm::build_pool`].

pub mod config;
pub mod error;
pub mod models;
pub mod orm;
pub mod schema;
pub mod validation;

#[cfg(test)]
pub mod generate_types;

pub use config::DbConfig;
pub use error::{ConstraintKind, DbError, DbResult};
pub use orm::{DbPool, MIGRATIONS};
