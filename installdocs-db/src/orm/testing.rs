//! Fixtures shared by unit tests and the integration tests under `tests/`.

use diesel::prelude::*;

use super::db::{run_pending_migrations, set_foreign_keys};
use crate::models::{Building, BuildingInput, Ticket, User, UserInput};
use crate::orm::{building::insert_building, ticket::insert_ticket, user::insert_user};

/// Opens a fresh in-memory database with foreign keys enabled and every
/// migration applied.
///
/// # Panics
/// Panics if the connection cannot be opened or a migration fails.
pub fn setup_test_db() -> SqliteConnection {
    let mut conn =
        SqliteConnection::establish(":memory:").expect("Failed to create in-memory database");
    set_foreign_keys(&mut conn).expect("Failed to enable foreign keys");
    run_pending_migrations(&mut conn).expect("Failed to run migrations");
    conn
}

/// Inserts an active user with no roles. The user name is taken from the
/// local part of `email`.
pub fn create_test_user(conn: &mut SqliteConnection, email: &str) -> User {
    let name = email.split('@').next().unwrap_or(email);
    insert_user(conn, UserInput::new(email, "not-a-real-hash", name))
        .unwrap_or_else(|e| panic!("Failed to create test user {}: {}", email, e))
}

pub fn create_test_building(conn: &mut SqliteConnection, name: &str) -> Building {
    insert_building(
        conn,
        BuildingInput {
            building_name: name.to_string(),
            description: None,
        },
    )
    .unwrap_or_else(|e| panic!("Failed to create test building {}: {}", name, e))
}

pub fn create_test_ticket(conn: &mut SqliteConnection, number: &str) -> Ticket {
    insert_ticket(conn, number)
        .unwrap_or_else(|e| panic!("Failed to create test ticket {}: {}", number, e))
}
