pub mod audit_commands;
pub mod building_commands;
pub mod device_commands;
pub mod group_commands;
pub mod report_commands;
pub mod ticket_commands;
pub mod user_commands;
pub mod utils;

use diesel::sqlite::SqliteConnection;
use installdocs_db::orm::run_pending_migrations;

pub fn migrate_impl(conn: &mut SqliteConnection) -> Result<(), Box<dyn std::error::Error>> {
    let applied = run_pending_migrations(conn)?;
    if applied.is_empty() {
        println!("Database schema is up to date.");
    } else {
        println!("Applied {} migration(s):", applied.len());
        for version in applied {
            println!("  {}", version);
        }
    }
    Ok(())
}
