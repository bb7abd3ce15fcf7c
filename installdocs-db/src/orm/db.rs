use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

use crate::config::DbConfig;
use crate::error::{DbError, DbResult};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type PooledConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Enables foreign key support for SQLite connections.
///
/// Foreign keys are disabled by default in SQLite for backwards
/// compatibility, so every connection the crate hands out runs this first.
pub fn set_foreign_keys(conn: &mut SqliteConnection) -> DbResult<()> {
    conn.batch_execute("PRAGMA foreign_keys = ON")?;
    Ok(())
}

fn apply_pragmas(conn: &mut SqliteConnection, busy_timeout: Duration) -> QueryResult<()> {
    conn.batch_execute(&format!(
        "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
        busy_timeout.as_millis()
    ))
}

/// Runs all pending database migrations on the provided connection and
/// returns the versions that were applied.
pub fn run_pending_migrations(conn: &mut SqliteConnection) -> DbResult<Vec<String>> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| DbError::Migration(e.to_string()))?;
    let versions: Vec<String> = applied.iter().map(|v| v.to_string()).collect();
    if !versions.is_empty() {
        tracing::info!(count = versions.len(), "applied pending migrations");
    }
    Ok(versions)
}

/// Opens a single connection with foreign keys and the busy timeout set.
pub fn establish_connection(config: &DbConfig) -> DbResult<SqliteConnection> {
    let mut conn = SqliteConnection::establish(&config.database_url)?;
    apply_pragmas(&mut conn, config.busy_timeout)?;
    tracing::debug!(url = %config.database_url, "opened database connection");
    Ok(conn)
}

#[derive(Debug, Clone, Copy)]
struct SqlitePragmas {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        apply_pragmas(conn, self.busy_timeout).map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Builds a connection pool whose connections all have foreign keys enabled.
///
/// Each pooled connection to `:memory:` is its own database, so in-memory
/// pools are only useful with `pool_size = 1`.
pub fn build_pool(config: &DbConfig) -> DbResult<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(&config.database_url);
    let pool = Pool::builder()
        .max_size(config.pool_size)
        .connection_customizer(Box::new(SqlitePragmas {
            busy_timeout: config.busy_timeout,
        }))
        .build(manager)?;
    tracing::info!(
        url = %config.database_url,
        pool_size = config.pool_size,
        "database pool ready"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use diesel::sql_types::{BigInt, Integer};

    use super::*;

    #[derive(QueryableByName)]
    struct ForeignKeys {
        #[diesel(sql_type = Integer)]
        foreign_keys: i32,
    }

    #[derive(QueryableByName)]
    struct BusyTimeout {
        #[diesel(sql_type = BigInt)]
        timeout: i64,
    }

    fn single_memory_config() -> DbConfig {
        let mut config = DbConfig::new(":memory:");
        config.pool_size = 1;
        config.busy_timeout = Duration::from_millis(1234);
        config
    }

    #[test]
    fn test_pooled_connections_have_foreign_keys_enabled() {
        let pool = build_pool(&single_memory_config()).expect("pool should build");
        let mut conn = pool.get().expect("connection");

        let fk = diesel::sql_query("PRAGMA foreign_keys")
            .get_result::<ForeignKeys>(&mut conn)
            .unwrap();
        assert_eq!(fk.foreign_keys, 1);

        let busy = diesel::sql_query("PRAGMA busy_timeout")
            .get_result::<BusyTimeout>(&mut conn)
            .unwrap();
        assert_eq!(busy.timeout, 1234);
    }

    #[test]
    fn test_migrations_apply_once() {
        let mut conn = establish_connection(&single_memory_config()).unwrap();

        let first = run_pending_migrations(&mut conn).unwrap();
        assert_eq!(first.len(), 7);

        let second = run_pending_migrations(&mut conn).unwrap();
        assert!(second.is_empty());
    }
}
