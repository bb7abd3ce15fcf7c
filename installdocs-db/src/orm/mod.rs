pub mod alert;
pub mod building;
pub mod daily_alert_count;
mod db;
pub mod device;
pub mod group;
pub mod history;
pub mod login_attempt;
pub mod notification;
pub mod testing;
pub mod ticket;
pub mod ticket_entry;
pub mod ticket_misc_entry;
pub mod user;
pub mod user_session;
pub mod verification_token;

pub use db::*;

use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::BigInt;

use crate::error::{DbError, DbResult};

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = BigInt)]
    last_insert_rowid: i64,
}

/// Row id of the most recent insert on this connection.
pub(crate) fn last_insert_rowid(conn: &mut SqliteConnection) -> DbResult<i32> {
    let row = diesel::sql_query("SELECT last_insert_rowid() as last_insert_rowid")
        .get_result::<LastInsertRowId>(conn)?;
    i32::try_from(row.last_insert_rowid)
        .map_err(|_| DbError::validation("id", format!("row id {} out of range", row.last_insert_rowid)))
}

/// Turns an UPDATE or DELETE that touched no rows into `NotFound`.
pub(crate) fn ensure_found(affected: usize) -> DbResult<usize> {
    if affected == 0 {
        Err(DbError::NotFound)
    } else {
        Ok(affected)
    }
}

pub(crate) fn new_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}
