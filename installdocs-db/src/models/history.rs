use chrono::NaiveDateTime;
use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::JsonDocument;
use crate::schema::history;

/// Audit trail row: which record of which table was touched, how, and by whom.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(belongs_to(crate::models::user::User))]
#[diesel(table_name = history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct History {
    pub id: i32,
    pub table_name: String,
    pub record_id: i64,
    pub action: String, // 'create', 'update', 'delete', ...
    pub user_id: String,
    #[ts(type = "unknown | null")]
    pub changes: Option<JsonDocument>,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone, Deserialize, Serialize, TS)]
#[diesel(table_name = history)]
#[ts(export)]
pub struct NewHistory {
    pub table_name: String,
    pub record_id: i64,
    pub action: String,
    pub user_id: String,
    #[ts(type = "unknown | null")]
    pub changes: Option<JsonDocument>,
}

/// Audit query over history rows. Unset fields do not filter.
#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct HistoryFilter {
    pub table_name: Option<String>,
    pub record_id: Option<i64>,
    pub user_id: Option<String>,
    pub action: Option<String>,
    #[ts(type = "string | null")]
    pub since: Option<NaiveDateTime>,
    #[ts(type = "string | null")]
    pub until: Option<NaiveDateTime>,
    pub limit: Option<i64>,
}
