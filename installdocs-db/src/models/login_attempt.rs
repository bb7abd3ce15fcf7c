use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::login_attempts;

/// Audit row for one sign-in attempt. Written once, never updated.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = login_attempts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct LoginAttempt {
    pub id: i32,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub ip_address: String,
    pub login_origin: Option<String>,
    pub success: bool,
    #[ts(type = "string")]
    pub attempt_time: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone, Deserialize, Serialize, TS)]
#[diesel(table_name = login_attempts)]
#[ts(export)]
pub struct NewLoginAttempt {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub ip_address: String,
    pub login_origin: Option<String>,
    pub success: bool,
}

/// Audit query over login attempts. Unset fields do not filter.
#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct LoginAttemptFilter {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub success: Option<bool>,
    #[ts(type = "string | null")]
    pub since: Option<NaiveDateTime>,
    #[ts(type = "string | null")]
    pub until: Option<NaiveDateTime>,
    pub limit: Option<i64>,
}
