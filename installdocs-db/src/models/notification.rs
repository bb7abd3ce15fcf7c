use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::notifications;

/// A message for a user, a group, or both. Either reference may be null and
/// becomes null when its target is deleted.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Notification {
    pub id: i32,
    pub user_id: Option<String>,
    pub group_id: Option<i32>,
    pub title: String,
    pub message: String,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone, Deserialize, Serialize, TS)]
#[diesel(table_name = notifications)]
#[ts(export)]
pub struct NewNotification {
    pub user_id: Option<String>,
    pub group_id: Option<i32>,
    pub title: String,
    pub message: String,
}
