use chrono::NaiveDateTime;
use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::user_sessions;

#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(belongs_to(crate::models::user::User))]
#[diesel(table_name = user_sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct UserSession {
    pub id: String,
    pub user_id: String,
    pub login_origin: String,
    pub token: String, // Opaque bearer token
    #[ts(type = "string")]
    pub issued_at: NaiveDateTime,
    #[ts(type = "string")]
    pub expires_at: NaiveDateTime,
    #[ts(type = "string")]
    pub last_accessed_at: NaiveDateTime,
    pub is_active: bool,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = user_sessions)]
pub struct NewUserSession {
    pub id: String,
    pub user_id: String,
    pub login_origin: String,
    pub token: String,
    pub expires_at: NaiveDateTime,
    pub is_active: bool,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UserSessionInput {
    pub user_id: String,
    pub login_origin: String,
    pub token: String,
    #[ts(type = "string")]
    pub expires_at: NaiveDateTime,
    pub is_active: bool,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
}
