use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use diesel::{AsChangeset, Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::ticket_entry::effective_duration;
use crate::schema::ticket_misc_entries;

/// Work logged by a user that is not tied to a ticket.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(belongs_to(crate::models::user::User))]
#[diesel(table_name = ticket_misc_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct TicketMiscEntry {
    pub id: i32,
    pub user_id: String,
    pub misc_name: String,
    #[ts(type = "string")]
    pub misc_start_date: NaiveDate,
    #[ts(type = "string")]
    pub misc_start_time: NaiveTime,
    #[ts(type = "string | null")]
    pub misc_end_time: Option<NaiveTime>,
    pub misc_duration: Option<i64>,
    pub misc_details: Option<String>,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

impl TicketMiscEntry {
    pub fn effective_duration(&self) -> Option<TimeDelta> {
        effective_duration(self.misc_start_time, self.misc_end_time, self.misc_duration)
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = ticket_misc_entries)]
pub struct NewTicketMiscEntry {
    pub user_id: String,
    pub misc_name: String,
    pub misc_start_date: Option<NaiveDate>,
    pub misc_start_time: Option<NaiveTime>,
    pub misc_end_time: Option<NaiveTime>,
    pub misc_duration: Option<i64>,
    pub misc_details: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct TicketMiscEntryInput {
    pub user_id: String,
    pub misc_name: String,
    #[ts(type = "string | null")]
    pub misc_start_date: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub misc_start_time: Option<NaiveTime>,
    #[ts(type = "string | null")]
    pub misc_end_time: Option<NaiveTime>,
    pub misc_duration: Option<i64>,
    pub misc_details: Option<String>,
}

impl TicketMiscEntryInput {
    pub fn new(user_id: impl Into<String>, misc_name: impl Into<String>) -> Self {
        TicketMiscEntryInput {
            user_id: user_id.into(),
            misc_name: misc_name.into(),
            misc_start_date: None,
            misc_start_time: None,
            misc_end_time: None,
            misc_duration: None,
            misc_details: None,
        }
    }
}

#[derive(AsChangeset, Debug, Clone, Default, Deserialize, Serialize, TS)]
#[diesel(table_name = ticket_misc_entries)]
#[ts(export)]
pub struct TicketMiscEntryChanges {
    pub misc_name: Option<String>,
    #[ts(type = "string | null")]
    pub misc_start_date: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub misc_start_time: Option<NaiveTime>,
    #[ts(type = "string | null")]
    pub misc_end_time: Option<Option<NaiveTime>>,
    pub misc_duration: Option<Option<i64>>,
    pub misc_details: Option<Option<String>>,
}
