use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use diesel::{AsChangeset, Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::{ticket_entries, ticket_entry_devices};

/// Recorded duration if there is one, otherwise the span between start and
/// end time. Shared by ticket entries and misc entries. A recorded value too
/// large for a `TimeDelta` gives `None`.
pub fn effective_duration(
    start_time: NaiveTime,
    end_time: Option<NaiveTime>,
    recorded_seconds: Option<i64>,
) -> Option<TimeDelta> {
    if let Some(seconds) = recorded_seconds {
        return TimeDelta::try_seconds(seconds);
    }
    let span = end_time? - start_time;
    if span < TimeDelta::zero() {
        None
    } else {
        Some(span)
    }
}

/// Work logged by a user against a ticket.
#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(belongs_to(crate::models::user::User))]
#[diesel(belongs_to(crate::models::ticket::Ticket))]
#[diesel(table_name = ticket_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct TicketEntry {
    pub id: i32,
    pub user_id: String,
    pub ticket_id: i32,
    pub job_name: String,
    #[ts(type = "string")]
    pub job_start_date: NaiveDate,
    #[ts(type = "string")]
    pub job_start_time: NaiveTime,
    #[ts(type = "string | null")]
    pub job_end_time: Option<NaiveTime>,
    /// Seconds
    pub job_duration: Option<i64>,
    pub job_materials_needed: Option<String>,
    pub job_access_needed: Option<String>,
    pub job_programming_changes: Option<String>,
    pub job_followup_required: bool,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

impl TicketEntry {
    pub fn effective_duration(&self) -> Option<TimeDelta> {
        effective_duration(self.job_start_time, self.job_end_time, self.job_duration)
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = ticket_entries)]
pub struct NewTicketEntry {
    pub user_id: String,
    pub ticket_id: i32,
    pub job_name: String,
    pub job_start_date: Option<NaiveDate>, // None uses today
    pub job_start_time: Option<NaiveTime>, // None uses now
    pub job_end_time: Option<NaiveTime>,
    pub job_duration: Option<i64>,
    pub job_materials_needed: Option<String>,
    pub job_access_needed: Option<String>,
    pub job_programming_changes: Option<String>,
    pub job_followup_required: bool,
}

// For inputs and validation
#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct TicketEntryInput {
    pub user_id: String,
    pub ticket_id: i32,
    pub job_name: String,
    #[ts(type = "string | null")]
    pub job_start_date: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub job_start_time: Option<NaiveTime>,
    #[ts(type = "string | null")]
    pub job_end_time: Option<NaiveTime>,
    pub job_duration: Option<i64>,
    pub job_materials_needed: Option<String>,
    pub job_access_needed: Option<String>,
    pub job_programming_changes: Option<String>,
    pub job_followup_required: bool,
}

impl TicketEntryInput {
    pub fn new(user_id: impl Into<String>, ticket_id: i32, job_name: impl Into<String>) -> Self {
        TicketEntryInput {
            user_id: user_id.into(),
            ticket_id,
            job_name: job_name.into(),
            job_start_date: None,
            job_start_time: None,
            job_end_time: None,
            job_duration: None,
            job_materials_needed: None,
            job_access_needed: None,
            job_programming_changes: None,
            job_followup_required: false,
        }
    }
}

/// Partial update of a ticket entry. `Some(None)` clears a nullable column.
#[derive(AsChangeset, Debug, Clone, Default, Deserialize, Serialize, TS)]
#[diesel(table_name = ticket_entries)]
#[ts(export)]
pub struct TicketEntryChanges {
    pub job_name: Option<String>,
    #[ts(type = "string | null")]
    pub job_start_date: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub job_start_time: Option<NaiveTime>,
    #[ts(type = "string | null")]
    pub job_end_time: Option<Option<NaiveTime>>,
    pub job_duration: Option<Option<i64>>,
    pub job_materials_needed: Option<Option<String>>,
    pub job_access_needed: Option<Option<String>>,
    pub job_programming_changes: Option<Option<String>>,
    pub job_followup_required: Option<bool>,
}

/// Link between a ticket entry and a device worked on.
#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(belongs_to(TicketEntry, foreign_key = entry_id))]
#[diesel(belongs_to(crate::models::device::Device))]
#[diesel(table_name = ticket_entry_devices)]
#[diesel(primary_key(entry_id, device_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct TicketEntryDevice {
    pub entry_id: i32,
    pub device_id: i32,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = ticket_entry_devices)]
pub struct NewTicketEntryDevice {
    pub entry_id: i32,
    pub device_id: i32,
}
