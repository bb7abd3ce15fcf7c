use chrono::NaiveDate;
use diesel::{Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::daily_alert_counts;

/// Per-user, per-day alert tally. Read-only here; the rows are produced by
/// the reporting job.
#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[diesel(table_name = daily_alert_counts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct DailyAlertCount {
    pub user_id: String,
    #[ts(type = "string")]
    pub alert_date: NaiveDate,
    pub alert_count: i64,
}
