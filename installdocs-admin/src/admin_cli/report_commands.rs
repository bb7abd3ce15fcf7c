//! Reporting jobs.
//!
//! `refresh-alert-counts` owns the `daily_alert_counts` relation: it creates
//! the table on first run and rebuilds every row from `alerts` inside one
//! transaction, so readers never see a half-built rollup.

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use installdocs_db::DbError;
use installdocs_db::models::DailyAlertCount;
use installdocs_db::orm::daily_alert_count::{get_daily_alert_counts_for_user, list_daily_alert_counts};
use installdocs_db::orm::user::get_user;

use super::utils::resolve_user;

const CREATE_ROLLUP: &str = "
CREATE TABLE IF NOT EXISTS daily_alert_counts (
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    alert_date DATE NOT NULL,
    alert_count BIGINT NOT NULL,
    PRIMARY KEY (user_id, alert_date)
);
DELETE FROM daily_alert_counts;
";

// Alerts whose user was deleted (user_id set to NULL) are not attributed.
const FILL_ROLLUP: &str = "
INSERT INTO daily_alert_counts (user_id, alert_date, alert_count)
SELECT user_id, date(created_at), count(*)
FROM alerts
WHERE user_id IS NOT NULL
GROUP BY user_id, date(created_at)
";

#[derive(Subcommand)]
pub enum ReportAction {
    #[command(about = "Rebuild the per-user daily alert counts from the alerts table")]
    RefreshAlertCounts,
    #[command(about = "Show daily alert counts for one day, or for one user over a range")]
    AlertCounts {
        #[arg(short, long, help = "Day to report (YYYY-MM-DD, defaults to today in UTC)")]
        date: Option<NaiveDate>,
        #[arg(short, long, help = "Report one user (email or ID) instead of one day")]
        user: Option<String>,
        #[arg(long, requires = "user", help = "First day of the user's range (defaults to 30 days before --to)")]
        from: Option<NaiveDate>,
        #[arg(long, requires = "user", help = "Last day of the user's range (defaults to today in UTC)")]
        to: Option<NaiveDate>,
    },
}

pub fn handle_report_command_with_conn(
    conn: &mut SqliteConnection,
    action: ReportAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ReportAction::RefreshAlertCounts => {
            let rows = refresh_alert_counts_impl(conn)?;
            println!("Rebuilt daily alert counts: {} row(s).", rows);
        }
        ReportAction::AlertCounts { date, user, from, to } => {
            let today = Utc::now().date_naive();
            match user {
                Some(user) => {
                    let to = to.unwrap_or(today);
                    let from = from.unwrap_or(to - chrono::Days::new(30));
                    user_alert_counts_impl(conn, &user, from, to)?;
                }
                None => {
                    day_alert_counts_impl(conn, date.unwrap_or(today))?;
                }
            }
        }
    }
    Ok(())
}

/// Rebuilds `daily_alert_counts` and returns the number of rows written.
pub fn refresh_alert_counts_impl(conn: &mut SqliteConnection) -> Result<usize, DbError> {
    let rows = conn.transaction::<_, DbError, _>(|conn| {
        conn.batch_execute(CREATE_ROLLUP)?;
        Ok(diesel::sql_query(FILL_ROLLUP).execute(conn)?)
    })?;
    tracing::info!(rows, "refreshed daily alert counts");
    Ok(rows)
}

fn rollup_missing(err: &DbError) -> bool {
    matches!(err, DbError::Database(_)) && err.to_string().contains("no such table")
}

fn load_or_hint<T>(result: Result<T, DbError>) -> Result<T, Box<dyn std::error::Error>> {
    result.map_err(|e| {
        if rollup_missing(&e) {
            "Daily alert counts have not been built yet; run `report refresh-alert-counts` first".into()
        } else {
            e.into()
        }
    })
}

pub fn day_alert_counts_impl(
    conn: &mut SqliteConnection,
    day: NaiveDate,
) -> Result<Vec<DailyAlertCount>, Box<dyn std::error::Error>> {
    let counts = load_or_hint(list_daily_alert_counts(conn, day))?;

    if counts.is_empty() {
        println!("No alerts recorded on {}.", day);
        return Ok(counts);
    }

    println!("Alert counts for {}:", day);
    for count in &counts {
        let who = get_user(conn, &count.user_id)
            .map(|u| u.email)
            .unwrap_or_else(|_| count.user_id.clone());
        println!("  {}: {}", who, count.alert_count);
    }
    Ok(counts)
}

pub fn user_alert_counts_impl(
    conn: &mut SqliteConnection,
    user: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DailyAlertCount>, Box<dyn std::error::Error>> {
    if from > to {
        return Err(format!("--from ({}) is after --to ({})", from, to).into());
    }
    let target = resolve_user(conn, user)?;
    let counts = load_or_hint(get_daily_alert_counts_for_user(conn, &target.id, from, to))?;

    if counts.is_empty() {
        println!("No alerts for {} between {} and {}.", target.email, from, to);
        return Ok(counts);
    }

    println!("Alert counts for {}:", target.email);
    for count in &counts {
        println!("  {}: {}", count.alert_date, count.alert_count);
    }
    Ok(counts)
}
