//! Read access to the per-user daily alert rollup.
//!
//! The `daily_alert_counts` relation is owned by the reporting job
//! (`installdocs-admin report refresh-alert-counts`). Migrations do not
//! create it, so these queries fail with a database error until the job has
//! run at least once.

use chrono::NaiveDate;
use diesel::prelude::*;

use crate::error::DbResult;
use crate::models::DailyAlertCount;

/// Counts for one user between `from` and `to` inclusive, oldest day first.
pub fn get_daily_alert_counts_for_user(
    conn: &mut SqliteConnection,
    owner_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> DbResult<Vec<DailyAlertCount>> {
    use crate::schema::daily_alert_counts::dsl::*;
    Ok(daily_alert_counts
        .filter(user_id.eq(owner_id))
        .filter(alert_date.between(from, to))
        .order(alert_date.asc())
        .select(DailyAlertCount::as_select())
        .load(conn)?)
}

/// Counts for every user on one day, highest count first.
pub fn list_daily_alert_counts(
    conn: &mut SqliteConnection,
    day: NaiveDate,
) -> DbResult<Vec<DailyAlertCount>> {
    use crate::schema::daily_alert_counts::dsl::*;
    Ok(daily_alert_counts
        .filter(alert_date.eq(day))
        .order((alert_count.desc(), user_id.asc()))
        .select(DailyAlertCount::as_select())
        .load(conn)?)
}

#[cfg(test)]
mod tests {
    use diesel::connection::SimpleConnection;

    use super::*;
    use crate::error::DbError;
    use crate::orm::testing::{create_test_user, setup_test_db};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    #[test]
    fn test_missing_relation_is_a_database_error() {
        let mut conn = setup_test_db();
        let err = list_daily_alert_counts(&mut conn, day(1)).unwrap_err();
        assert!(matches!(err, DbError::Database(_)));
    }

    #[test]
    fn test_reads_rows_written_by_the_rollup() {
        let mut conn = setup_test_db();
        let a = create_test_user(&mut conn, "a@example.com");
        let b = create_test_user(&mut conn, "b@example.com");

        conn.batch_execute(&format!(
            "CREATE TABLE daily_alert_counts (
                 user_id TEXT NOT NULL,
                 alert_date DATE NOT NULL,
                 alert_count BIGINT NOT NULL,
                 PRIMARY KEY (user_id, alert_date)
             );
             INSERT INTO daily_alert_counts VALUES
                 ('{a}', '2025-05-01', 2),
                 ('{a}', '2025-05-02', 5),
                 ('{a}', '2025-05-09', 1),
                 ('{b}', '2025-05-02', 7);",
            a = a.id,
            b = b.id
        ))
        .unwrap();

        let week = get_daily_alert_counts_for_user(&mut conn, &a.id, day(1), day(7)).unwrap();
        let counts: Vec<i64> = week.iter().map(|c| c.alert_count).collect();
        assert_eq!(counts, vec![2, 5]);

        let second = list_daily_alert_counts(&mut conn, day(2)).unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].user_id, b.id);
        assert_eq!(second[0].alert_count, 7);
    }
}
