use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::error::{DbError, DbResult};
use crate::models::{Alert, AlertFilter, NewAlert};
use crate::orm::{ensure_found, last_insert_rowid};
use crate::validation::{MAX_SHORT_LEN, require_text};

/// Raises an alert. Any combination of user, group and ticket entry may be
/// set, including none.
pub fn insert_alert(conn: &mut SqliteConnection, new_alert: NewAlert) -> DbResult<Alert> {
    use crate::schema::alerts::dsl::*;

    require_text("alert_type", &new_alert.alert_type, MAX_SHORT_LEN)?;
    if new_alert.message.is_empty() {
        return Err(DbError::validation("message", "must not be empty"));
    }

    let saved = conn.transaction::<_, DbError, _>(|conn| {
        diesel::insert_into(alerts).values(&new_alert).execute(conn)?;
        let new_id = last_insert_rowid(conn)?;
        Ok(alerts.filter(id.eq(new_id)).first::<Alert>(conn)?)
    })?;

    tracing::info!(
        alert_id = saved.id,
        alert_type = %saved.alert_type,
        severity = %saved.severity,
        "alert raised"
    );
    Ok(saved)
}

pub fn get_alert(conn: &mut SqliteConnection, alert_id: i32) -> DbResult<Alert> {
    use crate::schema::alerts::dsl::*;
    Ok(alerts.filter(id.eq(alert_id)).first::<Alert>(conn)?)
}

/// Alerts matching `filter`, newest first.
pub fn list_alerts(conn: &mut SqliteConnection, filter: &AlertFilter) -> DbResult<Vec<Alert>> {
    use crate::schema::alerts::dsl::*;

    let mut query = alerts.into_boxed();

    if let Some(uid) = &filter.user_id {
        query = query.filter(user_id.eq(uid));
    }
    if let Some(gid) = filter.group_id {
        query = query.filter(group_id.eq(gid));
    }
    if let Some(eid) = filter.entry_id {
        query = query.filter(entry_id.eq(eid));
    }
    if let Some(level) = filter.severity {
        query = query.filter(severity.eq(level.as_str()));
    }
    if let Some(resolved) = filter.is_resolved {
        query = query.filter(is_resolved.eq(resolved));
    }

    Ok(query
        .order((created_at.desc(), id.desc()))
        .load::<Alert>(conn)?)
}

/// Marks an alert resolved at `at`.
pub fn resolve_alert(
    conn: &mut SqliteConnection,
    alert_id: i32,
    at: NaiveDateTime,
) -> DbResult<Alert> {
    use crate::schema::alerts::dsl::*;

    let affected = diesel::update(alerts.filter(id.eq(alert_id)))
        .set((is_resolved.eq(true), resolved_at.eq(Some(at))))
        .execute(conn)?;
    ensure_found(affected)?;
    tracing::info!(alert_id, "alert resolved");
    get_alert(conn, alert_id)
}

/// Clears the resolved state of an alert.
pub fn reopen_alert(conn: &mut SqliteConnection, alert_id: i32) -> DbResult<Alert> {
    use crate::schema::alerts::dsl::*;

    let affected = diesel::update(alerts.filter(id.eq(alert_id)))
        .set((is_resolved.eq(false), resolved_at.eq(None::<NaiveDateTime>)))
        .execute(conn)?;
    ensure_found(affected)?;
    tracing::info!(alert_id, "alert reopened");
    get_alert(conn, alert_id)
}

pub fn delete_alert(conn: &mut SqliteConnection, alert_id: i32) -> DbResult<()> {
    use crate::schema::alerts::dsl::*;
    let affected = diesel::delete(alerts.filter(id.eq(alert_id))).execute(conn)?;
    ensure_found(affected)?;
    Ok(())
}
