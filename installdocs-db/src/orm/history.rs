use diesel::prelude::*;

use crate::error::{DbError, DbResult};
use crate::models::{History, HistoryFilter, NewHistory};
use crate::orm::last_insert_rowid;
use crate::validation::{MAX_NAME_LEN, MAX_SHORT_LEN, require_text};

/// Appends an audit row describing a change to some record. History rows are
/// never updated.
pub fn record_history(conn: &mut SqliteConnection, entry: NewHistory) -> DbResult<History> {
    use crate::schema::history::dsl::*;

    require_text("table_name", &entry.table_name, MAX_NAME_LEN)?;
    require_text("action", &entry.action, MAX_SHORT_LEN)?;

    let saved = conn.transaction::<_, DbError, _>(|conn| {
        diesel::insert_into(history).values(&entry).execute(conn)?;
        let new_id = last_insert_rowid(conn)?;
        Ok(history.filter(id.eq(new_id)).first::<History>(conn)?)
    })?;

    tracing::debug!(
        history_id = saved.id,
        table = %saved.table_name,
        record_id = saved.record_id,
        action = %saved.action,
        "recorded history"
    );
    Ok(saved)
}

pub fn get_history_entry(conn: &mut SqliteConnection, history_id: i32) -> DbResult<History> {
    use crate::schema::history::dsl::*;
    Ok(history.filter(id.eq(history_id)).first::<History>(conn)?)
}

/// History rows matching `filter`, newest first. The time range is inclusive
/// at both ends.
pub fn list_history(conn: &mut SqliteConnection, filter: &HistoryFilter) -> DbResult<Vec<History>> {
    use crate::schema::history::dsl::*;

    let mut query = history.into_boxed();

    if let Some(table) = &filter.table_name {
        query = query.filter(table_name.eq(table));
    }
    if let Some(record) = filter.record_id {
        query = query.filter(record_id.eq(record));
    }
    if let Some(uid) = &filter.user_id {
        query = query.filter(user_id.eq(uid));
    }
    if let Some(act) = &filter.action {
        query = query.filter(action.eq(act));
    }
    if let Some(since) = filter.since {
        query = query.filter(created_at.ge(since));
    }
    if let Some(until) = filter.until {
        query = query.filter(created_at.le(until));
    }
    if let Some(n) = filter.limit {
        query = query.limit(n);
    }

    Ok(query
        .order((created_at.desc(), id.desc()))
        .load::<History>(conn)?)
}
