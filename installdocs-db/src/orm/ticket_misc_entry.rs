use diesel::prelude::*;

use crate::error::{DbError, DbResult};
use crate::models::{NewTicketMiscEntry, TicketMiscEntry, TicketMiscEntryChanges, TicketMiscEntryInput};
use crate::orm::{ensure_found, last_insert_rowid};
use crate::validation::{MAX_NAME_LEN, require_text, validate_duration};

fn has_changes(changes: &TicketMiscEntryChanges) -> bool {
    changes.misc_name.is_some()
        || changes.misc_start_date.is_some()
        || changes.misc_start_time.is_some()
        || changes.misc_end_time.is_some()
        || changes.misc_duration.is_some()
        || changes.misc_details.is_some()
}

/// Logs time that is not tied to a ticket (training, travel, shop work).
pub fn insert_misc_entry(
    conn: &mut SqliteConnection,
    input: TicketMiscEntryInput,
) -> DbResult<TicketMiscEntry> {
    use crate::schema::ticket_misc_entries::dsl::*;

    require_text("misc_name", &input.misc_name, MAX_NAME_LEN)?;
    validate_duration("misc_duration", input.misc_duration)?;

    let row = NewTicketMiscEntry {
        user_id: input.user_id,
        misc_name: input.misc_name,
        misc_start_date: input.misc_start_date,
        misc_start_time: input.misc_start_time,
        misc_end_time: input.misc_end_time,
        misc_duration: input.misc_duration,
        misc_details: input.misc_details,
    };

    let entry = conn.transaction::<_, DbError, _>(|conn| {
        diesel::insert_into(ticket_misc_entries)
            .values(&row)
            .execute(conn)?;
        let new_id = last_insert_rowid(conn)?;
        Ok(ticket_misc_entries
            .filter(id.eq(new_id))
            .first::<TicketMiscEntry>(conn)?)
    })?;

    tracing::debug!(misc_entry_id = entry.id, user_id = %entry.user_id, "inserted misc entry");
    Ok(entry)
}

pub fn get_misc_entry(conn: &mut SqliteConnection, entry_id: i32) -> DbResult<TicketMiscEntry> {
    use crate::schema::ticket_misc_entries::dsl::*;
    Ok(ticket_misc_entries
        .filter(id.eq(entry_id))
        .first::<TicketMiscEntry>(conn)?)
}

pub fn get_misc_entries_for_user(
    conn: &mut SqliteConnection,
    owner_id: &str,
) -> DbResult<Vec<TicketMiscEntry>> {
    use crate::schema::ticket_misc_entries::dsl::*;
    Ok(ticket_misc_entries
        .filter(user_id.eq(owner_id))
        .order((misc_start_date.desc(), misc_start_time.desc(), id.desc()))
        .load::<TicketMiscEntry>(conn)?)
}

pub fn update_misc_entry(
    conn: &mut SqliteConnection,
    entry_id: i32,
    changes: TicketMiscEntryChanges,
) -> DbResult<TicketMiscEntry> {
    use crate::schema::ticket_misc_entries::dsl::*;

    if let Some(name) = &changes.misc_name {
        require_text("misc_name", name, MAX_NAME_LEN)?;
    }
    if let Some(duration) = changes.misc_duration {
        validate_duration("misc_duration", duration)?;
    }
    if !has_changes(&changes) {
        return get_misc_entry(conn, entry_id);
    }

    let affected = diesel::update(ticket_misc_entries.filter(id.eq(entry_id)))
        .set(&changes)
        .execute(conn)?;
    ensure_found(affected)?;
    get_misc_entry(conn, entry_id)
}

pub fn delete_misc_entry(conn: &mut SqliteConnection, entry_id: i32) -> DbResult<()> {
    use crate::schema::ticket_misc_entries::dsl::*;
    let affected = diesel::delete(ticket_misc_entries.filter(id.eq(entry_id))).execute(conn)?;
    ensure_found(affected)?;
    Ok(())
}
