use diesel::prelude::*;

use crate::error::{DbError, DbResult};
use crate::models::{
    Device, NewTicketEntry, NewTicketEntryDevice, TicketEntry, TicketEntryChanges,
    TicketEntryDevice, TicketEntryInput,
};
use crate::orm::{ensure_found, last_insert_rowid};
use crate::validation::{MAX_NAME_LEN, require_text, validate_duration};

fn validate_entry_input(input: &TicketEntryInput) -> DbResult<()> {
    require_text("job_name", &input.job_name, MAX_NAME_LEN)?;
    validate_duration("job_duration", input.job_duration)?;
    Ok(())
}

fn validate_entry_changes(changes: &TicketEntryChanges) -> DbResult<()> {
    if let Some(name) = &changes.job_name {
        require_text("job_name", name, MAX_NAME_LEN)?;
    }
    if let Some(duration) = changes.job_duration {
        validate_duration("job_duration", duration)?;
    }
    Ok(())
}

fn has_changes(changes: &TicketEntryChanges) -> bool {
    changes.job_name.is_some()
        || changes.job_start_date.is_some()
        || changes.job_start_time.is_some()
        || changes.job_end_time.is_some()
        || changes.job_duration.is_some()
        || changes.job_materials_needed.is_some()
        || changes.job_access_needed.is_some()
        || changes.job_programming_changes.is_some()
        || changes.job_followup_required.is_some()
}

/// Logs work against a ticket. Start date and time default to the moment of
/// insertion when not given.
pub fn insert_ticket_entry(
    conn: &mut SqliteConnection,
    input: TicketEntryInput,
) -> DbResult<TicketEntry> {
    use crate::schema::ticket_entries::dsl::*;

    validate_entry_input(&input)?;
    let row = NewTicketEntry {
        user_id: input.user_id,
        ticket_id: input.ticket_id,
        job_name: input.job_name,
        job_start_date: input.job_start_date,
        job_start_time: input.job_start_time,
        job_end_time: input.job_end_time,
        job_duration: input.job_duration,
        job_materials_needed: input.job_materials_needed,
        job_access_needed: input.job_access_needed,
        job_programming_changes: input.job_programming_changes,
        job_followup_required: input.job_followup_required,
    };

    let entry = conn.transaction::<_, DbError, _>(|conn| {
        diesel::insert_into(ticket_entries).values(&row).execute(conn)?;
        let new_id = last_insert_rowid(conn)?;
        Ok(ticket_entries
            .filter(id.eq(new_id))
            .first::<TicketEntry>(conn)?)
    })?;

    tracing::debug!(
        entry_id = entry.id,
        ticket_id = entry.ticket_id,
        user_id = %entry.user_id,
        "inserted ticket entry"
    );
    Ok(entry)
}

pub fn get_ticket_entry(conn: &mut SqliteConnection, entry_id: i32) -> DbResult<TicketEntry> {
    use crate::schema::ticket_entries::dsl::*;
    Ok(ticket_entries
        .filter(id.eq(entry_id))
        .first::<TicketEntry>(conn)?)
}

/// Entries on a ticket in the order the work started.
pub fn get_entries_for_ticket(
    conn: &mut SqliteConnection,
    target_ticket_id: i32,
) -> DbResult<Vec<TicketEntry>> {
    use crate::schema::ticket_entries::dsl::*;
    Ok(ticket_entries
        .filter(ticket_id.eq(target_ticket_id))
        .order((job_start_date.asc(), job_start_time.asc(), id.asc()))
        .load::<TicketEntry>(conn)?)
}

/// Entries logged by a user, most recent work first.
pub fn get_entries_for_user(
    conn: &mut SqliteConnection,
    owner_id: &str,
) -> DbResult<Vec<TicketEntry>> {
    use crate::schema::ticket_entries::dsl::*;
    Ok(ticket_entries
        .filter(user_id.eq(owner_id))
        .order((job_start_date.desc(), job_start_time.desc(), id.desc()))
        .load::<TicketEntry>(conn)?)
}

/// Applies a partial update. An empty change set returns the stored entry
/// unchanged.
pub fn update_ticket_entry(
    conn: &mut SqliteConnection,
    entry_id: i32,
    changes: TicketEntryChanges,
) -> DbResult<TicketEntry> {
    use crate::schema::ticket_entries::dsl::*;

    validate_entry_changes(&changes)?;
    if !has_changes(&changes) {
        return get_ticket_entry(conn, entry_id);
    }

    let affected = diesel::update(ticket_entries.filter(id.eq(entry_id)))
        .set(&changes)
        .execute(conn)?;
    ensure_found(affected)?;
    get_ticket_entry(conn, entry_id)
}

/// Deletes an entry with its device links. Alerts raised on the entry keep
/// their rows with the entry reference cleared.
pub fn delete_ticket_entry(conn: &mut SqliteConnection, entry_id: i32) -> DbResult<()> {
    use crate::schema::ticket_entries::dsl::*;
    let affected = diesel::delete(ticket_entries.filter(id.eq(entry_id))).execute(conn)?;
    ensure_found(affected)?;
    tracing::info!(entry_id, "deleted ticket entry");
    Ok(())
}

/// Records that a device was worked on for an entry. Attaching the same
/// device twice is a unique violation.
pub fn attach_device_to_entry(
    conn: &mut SqliteConnection,
    target_entry_id: i32,
    target_device_id: i32,
) -> DbResult<TicketEntryDevice> {
    use crate::schema::ticket_entry_devices::dsl::*;

    let row = NewTicketEntryDevice {
        entry_id: target_entry_id,
        device_id: target_device_id,
    };
    diesel::insert_into(ticket_entry_devices)
        .values(&row)
        .execute(conn)?;
    tracing::debug!(entry_id = row.entry_id, device_id = row.device_id, "attached device");

    Ok(TicketEntryDevice {
        entry_id: row.entry_id,
        device_id: row.device_id,
    })
}

pub fn detach_device_from_entry(
    conn: &mut SqliteConnection,
    target_entry_id: i32,
    target_device_id: i32,
) -> DbResult<()> {
    use crate::schema::ticket_entry_devices::dsl::*;
    let affected = diesel::delete(
        ticket_entry_devices
            .filter(entry_id.eq(target_entry_id))
            .filter(device_id.eq(target_device_id)),
    )
    .execute(conn)?;
    ensure_found(affected)?;
    Ok(())
}

/// Devices attached to an entry ordered by name.
pub fn get_devices_for_entry(
    conn: &mut SqliteConnection,
    target_entry_id: i32,
) -> DbResult<Vec<Device>> {
    use crate::schema::{devices, ticket_entry_devices};

    Ok(devices::table
        .inner_join(ticket_entry_devices::table)
        .filter(ticket_entry_devices::entry_id.eq(target_entry_id))
        .order((devices::device_name.asc(), devices::id.asc()))
        .select(Device::as_select())
        .load::<Device>(conn)?)
}
