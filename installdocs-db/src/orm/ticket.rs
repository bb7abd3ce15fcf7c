use diesel::prelude::*;

use crate::error::{DbError, DbResult};
use crate::models::{NewTicket, Ticket};
use crate::orm::{ensure_found, last_insert_rowid};
use crate::validation::{MAX_SHORT_LEN, require_text};

/// Opens a ticket under a caller-chosen, unique ticket number.
pub fn insert_ticket(conn: &mut SqliteConnection, number: &str) -> DbResult<Ticket> {
    use crate::schema::tickets::dsl::*;

    require_text("ticket_number", number, MAX_SHORT_LEN)?;
    let row = NewTicket {
        ticket_number: number.to_string(),
    };

    let ticket = conn.transaction::<_, DbError, _>(|conn| {
        diesel::insert_into(tickets).values(&row).execute(conn)?;
        let new_id = last_insert_rowid(conn)?;
        Ok(tickets.filter(id.eq(new_id)).first::<Ticket>(conn)?)
    })?;

    tracing::debug!(ticket_id = ticket.id, number = %ticket.ticket_number, "opened ticket");
    Ok(ticket)
}

pub fn get_ticket(conn: &mut SqliteConnection, ticket_id: i32) -> DbResult<Ticket> {
    use crate::schema::tickets::dsl::*;
    Ok(tickets.filter(id.eq(ticket_id)).first::<Ticket>(conn)?)
}

pub fn get_ticket_by_number(conn: &mut SqliteConnection, number: &str) -> DbResult<Ticket> {
    use crate::schema::tickets::dsl::*;
    Ok(tickets
        .filter(ticket_number.eq(number))
        .first::<Ticket>(conn)?)
}

/// Returns all tickets, newest first.
pub fn list_all_tickets(conn: &mut SqliteConnection) -> DbResult<Vec<Ticket>> {
    use crate::schema::tickets::dsl::*;
    Ok(tickets
        .order((created_at.desc(), id.desc()))
        .load::<Ticket>(conn)?)
}

pub fn update_ticket_number(
    conn: &mut SqliteConnection,
    ticket_id: i32,
    number: &str,
) -> DbResult<Ticket> {
    use crate::schema::tickets::dsl::*;

    require_text("ticket_number", number, MAX_SHORT_LEN)?;
    let affected = diesel::update(tickets.filter(id.eq(ticket_id)))
        .set(ticket_number.eq(number))
        .execute(conn)?;
    ensure_found(affected)?;
    get_ticket(conn, ticket_id)
}

/// Deletes a ticket together with its entries and their device links.
pub fn delete_ticket(conn: &mut SqliteConnection, ticket_id: i32) -> DbResult<()> {
    use crate::schema::tickets::dsl::*;
    let affected = diesel::delete(tickets.filter(id.eq(ticket_id))).execute(conn)?;
    ensure_found(affected)?;
    tracing::info!(ticket_id, "deleted ticket");
    Ok(())
}
