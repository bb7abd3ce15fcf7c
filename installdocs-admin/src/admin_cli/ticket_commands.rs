use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use installdocs_db::models::{Device, Ticket, TicketEntry};
use installdocs_db::orm::ticket::{delete_ticket, get_ticket_by_number, insert_ticket, list_all_tickets};
use installdocs_db::orm::ticket_entry::{get_devices_for_entry, get_entries_for_ticket};
use installdocs_db::orm::user::get_user;

use super::utils::{SearchPattern, confirm, yes_no};

#[derive(Subcommand)]
pub enum TicketAction {
    #[command(about = "Add a new ticket")]
    Add {
        #[arg(help = "Ticket number")]
        number: String,
    },
    #[command(about = "List tickets with entry counts, optionally filtered by search term")]
    Ls {
        #[arg(help = "Search term (regex by default, use -F for fixed string)")]
        search_term: Option<String>,
        #[arg(short = 'F', long = "fixed-string", help = "Treat search term as fixed string instead of regex")]
        fixed_string: bool,
    },
    #[command(about = "Show a ticket and the work logged against it")]
    Show {
        #[arg(help = "Ticket number")]
        number: String,
    },
    #[command(about = "Remove a ticket and all work logged against it")]
    Rm {
        #[arg(help = "Ticket number")]
        number: String,
        #[arg(short = 'y', long = "yes", help = "Skip confirmation prompt")]
        yes: bool,
    },
}

/// One logged entry with its attached devices.
pub struct EntryReport {
    pub entry: TicketEntry,
    pub technician: String,
    pub devices: Vec<Device>,
}

pub fn handle_ticket_command_with_conn(
    conn: &mut SqliteConnection,
    action: TicketAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TicketAction::Add { number } => {
            add_ticket_impl(conn, &number)?;
        }
        TicketAction::Ls {
            search_term,
            fixed_string,
        } => {
            list_tickets_impl(conn, search_term, fixed_string)?;
        }
        TicketAction::Show { number } => {
            show_ticket_impl(conn, &number)?;
        }
        TicketAction::Rm { number, yes } => {
            remove_ticket_impl(conn, &number, yes)?;
        }
    }
    Ok(())
}

fn find_ticket(conn: &mut SqliteConnection, number: &str) -> Result<Ticket, Box<dyn std::error::Error>> {
    get_ticket_by_number(conn, number).map_err(|e| {
        if e.is_not_found() {
            format!("Ticket '{}' does not exist", number).into()
        } else {
            e.into()
        }
    })
}

fn format_minutes(minutes: i64) -> String {
    format!("{}h{:02}m", minutes / 60, minutes % 60)
}

pub fn add_ticket_impl(conn: &mut SqliteConnection, number: &str) -> Result<Ticket, Box<dyn std::error::Error>> {
    let ticket = insert_ticket(conn, number)?;
    println!("Ticket created successfully!");
    println!("ID: {}", ticket.id);
    println!("Number: {}", ticket.ticket_number);
    Ok(ticket)
}

pub fn list_tickets_impl(
    conn: &mut SqliteConnection,
    search_term: Option<String>,
    fixed_string: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let pattern = SearchPattern::new(search_term.as_deref(), fixed_string)?;
    let tickets: Vec<Ticket> = list_all_tickets(conn)?
        .into_iter()
        .filter(|t| pattern.is_match(&t.ticket_number))
        .collect();

    if tickets.is_empty() {
        println!("No tickets found.");
        return Ok(());
    }

    println!("Tickets:");
    for ticket in tickets {
        let entries = get_entries_for_ticket(conn, ticket.id)?;
        println!(
            "  ID: {}, Number: {}, Entries: {}, Created: {}",
            ticket.id,
            ticket.ticket_number,
            entries.len(),
            ticket.created_at
        );
    }
    Ok(())
}

/// Loads every entry on a ticket with its technician and devices.
pub fn ticket_report(
    conn: &mut SqliteConnection,
    ticket: &Ticket,
) -> Result<Vec<EntryReport>, Box<dyn std::error::Error>> {
    let mut report = Vec::new();
    for entry in get_entries_for_ticket(conn, ticket.id)? {
        let technician = get_user(conn, &entry.user_id)?.email;
        let devices = get_devices_for_entry(conn, entry.id)?;
        report.push(EntryReport {
            entry,
            technician,
            devices,
        });
    }
    Ok(report)
}

pub fn show_ticket_impl(conn: &mut SqliteConnection, number: &str) -> Result<(), Box<dyn std::error::Error>> {
    let ticket = find_ticket(conn, number)?;
    let report = ticket_report(conn, &ticket)?;

    println!("Ticket: {} (ID: {})", ticket.ticket_number, ticket.id);
    println!("Created: {}", ticket.created_at);

    if report.is_empty() {
        println!("No work logged.");
        return Ok(());
    }

    let mut total_minutes: i64 = 0;
    for item in &report {
        let entry = &item.entry;
        let duration = entry.effective_duration().map(|d| d.num_minutes());
        total_minutes = total_minutes.saturating_add(duration.unwrap_or(0));

        println!();
        println!("Entry {}: {}", entry.id, entry.job_name);
        println!("  Technician: {}", item.technician);
        println!(
            "  Started: {} {}{}",
            entry.job_start_date,
            entry.job_start_time,
            entry
                .job_end_time
                .map(|end| format!(", ended {}", end))
                .unwrap_or_default()
        );
        println!(
            "  Duration: {}",
            duration.map(format_minutes).unwrap_or_else(|| "-".to_string())
        );
        if let Some(materials) = &entry.job_materials_needed {
            println!("  Materials: {}", materials);
        }
        if let Some(access) = &entry.job_access_needed {
            println!("  Access: {}", access);
        }
        if let Some(changes) = &entry.job_programming_changes {
            println!("  Programming changes: {}", changes);
        }
        println!("  Follow-up required: {}", yes_no(entry.job_followup_required));
        if !item.devices.is_empty() {
            let names: Vec<&str> = item.devices.iter().map(|d| d.device_name.as_str()).collect();
            println!("  Devices: {}", names.join(", "));
        }
    }

    println!();
    println!("Total logged: {}", format_minutes(total_minutes));
    Ok(())
}

pub fn remove_ticket_impl(
    conn: &mut SqliteConnection,
    number: &str,
    yes: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let ticket = find_ticket(conn, number)?;
    let entry_count = get_entries_for_ticket(conn, ticket.id)?.len();

    if !yes {
        let question = format!(
            "Delete ticket '{}' and its {} logged entr{}?",
            ticket.ticket_number,
            entry_count,
            if entry_count == 1 { "y" } else { "ies" }
        );
        if !confirm(&question)? {
            println!("Operation cancelled.");
            return Ok(false);
        }
    }

    delete_ticket(conn, ticket.id)?;
    println!("Deleted ticket: {} (ID: {})", ticket.ticket_number, ticket.id);
    Ok(true)
}
