use chrono::NaiveDateTime;
use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use installdocs_db::models::{History, HistoryFilter, LoginAttempt, LoginAttemptFilter};
use installdocs_db::orm::history::list_history;
use installdocs_db::orm::login_attempt::list_login_attempts;

use super::utils::{parse_timestamp, resolve_user};

const DEFAULT_LIMIT: i64 = 50;

#[derive(Subcommand)]
pub enum AuditAction {
    #[command(about = "List login attempts, newest first")]
    Logins {
        #[arg(short, long, help = "Only attempts tied to this user (email or ID)")]
        user: Option<String>,
        #[arg(short, long, help = "Only attempts made with this email as typed, known user or not")]
        email: Option<String>,
        #[arg(long, help = "Only failed attempts")]
        failed: bool,
        #[arg(long, value_parser = parse_timestamp, help = "Earliest attempt time (YYYY-MM-DD[ HH:MM[:SS]])")]
        since: Option<NaiveDateTime>,
        #[arg(long, value_parser = parse_timestamp, help = "Latest attempt time (YYYY-MM-DD[ HH:MM[:SS]])")]
        until: Option<NaiveDateTime>,
        #[arg(short = 'n', long, default_value_t = DEFAULT_LIMIT, help = "Maximum number of rows")]
        limit: i64,
    },
    #[command(about = "List change history, newest first")]
    History {
        #[arg(short, long, help = "Only changes to this table")]
        table: Option<String>,
        #[arg(short, long, help = "Only changes to this record ID (use with --table)")]
        record: Option<i64>,
        #[arg(short, long, help = "Only changes made by this user (email or ID)")]
        user: Option<String>,
        #[arg(short, long, help = "Only this action, e.g. create, update or delete")]
        action: Option<String>,
        #[arg(long, value_parser = parse_timestamp, help = "Earliest change time (YYYY-MM-DD[ HH:MM[:SS]])")]
        since: Option<NaiveDateTime>,
        #[arg(long, value_parser = parse_timestamp, help = "Latest change time (YYYY-MM-DD[ HH:MM[:SS]])")]
        until: Option<NaiveDateTime>,
        #[arg(short = 'n', long, default_value_t = DEFAULT_LIMIT, help = "Maximum number of rows")]
        limit: i64,
    },
}

pub fn handle_audit_command_with_conn(
    conn: &mut SqliteConnection,
    action: AuditAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuditAction::Logins {
            user,
            email,
            failed,
            since,
            until,
            limit,
        } => {
            let user_id = match user {
                Some(user) => Some(resolve_user(conn, &user)?.id),
                None => None,
            };
            let filter = LoginAttemptFilter {
                user_id,
                email,
                success: failed.then_some(false),
                since,
                until,
                limit: Some(limit),
            };
            list_logins_impl(conn, &filter)?;
        }
        AuditAction::History {
            table,
            record,
            user,
            action,
            since,
            until,
            limit,
        } => {
            let user_id = match user {
                Some(user) => Some(resolve_user(conn, &user)?.id),
                None => None,
            };
            let filter = HistoryFilter {
                table_name: table,
                record_id: record,
                user_id,
                action,
                since,
                until,
                limit: Some(limit),
            };
            list_history_impl(conn, &filter)?;
        }
    }
    Ok(())
}

fn check_range(since: Option<NaiveDateTime>, until: Option<NaiveDateTime>) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(since), Some(until)) = (since, until) {
        if since > until {
            return Err(format!("--since ({}) is after --until ({})", since, until).into());
        }
    }
    Ok(())
}

pub fn list_logins_impl(
    conn: &mut SqliteConnection,
    filter: &LoginAttemptFilter,
) -> Result<Vec<LoginAttempt>, Box<dyn std::error::Error>> {
    check_range(filter.since, filter.until)?;
    let attempts = list_login_attempts(conn, filter)?;

    if attempts.is_empty() {
        println!("No login attempts found.");
        return Ok(attempts);
    }

    println!("Login attempts:");
    for attempt in &attempts {
        println!(
            "  {} {} email={} ip={} origin={} user={}",
            attempt.attempt_time,
            if attempt.success { "OK  " } else { "FAIL" },
            attempt.email.as_deref().unwrap_or("-"),
            attempt.ip_address,
            attempt.login_origin.as_deref().unwrap_or("-"),
            attempt.user_id.as_deref().unwrap_or("(none)")
        );
    }
    Ok(attempts)
}

pub fn list_history_impl(
    conn: &mut SqliteConnection,
    filter: &HistoryFilter,
) -> Result<Vec<History>, Box<dyn std::error::Error>> {
    check_range(filter.since, filter.until)?;
    let rows = list_history(conn, filter)?;

    if rows.is_empty() {
        println!("No history found.");
        return Ok(rows);
    }

    println!("History:");
    for row in &rows {
        println!(
            "  {} {} {}#{} by {}",
            row.created_at, row.action, row.table_name, row.record_id, row.user_id
        );
        if let Some(changes) = &row.changes {
            println!("    {}", serde_json::to_string(&changes.0)?);
        }
    }
    Ok(rows)
}
