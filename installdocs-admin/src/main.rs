/*!
 * InstallDocs Administrative CLI Utility
 *
 * Command-line management of an InstallDocs SQLite database. Every command
 * goes through the ORM functions in installdocs-db so the same validation,
 * derived access flags and referential rules apply as for the application.
 *
 * Key Features:
 * - Schema migrations
 * - User management (create, list, edit roles, remove, password changes)
 * - Group, building and device management
 * - Ticket listing with logged work per entry
 * - Audit views over login attempts and the change history
 * - The daily alert count rollup job
 *
 * The database location comes from DATABASE_URL (a .env file is honored) or
 * the --database-url flag. Log verbosity follows RUST_LOG.
 *
 * For detailed usage information and available commands, run with --help.
 */

mod admin_cli;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use admin_cli::{
    audit_commands::{AuditAction, handle_audit_command_with_conn},
    building_commands::{BuildingAction, handle_building_command_with_conn},
    device_commands::{DeviceAction, handle_device_command_with_conn},
    group_commands::{GroupAction, handle_group_command_with_conn},
    migrate_impl,
    report_commands::{ReportAction, handle_report_command_with_conn},
    ticket_commands::{TicketAction, handle_ticket_command_with_conn},
    user_commands::{UserAction, handle_user_command_with_conn},
    utils::establish_connection,
};

#[derive(Parser)]
#[command(name = "installdocs-admin")]
#[command(about = "Administrative CLI for InstallDocs database management")]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "Database URL (defaults to DATABASE_URL)")]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Apply pending schema migrations")]
    Migrate,
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    Group {
        #[command(subcommand)]
        action: GroupAction,
    },
    Building {
        #[command(subcommand)]
        action: BuildingAction,
    },
    Device {
        #[command(subcommand)]
        action: DeviceAction,
    },
    Ticket {
        #[command(subcommand)]
        action: TicketAction,
    },
    #[command(about = "Inspect login attempts and the change history")]
    Audit {
        #[command(subcommand)]
        action: AuditAction,
    },
    #[command(about = "Reporting jobs")]
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let mut conn = establish_connection(cli.database_url.as_deref())?;

    match cli.command {
        Commands::Migrate => migrate_impl(&mut conn)?,
        Commands::User { action } => handle_user_command_with_conn(&mut conn, action)?,
        Commands::Group { action } => handle_group_command_with_conn(&mut conn, action)?,
        Commands::Building { action } => handle_building_command_with_conn(&mut conn, action)?,
        Commands::Device { action } => handle_device_command_with_conn(&mut conn, action)?,
        Commands::Ticket { action } => handle_ticket_command_with_conn(&mut conn, action)?,
        Commands::Audit { action } => handle_audit_command_with_conn(&mut conn, action)?,
        Commands::Report { action } => handle_report_command_with_conn(&mut conn, action)?,
    }

    Ok(())
}
