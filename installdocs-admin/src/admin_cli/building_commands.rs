use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use installdocs_db::ConstraintKind;
use installdocs_db::models::{Building, BuildingInput};
use installdocs_db::orm::building::{delete_building, insert_building, list_all_buildings, update_building};
use installdocs_db::orm::device::get_devices_by_building;

use super::utils::{SearchPattern, confirm, resolve_building};

#[derive(Subcommand)]
pub enum BuildingAction {
    #[command(about = "Add a new building")]
    Add {
        #[arg(short, long, help = "Building name")]
        name: String,
        #[arg(short, long, help = "Description (optional)")]
        description: Option<String>,
    },
    #[command(about = "List buildings with device counts, optionally filtered by search term")]
    Ls {
        #[arg(help = "Search term (regex by default, use -F for fixed string)")]
        search_term: Option<String>,
        #[arg(short = 'F', long = "fixed-string", help = "Treat search term as fixed string instead of regex")]
        fixed_string: bool,
    },
    #[command(about = "Edit a building's name or description")]
    Edit {
        #[arg(help = "Building ID, UUID or name")]
        building: String,
        #[arg(long, help = "New building name")]
        name: Option<String>,
        #[arg(long, help = "New description")]
        description: Option<String>,
        #[arg(long, help = "Clear the description", conflicts_with = "description")]
        clear_description: bool,
    },
    #[command(about = "Remove a building (it must have no devices)")]
    Rm {
        #[arg(help = "Building ID, UUID or name")]
        building: String,
        #[arg(short = 'y', long = "yes", help = "Skip confirmation prompt")]
        yes: bool,
    },
}

pub fn handle_building_command_with_conn(
    conn: &mut SqliteConnection,
    action: BuildingAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        BuildingAction::Add { name, description } => {
            add_building_impl(conn, &name, description)?;
        }
        BuildingAction::Ls {
            search_term,
            fixed_string,
        } => {
            list_buildings_impl(conn, search_term, fixed_string)?;
        }
        BuildingAction::Edit {
            building,
            name,
            description,
            clear_description,
        } => {
            let description = if clear_description {
                Some(None)
            } else {
                description.map(Some)
            };
            edit_building_impl(conn, &building, name, description)?;
        }
        BuildingAction::Rm { building, yes } => {
            remove_building_impl(conn, &building, yes)?;
        }
    }
    Ok(())
}

pub fn add_building_impl(
    conn: &mut SqliteConnection,
    name: &str,
    description: Option<String>,
) -> Result<Building, Box<dyn std::error::Error>> {
    let building = insert_building(
        conn,
        BuildingInput {
            building_name: name.to_string(),
            description,
        },
    )?;

    println!("Building created successfully!");
    println!("ID: {}", building.id);
    println!("UUID: {}", building.building_uuid);
    println!("Name: {}", building.building_name);
    Ok(building)
}

pub fn list_buildings_impl(
    conn: &mut SqliteConnection,
    search_term: Option<String>,
    fixed_string: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let pattern = SearchPattern::new(search_term.as_deref(), fixed_string)?;
    let buildings: Vec<Building> = list_all_buildings(conn)?
        .into_iter()
        .filter(|b| pattern.is_match(&b.building_name))
        .collect();

    if buildings.is_empty() {
        println!("No buildings found.");
        return Ok(());
    }

    println!("Buildings:");
    for building in buildings {
        let device_count = get_devices_by_building(conn, building.id)?.len();
        println!(
            "  ID: {}, UUID: {}, Name: {}, Devices: {}",
            building.id, building.building_uuid, building.building_name, device_count
        );
        if let Some(description) = &building.description {
            println!("    {}", description);
        }
    }
    Ok(())
}

/// `description` follows the usual convention: `None` keeps it, `Some(None)`
/// clears it.
pub fn edit_building_impl(
    conn: &mut SqliteConnection,
    building: &str,
    name: Option<String>,
    description: Option<Option<String>>,
) -> Result<Option<Building>, Box<dyn std::error::Error>> {
    let target = resolve_building(conn, building)?;

    if name.is_none() && description.is_none() {
        println!("No fields specified for update. Use --name, --description or --clear-description.");
        return Ok(None);
    }

    let input = BuildingInput {
        building_name: name.unwrap_or(target.building_name),
        description: description.unwrap_or(target.description),
    };
    let updated = update_building(conn, target.id, input)?;

    println!("Building updated successfully!");
    println!("ID: {}", updated.id);
    println!("Name: {}", updated.building_name);
    println!("Description: {}", updated.description.as_deref().unwrap_or("-"));
    Ok(Some(updated))
}

pub fn remove_building_impl(
    conn: &mut SqliteConnection,
    building: &str,
    yes: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let target = resolve_building(conn, building)?;

    if !yes {
        let question = format!("Delete building '{}' (ID: {})?", target.building_name, target.id);
        if !confirm(&question)? {
            println!("Operation cancelled.");
            return Ok(false);
        }
    }

    match delete_building(conn, target.id) {
        Ok(()) => {
            println!("Deleted building: {} (ID: {})", target.building_name, target.id);
            Ok(true)
        }
        Err(e) if e.constraint_kind() == Some(ConstraintKind::ForeignKey) => {
            let devices = get_devices_by_building(conn, target.id)?.len();
            Err(format!(
                "Building '{}' still has {} device(s); remove them first",
                target.building_name, devices
            )
            .into())
        }
        Err(e) => Err(e.into()),
    }
}
