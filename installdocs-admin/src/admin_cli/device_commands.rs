use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use installdocs_db::ConstraintKind;
use installdocs_db::models::{Device, DeviceInput};
use installdocs_db::orm::building::list_all_buildings;
use installdocs_db::orm::device::{
    delete_device, get_device, get_device_by_building_and_name, get_device_by_uuid,
    get_devices_by_building, insert_device, list_all_devices,
};
use std::collections::HashMap;

use super::utils::{SearchPattern, confirm, resolve_building};

#[derive(Subcommand)]
pub enum DeviceAction {
    #[command(about = "Add a device to a building")]
    Add {
        #[arg(short, long, help = "Building ID, UUID or name")]
        building: String,
        #[arg(short, long, help = "Device name (unique within the building)")]
        name: String,
        #[arg(short = 't', long = "type", help = "Device type, e.g. VAV or AHU")]
        device_type: Option<String>,
        #[arg(short, long, help = "Description (optional)")]
        description: Option<String>,
    },
    #[command(about = "List devices, optionally limited to one building and filtered by search term")]
    Ls {
        #[arg(help = "Search term matched against device names (regex by default, use -F for fixed string)")]
        search_term: Option<String>,
        #[arg(short, long, help = "Only list devices in this building (ID, UUID or name)")]
        building: Option<String>,
        #[arg(short = 'F', long = "fixed-string", help = "Treat search term as fixed string instead of regex")]
        fixed_string: bool,
    },
    #[command(about = "Remove a device")]
    Rm {
        #[arg(help = "Device ID or UUID, or the device name together with --building")]
        device: String,
        #[arg(short, long, help = "Building the named device belongs to")]
        building: Option<String>,
        #[arg(short = 'y', long = "yes", help = "Skip confirmation prompt")]
        yes: bool,
    },
}

pub fn handle_device_command_with_conn(
    conn: &mut SqliteConnection,
    action: DeviceAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        DeviceAction::Add {
            building,
            name,
            device_type,
            description,
        } => {
            add_device_impl(conn, &building, &name, device_type, description)?;
        }
        DeviceAction::Ls {
            search_term,
            building,
            fixed_string,
        } => {
            list_devices_impl(conn, search_term, building, fixed_string)?;
        }
        DeviceAction::Rm { device, building, yes } => {
            remove_device_impl(conn, &device, building.as_deref(), yes)?;
        }
    }
    Ok(())
}

/// Resolve a device by ID or UUID, or by name within `building`.
pub fn resolve_device(
    conn: &mut SqliteConnection,
    device: &str,
    building: Option<&str>,
) -> Result<Device, Box<dyn std::error::Error>> {
    if let Some(building) = building {
        let owner = resolve_building(conn, building)?;
        return get_device_by_building_and_name(conn, owner.id, device).map_err(|_| {
            format!("Device '{}' does not exist in building '{}'", device, owner.building_name).into()
        });
    }
    if let Ok(id) = device.parse::<i32>() {
        return get_device(conn, id).map_err(|_| format!("Device with ID {} does not exist", id).into());
    }
    get_device_by_uuid(conn, device).map_err(|e| {
        if e.is_not_found() {
            format!("Device with UUID {} does not exist", device).into()
        } else {
            format!("'{}' is not a device ID or UUID; pass --building to look up by name", device).into()
        }
    })
}

pub fn add_device_impl(
    conn: &mut SqliteConnection,
    building: &str,
    name: &str,
    device_type: Option<String>,
    description: Option<String>,
) -> Result<Device, Box<dyn std::error::Error>> {
    let owner = resolve_building(conn, building)?;

    let device = insert_device(
        conn,
        DeviceInput {
            building_id: owner.id,
            device_name: name.to_string(),
            device_type,
            description,
        },
    )
    .map_err(|e| {
        if e.constraint_kind() == Some(ConstraintKind::Unique) {
            format!("Building '{}' already has a device named '{}'", owner.building_name, name).into()
        } else {
            Box::<dyn std::error::Error>::from(e)
        }
    })?;

    println!("Device created successfully!");
    println!("ID: {}", device.id);
    println!("UUID: {}", device.device_uuid);
    println!("Name: {}", device.device_name);
    println!("Building: {} (ID: {})", owner.building_name, owner.id);
    Ok(device)
}

pub fn list_devices_impl(
    conn: &mut SqliteConnection,
    search_term: Option<String>,
    building: Option<String>,
    fixed_string: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let pattern = SearchPattern::new(search_term.as_deref(), fixed_string)?;
    let devices = match building.as_deref() {
        Some(building) => {
            let owner = resolve_building(conn, building)?;
            get_devices_by_building(conn, owner.id)?
        }
        None => list_all_devices(conn)?,
    };
    let devices: Vec<Device> = devices
        .into_iter()
        .filter(|d| pattern.is_match(&d.device_name))
        .collect();

    if devices.is_empty() {
        println!("No devices found.");
        return Ok(());
    }

    let building_names: HashMap<i32, String> = list_all_buildings(conn)?
        .into_iter()
        .map(|b| (b.id, b.building_name))
        .collect();

    println!("Devices:");
    for device in devices {
        println!(
            "  ID: {}, UUID: {}, Building: {}, Name: {}, Type: {}",
            device.id,
            device.device_uuid,
            building_names
                .get(&device.building_id)
                .map(String::as_str)
                .unwrap_or("?"),
            device.device_name,
            device.device_type.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub fn remove_device_impl(
    conn: &mut SqliteConnection,
    device: &str,
    building: Option<&str>,
    yes: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let target = resolve_device(conn, device, building)?;

    if !yes {
        let question = format!("Delete device '{}' (ID: {})?", target.device_name, target.id);
        if !confirm(&question)? {
            println!("Operation cancelled.");
            return Ok(false);
        }
    }

    match delete_device(conn, target.id) {
        Ok(()) => {
            println!("Deleted device: {} (ID: {})", target.device_name, target.id);
            Ok(true)
        }
        Err(e) if e.constraint_kind() == Some(ConstraintKind::ForeignKey) => Err(format!(
            "Device '{}' is referenced by logged work and cannot be removed",
            target.device_name
        )
        .into()),
        Err(e) => Err(e.into()),
    }
}
