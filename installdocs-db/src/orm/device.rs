use diesel::prelude::*;

use crate::error::{DbError, DbResult};
use crate::models::{Device, DeviceInput, NewDevice};
use crate::orm::{ensure_found, last_insert_rowid, new_uuid};
use crate::validation::{MAX_NAME_LEN, MAX_SHORT_LEN, limit_text, parse_uuid, require_text};

fn validate_device_input(input: &DeviceInput) -> DbResult<()> {
    require_text("device_name", &input.device_name, MAX_NAME_LEN)?;
    limit_text("device_type", input.device_type.as_deref(), MAX_SHORT_LEN)?;
    Ok(())
}

/// Inserts a device into a building. Device names are unique within a
/// building but may repeat across buildings.
pub fn insert_device(conn: &mut SqliteConnection, input: DeviceInput) -> DbResult<Device> {
    use crate::schema::devices::dsl::*;

    validate_device_input(&input)?;
    let row = NewDevice {
        device_uuid: new_uuid(),
        building_id: input.building_id,
        device_name: input.device_name,
        device_type: input.device_type,
        description: input.description,
    };

    let device = conn.transaction::<_, DbError, _>(|conn| {
        diesel::insert_into(devices).values(&row).execute(conn)?;
        let new_id = last_insert_rowid(conn)?;
        Ok(devices.filter(id.eq(new_id)).first::<Device>(conn)?)
    })?;

    tracing::debug!(
        device_id = device.id,
        building_id = device.building_id,
        name = %device.device_name,
        "inserted device"
    );
    Ok(device)
}

pub fn get_device(conn: &mut SqliteConnection, device_id: i32) -> DbResult<Device> {
    use crate::schema::devices::dsl::*;
    Ok(devices.filter(id.eq(device_id)).first::<Device>(conn)?)
}

pub fn get_device_by_uuid(conn: &mut SqliteConnection, uuid: &str) -> DbResult<Device> {
    use crate::schema::devices::dsl::*;
    let uuid = parse_uuid("device_uuid", uuid)?;
    Ok(devices
        .filter(device_uuid.eq(uuid.to_string()))
        .first::<Device>(conn)?)
}

pub fn get_device_by_building_and_name(
    conn: &mut SqliteConnection,
    target_building_id: i32,
    name: &str,
) -> DbResult<Device> {
    use crate::schema::devices::dsl::*;
    Ok(devices
        .filter(building_id.eq(target_building_id))
        .filter(device_name.eq(name))
        .first::<Device>(conn)?)
}

/// Devices in a building ordered by name.
pub fn get_devices_by_building(
    conn: &mut SqliteConnection,
    target_building_id: i32,
) -> DbResult<Vec<Device>> {
    use crate::schema::devices::dsl::*;
    Ok(devices
        .filter(building_id.eq(target_building_id))
        .order(device_name.asc())
        .load::<Device>(conn)?)
}

pub fn list_all_devices(conn: &mut SqliteConnection) -> DbResult<Vec<Device>> {
    use crate::schema::devices::dsl::*;
    Ok(devices
        .order((building_id.asc(), device_name.asc()))
        .load::<Device>(conn)?)
}

/// Replaces a device's building, name, type and description.
pub fn update_device(
    conn: &mut SqliteConnection,
    device_id: i32,
    input: DeviceInput,
) -> DbResult<Device> {
    use crate::schema::devices::dsl::*;

    validate_device_input(&input)?;
    let affected = diesel::update(devices.filter(id.eq(device_id)))
        .set((
            building_id.eq(input.building_id),
            device_name.eq(input.device_name),
            device_type.eq(input.device_type),
            description.eq(input.description),
        ))
        .execute(conn)?;
    ensure_found(affected)?;
    get_device(conn, device_id)
}

/// Deletes a device. Fails with a foreign key violation while the device is
/// attached to a ticket entry.
pub fn delete_device(conn: &mut SqliteConnection, device_id: i32) -> DbResult<()> {
    use crate::schema::devices::dsl::*;
    let affected = diesel::delete(devices.filter(id.eq(device_id))).execute(conn)?;
    ensure_found(affected)?;
    tracing::info!(device_id, "deleted device");
    Ok(())
}
