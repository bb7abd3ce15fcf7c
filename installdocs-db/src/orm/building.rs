use diesel::prelude::*;

use crate::error::{DbError, DbResult};
use crate::models::{Building, BuildingInput, NewBuilding};
use crate::orm::{ensure_found, last_insert_rowid, new_uuid};
use crate::validation::{MAX_NAME_LEN, parse_uuid, require_text};

fn validate_building_input(input: &BuildingInput) -> DbResult<()> {
    require_text("building_name", &input.building_name, MAX_NAME_LEN)
}

/// Inserts a building with a freshly generated public UUID.
pub fn insert_building(conn: &mut SqliteConnection, input: BuildingInput) -> DbResult<Building> {
    use crate::schema::buildings::dsl::*;

    validate_building_input(&input)?;
    let row = NewBuilding {
        building_uuid: new_uuid(),
        building_name: input.building_name,
        description: input.description,
    };

    let building = conn.transaction::<_, DbError, _>(|conn| {
        diesel::insert_into(buildings).values(&row).execute(conn)?;
        let new_id = last_insert_rowid(conn)?;
        Ok(buildings.filter(id.eq(new_id)).first::<Building>(conn)?)
    })?;

    tracing::debug!(building_id = building.id, uuid = %building.building_uuid, "inserted building");
    Ok(building)
}

pub fn get_building(conn: &mut SqliteConnection, building_id: i32) -> DbResult<Building> {
    use crate::schema::buildings::dsl::*;
    Ok(buildings.filter(id.eq(building_id)).first::<Building>(conn)?)
}

pub fn get_building_by_uuid(conn: &mut SqliteConnection, uuid: &str) -> DbResult<Building> {
    use crate::schema::buildings::dsl::*;
    let uuid = parse_uuid("building_uuid", uuid)?;
    Ok(buildings
        .filter(building_uuid.eq(uuid.to_string()))
        .first::<Building>(conn)?)
}

/// Returns all buildings ordered by name.
pub fn list_all_buildings(conn: &mut SqliteConnection) -> DbResult<Vec<Building>> {
    use crate::schema::buildings::dsl::*;
    Ok(buildings
        .order((building_name.asc(), id.asc()))
        .load::<Building>(conn)?)
}

/// Replaces a building's name and description. The UUID never changes.
pub fn update_building(
    conn: &mut SqliteConnection,
    building_id: i32,
    input: BuildingInput,
) -> DbResult<Building> {
    use crate::schema::buildings::dsl::*;

    validate_building_input(&input)?;
    let affected = diesel::update(buildings.filter(id.eq(building_id)))
        .set((
            building_name.eq(input.building_name),
            description.eq(input.description),
        ))
        .execute(conn)?;
    ensure_found(affected)?;
    get_building(conn, building_id)
}

/// Deletes a building. Fails with a foreign key violation while any device
/// still belongs to it.
pub fn delete_building(conn: &mut SqliteConnection, building_id: i32) -> DbResult<()> {
    use crate::schema::buildings::dsl::*;
    let affected = diesel::delete(buildings.filter(id.eq(building_id))).execute(conn)?;
    ensure_found(affected)?;
    tracing::info!(building_id, "deleted building");
    Ok(())
}
