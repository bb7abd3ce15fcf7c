use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::buildings;

/// A physical site. Carries both an integer key and a public UUID.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = buildings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Building {
    pub id: i32,
    pub building_uuid: String,
    pub building_name: String,
    pub description: Option<String>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = buildings)]
pub struct NewBuilding {
    pub building_uuid: String,
    pub building_name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct BuildingInput {
    pub building_name: String,
    pub description: Option<String>,
}
