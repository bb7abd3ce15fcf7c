use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::devices;

#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(belongs_to(crate::models::building::Building))]
#[diesel(table_name = devices)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Device {
    pub id: i32,
    pub device_uuid: String,
    pub building_id: i32,
    pub device_name: String, // Unique within the building
    pub device_type: Option<String>,
    pub description: Option<String>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = devices)]
pub struct NewDevice {
    pub device_uuid: String,
    pub building_id: i32,
    pub device_name: String,
    pub device_type: Option<String>,
    pub description: Option<String>,
}

// For inputs and validation
#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct DeviceInput {
    pub building_id: i32,
    pub device_name: String,
    pub device_type: Option<String>,
    pub description: Option<String>,
}
