use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::{groups, user_groups};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[diesel(table_name = groups)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Group {
    pub id: i32,
    pub group_name: String,
}

#[derive(Insertable, Debug, Deserialize, Serialize, TS)]
#[diesel(table_name = groups)]
#[ts(export)]
pub struct NewGroup {
    pub group_name: String,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(belongs_to(crate::models::user::User))]
#[diesel(belongs_to(crate::models::group::Group))]
#[diesel(table_name = user_groups)]
#[diesel(primary_key(user_id, group_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct UserGroup {
    pub user_id: String,
    pub group_id: i32,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = user_groups)]
pub struct NewUserGroup {
    pub user_id: String,
    pub group_id: i32,
}
