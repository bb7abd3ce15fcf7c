use diesel::prelude::*;

use crate::error::{DbError, DbResult};
use crate::models::{Group, NewGroup, NewUserGroup, User, UserGroup};
use crate::orm::{ensure_found, last_insert_rowid};
use crate::validation::{MAX_SHORT_LEN, require_text};

pub fn insert_group(conn: &mut SqliteConnection, name: &str) -> DbResult<Group> {
    use crate::schema::groups::dsl::*;

    require_text("group_name", name, MAX_SHORT_LEN)?;
    let row = NewGroup {
        group_name: name.to_string(),
    };

    let group = conn.transaction::<_, DbError, _>(|conn| {
        diesel::insert_into(groups).values(&row).execute(conn)?;
        let new_id = last_insert_rowid(conn)?;
        Ok(groups.filter(id.eq(new_id)).first::<Group>(conn)?)
    })?;

    tracing::debug!(group_id = group.id, name = %group.group_name, "inserted group");
    Ok(group)
}

pub fn get_group(conn: &mut SqliteConnection, group_id: i32) -> DbResult<Group> {
    use crate::schema::groups::dsl::*;
    Ok(groups.filter(id.eq(group_id)).first::<Group>(conn)?)
}

pub fn get_group_by_name(conn: &mut SqliteConnection, name: &str) -> DbResult<Group> {
    use crate::schema::groups::dsl::*;
    Ok(groups.filter(group_name.eq(name)).first::<Group>(conn)?)
}

/// Returns all groups ordered by name.
pub fn list_all_groups(conn: &mut SqliteConnection) -> DbResult<Vec<Group>> {
    use crate::schema::groups::dsl::*;
    Ok(groups.order(group_name.asc()).load::<Group>(conn)?)
}

pub fn rename_group(conn: &mut SqliteConnection, group_id: i32, new_name: &str) -> DbResult<Group> {
    use crate::schema::groups::dsl::*;

    require_text("group_name", new_name, MAX_SHORT_LEN)?;
    let affected = diesel::update(groups.filter(id.eq(group_id)))
        .set(group_name.eq(new_name))
        .execute(conn)?;
    ensure_found(affected)?;
    get_group(conn, group_id)
}

/// Deletes a group. Memberships are removed with it; notifications and
/// alerts addressed to the group lose their group reference.
pub fn delete_group(conn: &mut SqliteConnection, group_id: i32) -> DbResult<()> {
    use crate::schema::groups::dsl::*;
    let affected = diesel::delete(groups.filter(id.eq(group_id))).execute(conn)?;
    ensure_found(affected)?;
    tracing::info!(group_id, "deleted group");
    Ok(())
}

/// Adds a user to a group. Adding the same pair twice is a unique violation.
pub fn add_user_to_group(
    conn: &mut SqliteConnection,
    member_id: &str,
    target_group_id: i32,
) -> DbResult<UserGroup> {
    use crate::schema::user_groups::dsl::*;

    let row = NewUserGroup {
        user_id: member_id.to_string(),
        group_id: target_group_id,
    };
    diesel::insert_into(user_groups).values(&row).execute(conn)?;
    tracing::debug!(user_id = member_id, group_id = target_group_id, "added group member");

    Ok(UserGroup {
        user_id: row.user_id,
        group_id: row.group_id,
    })
}

pub fn remove_user_from_group(
    conn: &mut SqliteConnection,
    member_id: &str,
    target_group_id: i32,
) -> DbResult<()> {
    use crate::schema::user_groups::dsl::*;
    let affected = diesel::delete(
        user_groups
            .filter(user_id.eq(member_id))
            .filter(group_id.eq(target_group_id)),
    )
    .execute(conn)?;
    ensure_found(affected)?;
    Ok(())
}

/// Members of a group ordered by email.
pub fn get_group_members(conn: &mut SqliteConnection, target_group_id: i32) -> DbResult<Vec<User>> {
    use crate::schema::{user_groups, users};

    Ok(users::table
        .inner_join(user_groups::table)
        .filter(user_groups::group_id.eq(target_group_id))
        .order(users::email.asc())
        .select(User::as_select())
        .load::<User>(conn)?)
}

/// Groups a user belongs to ordered by name.
pub fn get_user_groups(conn: &mut SqliteConnection, member_id: &str) -> DbResult<Vec<Group>> {
    use crate::schema::{groups, user_groups};

    Ok(groups::table
        .inner_join(user_groups::table)
        .filter(user_groups::user_id.eq(member_id))
        .order(groups::group_name.asc())
        .select(Group::as_select())
        .load::<Group>(conn)?)
}
