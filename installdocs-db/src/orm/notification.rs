use diesel::prelude::*;

use crate::error::{DbError, DbResult};
use crate::models::{NewNotification, Notification};
use crate::orm::{ensure_found, last_insert_rowid};
use crate::validation::{MAX_NAME_LEN, require_text};

/// Stores a notification for a user, a group, both or neither.
pub fn insert_notification(
    conn: &mut SqliteConnection,
    new_notification: NewNotification,
) -> DbResult<Notification> {
    use crate::schema::notifications::dsl::*;

    require_text("title", &new_notification.title, MAX_NAME_LEN)?;
    if new_notification.message.is_empty() {
        return Err(DbError::validation("message", "must not be empty"));
    }

    let saved = conn.transaction::<_, DbError, _>(|conn| {
        diesel::insert_into(notifications)
            .values(&new_notification)
            .execute(conn)?;
        let new_id = last_insert_rowid(conn)?;
        Ok(notifications
            .filter(id.eq(new_id))
            .first::<Notification>(conn)?)
    })?;

    tracing::debug!(
        notification_id = saved.id,
        user_id = saved.user_id.as_deref(),
        group_id = saved.group_id,
        "inserted notification"
    );
    Ok(saved)
}

pub fn get_notification(
    conn: &mut SqliteConnection,
    notification_id: i32,
) -> DbResult<Notification> {
    use crate::schema::notifications::dsl::*;
    Ok(notifications
        .filter(id.eq(notification_id))
        .first::<Notification>(conn)?)
}

/// Notifications a user should see: those addressed to the user directly and
/// those addressed to any group the user belongs to. Newest first.
pub fn get_notifications_for_user(
    conn: &mut SqliteConnection,
    member_id: &str,
) -> DbResult<Vec<Notification>> {
    use crate::schema::notifications::dsl::*;
    use crate::schema::user_groups;

    let member_groups: Vec<i32> = user_groups::table
        .filter(user_groups::user_id.eq(member_id))
        .select(user_groups::group_id)
        .load(conn)?;

    Ok(notifications
        .filter(user_id.eq(member_id).or(group_id.eq_any(member_groups)))
        .order((created_at.desc(), id.desc()))
        .load::<Notification>(conn)?)
}

/// Notifications addressed to a group, newest first.
pub fn get_notifications_for_group(
    conn: &mut SqliteConnection,
    target_group_id: i32,
) -> DbResult<Vec<Notification>> {
    use crate::schema::notifications::dsl::*;
    Ok(notifications
        .filter(group_id.eq(target_group_id))
        .order((created_at.desc(), id.desc()))
        .load::<Notification>(conn)?)
}

pub fn delete_notification(conn: &mut SqliteConnection, notification_id: i32) -> DbResult<()> {
    use crate::schema::notifications::dsl::*;
    let affected = diesel::delete(notifications.filter(id.eq(notification_id))).execute(conn)?;
    ensure_found(affected)?;
    Ok(())
}
