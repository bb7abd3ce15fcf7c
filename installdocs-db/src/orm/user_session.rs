use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::error::{DbError, DbResult};
use crate::models::{NewUserSession, UserSession, UserSessionInput};
use crate::orm::{ensure_found, new_uuid};
use crate::validation::{
    MAX_IP_ADDRESS_LEN, MAX_NAME_LEN, MAX_SESSION_TOKEN_LEN, limit_text, require_text,
};

fn validate_session_input(input: &UserSessionInput) -> DbResult<()> {
    require_text("login_origin", &input.login_origin, MAX_NAME_LEN)?;
    require_text("token", &input.token, MAX_SESSION_TOKEN_LEN)?;
    limit_text("device_info", input.device_info.as_deref(), MAX_NAME_LEN)?;
    limit_text("ip_address", input.ip_address.as_deref(), MAX_IP_ADDRESS_LEN)?;
    Ok(())
}

/// Creates a session. `issued_at` and `last_accessed_at` start at the
/// insertion time.
pub fn insert_session(
    conn: &mut SqliteConnection,
    input: UserSessionInput,
) -> DbResult<UserSession> {
    use crate::schema::user_sessions::dsl::*;

    validate_session_input(&input)?;

    let row = NewUserSession {
        id: new_uuid(),
        user_id: input.user_id,
        login_origin: input.login_origin,
        token: input.token,
        expires_at: input.expires_at,
        is_active: input.is_active,
        device_info: input.device_info,
        ip_address: input.ip_address,
    };

    let session = conn.transaction::<_, DbError, _>(|conn| {
        diesel::insert_into(user_sessions).values(&row).execute(conn)?;
        Ok(user_sessions
            .filter(id.eq(&row.id))
            .first::<UserSession>(conn)?)
    })?;

    tracing::debug!(
        session_id = %session.id,
        user_id = %session.user_id,
        origin = %session.login_origin,
        "created session"
    );
    Ok(session)
}

pub fn get_session(conn: &mut SqliteConnection, session_id: &str) -> DbResult<UserSession> {
    use crate::schema::user_sessions::dsl::*;
    Ok(user_sessions
        .filter(id.eq(session_id))
        .first::<UserSession>(conn)?)
}

pub fn get_session_by_token(
    conn: &mut SqliteConnection,
    token_value: &str,
) -> DbResult<UserSession> {
    use crate::schema::user_sessions::dsl::*;
    Ok(user_sessions
        .filter(token.eq(token_value))
        .first::<UserSession>(conn)?)
}

/// Sessions belonging to a user, most recently issued first.
pub fn list_sessions_for_user(
    conn: &mut SqliteConnection,
    owner_id: &str,
) -> DbResult<Vec<UserSession>> {
    use crate::schema::user_sessions::dsl::*;
    Ok(user_sessions
        .filter(user_id.eq(owner_id))
        .order(issued_at.desc())
        .load::<UserSession>(conn)?)
}

/// Records activity on a session.
pub fn touch_session(
    conn: &mut SqliteConnection,
    session_id: &str,
    at: NaiveDateTime,
) -> DbResult<()> {
    use crate::schema::user_sessions::dsl::*;
    let affected = diesel::update(user_sessions.filter(id.eq(session_id)))
        .set(last_accessed_at.eq(at))
        .execute(conn)?;
    ensure_found(affected)?;
    Ok(())
}

pub fn set_session_active(
    conn: &mut SqliteConnection,
    session_id: &str,
    active: bool,
) -> DbResult<()> {
    use crate::schema::user_sessions::dsl::*;
    let affected = diesel::update(user_sessions.filter(id.eq(session_id)))
        .set(is_active.eq(active))
        .execute(conn)?;
    ensure_found(affected)?;
    tracing::debug!(session_id, active, "session state changed");
    Ok(())
}

pub fn delete_session(conn: &mut SqliteConnection, session_id: &str) -> DbResult<()> {
    use crate::schema::user_sessions::dsl::*;
    let affected = diesel::delete(user_sessions.filter(id.eq(session_id))).execute(conn)?;
    ensure_found(affected)?;
    Ok(())
}

/// Deletes sessions that expired at or before `now`.
pub fn purge_expired_sessions(conn: &mut SqliteConnection, now: NaiveDateTime) -> DbResult<usize> {
    use crate::schema::user_sessions::dsl::*;
    let removed = diesel::delete(user_sessions.filter(expires_at.le(now))).execute(conn)?;
    if removed > 0 {
        tracing::info!(removed, "purged expired sessions");
    }
    Ok(removed)
}
