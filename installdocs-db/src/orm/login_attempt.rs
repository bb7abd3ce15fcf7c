use diesel::prelude::*;

use crate::error::{DbError, DbResult};
use crate::models::{LoginAttempt, LoginAttemptFilter, NewLoginAttempt};
use crate::orm::last_insert_rowid;
use crate::validation::{MAX_IP_ADDRESS_LEN, MAX_NAME_LEN, limit_text, require_text};

/// Appends a login attempt to the audit log. Attempts are never updated.
pub fn record_login_attempt(
    conn: &mut SqliteConnection,
    attempt: NewLoginAttempt,
) -> DbResult<LoginAttempt> {
    use crate::schema::login_attempts::dsl::*;

    require_text("ip_address", &attempt.ip_address, MAX_IP_ADDRESS_LEN)?;
    // The email is kept as typed, so it is only bounded, not validated.
    limit_text("email", attempt.email.as_deref(), MAX_NAME_LEN)?;
    limit_text("login_origin", attempt.login_origin.as_deref(), MAX_NAME_LEN)?;

    let saved = conn.transaction::<_, DbError, _>(|conn| {
        diesel::insert_into(login_attempts)
            .values(&attempt)
            .execute(conn)?;
        let new_id = last_insert_rowid(conn)?;
        Ok(login_attempts
            .filter(id.eq(new_id))
            .first::<LoginAttempt>(conn)?)
    })?;

    if saved.success {
        tracing::debug!(attempt_id = saved.id, ip = %saved.ip_address, "login succeeded");
    } else {
        tracing::warn!(
            attempt_id = saved.id,
            ip = %saved.ip_address,
            email = saved.email.as_deref().unwrap_or("-"),
            "login failed"
        );
    }
    Ok(saved)
}

pub fn get_login_attempt(conn: &mut SqliteConnection, attempt_id: i32) -> DbResult<LoginAttempt> {
    use crate::schema::login_attempts::dsl::*;
    Ok(login_attempts
        .filter(id.eq(attempt_id))
        .first::<LoginAttempt>(conn)?)
}

/// Login attempts matching `filter`, newest first. The time range is
/// inclusive at both ends.
pub fn list_login_attempts(
    conn: &mut SqliteConnection,
    filter: &LoginAttemptFilter,
) -> DbResult<Vec<LoginAttempt>> {
    use crate::schema::login_attempts::dsl::*;

    let mut query = login_attempts.into_boxed();

    if let Some(uid) = &filter.user_id {
        query = query.filter(user_id.eq(uid));
    }
    if let Some(addr) = &filter.email {
        query = query.filter(email.eq(addr));
    }
    if let Some(ok) = filter.success {
        query = query.filter(success.eq(ok));
    }
    if let Some(since) = filter.since {
        query = query.filter(attempt_time.ge(since));
    }
    if let Some(until) = filter.until {
        query = query.filter(attempt_time.le(until));
    }
    if let Some(n) = filter.limit {
        query = query.limit(n);
    }

    Ok(query
        .order((attempt_time.desc(), id.desc()))
        .load::<LoginAttempt>(conn)?)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};

    use super::*;
    use crate::orm::testing::{create_test_user, setup_test_db};
    use crate::orm::user::delete_user;

    fn attempt(user: Option<&str>, email: &str, success: bool) -> NewLoginAttempt {
        NewLoginAttempt {
            user_id: user.map(str::to_string),
            email: Some(email.to_string()),
            ip_address: "198.51.100.4".to_string(),
            login_origin: Some("web".to_string()),
            success,
        }
    }

    #[test]
    fn test_record_login_attempt() {
        let mut conn = setup_test_db();
        let user = create_test_user(&mut conn, "audit@example.com");

        let saved = record_login_attempt(&mut conn, attempt(Some(&user.id), &user.email, true)).unwrap();
        assert!(saved.id > 0);
        assert_eq!(saved.user_id.as_deref(), Some(user.id.as_str()));

        let loaded = get_login_attempt(&mut conn, saved.id).unwrap();
        assert!(loaded.success);
    }

    #[test]
    fn test_attempt_without_user_is_allowed() {
        let mut conn = setup_test_db();
        let saved = record_login_attempt(&mut conn, attempt(None, "nobody@example.com", false)).unwrap();
        assert!(saved.user_id.is_none());
    }

    #[test]
    fn test_filters_and_ordering() {
        let mut conn = setup_test_db();
        let user = create_test_user(&mut conn, "filter@example.com");

        record_login_attempt(&mut conn, attempt(Some(&user.id), &user.email, false)).unwrap();
        record_login_attempt(&mut conn, attempt(Some(&user.id), &user.email, true)).unwrap();
        record_login_attempt(&mut conn, attempt(None, "other@example.com", false)).unwrap();

        let failures = list_login_attempts(
            &mut conn,
            &LoginAttemptFilter {
                success: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(failures.len(), 2);

        let mine = list_login_attempts(
            &mut conn,
            &LoginAttemptFilter {
                user_id: Some(user.id.clone()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine[0].id > mine[1].id, "newest first");

        let limited = list_login_attempts(
            &mut conn,
            &LoginAttemptFilter {
                limit: Some(1),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_time_range_filter() {
        let mut conn = setup_test_db();
        record_login_attempt(&mut conn, attempt(None, "range@example.com", false)).unwrap();
        let now = Utc::now().naive_utc();

        let in_range = list_login_attempts(
            &mut conn,
            &LoginAttemptFilter {
                since: Some(now - TimeDelta::hours(1)),
                until: Some(now + TimeDelta::hours(1)),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(in_range.len(), 1);

        let future = list_login_attempts(
            &mut conn,
            &LoginAttemptFilter {
                since: Some(now + TimeDelta::hours(1)),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(future.is_empty());
    }

    #[test]
    fn test_deleting_user_keeps_attempts() {
        let mut conn = setup_test_db();
        let user = create_test_user(&mut conn, "leaver@example.com");
        let saved = record_login_attempt(&mut conn, attempt(Some(&user.id), &user.email, true)).unwrap();

        delete_user(&mut conn, &user.id).unwrap();

        let kept = get_login_attempt(&mut conn, saved.id).unwrap();
        assert!(kept.user_id.is_none());
        assert_eq!(kept.email.as_deref(), Some("leaver@example.com"));
    }

    #[test]
    fn test_login_origin_accepts_up_to_255_characters() {
        let mut conn = setup_test_db();

        let mut long = attempt(None, "origin@example.com", false);
        long.login_origin = Some("o".repeat(255));
        let saved = record_login_attempt(&mut conn, long).unwrap();
        assert_eq!(saved.login_origin.map(|o| o.chars().count()), Some(255));

        let mut too_long = attempt(None, "origin@example.com", false);
        too_long.login_origin = Some("o".repeat(256));
        let err = record_login_attempt(&mut conn, too_long).unwrap_err();
        assert!(matches!(err, DbError::Validation { field: "login_origin", .. }));
    }
}
