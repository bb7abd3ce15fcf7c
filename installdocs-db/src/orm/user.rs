use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::error::{DbError, DbResult};
use crate::models::{NewUser, User, UserChanges, UserInput, UserUpdate};
use crate::orm::{ensure_found, new_uuid};
use crate::validation::{MAX_NAME_LEN, MAX_SHORT_LEN, limit_text, require_text, validate_email};

fn validate_user_input(input: &UserInput) -> DbResult<()> {
    validate_email(&input.email)?;
    require_text("password", &input.password, MAX_NAME_LEN)?;
    require_text("user_name", &input.user_name, MAX_NAME_LEN)?;
    limit_text("user_alias", input.user_alias.as_deref(), MAX_NAME_LEN)?;
    limit_text("preferred_color", input.preferred_color.as_deref(), MAX_SHORT_LEN)?;
    limit_text(
        "preferred_landing_page",
        input.preferred_landing_page.as_deref(),
        MAX_NAME_LEN,
    )?;
    if let Some(tz) = &input.preferred_timezone {
        require_text("preferred_timezone", tz, MAX_SHORT_LEN)?;
    }
    limit_text("auth_provider", input.auth_provider.as_deref(), MAX_SHORT_LEN)?;
    limit_text("external_id", input.external_id.as_deref(), MAX_NAME_LEN)?;
    Ok(())
}

fn validate_user_changes(changes: &UserChanges) -> DbResult<()> {
    if let Some(email) = &changes.email {
        validate_email(email)?;
    }
    if let Some(name) = &changes.user_name {
        require_text("user_name", name, MAX_NAME_LEN)?;
    }
    if let Some(alias) = &changes.user_alias {
        limit_text("user_alias", alias.as_deref(), MAX_NAME_LEN)?;
    }
    if let Some(color) = &changes.preferred_color {
        limit_text("preferred_color", color.as_deref(), MAX_SHORT_LEN)?;
    }
    if let Some(page) = &changes.preferred_landing_page {
        limit_text("preferred_landing_page", page.as_deref(), MAX_NAME_LEN)?;
    }
    if let Some(tz) = &changes.preferred_timezone {
        require_text("preferred_timezone", tz, MAX_SHORT_LEN)?;
    }
    if let Some(provider) = &changes.auth_provider {
        limit_text("auth_provider", provider.as_deref(), MAX_SHORT_LEN)?;
    }
    if let Some(ext) = &changes.external_id {
        limit_text("external_id", ext.as_deref(), MAX_NAME_LEN)?;
    }
    Ok(())
}

/// Inserts a new user. `is_staff` and `is_superuser` are derived from the
/// role flags; preference columns left as `None` take their defaults.
pub fn insert_user(conn: &mut SqliteConnection, new_user: UserInput) -> DbResult<User> {
    use crate::schema::users::dsl::*;

    validate_user_input(&new_user)?;
    let user_id = new_uuid();
    let row = NewUser::from_input(user_id.clone(), new_user);

    let user = conn.transaction::<_, DbError, _>(|conn| {
        diesel::insert_into(users).values(&row).execute(conn)?;
        Ok(users.filter(id.eq(&user_id)).first::<User>(conn)?)
    })?;

    tracing::debug!(user_id = %user.id, email = %user.email, "inserted user");
    Ok(user)
}

pub fn get_user(conn: &mut SqliteConnection, user_id: &str) -> DbResult<User> {
    use crate::schema::users::dsl::*;
    Ok(users.filter(id.eq(user_id)).first::<User>(conn)?)
}

/// Looks a user up by email. Matching ignores case; the stored address keeps
/// the case it was saved with.
pub fn get_user_by_email(conn: &mut SqliteConnection, user_email: &str) -> DbResult<User> {
    use crate::schema::users::dsl::*;
    Ok(users.filter(email.eq(user_email)).first::<User>(conn)?)
}

/// Returns all users ordered by email.
pub fn list_all_users(conn: &mut SqliteConnection) -> DbResult<Vec<User>> {
    use crate::schema::users::dsl::*;
    Ok(users.order(email.asc()).load::<User>(conn)?)
}

/// Applies `changes` to a stored user.
///
/// The current row is loaded and merged with the changes inside one
/// transaction, and the access flags are recomputed from the merged role
/// flags before the write.
pub fn update_user(
    conn: &mut SqliteConnection,
    user_id: &str,
    changes: UserChanges,
) -> DbResult<User> {
    use crate::schema::users::dsl::*;

    validate_user_changes(&changes)?;

    let user = conn.transaction::<_, DbError, _>(|conn| {
        let current = users.filter(id.eq(user_id)).first::<User>(conn)?;
        let update = UserUpdate::merge(current, changes);
        diesel::update(users.filter(id.eq(user_id)))
            .set(&update)
            .execute(conn)?;
        Ok(users.filter(id.eq(user_id)).first::<User>(conn)?)
    })?;

    tracing::debug!(
        user_id = %user.id,
        is_staff = user.is_staff,
        is_superuser = user.is_superuser,
        "updated user"
    );
    Ok(user)
}

/// Replaces the stored password hash.
pub fn set_user_password(
    conn: &mut SqliteConnection,
    user_id: &str,
    password_hash: &str,
) -> DbResult<()> {
    use crate::schema::users::dsl::*;

    require_text("password", password_hash, MAX_NAME_LEN)?;
    let affected = diesel::update(users.filter(id.eq(user_id)))
        .set(password.eq(password_hash))
        .execute(conn)?;
    ensure_found(affected)?;
    tracing::info!(user_id, "password changed");
    Ok(())
}

/// Stamps `last_login`.
pub fn record_user_login(
    conn: &mut SqliteConnection,
    user_id: &str,
    at: NaiveDateTime,
) -> DbResult<()> {
    use crate::schema::users::dsl::*;

    let affected = diesel::update(users.filter(id.eq(user_id)))
        .set(last_login.eq(Some(at)))
        .execute(conn)?;
    ensure_found(affected)?;
    Ok(())
}

/// Deletes a user. Sessions, tokens, memberships, ticket entries and history
/// rows owned by the user go with it; login attempts, notifications and
/// alerts keep their rows with the user reference cleared.
pub fn delete_user(conn: &mut SqliteConnection, user_id: &str) -> DbResult<()> {
    use crate::schema::users::dsl::*;

    let affected = diesel::delete(users.filter(id.eq(user_id))).execute(conn)?;
    ensure_found(affected)?;
    tracing::info!(user_id, "deleted user");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::error::ConstraintKind;
    use crate::models::{DisplayMode, Theme};
    use crate::orm::testing::setup_test_db;

    fn assert_flags_consistent(user: &User) {
        assert_eq!(user.is_superuser, user.is_admin);
        assert_eq!(user.is_staff, user.is_manager || user.is_admin);
    }

    #[test]
    fn test_insert_user_applies_defaults() {
        let mut conn = setup_test_db();

        let user = insert_user(&mut conn, UserInput::new("Tech@Example.com", "hash", "Tech"))
            .expect("insert should succeed");

        assert_eq!(user.email, "Tech@Example.com");
        assert_eq!(user.mobile_theme, Theme::Dark);
        assert_eq!(user.desktop_theme, Theme::Light);
        assert_eq!(user.preferred_timezone, "America/Los_Angeles");
        assert!(user.display_mode.is_none());
        assert!(user.is_active);
        assert!(!user.email_verified);
        assert!(user.last_login.is_none());
        assert!(uuid::Uuid::parse_str(&user.id).is_ok());
        assert_flags_consistent(&user);
    }

    #[test]
    fn test_insert_manager_is_staff_but_not_superuser() {
        let mut conn = setup_test_db();

        let mut input = UserInput::new("manager@example.com", "hash", "Manager");
        input.is_manager = true;
        let user = insert_user(&mut conn, input).unwrap();

        assert!(user.is_staff);
        assert!(!user.is_superuser);
    }

    #[test]
    fn test_insert_admin_is_staff_and_superuser() {
        let mut conn = setup_test_db();

        let mut input = UserInput::new("admin@example.com", "hash", "Admin");
        input.is_admin = true;
        let user = insert_user(&mut conn, input).unwrap();

        assert!(user.is_staff);
        assert!(user.is_superuser);
    }

    #[test]
    fn test_update_recomputes_flags_from_merged_roles() {
        let mut conn = setup_test_db();

        let mut input = UserInput::new("promote@example.com", "hash", "Promote");
        input.is_manager = true;
        let user = insert_user(&mut conn, input).unwrap();

        let promoted = update_user(
            &mut conn,
            &user.id,
            UserChanges {
                is_admin: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(promoted.is_manager, "untouched role flag must survive the merge");
        assert!(promoted.is_staff);
        assert!(promoted.is_superuser);

        let demoted = update_user(
            &mut conn,
            &user.id,
            UserChanges {
                is_admin: Some(false),
                is_manager: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!demoted.is_staff);
        assert!(!demoted.is_superuser);
        assert_flags_consistent(&demoted);
    }

    #[test]
    fn test_update_clears_nullable_fields() {
        let mut conn = setup_test_db();

        let mut input = UserInput::new("prefs@example.com", "hash", "Prefs");
        input.user_alias = Some("P".to_string());
        input.display_mode = Some(DisplayMode::Mobile);
        let user = insert_user(&mut conn, input).unwrap();

        let updated = update_user(
            &mut conn,
            &user.id,
            UserChanges {
                user_alias: Some(None),
                desktop_theme: Some(Theme::Dark),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(updated.user_alias.is_none());
        assert_eq!(updated.display_mode, Some(DisplayMode::Mobile));
        assert_eq!(updated.desktop_theme, Theme::Dark);
        assert_eq!(updated.email, "prefs@example.com");
    }

    #[test]
    fn test_duplicate_email_differing_in_case_is_rejected() {
        let mut conn = setup_test_db();

        insert_user(&mut conn, UserInput::new("a@x.com", "hash", "A")).unwrap();
        let err = insert_user(&mut conn, UserInput::new("A@x.com", "hash", "Other A")).unwrap_err();

        assert_eq!(err.constraint_kind(), Some(ConstraintKind::Unique));
    }

    #[test]
    fn test_get_user_by_email_ignores_case() {
        let mut conn = setup_test_db();

        let user = insert_user(&mut conn, UserInput::new("Mixed@Case.com", "hash", "Mixed")).unwrap();
        let found = get_user_by_email(&mut conn, "mixed@case.COM").unwrap();

        assert_eq!(found.id, user.id);
        assert_eq!(found.email, "Mixed@Case.com");
    }

    #[test]
    fn test_malformed_email_is_a_validation_error() {
        let mut conn = setup_test_db();

        let err = insert_user(&mut conn, UserInput::new("not-an-email", "hash", "Bad")).unwrap_err();
        assert!(matches!(err, DbError::Validation { field: "email", .. }));
        assert!(list_all_users(&mut conn).unwrap().is_empty());
    }

    #[test]
    fn test_missing_user_is_not_found() {
        let mut conn = setup_test_db();

        assert!(get_user(&mut conn, "missing").unwrap_err().is_not_found());
        assert!(delete_user(&mut conn, "missing").unwrap_err().is_not_found());
        assert!(
            update_user(&mut conn, "missing", UserChanges::default())
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn test_password_and_login_stamp() {
        let mut conn = setup_test_db();
        let user = insert_user(&mut conn, UserInput::new("login@example.com", "old", "Login")).unwrap();

        set_user_password(&mut conn, &user.id, "new").unwrap();
        let now = Utc::now().naive_utc();
        record_user_login(&mut conn, &user.id, now).unwrap();

        let reloaded = get_user(&mut conn, &user.id).unwrap();
        assert_eq!(reloaded.password, "new");
        assert_eq!(reloaded.last_login, Some(now));
    }

    #[test]
    fn test_list_and_delete() {
        let mut conn = setup_test_db();
        let b = insert_user(&mut conn, UserInput::new("b@example.com", "hash", "B")).unwrap();
        insert_user(&mut conn, UserInput::new("a@example.com", "hash", "A")).unwrap();

        let emails: Vec<String> = list_all_users(&mut conn)
            .unwrap()
            .into_iter()
            .map(|u| u.email)
            .collect();
        assert_eq!(emails, vec!["a@example.com", "b@example.com"]);

        delete_user(&mut conn, &b.id).unwrap();
        assert_eq!(list_all_users(&mut conn).unwrap().len(), 1);
    }
}
