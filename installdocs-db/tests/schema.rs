// installdocs-db/tests/schema.rs
//
// Constraint and relationship tests against the raw tables. These go around
// the orm layer on purpose: they check what the database itself enforces.
//

use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error};
use installdocs_db::error::ConstraintKind;
use installdocs_db::models::*;
use installdocs_db::DbError;
use installdocs_db::orm::testing::{create_test_building, create_test_ticket, create_test_user, setup_test_db};
use installdocs_db::schema::*;
// models::history is also glob-imported
use installdocs_db::schema::history;

fn raw_user(id: &str, email: &str, is_admin: bool, is_manager: bool, is_staff: bool, is_superuser: bool) -> String {
    format!(
        "INSERT INTO users (id, email, password, user_name, is_admin, is_manager, is_staff, is_superuser) \
         VALUES ('{}', '{}', 'hash', 'raw', {}, {}, {}, {})",
        id, email, is_admin as i32, is_manager as i32, is_staff as i32, is_superuser as i32
    )
}

fn insert_raw_device(conn: &mut SqliteConnection, building: i32, uuid: &str, name: &str) -> QueryResult<usize> {
    diesel::insert_into(devices::table)
        .values(&NewDevice {
            device_uuid: uuid.to_string(),
            building_id: building,
            device_name: name.to_string(),
            device_type: None,
            description: None,
        })
        .execute(conn)
}

/// A write that bypasses the flag derivation and stores inconsistent access
/// flags is rejected by the table itself.
#[test]
fn test_inconsistent_access_flags_violate_check() {
    let mut conn = setup_test_db();

    let res = diesel::sql_query(raw_user("u1", "raw@example.com", false, true, false, false)).execute(&mut conn);
    assert!(matches!(
        res,
        Err(Error::DatabaseError(DatabaseErrorKind::CheckViolation, _))
    ));

    let res = diesel::sql_query(raw_user("u2", "root@example.com", false, false, true, true)).execute(&mut conn);
    assert!(matches!(
        res,
        Err(Error::DatabaseError(DatabaseErrorKind::CheckViolation, _))
    ));

    let res = diesel::sql_query(raw_user("u3", "ok@example.com", true, false, true, true)).execute(&mut conn);
    assert!(res.is_ok(), "consistent flags are accepted");
}

/// Flipping a role flag with a raw update, without touching the derived
/// flags, is rejected.
#[test]
fn test_raw_role_update_without_derived_flags_is_rejected() {
    let mut conn = setup_test_db();
    let user = create_test_user(&mut conn, "flags@example.com");

    let res = diesel::update(users::table.find(&user.id))
        .set(users::is_admin.eq(true))
        .execute(&mut conn);
    assert!(matches!(
        res,
        Err(Error::DatabaseError(DatabaseErrorKind::CheckViolation, _))
    ));
}

#[test]
fn test_theme_outside_enum_violates_check() {
    let mut conn = setup_test_db();
    let user = create_test_user(&mut conn, "theme@example.com");

    let res = diesel::sql_query(format!(
        "UPDATE users SET mobile_theme = 'sepia' WHERE id = '{}'",
        user.id
    ))
    .execute(&mut conn);
    assert!(matches!(
        res,
        Err(Error::DatabaseError(DatabaseErrorKind::CheckViolation, _))
    ));
}

/// Email uniqueness ignores case at the table level.
#[test]
fn test_email_unique_ignoring_case() {
    let mut conn = setup_test_db();

    diesel::sql_query(raw_user("a", "case@example.com", false, false, false, false))
        .execute(&mut conn)
        .unwrap();
    let res = diesel::sql_query(raw_user("b", "CASE@example.com", false, false, false, false)).execute(&mut conn);
    assert!(matches!(
        res,
        Err(Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
    ));
}

#[test]
fn test_required_column_violates_not_null() {
    let mut conn = setup_test_db();

    let res = diesel::sql_query("INSERT INTO tickets (ticket_number) VALUES (NULL)").execute(&mut conn);
    assert!(matches!(
        res,
        Err(Error::DatabaseError(DatabaseErrorKind::NotNullViolation, _))
    ));
}

/// Device names are scoped to their building.
#[test]
fn test_device_name_unique_per_building() {
    let mut conn = setup_test_db();
    let north = create_test_building(&mut conn, "North");
    let south = create_test_building(&mut conn, "South");

    insert_raw_device(&mut conn, north.id, "4f7c2f2e-0000-4000-8000-000000000001", "RTU-1").unwrap();

    let res = insert_raw_device(&mut conn, north.id, "4f7c2f2e-0000-4000-8000-000000000002", "RTU-1");
    assert!(matches!(
        res,
        Err(Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
    ));

    let res = insert_raw_device(&mut conn, south.id, "4f7c2f2e-0000-4000-8000-000000000003", "RTU-1");
    assert!(res.is_ok());

    let res = insert_raw_device(&mut conn, south.id, "4f7c2f2e-0000-4000-8000-000000000001", "RTU-2");
    assert!(
        matches!(res, Err(Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _))),
        "device UUIDs are globally unique"
    );
}

/// Buildings cannot be deleted while devices reference them.
#[test]
fn test_building_delete_restricted_by_devices() {
    let mut conn = setup_test_db();
    let building = create_test_building(&mut conn, "Restricted");
    insert_raw_device(&mut conn, building.id, "4f7c2f2e-0000-4000-8000-0000000000aa", "Boiler").unwrap();

    // SQLite reports RESTRICT failures without the foreign key result code
    let err = diesel::delete(buildings::table.find(building.id))
        .execute(&mut conn)
        .unwrap_err();
    match &err {
        Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {}
        Error::DatabaseError(DatabaseErrorKind::Unknown, info) => {
            assert!(info.message().starts_with("FOREIGN KEY constraint failed"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(DbError::from(err).constraint_kind(), Some(ConstraintKind::ForeignKey));
    assert_eq!(buildings::table.count().get_result::<i64>(&mut conn).unwrap(), 1);
}

/// A user may join many groups but each group only once.
#[test]
fn test_user_group_pair_is_unique() {
    let mut conn = setup_test_db();
    let user = create_test_user(&mut conn, "pair@example.com");
    diesel::sql_query(r#"INSERT INTO "groups" (group_name) VALUES ('one'), ('two')"#)
        .execute(&mut conn)
        .unwrap();
    let ids: Vec<i32> = groups::table
        .order(groups::id.asc())
        .select(groups::id)
        .load(&mut conn)
        .unwrap();

    let link = |group_id: i32| NewUserGroup {
        user_id: user.id.clone(),
        group_id,
    };

    diesel::insert_into(user_groups::table)
        .values(&link(ids[0]))
        .execute(&mut conn)
        .unwrap();
    let res = diesel::insert_into(user_groups::table)
        .values(&link(ids[0]))
        .execute(&mut conn);
    assert!(matches!(
        res,
        Err(Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _))
    ));

    assert!(
        diesel::insert_into(user_groups::table)
            .values(&link(ids[1]))
            .execute(&mut conn)
            .is_ok()
    );
}

/// Deleting a user clears optional references and removes owned rows.
#[test]
fn test_user_delete_set_null_and_cascade() {
    let mut conn = setup_test_db();
    let user = create_test_user(&mut conn, "cascade@example.com");
    let ticket = create_test_ticket(&mut conn, "T-CASCADE");

    diesel::insert_into(notifications::table)
        .values(&NewNotification {
            user_id: Some(user.id.clone()),
            group_id: None,
            title: "Heads up".to_string(),
            message: "Body".to_string(),
        })
        .execute(&mut conn)
        .unwrap();
    diesel::insert_into(alerts::table)
        .values(&NewAlert {
            user_id: Some(user.id.clone()),
            group_id: None,
            entry_id: None,
            alert_type: "overdue".to_string(),
            severity: Severity::Medium,
            message: "Late".to_string(),
        })
        .execute(&mut conn)
        .unwrap();
    diesel::insert_into(history::table)
        .values(&NewHistory {
            table_name: "tickets".to_string(),
            record_id: ticket.id as i64,
            action: "create".to_string(),
            user_id: user.id.clone(),
            changes: None,
        })
        .execute(&mut conn)
        .unwrap();
    diesel::sql_query(format!(
        "INSERT INTO ticket_entries (user_id, ticket_id, job_name) VALUES ('{}', {}, 'Job')",
        user.id, ticket.id
    ))
    .execute(&mut conn)
    .unwrap();

    diesel::delete(users::table.find(&user.id))
        .execute(&mut conn)
        .unwrap();

    let notification_owner: Option<String> = notifications::table
        .select(notifications::user_id)
        .first(&mut conn)
        .unwrap();
    assert!(notification_owner.is_none());

    let alert_owner: Option<String> = alerts::table
        .select(alerts::user_id)
        .first(&mut conn)
        .unwrap();
    assert!(alert_owner.is_none());

    let history_rows: i64 = history::table.count().get_result(&mut conn).unwrap();
    assert_eq!(history_rows, 0);

    let entry_rows: i64 = ticket_entries::table.count().get_result(&mut conn).unwrap();
    assert_eq!(entry_rows, 0);

    let tickets_left: i64 = tickets::table.count().get_result(&mut conn).unwrap();
    assert_eq!(tickets_left, 1, "tickets are not owned by users");
}

/// Alerts must name an existing ticket entry when they name one at all.
#[test]
fn test_alert_entry_reference_must_exist() {
    let mut conn = setup_test_db();

    let res = diesel::sql_query(
        "INSERT INTO alerts (entry_id, alert_type, severity, message) VALUES (42, 't', 'low', 'm')",
    )
    .execute(&mut conn);
    assert!(matches!(
        res,
        Err(Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _))
    ));
}

/// Updating a row bumps `updated_at` unless the caller set it explicitly.
#[test]
fn test_updated_at_trigger() {
    let mut conn = setup_test_db();
    let user = create_test_user(&mut conn, "stamp@example.com");
    let old = chrono::NaiveDate::from_ymd_opt(2000, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();

    diesel::update(users::table.find(&user.id))
        .set(users::updated_at.eq(old))
        .execute(&mut conn)
        .unwrap();
    let pinned: User = users::table.find(&user.id).first(&mut conn).unwrap();
    assert_eq!(pinned.updated_at, old);

    diesel::update(users::table.find(&user.id))
        .set(users::user_alias.eq(Some("Stamp")))
        .execute(&mut conn)
        .unwrap();
    let bumped: User = users::table.find(&user.id).first(&mut conn).unwrap();
    assert!(bumped.updated_at > old);
}

/// The rollup relation is not part of the migrated schema.
#[test]
fn test_daily_alert_counts_not_created_by_migrations() {
    #[derive(QueryableByName)]
    struct Count {
        #[diesel(sql_type = diesel::sql_types::BigInt)]
        n: i64,
    }

    let mut conn = setup_test_db();
    let found = diesel::sql_query(
        "SELECT count(*) AS n FROM sqlite_master WHERE type = 'table' AND name = 'daily_alert_counts'",
    )
    .get_result::<Count>(&mut conn)
    .unwrap();
    assert_eq!(found.n, 0);
}
