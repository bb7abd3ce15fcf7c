use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher};
use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use installdocs_db::models::{User, UserChanges, UserInput};
use installdocs_db::orm::group::get_user_groups;
use installdocs_db::orm::user::{delete_user, insert_user, list_all_users, set_user_password, update_user};
use rpassword::read_password;
use std::io::{self, Write};

use super::utils::{SearchPattern, confirm, resolve_user, yes_no};

#[derive(Subcommand)]
pub enum UserAction {
    #[command(about = "Add a new user")]
    Add {
        #[arg(short, long, help = "Email address")]
        email: String,
        #[arg(short, long, help = "Display name")]
        name: String,
        #[arg(short, long, help = "Password (will be prompted securely if not provided)")]
        password: Option<String>,
        #[arg(long, help = "Grant the admin role")]
        admin: bool,
        #[arg(long, help = "Grant the manager role")]
        manager: bool,
        #[arg(long, help = "Preferred IANA timezone (defaults to America/Los_Angeles)")]
        timezone: Option<String>,
    },
    #[command(about = "Change user password")]
    ChangePassword {
        #[arg(help = "User email or ID")]
        user: String,
        #[arg(short, long, help = "New password (will be prompted securely if not provided)")]
        password: Option<String>,
    },
    #[command(about = "List users, optionally filtered by search term")]
    Ls {
        #[arg(help = "Search term matched against email and name (regex by default, use -F for fixed string)")]
        search_term: Option<String>,
        #[arg(short = 'F', long = "fixed-string", help = "Treat search term as fixed string instead of regex")]
        fixed_string: bool,
    },
    #[command(about = "Remove users matching search term")]
    Rm {
        #[arg(help = "Search term to match user emails for removal (regex by default, use -F for fixed string)")]
        search_term: String,
        #[arg(short = 'F', long = "fixed-string", help = "Treat search term as fixed string instead of regex")]
        fixed_string: bool,
        #[arg(short = 'y', long = "yes", help = "Skip confirmation prompt")]
        yes: bool,
    },
    #[command(about = "Edit user fields and roles")]
    Edit {
        #[arg(help = "User email or ID")]
        user: String,
        #[arg(long, help = "New email address")]
        email: Option<String>,
        #[arg(long, help = "New display name")]
        name: Option<String>,
        #[arg(long, help = "Set the admin role (true/false)")]
        admin: Option<bool>,
        #[arg(long, help = "Set the manager role (true/false)")]
        manager: Option<bool>,
        #[arg(long, help = "Activate or deactivate the account (true/false)")]
        active: Option<bool>,
        #[arg(long, help = "Mark the email as verified (true/false)")]
        verified: Option<bool>,
        #[arg(long, help = "New preferred IANA timezone")]
        timezone: Option<String>,
    },
    #[command(about = "Show a user's details, roles and group memberships")]
    Show {
        #[arg(help = "User email or ID")]
        user: String,
    },
}

/// Field changes accepted by `user edit`.
#[derive(Debug, Default)]
pub struct UserEdit {
    pub email: Option<String>,
    pub name: Option<String>,
    pub admin: Option<bool>,
    pub manager: Option<bool>,
    pub active: Option<bool>,
    pub verified: Option<bool>,
    pub timezone: Option<String>,
}

impl UserEdit {
    fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.name.is_none()
            && self.admin.is_none()
            && self.manager.is_none()
            && self.active.is_none()
            && self.verified.is_none()
            && self.timezone.is_none()
    }

    fn into_changes(self) -> UserChanges {
        UserChanges {
            email: self.email,
            user_name: self.name,
            is_admin: self.admin,
            is_manager: self.manager,
            is_active: self.active,
            email_verified: self.verified,
            preferred_timezone: self.timezone,
            ..Default::default()
        }
    }
}

pub fn handle_user_command_with_conn(
    conn: &mut SqliteConnection,
    action: UserAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        UserAction::Add {
            email,
            name,
            password,
            admin,
            manager,
            timezone,
        } => {
            add_user_impl(conn, &email, &name, password, admin, manager, timezone)?;
        }
        UserAction::ChangePassword { user, password } => {
            change_password_impl(conn, &user, password)?;
        }
        UserAction::Ls {
            search_term,
            fixed_string,
        } => {
            list_users_impl(conn, search_term, fixed_string)?;
        }
        UserAction::Rm {
            search_term,
            fixed_string,
            yes,
        } => {
            remove_users_impl(conn, search_term, fixed_string, yes)?;
        }
        UserAction::Edit {
            user,
            email,
            name,
            admin,
            manager,
            active,
            verified,
            timezone,
        } => {
            let edit = UserEdit {
                email,
                name,
                admin,
                manager,
                active,
                verified,
                timezone,
            };
            user_edit_impl(conn, &user, edit)?;
        }
        UserAction::Show { user } => {
            show_user_impl(conn, &user)?;
        }
    }
    Ok(())
}

fn print_user_summary(user: &User) {
    println!("ID: {}", user.id);
    println!("Email: {}", user.email);
    println!("Name: {}", user.user_name);
    println!(
        "Roles: admin={} manager={} (staff={} superuser={})",
        yes_no(user.is_admin),
        yes_no(user.is_manager),
        yes_no(user.is_staff),
        yes_no(user.is_superuser)
    );
    println!("Active: {}", yes_no(user.is_active));
    println!("Email verified: {}", yes_no(user.email_verified));
    println!("Timezone: {}", user.preferred_timezone);
}

pub fn add_user_impl(
    conn: &mut SqliteConnection,
    email: &str,
    name: &str,
    password: Option<String>,
    admin: bool,
    manager: bool,
    timezone: Option<String>,
) -> Result<User, Box<dyn std::error::Error>> {
    let password = match password {
        Some(p) => p,
        None => prompt_for_password()?,
    };

    let password_hash =
        hash_password(&password).map_err(|e| format!("Failed to hash password: {}", e))?;

    let mut new_user = UserInput::new(email, password_hash, name);
    new_user.is_admin = admin;
    new_user.is_manager = manager;
    new_user.preferred_timezone = timezone;

    let created_user = insert_user(conn, new_user)?;

    println!("User created successfully!");
    print_user_summary(&created_user);

    Ok(created_user)
}

pub fn change_password_impl(
    conn: &mut SqliteConnection,
    user: &str,
    password: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let target = resolve_user(conn, user)?;

    let password = match password {
        Some(p) => p,
        None => prompt_for_password()?,
    };

    let password_hash =
        hash_password(&password).map_err(|e| format!("Failed to hash password: {}", e))?;
    set_user_password(conn, &target.id, &password_hash)?;

    println!("Password changed successfully for user: {}", target.email);
    Ok(())
}

fn matching_users(
    conn: &mut SqliteConnection,
    search_term: Option<&str>,
    fixed_string: bool,
    include_name: bool,
) -> Result<Vec<User>, Box<dyn std::error::Error>> {
    let pattern = SearchPattern::new(search_term, fixed_string)?;
    Ok(list_all_users(conn)?
        .into_iter()
        .filter(|user| {
            pattern.is_match(&user.email) || (include_name && pattern.is_match(&user.user_name))
        })
        .collect())
}

pub fn list_users_impl(
    conn: &mut SqliteConnection,
    search_term: Option<String>,
    fixed_string: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let users = matching_users(conn, search_term.as_deref(), fixed_string, true)?;

    if users.is_empty() {
        println!("No users found.");
    } else {
        println!("Users:");
        for user in users {
            let mut roles = Vec::new();
            if user.is_admin {
                roles.push("admin");
            }
            if user.is_manager {
                roles.push("manager");
            }
            let roles = if roles.is_empty() {
                "-".to_string()
            } else {
                roles.join(",")
            };
            println!(
                "  ID: {}, Email: {}, Name: {}, Roles: {}, Active: {}, Joined: {}",
                user.id,
                user.email,
                user.user_name,
                roles,
                yes_no(user.is_active),
                user.date_joined
            );
        }
    }

    Ok(())
}

pub fn remove_users_impl(
    conn: &mut SqliteConnection,
    search_term: String,
    fixed_string: bool,
    yes: bool,
) -> Result<usize, Box<dyn std::error::Error>> {
    // Removal only matches on email; names are too loose to delete by.
    let users = matching_users(conn, Some(&search_term), fixed_string, false)?;

    if users.is_empty() {
        println!("No users found matching the search term.");
        return Ok(0);
    }

    println!("Found {} user(s) matching the search term:", users.len());
    for user in &users {
        println!("  ID: {}, Email: {}, Name: {}", user.id, user.email, user.user_name);
    }

    if !yes {
        let question = format!("Are you sure you want to delete these {} user(s)?", users.len());
        if !confirm(&question)? {
            println!("Operation cancelled.");
            return Ok(0);
        }
    }

    let mut deleted_count = 0;
    let mut errors = Vec::new();

    for user in users {
        match delete_user(conn, &user.id) {
            Ok(()) => {
                deleted_count += 1;
                println!("Deleted user: {} (ID: {})", user.email, user.id);
            }
            Err(e) => {
                errors.push(format!("Failed to delete user {} (ID: {}): {}", user.email, user.id, e));
            }
        }
    }

    println!("Successfully deleted {} user(s).", deleted_count);

    if !errors.is_empty() {
        println!("Errors encountered:");
        for error in errors {
            println!("  {}", error);
        }
        return Err("Some deletions failed".into());
    }

    Ok(deleted_count)
}

pub fn user_edit_impl(
    conn: &mut SqliteConnection,
    user: &str,
    edit: UserEdit,
) -> Result<Option<User>, Box<dyn std::error::Error>> {
    let target = resolve_user(conn, user)?;

    if edit.is_empty() {
        println!(
            "No fields specified for update. Use --email, --name, --admin, --manager, --active, --verified or --timezone."
        );
        return Ok(None);
    }

    let updated_user = update_user(conn, &target.id, edit.into_changes())?;

    println!("User updated successfully!");
    print_user_summary(&updated_user);

    Ok(Some(updated_user))
}

pub fn show_user_impl(conn: &mut SqliteConnection, user: &str) -> Result<(), Box<dyn std::error::Error>> {
    let target = resolve_user(conn, user)?;
    let groups = get_user_groups(conn, &target.id)?;

    print_user_summary(&target);
    if let Some(alias) = &target.user_alias {
        println!("Alias: {}", alias);
    }
    println!("Themes: mobile={} desktop={}", target.mobile_theme, target.desktop_theme);
    println!("Joined: {}", target.date_joined);
    match target.last_login {
        Some(at) => println!("Last login: {}", at),
        None => println!("Last login: never"),
    }
    if groups.is_empty() {
        println!("Groups: none");
    } else {
        let names: Vec<&str> = groups.iter().map(|g| g.group_name.as_str()).collect();
        println!("Groups: {}", names.join(", "));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

pub fn prompt_for_password() -> Result<String, Box<dyn std::error::Error>> {
    print!("Enter new password: ");
    io::stdout().flush()?;
    let password = read_password()?;

    if password.is_empty() {
        return Err("Password cannot be empty".into());
    }

    print!("Confirm new password: ");
    io::stdout().flush()?;
    let confirm_password = read_password()?;

    if password != confirm_password {
        return Err("Passwords do not match".into());
    }

    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{PasswordHash, PasswordVerifier};
    use installdocs_db::orm::group::{add_user_to_group, insert_group};
    use installdocs_db::orm::testing::{create_test_user, setup_test_db};
    use installdocs_db::orm::user::get_user_by_email;

    #[test]
    fn test_hash_password() {
        let password = "test_password_123";
        let hash = hash_password(password).expect("Failed to hash password");

        assert!(hash.starts_with("$argon2"));

        let argon2 = Argon2::default();
        let parsed_hash = PasswordHash::new(&hash).expect("Failed to parse hash");
        assert!(argon2.verify_password(password.as_bytes(), &parsed_hash).is_ok());
    }

    #[test]
    fn test_add_user_impl() {
        let mut conn = setup_test_db();

        let created = add_user_impl(
            &mut conn,
            "tech@example.com",
            "Tech",
            Some("password123".to_string()),
            false,
            true,
            Some("America/Denver".to_string()),
        )
        .expect("Failed to add user");

        let stored = get_user_by_email(&mut conn, "tech@example.com").expect("Failed to get created user");
        assert_eq!(stored.id, created.id);
        assert!(stored.is_manager);
        assert!(stored.is_staff);
        assert!(!stored.is_superuser);
        assert_eq!(stored.preferred_timezone, "America/Denver");

        assert_ne!(stored.password, "password123");
        assert!(stored.password.starts_with("$argon2"));
    }

    #[test]
    fn test_add_user_impl_duplicate_email_ignores_case() {
        let mut conn = setup_test_db();

        add_user_impl(&mut conn, "dup@example.com", "One", Some("pw1".to_string()), false, false, None)
            .expect("Failed to add first user");
        let result = add_user_impl(&mut conn, "DUP@example.com", "Two", Some("pw2".to_string()), false, false, None);

        assert!(result.is_err());
    }

    #[test]
    fn test_change_password_impl() {
        let mut conn = setup_test_db();
        let user = create_test_user(&mut conn, "pw@example.com");

        change_password_impl(&mut conn, "pw@example.com", Some("new_password".to_string()))
            .expect("Failed to change password");

        let stored = get_user_by_email(&mut conn, "pw@example.com").unwrap();
        assert_ne!(stored.password, user.password);
        let parsed_hash = PasswordHash::new(&stored.password).unwrap();
        assert!(Argon2::default().verify_password(b"new_password", &parsed_hash).is_ok());
    }

    #[test]
    fn test_change_password_impl_unknown_user() {
        let mut conn = setup_test_db();
        let result = change_password_impl(&mut conn, "nobody@example.com", Some("pw".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn test_user_edit_impl_recomputes_access_flags() {
        let mut conn = setup_test_db();
        let user = create_test_user(&mut conn, "edit@example.com");

        let promoted = user_edit_impl(
            &mut conn,
            &user.id,
            UserEdit {
                admin: Some(true),
                ..Default::default()
            },
        )
        .unwrap()
        .expect("edit should apply");
        assert!(promoted.is_superuser);
        assert!(promoted.is_staff);

        let demoted = user_edit_impl(
            &mut conn,
            "edit@example.com",
            UserEdit {
                admin: Some(false),
                name: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .unwrap()
        .expect("edit should apply");
        assert!(!demoted.is_superuser);
        assert!(!demoted.is_staff);
        assert_eq!(demoted.user_name, "Renamed");
    }

    #[test]
    fn test_user_edit_impl_without_fields_is_a_no_op() {
        let mut conn = setup_test_db();
        create_test_user(&mut conn, "noop@example.com");

        let result = user_edit_impl(&mut conn, "noop@example.com", UserEdit::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_remove_users_impl_with_yes() {
        let mut conn = setup_test_db();
        create_test_user(&mut conn, "keep@example.com");
        create_test_user(&mut conn, "drop1@test.local");
        create_test_user(&mut conn, "drop2@test.local");

        let removed = remove_users_impl(&mut conn, "@test.local".to_string(), true, true).unwrap();
        assert_eq!(removed, 2);

        let remaining = list_all_users(&mut conn).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].email, "keep@example.com");
    }

    #[test]
    fn test_remove_users_impl_no_match() {
        let mut conn = setup_test_db();
        create_test_user(&mut conn, "keep@example.com");

        let removed = remove_users_impl(&mut conn, "^zzz".to_string(), false, true).unwrap();
        assert_eq!(removed, 0);
    }

    #[test]
    fn test_list_and_show_users() {
        let mut conn = setup_test_db();
        let user = create_test_user(&mut conn, "show@example.com");
        let group = insert_group(&mut conn, "Controls").unwrap();
        add_user_to_group(&mut conn, &user.id, group.id).unwrap();

        assert!(list_users_impl(&mut conn, Some("show".to_string()), true).is_ok());
        assert!(list_users_impl(&mut conn, Some("[".to_string()), false).is_err());
        assert!(show_user_impl(&mut conn, "show@example.com").is_ok());
    }
}
