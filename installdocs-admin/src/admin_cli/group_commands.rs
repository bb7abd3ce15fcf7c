use clap::Subcommand;
use diesel::sqlite::SqliteConnection;
use installdocs_db::models::{Group, UserGroup};
use installdocs_db::orm::group::{
    add_user_to_group, delete_group, get_group_members, insert_group, list_all_groups,
    remove_user_from_group, rename_group,
};

use super::utils::{SearchPattern, confirm, resolve_group, resolve_user};

#[derive(Subcommand)]
pub enum GroupAction {
    #[command(about = "Add a new group")]
    Add {
        #[arg(help = "Group name")]
        name: String,
    },
    #[command(about = "List groups with member counts, optionally filtered by search term")]
    Ls {
        #[arg(help = "Search term (regex by default, use -F for fixed string)")]
        search_term: Option<String>,
        #[arg(short = 'F', long = "fixed-string", help = "Treat search term as fixed string instead of regex")]
        fixed_string: bool,
        #[arg(short = 'm', long = "members", help = "Also list each group's members")]
        members: bool,
    },
    #[command(about = "Rename a group")]
    Rename {
        #[arg(help = "Group ID or name")]
        group: String,
        #[arg(help = "New group name")]
        new_name: String,
    },
    #[command(about = "Remove a group (memberships go with it)")]
    Rm {
        #[arg(help = "Group ID or name")]
        group: String,
        #[arg(short = 'y', long = "yes", help = "Skip confirmation prompt")]
        yes: bool,
    },
    #[command(about = "Add a user to a group")]
    AddMember {
        #[arg(help = "Group ID or name")]
        group: String,
        #[arg(help = "User email or ID")]
        user: String,
    },
    #[command(about = "Remove a user from a group")]
    RmMember {
        #[arg(help = "Group ID or name")]
        group: String,
        #[arg(help = "User email or ID")]
        user: String,
    },
}

pub fn handle_group_command_with_conn(
    conn: &mut SqliteConnection,
    action: GroupAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        GroupAction::Add { name } => {
            add_group_impl(conn, &name)?;
        }
        GroupAction::Ls {
            search_term,
            fixed_string,
            members,
        } => {
            list_groups_impl(conn, search_term, fixed_string, members)?;
        }
        GroupAction::Rename { group, new_name } => {
            rename_group_impl(conn, &group, &new_name)?;
        }
        GroupAction::Rm { group, yes } => {
            remove_group_impl(conn, &group, yes)?;
        }
        GroupAction::AddMember { group, user } => {
            add_member_impl(conn, &group, &user)?;
        }
        GroupAction::RmMember { group, user } => {
            remove_member_impl(conn, &group, &user)?;
        }
    }
    Ok(())
}

pub fn add_group_impl(conn: &mut SqliteConnection, name: &str) -> Result<Group, Box<dyn std::error::Error>> {
    let group = insert_group(conn, name)?;
    println!("Group created successfully!");
    println!("ID: {}", group.id);
    println!("Name: {}", group.group_name);
    Ok(group)
}

pub fn list_groups_impl(
    conn: &mut SqliteConnection,
    search_term: Option<String>,
    fixed_string: bool,
    members: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let pattern = SearchPattern::new(search_term.as_deref(), fixed_string)?;
    let groups: Vec<Group> = list_all_groups(conn)?
        .into_iter()
        .filter(|g| pattern.is_match(&g.group_name))
        .collect();

    if groups.is_empty() {
        println!("No groups found.");
        return Ok(());
    }

    println!("Groups:");
    for group in groups {
        let group_members = get_group_members(conn, group.id)?;
        println!(
            "  ID: {}, Name: {}, Members: {}",
            group.id,
            group.group_name,
            group_members.len()
        );
        if members {
            for member in group_members {
                println!("    {} ({})", member.email, member.user_name);
            }
        }
    }
    Ok(())
}

pub fn rename_group_impl(
    conn: &mut SqliteConnection,
    group: &str,
    new_name: &str,
) -> Result<Group, Box<dyn std::error::Error>> {
    let target = resolve_group(conn, group)?;
    let renamed = rename_group(conn, target.id, new_name)?;
    println!("Renamed group '{}' to '{}'", target.group_name, renamed.group_name);
    Ok(renamed)
}

pub fn remove_group_impl(
    conn: &mut SqliteConnection,
    group: &str,
    yes: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let target = resolve_group(conn, group)?;
    let member_count = get_group_members(conn, target.id)?.len();

    if !yes {
        let question = format!(
            "Delete group '{}' and its {} membership(s)?",
            target.group_name, member_count
        );
        if !confirm(&question)? {
            println!("Operation cancelled.");
            return Ok(false);
        }
    }

    delete_group(conn, target.id)?;
    println!("Deleted group: {} (ID: {})", target.group_name, target.id);
    Ok(true)
}

pub fn add_member_impl(
    conn: &mut SqliteConnection,
    group: &str,
    user: &str,
) -> Result<UserGroup, Box<dyn std::error::Error>> {
    let target_group = resolve_group(conn, group)?;
    let target_user = resolve_user(conn, user)?;

    let membership = add_user_to_group(conn, &target_user.id, target_group.id).map_err(|e| {
        if e.is_constraint_violation() {
            format!(
                "User '{}' is already a member of '{}'",
                target_user.email, target_group.group_name
            )
            .into()
        } else {
            Box::<dyn std::error::Error>::from(e)
        }
    })?;

    println!("Added {} to group '{}'", target_user.email, target_group.group_name);
    Ok(membership)
}

pub fn remove_member_impl(
    conn: &mut SqliteConnection,
    group: &str,
    user: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let target_group = resolve_group(conn, group)?;
    let target_user = resolve_user(conn, user)?;

    remove_user_from_group(conn, &target_user.id, target_group.id).map_err(|e| {
        if e.is_not_found() {
            format!(
                "User '{}' is not a member of '{}'",
                target_user.email, target_group.group_name
            )
            .into()
        } else {
            Box::<dyn std::error::Error>::from(e)
        }
    })?;

    println!("Removed {} from group '{}'", target_user.email, target_group.group_name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use installdocs_db::orm::group::get_user_groups;
    use installdocs_db::orm::testing::{create_test_user, setup_test_db};

    #[test]
    fn test_add_and_list_groups() {
        let mut conn = setup_test_db();
        add_group_impl(&mut conn, "HVAC").unwrap();
        add_group_impl(&mut conn, "Electrical").unwrap();

        assert!(add_group_impl(&mut conn, "HVAC").is_err(), "group names are unique");
        assert!(list_groups_impl(&mut conn, Some("^H".to_string()), false, true).is_ok());
        assert_eq!(list_all_groups(&mut conn).unwrap().len(), 2);
    }

    #[test]
    fn test_membership_round_trip() {
        let mut conn = setup_test_db();
        let user = create_test_user(&mut conn, "member@example.com");
        let group = add_group_impl(&mut conn, "Night crew").unwrap();

        add_member_impl(&mut conn, "Night crew", "member@example.com").unwrap();
        let err = add_member_impl(&mut conn, &group.id.to_string(), &user.id).unwrap_err();
        assert!(err.to_string().contains("already a member"));

        assert_eq!(get_user_groups(&mut conn, &user.id).unwrap().len(), 1);

        remove_member_impl(&mut conn, "Night crew", "member@example.com").unwrap();
        assert!(get_user_groups(&mut conn, &user.id).unwrap().is_empty());

        let err = remove_member_impl(&mut conn, "Night crew", "member@example.com").unwrap_err();
        assert!(err.to_string().contains("not a member"));
    }

    #[test]
    fn test_remove_group_keeps_users() {
        let mut conn = setup_test_db();
        let user = create_test_user(&mut conn, "stay@example.com");
        add_group_impl(&mut conn, "Temporary").unwrap();
        add_member_impl(&mut conn, "Temporary", "stay@example.com").unwrap();

        assert!(remove_group_impl(&mut conn, "Temporary", true).unwrap());
        assert!(list_all_groups(&mut conn).unwrap().is_empty());
        assert!(get_user_groups(&mut conn, &user.id).unwrap().is_empty());
        assert!(resolve_user(&mut conn, "stay@example.com").is_ok());
    }

    #[test]
    fn test_rename_group_impl() {
        let mut conn = setup_test_db();
        add_group_impl(&mut conn, "Old").unwrap();

        let renamed = rename_group_impl(&mut conn, "Old", "New").unwrap();
        assert_eq!(renamed.group_name, "New");
        assert!(resolve_group(&mut conn, "Old").is_err());
    }
}
