use std::io::{self, Write};

use chrono::{NaiveDate, NaiveDateTime};
use diesel::sqlite::SqliteConnection;
use dotenvy::dotenv;
use installdocs_db::DbConfig;
use installdocs_db::models::{Building, Group, User};
use installdocs_db::orm::{
    building::{get_building, get_building_by_uuid, list_all_buildings},
    establish_connection as open_connection,
    group::{get_group, get_group_by_name},
    user::{get_user, get_user_by_email},
};
use regex::Regex;

/// Opens the database named by `database_url`, or by `DATABASE_URL` when no
/// override is given. Busy timeout and foreign keys are applied either way.
pub fn establish_connection(
    database_url: Option<&str>,
) -> Result<SqliteConnection, Box<dyn std::error::Error>> {
    dotenv().ok();
    let config = match database_url {
        Some(url) => DbConfig::new(url),
        None => DbConfig::from_env()?,
    };
    Ok(open_connection(&config)?)
}

/// Search term matching for `ls`/`rm` style commands: a regex by default, a
/// plain substring with `-F`, or everything when no term is given.
pub enum SearchPattern {
    Any,
    Fixed(String),
    Regex(Regex),
}

impl SearchPattern {
    pub fn new(term: Option<&str>, fixed_string: bool) -> Result<Self, Box<dyn std::error::Error>> {
        match term {
            None => Ok(SearchPattern::Any),
            Some(term) if fixed_string => Ok(SearchPattern::Fixed(term.to_string())),
            Some(term) => {
                let regex = Regex::new(term)
                    .map_err(|e| format!("Invalid regex pattern '{}': {}", term, e))?;
                Ok(SearchPattern::Regex(regex))
            }
        }
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        match self {
            SearchPattern::Any => true,
            SearchPattern::Fixed(term) => haystack.contains(term.as_str()),
            SearchPattern::Regex(regex) => regex.is_match(haystack),
        }
    }
}

/// Asks a yes/no question on stdin. Anything but `y`/`yes` is a no.
pub fn confirm(prompt: &str) -> Result<bool, Box<dyn std::error::Error>> {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

/// Resolve a user identifier: anything containing `@` is looked up as an
/// email (case-insensitive), anything else as a user ID.
pub fn resolve_user(
    conn: &mut SqliteConnection,
    identifier: &str,
) -> Result<User, Box<dyn std::error::Error>> {
    let found = if identifier.contains('@') {
        get_user_by_email(conn, identifier)
    } else {
        get_user(conn, identifier)
    };
    found.map_err(|e| {
        if e.is_not_found() {
            format!("User '{}' does not exist", identifier).into()
        } else {
            e.into()
        }
    })
}

/// Resolve a group by numeric ID or by exact name.
pub fn resolve_group(
    conn: &mut SqliteConnection,
    identifier: &str,
) -> Result<Group, Box<dyn std::error::Error>> {
    let found = match identifier.parse::<i32>() {
        Ok(id) => get_group(conn, id),
        Err(_) => get_group_by_name(conn, identifier),
    };
    found.map_err(|e| {
        if e.is_not_found() {
            format!("Group '{}' does not exist", identifier).into()
        } else {
            e.into()
        }
    })
}

/// Resolve a building identifier. A number is treated as an ID, a UUID as
/// the building UUID, and anything else as a building name. Names are not
/// unique, so a name matching more than one building is an error.
pub fn resolve_building(
    conn: &mut SqliteConnection,
    identifier: &str,
) -> Result<Building, Box<dyn std::error::Error>> {
    if let Ok(id) = identifier.parse::<i32>() {
        return get_building(conn, id)
            .map_err(|_| format!("Building with ID {} does not exist", id).into());
    }
    if let Ok(building) = get_building_by_uuid(conn, identifier) {
        return Ok(building);
    }

    let mut matches: Vec<Building> = list_all_buildings(conn)?
        .into_iter()
        .filter(|b| b.building_name.eq_ignore_ascii_case(identifier))
        .collect();
    match matches.len() {
        0 => Err(format!("Building '{}' does not exist", identifier).into()),
        1 => Ok(matches.remove(0)),
        n => Err(format!(
            "{} buildings are named '{}'; use the ID or UUID instead",
            n, identifier
        )
        .into()),
    }
}

/// Parses `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]` or the `T`-separated form.
/// A bare date means midnight.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for format in FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("'{}' is not a date or timestamp (expected YYYY-MM-DD[ HH:MM[:SS]])", raw))
}

pub fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use installdocs_db::orm::group::insert_group;
    use installdocs_db::orm::testing::{create_test_building, create_test_user, setup_test_db};

    #[test]
    fn test_search_pattern_modes() {
        let any = SearchPattern::new(None, false).unwrap();
        assert!(any.is_match("anything"));

        let fixed = SearchPattern::new(Some("a.b"), true).unwrap();
        assert!(fixed.is_match("xa.by"));
        assert!(!fixed.is_match("axb"));

        let regex = SearchPattern::new(Some("^a.b$"), false).unwrap();
        assert!(regex.is_match("axb"));
        assert!(!regex.is_match("xaxb"));

        assert!(SearchPattern::new(Some("("), false).is_err());
    }

    #[test]
    fn test_resolve_user_by_email_or_id() {
        let mut conn = setup_test_db();
        let user = create_test_user(&mut conn, "resolve@example.com");

        assert_eq!(resolve_user(&mut conn, "RESOLVE@example.com").unwrap().id, user.id);
        assert_eq!(resolve_user(&mut conn, &user.id).unwrap().email, user.email);

        let err = resolve_user(&mut conn, "ghost@example.com").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_group_by_id_or_name() {
        let mut conn = setup_test_db();
        let group = insert_group(&mut conn, "Electricians").unwrap();

        assert_eq!(resolve_group(&mut conn, "Electricians").unwrap().id, group.id);
        assert_eq!(resolve_group(&mut conn, &group.id.to_string()).unwrap().group_name, "Electricians");
        assert!(resolve_group(&mut conn, "Plumbers").is_err());
    }

    #[test]
    fn test_resolve_building_forms() {
        let mut conn = setup_test_db();
        let library = create_test_building(&mut conn, "Library");

        assert_eq!(resolve_building(&mut conn, &library.id.to_string()).unwrap().id, library.id);
        assert_eq!(resolve_building(&mut conn, &library.building_uuid).unwrap().id, library.id);
        assert_eq!(resolve_building(&mut conn, "library").unwrap().id, library.id);
        assert!(resolve_building(&mut conn, "9999").is_err());

        create_test_building(&mut conn, "Library");
        let err = resolve_building(&mut conn, "Library").unwrap_err();
        assert!(err.to_string().contains("use the ID or UUID"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let midnight = parse_timestamp("2025-03-04").unwrap();
        assert_eq!(midnight.to_string(), "2025-03-04 00:00:00");

        let full = parse_timestamp("2025-03-04 13:05:09").unwrap();
        assert_eq!(full.to_string(), "2025-03-04 13:05:09");

        let t_form = parse_timestamp("2025-03-04T13:05").unwrap();
        assert_eq!(t_form.to_string(), "2025-03-04 13:05:00");

        assert!(parse_timestamp("04/03/2025").is_err());
    }
}
