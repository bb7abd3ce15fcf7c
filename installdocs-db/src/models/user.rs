use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use diesel::{
    AsChangeset, Identifiable, Insertable, Queryable, Selectable,
    deserialize::{self, FromSql},
    serialize::{self, Output, ToSql},
    sql_types::Text,
    sqlite::Sqlite,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::DbError;
use crate::models::JsonDocument;
use crate::schema::users;

/// Light or dark UI theme, chosen separately for desktop and mobile.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    TS,
    diesel::expression::AsExpression,
    diesel::deserialize::FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(DbError::validation("theme", format!("'{}' is not light or dark", s))),
        }
    }
}

impl ToSql<Text, Sqlite> for Theme {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(serialize::IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for Theme {
    fn from_sql(
        bytes: <Sqlite as diesel::backend::Backend>::RawValue<'_>,
    ) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        match s.as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("Invalid Theme value: {}", s).into()),
        }
    }
}

/// Preferred layout for the web client.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    TS,
    diesel::expression::AsExpression,
    diesel::deserialize::FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Desktop,
    Mobile,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Desktop => "desktop",
            DisplayMode::Mobile => "mobile",
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desktop" => Ok(DisplayMode::Desktop),
            "mobile" => Ok(DisplayMode::Mobile),
            _ => Err(DbError::validation(
                "display_mode",
                format!("'{}' is not desktop or mobile", s),
            )),
        }
    }
}

impl ToSql<Text, Sqlite> for DisplayMode {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(serialize::IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for DisplayMode {
    fn from_sql(
        bytes: <Sqlite as diesel::backend::Backend>::RawValue<'_>,
    ) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        match s.as_str() {
            "desktop" => Ok(DisplayMode::Desktop),
            "mobile" => Ok(DisplayMode::Mobile),
            _ => Err(format!("Invalid DisplayMode value: {}", s).into()),
        }
    }
}

/// Framework-level access flags. These are never taken from callers; they
/// follow from the domain role flags on every save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessFlags {
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl AccessFlags {
    pub fn derive(is_admin: bool, is_manager: bool) -> Self {
        AccessFlags {
            is_staff: is_manager || is_admin,
            is_superuser: is_admin,
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String, // Unique, case-insensitive
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub password: String,
    pub user_name: String,
    pub user_alias: Option<String>,
    pub preferred_color: Option<String>,
    pub preferred_landing_page: Option<String>,
    pub preferred_profile_picture: Option<String>,
    pub mobile_theme: Theme,
    pub desktop_theme: Theme,
    pub preferred_timezone: String,
    pub display_mode: Option<DisplayMode>,
    #[ts(type = "unknown | null")]
    pub alert_preferences: Option<JsonDocument>,
    #[ts(type = "unknown | null")]
    pub notification_preferences: Option<JsonDocument>,
    pub is_admin: bool,
    pub is_manager: bool,
    pub is_active: bool,
    pub email_verified: bool,
    pub agreed_to_terms: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub auth_provider: Option<String>,
    pub external_id: Option<String>,
    #[ts(type = "string")]
    pub date_joined: NaiveDateTime,
    #[ts(type = "string | null")]
    pub last_login: Option<NaiveDateTime>,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
    #[ts(type = "string")]
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn access_flags(&self) -> AccessFlags {
        AccessFlags {
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
        }
    }
}

/// Row written by `orm::user::insert_user`. Built only from a [`UserInput`]
/// so the access flags cannot be supplied directly.
#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub password: String,
    pub user_name: String,
    pub user_alias: Option<String>,
    pub preferred_color: Option<String>,
    pub preferred_landing_page: Option<String>,
    pub preferred_profile_picture: Option<String>,
    pub mobile_theme: Option<Theme>, // None uses the column default
    pub desktop_theme: Option<Theme>,
    pub preferred_timezone: Option<String>,
    pub display_mode: Option<DisplayMode>,
    pub alert_preferences: Option<JsonDocument>,
    pub notification_preferences: Option<JsonDocument>,
    pub is_admin: bool,
    pub is_manager: bool,
    pub is_active: bool,
    pub email_verified: bool,
    pub agreed_to_terms: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub auth_provider: Option<String>,
    pub external_id: Option<String>,
}

impl NewUser {
    pub(crate) fn from_input(id: String, input: UserInput) -> Self {
        let flags = AccessFlags::derive(input.is_admin, input.is_manager);
        NewUser {
            id,
            email: input.email,
            password: input.password,
            user_name: input.user_name,
            user_alias: input.user_alias,
            preferred_color: input.preferred_color,
            preferred_landing_page: input.preferred_landing_page,
            preferred_profile_picture: input.preferred_profile_picture,
            mobile_theme: input.mobile_theme,
            desktop_theme: input.desktop_theme,
            preferred_timezone: input.preferred_timezone,
            display_mode: input.display_mode,
            alert_preferences: input.alert_preferences,
            notification_preferences: input.notification_preferences,
            is_admin: input.is_admin,
            is_manager: input.is_manager,
            is_active: input.is_active,
            email_verified: input.email_verified,
            agreed_to_terms: input.agreed_to_terms,
            is_staff: flags.is_staff,
            is_superuser: flags.is_superuser,
            auth_provider: input.auth_provider,
            external_id: input.external_id,
        }
    }
}

// For inputs and validation
#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UserInput {
    pub email: String,
    /// Already-hashed password
    pub password: String,
    pub user_name: String,
    pub user_alias: Option<String>,
    pub preferred_color: Option<String>,
    pub preferred_landing_page: Option<String>,
    pub preferred_profile_picture: Option<String>,
    pub mobile_theme: Option<Theme>,
    pub desktop_theme: Option<Theme>,
    pub preferred_timezone: Option<String>,
    pub display_mode: Option<DisplayMode>,
    #[ts(type = "unknown | null")]
    pub alert_preferences: Option<JsonDocument>,
    #[ts(type = "unknown | null")]
    pub notification_preferences: Option<JsonDocument>,
    pub is_admin: bool,
    pub is_manager: bool,
    pub is_active: bool,
    pub email_verified: bool,
    pub agreed_to_terms: bool,
    pub auth_provider: Option<String>,
    pub external_id: Option<String>,
}

impl UserInput {
    /// An active user with no roles and default preferences.
    pub fn new(email: impl Into<String>, password: impl Into<String>, user_name: impl Into<String>) -> Self {
        UserInput {
            email: email.into(),
            password: password.into(),
            user_name: user_name.into(),
            user_alias: None,
            preferred_color: None,
            preferred_landing_page: None,
            preferred_profile_picture: None,
            mobile_theme: None,
            desktop_theme: None,
            preferred_timezone: None,
            display_mode: None,
            alert_preferences: None,
            notification_preferences: None,
            is_admin: false,
            is_manager: false,
            is_active: true,
            email_verified: false,
            agreed_to_terms: false,
            auth_provider: None,
            external_id: None,
        }
    }
}

/// Requested changes to a user. `None` leaves a field as stored; for nullable
/// columns `Some(None)` clears the value.
#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UserChanges {
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub user_alias: Option<Option<String>>,
    pub preferred_color: Option<Option<String>>,
    pub preferred_landing_page: Option<Option<String>>,
    pub preferred_profile_picture: Option<Option<String>>,
    pub mobile_theme: Option<Theme>,
    pub desktop_theme: Option<Theme>,
    pub preferred_timezone: Option<String>,
    pub display_mode: Option<Option<DisplayMode>>,
    #[ts(type = "unknown | null")]
    pub alert_preferences: Option<Option<JsonDocument>>,
    #[ts(type = "unknown | null")]
    pub notification_preferences: Option<Option<JsonDocument>>,
    pub is_admin: Option<bool>,
    pub is_manager: Option<bool>,
    pub is_active: Option<bool>,
    pub email_verified: Option<bool>,
    pub agreed_to_terms: Option<bool>,
    pub auth_provider: Option<Option<String>>,
    pub external_id: Option<Option<String>>,
}

/// Full set of mutable columns, written after `UserChanges` has been merged
/// over the stored row and the access flags recomputed.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserUpdate {
    pub email: String,
    pub user_name: String,
    pub user_alias: Option<String>,
    pub preferred_color: Option<String>,
    pub preferred_landing_page: Option<String>,
    pub preferred_profile_picture: Option<String>,
    pub mobile_theme: Theme,
    pub desktop_theme: Theme,
    pub preferred_timezone: String,
    pub display_mode: Option<DisplayMode>,
    pub alert_preferences: Option<JsonDocument>,
    pub notification_preferences: Option<JsonDocument>,
    pub is_admin: bool,
    pub is_manager: bool,
    pub is_active: bool,
    pub email_verified: bool,
    pub agreed_to_terms: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub auth_provider: Option<String>,
    pub external_id: Option<String>,
}

impl UserUpdate {
    pub(crate) fn merge(current: User, changes: UserChanges) -> Self {
        let is_admin = changes.is_admin.unwrap_or(current.is_admin);
        let is_manager = changes.is_manager.unwrap_or(current.is_manager);
        let flags = AccessFlags::derive(is_admin, is_manager);

        UserUpdate {
            email: changes.email.unwrap_or(current.email),
            user_name: changes.user_name.unwrap_or(current.user_name),
            user_alias: changes.user_alias.unwrap_or(current.user_alias),
            preferred_color: changes.preferred_color.unwrap_or(current.preferred_color),
            preferred_landing_page: changes
                .preferred_landing_page
                .unwrap_or(current.preferred_landing_page),
            preferred_profile_picture: changes
                .preferred_profile_picture
                .unwrap_or(current.preferred_profile_picture),
            mobile_theme: changes.mobile_theme.unwrap_or(current.mobile_theme),
            desktop_theme: changes.desktop_theme.unwrap_or(current.desktop_theme),
            preferred_timezone: changes.preferred_timezone.unwrap_or(current.preferred_timezone),
            display_mode: changes.display_mode.unwrap_or(current.display_mode),
            alert_preferences: changes.alert_preferences.unwrap_or(current.alert_preferences),
            notification_preferences: changes
                .notification_preferences
                .unwrap_or(current.notification_preferences),
            is_admin,
            is_manager,
            is_active: changes.is_active.unwrap_or(current.is_active),
            email_verified: changes.email_verified.unwrap_or(current.email_verified),
            agreed_to_terms: changes.agreed_to_terms.unwrap_or(current.agreed_to_terms),
            is_staff: flags.is_staff,
            is_superuser: flags.is_superuser,
            auth_provider: changes.auth_provider.unwrap_or(current.auth_provider),
            external_id: changes.external_id.unwrap_or(current.external_id),
        }
    }
}
