use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use diesel::{
    Identifiable, Insertable, Queryable, Selectable,
    deserialize::{self, FromSql},
    serialize::{self, Output, ToSql},
    sql_types::Text,
    sqlite::Sqlite,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::DbError;
use crate::schema::alerts;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    TS,
    diesel::expression::AsExpression,
    diesel::deserialize::FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(DbError::validation(
                "severity",
                format!("'{}' is not one of low, medium, high, critical", s),
            )),
        }
    }
}

impl ToSql<Text, Sqlite> for Severity {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(serialize::IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for Severity {
    fn from_sql(
        bytes: <Sqlite as diesel::backend::Backend>::RawValue<'_>,
    ) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        s.parse::<Severity>()
            .map_err(|_| format!("Invalid Severity value: {}", s).into())
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = alerts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Alert {
    pub id: i32,
    pub user_id: Option<String>,
    pub group_id: Option<i32>,
    pub entry_id: Option<i32>,
    pub alert_type: String,
    pub severity: Severity,
    pub message: String,
    pub is_resolved: bool,
    #[ts(type = "string | null")]
    pub resolved_at: Option<NaiveDateTime>,
    #[ts(type = "string")]
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone, Deserialize, Serialize, TS)]
#[diesel(table_name = alerts)]
#[ts(export)]
pub struct NewAlert {
    pub user_id: Option<String>,
    pub group_id: Option<i32>,
    pub entry_id: Option<i32>,
    pub alert_type: String,
    pub severity: Severity,
    pub message: String,
}

/// Alert query. Unset fields do not filter.
#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct AlertFilter {
    pub user_id: Option<String>,
    pub group_id: Option<i32>,
    pub entry_id: Option<i32>,
    pub severity: Option<Severity>,
    pub is_resolved: Option<bool>,
}
