use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, mysql::MySqlRow};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::parse_column;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    OnLeave,
    Terminated,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Ali Hassan",
        "department": "Operations",
        "position": "Technician",
        "fingerprint_id": "17",
        "status": "active",
        "created_at": "2026-01-01T08:00:00Z"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Ali Hassan")]
    pub name: String,

    #[schema(example = "Operations")]
    pub department: String,

    #[schema(example = "Technician")]
    pub position: String,

    /// Identifier the biometric device knows this person by.
    #[schema(example = "17")]
    pub fingerprint_id: String,

    pub status: EmployeeStatus,

    #[schema(example = "2026-01-01T08:00:00Z", format = "date-time", value_type = String, nullable = true)]
    pub created_at: Option<DateTime<Utc>>,
}

impl<'r> FromRow<'r, MySqlRow> for Employee {
    fn from_row(row: &'r MySqlRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            department: row.try_get("department")?,
            position: row.try_get("position")?,
            fingerprint_id: row.try_get("fingerprint_id")?,
            status: parse_column("status", &status)?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Employee row that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct NewEmployee {
    #[schema(example = "Ali Hassan")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "Operations")]
    pub department: String,
    #[serde(default)]
    #[schema(example = "Technician")]
    pub position: String,
    #[schema(example = "17")]
    pub fingerprint_id: String,
    #[serde(default = "default_status")]
    pub status: EmployeeStatus,
}

fn default_status() -> EmployeeStatus {
    EmployeeStatus::Active
}
