use chrono::NaiveDate;
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
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    HalfDay,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 12)]
    pub employee_id: u64,
    /// Copy of the employee's name when the row was written. Not refreshed
    /// on rename.
    #[schema(example = "Ali Hassan")]
    pub employee_name: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "08:05")]
    pub check_in: String,
    #[schema(example = "16:30", nullable = true)]
    pub check_out: Option<String>,
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    pub fn key(&self) -> AttendanceKey {
        AttendanceKey {
            employee_id: self.employee_id,
            date: self.date,
            check_in: self.check_in.clone(),
        }
    }
}

impl<'r> FromRow<'r, MySqlRow> for AttendanceRecord {
    fn from_row(row: &'r MySqlRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        Ok(Self {
            id: row.try_get("id")?,
            employee_id: row.try_get("employee_id")?,
            employee_name: row.try_get("employee_name")?,
            date: row.try_get("date")?,
            check_in: row.try_get("check_in")?,
            check_out: row.try_get("check_out")?,
            status: parse_column("status", &status)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub employee_name: String,
    pub date: NaiveDate,
    pub check_in: String,
    pub status: AttendanceStatus,
}

impl NewAttendance {
    pub fn key(&self) -> AttendanceKey {
        AttendanceKey {
            employee_id: self.employee_id,
            date: self.date,
            check_in: self.check_in.clone(),
        }
    }
}

/// Two punches with the same key are the same attendance row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttendanceKey {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub check_in: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AttendanceFilter {
    #[schema(example = "2026-01-01", format = "date", value_type = String, nullable = true)]
    pub date: Option<NaiveDate>,
    #[schema(example = 12, nullable = true)]
    pub employee_id: Option<u64>,
    #[schema(example = "2026-01-01", format = "date", value_type = String, nullable = true)]
    pub from: Option<NaiveDate>,
    #[schema(example = "2026-01-31", format = "date", value_type = String, nullable = true)]
    pub to: Option<NaiveDate>,
}

impl AttendanceFilter {
    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        self.date.is_none_or(|d| record.date == d)
            && self.employee_id.is_none_or(|id| record.employee_id == id)
            && self.from.is_none_or(|d| record.date >= d)
            && self.to.is_none_or(|d| record.date <= d)
    }
}
