use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, mysql::MySqlRow};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::parse_column;

pub const DEFAULT_DEVICE_PORT: u16 = 4370;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    Offline,
    Connecting,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BiometricDevice {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Main gate")]
    pub name: String,
    #[schema(example = "192.168.1.201")]
    pub ip_address: String,
    #[schema(example = 4370)]
    pub port: u16,
    #[schema(example = "CKJ1234567")]
    pub serial_number: String,
    pub status: DeviceStatus,
    #[schema(example = "2026-01-01T08:00:00Z", format = "date-time", value_type = String, nullable = true)]
    pub last_sync: Option<DateTime<Utc>>,
}

impl<'r> FromRow<'r, MySqlRow> for BiometricDevice {
    fn from_row(row: &'r MySqlRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            ip_address: row.try_get("ip_address")?,
            port: row.try_get("port")?,
            serial_number: row.try_get("serial_number")?,
            status: parse_column("status", &status)?,
            last_sync: row.try_get("last_sync")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewDevice {
    #[schema(example = "Main gate")]
    pub name: String,
    #[schema(example = "192.168.1.201")]
    pub ip_address: String,
    #[serde(default = "default_port")]
    #[schema(example = 4370)]
    pub port: u16,
    #[schema(example = "CKJ1234567")]
    pub serial_number: String,
}

fn default_port() -> u16 {
    DEFAULT_DEVICE_PORT
}

impl NewDevice {
    /// Returns the first missing required field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            Some("name")
        } else if self.ip_address.trim().is_empty() {
            Some("ip_address")
        } else if self.serial_number.trim().is_empty() {
            Some("serial_number")
        } else {
            None
        }
    }
}
