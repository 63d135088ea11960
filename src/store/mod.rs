//! Persistence seam for employees, attendance logs, devices and login
//! accounts.
//!
//! Handlers and the sync flows only see [`AttendanceStore`]; the MySQL
//! implementation lives in [`mysql`].

pub mod mysql;

#[cfg(test)]
pub mod memory;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::model::{
    attendance::{AttendanceFilter, AttendanceKey, AttendanceRecord, NewAttendance},
    device::{BiometricDevice, DeviceStatus, NewDevice},
    employee::{Employee, NewEmployee},
    user::User,
};

pub use mysql::MySqlStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Newest first. `search` matches the name or the fingerprint id.
    async fn list_employees(&self, search: Option<&str>) -> Result<Vec<Employee>, StoreError>;

    async fn count_employees(&self) -> Result<i64, StoreError>;

    async fn employees_by_fingerprint(
        &self,
        fingerprint_ids: &[String],
    ) -> Result<Vec<Employee>, StoreError>;

    /// Writes the whole batch in one statement; returns the rows written.
    async fn insert_employees(&self, batch: &[NewEmployee]) -> Result<u64, StoreError>;

    async fn delete_employees(&self, ids: &[u64]) -> Result<u64, StoreError>;

    /// Ordered by date then check-in, both descending.
    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    async fn existing_attendance_keys(
        &self,
        employee_ids: &[u64],
        dates: &[NaiveDate],
    ) -> Result<HashSet<AttendanceKey>, StoreError>;

    /// Rows colliding on (employee_id, date, check_in) at write time are
    /// dropped silently; returns the rows actually written.
    async fn insert_attendance_ignoring_conflicts(
        &self,
        batch: &[NewAttendance],
    ) -> Result<u64, StoreError>;

    async fn delete_attendance(&self, ids: &[u64]) -> Result<u64, StoreError>;

    async fn list_devices(&self) -> Result<Vec<BiometricDevice>, StoreError>;

    async fn get_device(&self, id: u64) -> Result<Option<BiometricDevice>, StoreError>;

    async fn insert_device(&self, device: &NewDevice) -> Result<u64, StoreError>;

    async fn delete_device(&self, id: u64) -> Result<u64, StoreError>;

    async fn set_device_status(&self, id: u64, status: DeviceStatus) -> Result<(), StoreError>;

    async fn set_device_last_sync(&self, id: u64, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn count_devices_with_status(&self, status: DeviceStatus) -> Result<i64, StoreError>;

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn touch_user_login(&self, user_id: u64) -> Result<(), StoreError>;
}

impl actix_web::ResponseError for StoreError {
    fn error_response(&self) -> actix_web::HttpResponse {
        tracing::error!(error = %self, "Store operation failed");
        actix_web::HttpResponse::InternalServerError().json(serde_json::json!({
            "message": self.to_string()
        }))
    }
}
