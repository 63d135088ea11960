//! In-process store used by the unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::{AttendanceStore, StoreError};
use crate::model::{
    attendance::{AttendanceFilter, AttendanceKey, AttendanceRecord, NewAttendance},
    device::{BiometricDevice, DeviceStatus, NewDevice},
    employee::{Employee, NewEmployee},
    user::User,
};

#[derive(Default)]
struct Tables {
    employees: Vec<Employee>,
    attendance: Vec<AttendanceRecord>,
    devices: Vec<BiometricDevice>,
    users: Vec<User>,
    next_id: u64,
    employee_inserts: usize,
    attendance_inserts: usize,
    rejected_status: Option<DeviceStatus>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut tables = self.tables.lock().expect("memory store poisoned");
        f(&mut tables)
    }

    pub fn seed_employee(&self, name: &str, fingerprint_id: &str) -> u64 {
        self.with(|t| {
            let id = t.next_id();
            t.employees.push(Employee {
                id,
                name: name.to_string(),
                department: String::new(),
                position: String::new(),
                fingerprint_id: fingerprint_id.to_string(),
                status: crate::model::employee::EmployeeStatus::Active,
                created_at: Some(Utc::now()),
            });
            id
        })
    }

    pub fn seed_device(&self, name: &str, status: DeviceStatus) -> u64 {
        self.with(|t| {
            let id = t.next_id();
            t.devices.push(BiometricDevice {
                id,
                name: name.to_string(),
                ip_address: "192.168.1.201".to_string(),
                port: 4370,
                serial_number: format!("SN-{id}"),
                status,
                last_sync: None,
            });
            id
        })
    }

    pub fn seed_user(&self, username: &str, password_hash: &str, role_id: u8) -> u64 {
        self.with(|t| {
            let id = t.next_id();
            t.users.push(User {
                id,
                username: username.to_string(),
                password: password_hash.to_string(),
                role_id,
                is_active: true,
            });
            id
        })
    }

    pub fn employees(&self) -> Vec<Employee> {
        self.with(|t| t.employees.clone())
    }

    pub fn attendance(&self) -> Vec<AttendanceRecord> {
        self.with(|t| t.attendance.clone())
    }

    pub fn device(&self, id: u64) -> Option<BiometricDevice> {
        self.with(|t| t.devices.iter().find(|d| d.id == id).cloned())
    }

    /// Makes every later write of `status` to a device fail.
    pub fn reject_status_writes(&self, status: DeviceStatus) {
        self.with(|t| t.rejected_status = Some(status));
    }

    /// Number of batch writes issued against each table.
    pub fn insert_calls(&self) -> (usize, usize) {
        self.with(|t| (t.employee_inserts, t.attendance_inserts))
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn list_employees(&self, search: Option<&str>) -> Result<Vec<Employee>, StoreError> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        Ok(self.with(|t| {
            let mut rows: Vec<Employee> = t
                .employees
                .iter()
                .filter(|e| match search {
                    Some(term) => e.name.contains(term) || e.fingerprint_id.contains(term),
                    None => true,
                })
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.id.cmp(&a.id));
            rows
        }))
    }

    async fn count_employees(&self) -> Result<i64, StoreError> {
        Ok(self.with(|t| t.employees.len() as i64))
    }

    async fn employees_by_fingerprint(
        &self,
        fingerprint_ids: &[String],
    ) -> Result<Vec<Employee>, StoreError> {
        Ok(self.with(|t| {
            t.employees
                .iter()
                .filter(|e| fingerprint_ids.contains(&e.fingerprint_id))
                .cloned()
                .collect()
        }))
    }

    async fn insert_employees(&self, batch: &[NewEmployee]) -> Result<u64, StoreError> {
        Ok(self.with(|t| {
            t.employee_inserts += 1;
            for e in batch {
                let id = t.next_id();
                t.employees.push(Employee {
                    id,
                    name: e.name.clone(),
                    department: e.department.clone(),
                    position: e.position.clone(),
                    fingerprint_id: e.fingerprint_id.clone(),
                    status: e.status,
                    created_at: Some(Utc::now()),
                });
            }
            batch.len() as u64
        }))
    }

    async fn delete_employees(&self, ids: &[u64]) -> Result<u64, StoreError> {
        Ok(self.with(|t| {
            let before = t.employees.len();
            t.employees.retain(|e| !ids.contains(&e.id));
            (before - t.employees.len()) as u64
        }))
    }

    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self.with(|t| {
            let mut rows: Vec<AttendanceRecord> = t
                .attendance
                .iter()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect();
            rows.sort_by(|a, b| (b.date, &b.check_in).cmp(&(a.date, &a.check_in)));
            rows
        }))
    }

    async fn existing_attendance_keys(
        &self,
        employee_ids: &[u64],
        dates: &[NaiveDate],
    ) -> Result<HashSet<AttendanceKey>, StoreError> {
        Ok(self.with(|t| {
            t.attendance
                .iter()
                .filter(|r| employee_ids.contains(&r.employee_id) && dates.contains(&r.date))
                .map(AttendanceRecord::key)
                .collect()
        }))
    }

    async fn insert_attendance_ignoring_conflicts(
        &self,
        batch: &[NewAttendance],
    ) -> Result<u64, StoreError> {
        Ok(self.with(|t| {
            t.attendance_inserts += 1;
            let mut written = 0;
            for row in batch {
                let key = row.key();
                if t.attendance.iter().any(|r| r.key() == key) {
                    continue;
                }
                let id = t.next_id();
                t.attendance.push(AttendanceRecord {
                    id,
                    employee_id: row.employee_id,
                    employee_name: row.employee_name.clone(),
                    date: row.date,
                    check_in: row.check_in.clone(),
                    check_out: None,
                    status: row.status,
                });
                written += 1;
            }
            written
        }))
    }

    async fn delete_attendance(&self, ids: &[u64]) -> Result<u64, StoreError> {
        Ok(self.with(|t| {
            let before = t.attendance.len();
            t.attendance.retain(|r| !ids.contains(&r.id));
            (before - t.attendance.len()) as u64
        }))
    }

    async fn list_devices(&self) -> Result<Vec<BiometricDevice>, StoreError> {
        Ok(self.with(|t| t.devices.clone()))
    }

    async fn get_device(&self, id: u64) -> Result<Option<BiometricDevice>, StoreError> {
        Ok(self.device(id))
    }

    async fn insert_device(&self, device: &NewDevice) -> Result<u64, StoreError> {
        Ok(self.with(|t| {
            let id = t.next_id();
            t.devices.push(BiometricDevice {
                id,
                name: device.name.clone(),
                ip_address: device.ip_address.clone(),
                port: device.port,
                serial_number: device.serial_number.clone(),
                status: DeviceStatus::Offline,
                last_sync: None,
            });
            id
        }))
    }

    async fn delete_device(&self, id: u64) -> Result<u64, StoreError> {
        Ok(self.with(|t| {
            let before = t.devices.len();
            t.devices.retain(|d| d.id != id);
            (before - t.devices.len()) as u64
        }))
    }

    async fn set_device_status(&self, id: u64, status: DeviceStatus) -> Result<(), StoreError> {
        self.with(|t| {
            if t.rejected_status == Some(status) {
                return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
            }
            if let Some(d) = t.devices.iter_mut().find(|d| d.id == id) {
                d.status = status;
            }
            Ok(())
        })
    }

    async fn set_device_last_sync(&self, id: u64, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.with(|t| {
            if let Some(d) = t.devices.iter_mut().find(|d| d.id == id) {
                d.last_sync = Some(at);
            }
        });
        Ok(())
    }

    async fn count_devices_with_status(&self, status: DeviceStatus) -> Result<i64, StoreError> {
        Ok(self.with(|t| t.devices.iter().filter(|d| d.status == status).count() as i64))
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.with(|t| t.users.iter().find(|u| u.username == username).cloned()))
    }

    async fn touch_user_login(&self, _user_id: u64) -> Result<(), StoreError> {
        Ok(())
    }
}
