use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};
use tracing::debug;

use super::{AttendanceStore, StoreError};
use crate::model::{
    attendance::{AttendanceFilter, AttendanceKey, AttendanceRecord, NewAttendance},
    device::{BiometricDevice, DeviceStatus, NewDevice},
    employee::{Employee, NewEmployee},
    user::User,
};

const EMPLOYEE_COLUMNS: &str =
    "id, name, department, position, fingerprint_id, status, created_at";
const ATTENDANCE_COLUMNS: &str =
    "id, employee_id, employee_name, date, check_in, check_out, status";
const DEVICE_COLUMNS: &str = "id, name, ip_address, port, serial_number, status, last_sync";

/// MySQL refuses prepared statements with more placeholders than this.
const BIND_LIMIT: usize = 65_535;
const EMPLOYEE_BINDS: usize = 5;
const ATTENDANCE_BINDS: usize = 5;

/// Largest slice of `binds_per_row`-sized rows one statement can carry,
/// leaving `reserved` placeholders for the rest of the query.
fn rows_per_statement(binds_per_row: usize, reserved: usize) -> usize {
    (BIND_LIMIT.saturating_sub(reserved) / binds_per_row).max(1)
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn push_id_list<'a, T>(qb: &mut QueryBuilder<'a, MySql>, values: &[T])
where
    T: Clone + Send + sqlx::Type<MySql> + sqlx::Encode<'a, MySql> + 'a,
{
    qb.push("(");
    let mut separated = qb.separated(", ");
    for value in values {
        separated.push_bind(value.clone());
    }
    separated.push_unseparated(")");
}

fn employee_insert(batch: &[NewEmployee]) -> QueryBuilder<'_, MySql> {
    let mut qb = QueryBuilder::<MySql>::new(
        "INSERT INTO employees (name, department, position, fingerprint_id, status) ",
    );
    qb.push_values(batch, |mut b, e| {
        b.push_bind(&e.name)
            .push_bind(&e.department)
            .push_bind(&e.position)
            .push_bind(&e.fingerprint_id)
            .push_bind(e.status.as_ref());
    });
    qb
}

// uq_attendance_punch makes IGNORE drop late collisions
fn attendance_insert(batch: &[NewAttendance]) -> QueryBuilder<'_, MySql> {
    let mut qb = QueryBuilder::<MySql>::new(
        "INSERT IGNORE INTO attendance_logs (employee_id, employee_name, date, check_in, status) ",
    );
    qb.push_values(batch, |mut b, row| {
        b.push_bind(row.employee_id)
            .push_bind(&row.employee_name)
            .push_bind(row.date)
            .push_bind(&row.check_in)
            .push_bind(row.status.as_ref());
    });
    qb
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn list_employees(&self, search: Option<&str>) -> Result<Vec<Employee>, StoreError> {
        let mut qb = QueryBuilder::<MySql>::new(format!("SELECT {EMPLOYEE_COLUMNS} FROM employees"));
        if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
            let like = format!("%{}%", term);
            qb.push(" WHERE name LIKE ")
                .push_bind(like.clone())
                .push(" OR fingerprint_id LIKE ")
                .push_bind(like);
        }
        qb.push(" ORDER BY created_at DESC, id DESC");

        debug!(sql = %qb.sql(), "Fetching employees");
        let rows = qb.build_query_as::<Employee>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn count_employees(&self) -> Result<i64, StoreError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn employees_by_fingerprint(
        &self,
        fingerprint_ids: &[String],
    ) -> Result<Vec<Employee>, StoreError> {
        if fingerprint_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut rows = Vec::new();
        for chunk in fingerprint_ids.chunks(rows_per_statement(1, 0)) {
            let mut qb = QueryBuilder::<MySql>::new(format!(
                "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE fingerprint_id IN "
            ));
            push_id_list(&mut qb, chunk);
            rows.extend(qb.build_query_as::<Employee>().fetch_all(&self.pool).await?);
        }
        Ok(rows)
    }

    async fn insert_employees(&self, batch: &[NewEmployee]) -> Result<u64, StoreError> {
        if batch.is_empty() {
            return Ok(0);
        }
        let mut written = 0;
        for chunk in batch.chunks(rows_per_statement(EMPLOYEE_BINDS, 0)) {
            written += employee_insert(chunk)
                .build()
                .execute(&self.pool)
                .await?
                .rows_affected();
        }
        Ok(written)
    }

    async fn delete_employees(&self, ids: &[u64]) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut deleted = 0;
        for chunk in ids.chunks(rows_per_statement(1, 0)) {
            let mut qb = QueryBuilder::<MySql>::new("DELETE FROM employees WHERE id IN ");
            push_id_list(&mut qb, chunk);
            deleted += qb.build().execute(&self.pool).await?.rows_affected();
        }
        Ok(deleted)
    }

    async fn list_attendance(
        &self,
        filter: &AttendanceFilter,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut qb = QueryBuilder::<MySql>::new(format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance_logs WHERE 1 = 1"
        ));
        if let Some(date) = filter.date {
            qb.push(" AND date = ").push_bind(date);
        }
        if let Some(employee_id) = filter.employee_id {
            qb.push(" AND employee_id = ").push_bind(employee_id);
        }
        if let Some(from) = filter.from {
            qb.push(" AND date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            qb.push(" AND date <= ").push_bind(to);
        }
        qb.push(" ORDER BY date DESC, check_in DESC");

        debug!(sql = %qb.sql(), ?filter, "Fetching attendance logs");
        let rows = qb
            .build_query_as::<AttendanceRecord>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn existing_attendance_keys(
        &self,
        employee_ids: &[u64],
        dates: &[NaiveDate],
    ) -> Result<HashSet<AttendanceKey>, StoreError> {
        if employee_ids.is_empty() || dates.is_empty() {
            return Ok(HashSet::new());
        }
        let mut keys = HashSet::new();
        for ids in employee_ids.chunks(rows_per_statement(1, dates.len())) {
            let mut qb = QueryBuilder::<MySql>::new(
                "SELECT employee_id, date, check_in FROM attendance_logs WHERE employee_id IN ",
            );
            push_id_list(&mut qb, ids);
            qb.push(" AND date IN ");
            push_id_list(&mut qb, dates);

            for row in qb.build().fetch_all(&self.pool).await? {
                keys.insert(AttendanceKey {
                    employee_id: row.try_get("employee_id")?,
                    date: row.try_get("date")?,
                    check_in: row.try_get("check_in")?,
                });
            }
        }
        Ok(keys)
    }

    async fn insert_attendance_ignoring_conflicts(
        &self,
        batch: &[NewAttendance],
    ) -> Result<u64, StoreError> {
        if batch.is_empty() {
            return Ok(0);
        }
        let mut written = 0;
        for chunk in batch.chunks(rows_per_statement(ATTENDANCE_BINDS, 0)) {
            let affected = attendance_insert(chunk)
                .build()
                .execute(&self.pool)
                .await?
                .rows_affected();
            debug!(rows = chunk.len(), affected, "Attendance chunk written");
            written += affected;
        }
        Ok(written)
    }

    async fn delete_attendance(&self, ids: &[u64]) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut deleted = 0;
        for chunk in ids.chunks(rows_per_statement(1, 0)) {
            let mut qb = QueryBuilder::<MySql>::new("DELETE FROM attendance_logs WHERE id IN ");
            push_id_list(&mut qb, chunk);
            deleted += qb.build().execute(&self.pool).await?.rows_affected();
        }
        Ok(deleted)
    }

    async fn list_devices(&self) -> Result<Vec<BiometricDevice>, StoreError> {
        let rows = sqlx::query_as::<_, BiometricDevice>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_device(&self, id: u64) -> Result<Option<BiometricDevice>, StoreError> {
        let device = sqlx::query_as::<_, BiometricDevice>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(device)
    }

    async fn insert_device(&self, device: &NewDevice) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO devices (name, ip_address, port, serial_number, status)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(device.name.trim())
        .bind(device.ip_address.trim())
        .bind(device.port)
        .bind(device.serial_number.trim())
        .bind(DeviceStatus::Offline.as_ref())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_id())
    }

    async fn delete_device(&self, id: u64) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM devices WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn set_device_status(&self, id: u64, status: DeviceStatus) -> Result<(), StoreError> {
        sqlx::query("UPDATE devices SET status = ? WHERE id = ?")
            .bind(status.as_ref())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_device_last_sync(&self, id: u64, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE devices SET last_sync = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_devices_with_status(&self, status: DeviceStatus) -> Result<i64, StoreError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM devices WHERE status = ?")
            .bind(status.as_ref())
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password, role_id, is_active
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn touch_user_login(&self, user_id: u64) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{attendance::AttendanceStatus, employee::EmployeeStatus};

    fn placeholders(sql: &str) -> usize {
        sql.matches('?').count()
    }

    fn punches(n: usize) -> Vec<NewAttendance> {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        (0..n)
            .map(|i| NewAttendance {
                employee_id: i as u64 + 1,
                employee_name: format!("Employee {i}"),
                date,
                check_in: "08:00".to_string(),
                status: AttendanceStatus::Present,
            })
            .collect()
    }

    #[test]
    fn large_punch_export_is_split_under_bind_limit() {
        let batch = punches(14_000);
        let per_statement = rows_per_statement(ATTENDANCE_BINDS, 0);
        assert_eq!(per_statement, 13_107);

        let chunks: Vec<&[NewAttendance]> = batch.chunks(per_statement).collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.iter().map(|c| c.len()).sum::<usize>(), 14_000);

        for chunk in chunks {
            let qb = attendance_insert(chunk);
            let count = placeholders(qb.sql());
            assert_eq!(count, chunk.len() * ATTENDANCE_BINDS);
            assert!(count <= BIND_LIMIT, "{count} placeholders");
        }
    }

    #[test]
    fn employee_insert_binds_every_column() {
        let batch = vec![
            NewEmployee {
                name: "Ali".into(),
                department: "Imported".into(),
                position: "Device user".into(),
                fingerprint_id: "7".into(),
                status: EmployeeStatus::Active,
            };
            3
        ];
        let qb = employee_insert(&batch);
        assert!(qb.sql().starts_with("INSERT INTO employees"));
        assert_eq!(placeholders(qb.sql()), 3 * EMPLOYEE_BINDS);
    }

    #[test]
    fn key_lookup_leaves_room_for_dates() {
        let per_statement = rows_per_statement(1, 20);
        assert_eq!(per_statement + 20, BIND_LIMIT);
        assert_eq!(rows_per_statement(1, BIND_LIMIT), 1);
    }
}
