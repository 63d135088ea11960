//! Import of device punches as attendance rows.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument};

use super::{SyncError, device_unreachable, require_online, stamp_last_sync};
use crate::connector::Connector;
use crate::model::attendance::{AttendanceKey, AttendanceStatus, NewAttendance};
use crate::model::employee::Employee;
use crate::store::AttendanceStore;
use crate::sync::normalize::UpstreamRecord;

/// Distinct dates per existing-row lookup. Every date is still checked;
/// larger runs issue several lookups.
pub const DATE_LOOKUP_CHUNK: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttendanceSyncOutcome {
    /// No local employees exist; the connector was not called.
    NoEmployeesToMatch,
    /// The connector returned no punches.
    NothingToImport,
    /// Punches came back but none matched an employee with a readable time.
    NoUsableRecords { fetched: usize },
    Imported {
        fetched: usize,
        created: u64,
        duplicates: usize,
        skipped: usize,
    },
}

impl AttendanceSyncOutcome {
    pub fn message(&self) -> String {
        match self {
            AttendanceSyncOutcome::NoEmployeesToMatch => {
                "No employees to match punches against; import employees first".to_string()
            }
            AttendanceSyncOutcome::NothingToImport => "The device returned no punches".to_string(),
            AttendanceSyncOutcome::NoUsableRecords { fetched } => format!(
                "Fetched {fetched} punches but none matched a known employee with a readable time"
            ),
            AttendanceSyncOutcome::Imported {
                created, duplicates, ..
            } => format!("Imported {created} attendance records ({duplicates} already present)"),
        }
    }
}

struct Match<'a> {
    employee_id: u64,
    name: &'a str,
}

/// Rows for every punch that maps to a local employee and carries a readable
/// time, deduplicated within the batch. Returns the rows and how many punches
/// were discarded.
pub fn candidates(records: &[UpstreamRecord], employees: &[Employee]) -> (Vec<NewAttendance>, usize) {
    let lookup: HashMap<&str, Match<'_>> = employees
        .iter()
        .map(|e| {
            (
                e.fingerprint_id.as_str(),
                Match {
                    employee_id: e.id,
                    name: e.name.as_str(),
                },
            )
        })
        .collect();

    let mut seen: HashSet<AttendanceKey> = HashSet::new();
    let mut rows = Vec::new();
    let mut skipped = 0;

    for record in records {
        let identifier = record.identifier();
        if identifier.is_empty() {
            skipped += 1;
            continue;
        }
        let (Some(employee), Some(at)) = (lookup.get(identifier.as_str()), record.timestamp()) else {
            skipped += 1;
            continue;
        };

        let row = NewAttendance {
            employee_id: employee.employee_id,
            employee_name: employee.name.to_string(),
            date: at.date(),
            check_in: at.format("%H:%M").to_string(),
            status: AttendanceStatus::Present,
        };
        if seen.insert(row.key()) {
            rows.push(row);
        }
    }

    (rows, skipped)
}

/// Distinct dates in first-seen order.
fn distinct_dates(rows: &[NewAttendance]) -> Vec<NaiveDate> {
    let mut seen = HashSet::new();
    rows.iter()
        .map(|r| r.date)
        .filter(|d| seen.insert(*d))
        .collect()
}

async fn existing_keys(
    store: &dyn AttendanceStore,
    rows: &[NewAttendance],
) -> Result<HashSet<AttendanceKey>, SyncError> {
    let mut employee_ids: Vec<u64> = rows.iter().map(|r| r.employee_id).collect();
    employee_ids.sort_unstable();
    employee_ids.dedup();

    let mut keys = HashSet::new();
    for dates in distinct_dates(rows).chunks(DATE_LOOKUP_CHUNK) {
        debug!(dates = dates.len(), employees = employee_ids.len(), "Looking up existing punches");
        keys.extend(store.existing_attendance_keys(&employee_ids, dates).await?);
    }
    Ok(keys)
}

/// Pulls the connector's punch export and writes the punches not yet
/// recorded.
#[instrument(name = "sync_logs", skip(store, connector))]
pub async fn pull_attendance(
    store: &dyn AttendanceStore,
    connector: &dyn Connector,
    device_id: u64,
) -> Result<AttendanceSyncOutcome, SyncError> {
    require_online(store, device_id).await?;

    let employees = store.list_employees(None).await?;
    if employees.is_empty() {
        info!("No local employees; skipping log export");
        return Ok(AttendanceSyncOutcome::NoEmployeesToMatch);
    }

    let batch = match connector.sync_logs().await {
        Ok(batch) => batch,
        Err(e) => return Err(device_unreachable(store, device_id, e).await),
    };
    stamp_last_sync(store, device_id).await?;

    let fetched = batch.records.len();
    if fetched == 0 {
        info!("Connector returned no punches");
        return Ok(AttendanceSyncOutcome::NothingToImport);
    }

    let (rows, skipped) = candidates(&batch.records, &employees);
    if rows.is_empty() {
        info!(fetched, skipped, "No upstream punch was usable");
        return Ok(AttendanceSyncOutcome::NoUsableRecords { fetched });
    }

    let existing = existing_keys(store, &rows).await?;
    let before = rows.len();
    let fresh: Vec<NewAttendance> = rows
        .into_iter()
        .filter(|r| !existing.contains(&r.key()))
        .collect();
    let mut duplicates = before - fresh.len();

    let created = if fresh.is_empty() {
        0
    } else {
        store.insert_attendance_ignoring_conflicts(&fresh).await?
    };
    // rows another writer added between the lookup and the insert
    duplicates += fresh.len() - created as usize;

    info!(fetched, created, duplicates, skipped, "Attendance sync finished");
    Ok(AttendanceSyncOutcome::Imported {
        fetched,
        created,
        duplicates,
        skipped,
    })
}
