//! Import of device users as local employees.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, instrument};

use super::{SyncError, device_unreachable, require_online, stamp_last_sync};
use crate::connector::Connector;
use crate::model::employee::{EmployeeStatus, NewEmployee};
use crate::store::AttendanceStore;
use crate::sync::normalize::UpstreamRecord;

pub const IMPORTED_DEPARTMENT: &str = "Imported";
pub const IMPORTED_POSITION: &str = "Device user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EmployeeSyncOutcome {
    /// The connector returned no users at all.
    NothingToImport,
    /// Users came back but none carried an identifier.
    NoUsableRecords { fetched: usize },
    /// `created` may be zero when every user already exists.
    Imported {
        fetched: usize,
        created: u64,
        already_known: usize,
    },
}

impl EmployeeSyncOutcome {
    pub fn message(&self) -> String {
        match self {
            EmployeeSyncOutcome::NothingToImport => "The device returned no users".to_string(),
            EmployeeSyncOutcome::NoUsableRecords { fetched } => format!(
                "Fetched {fetched} users but none had a user id; check the connector's field mapping"
            ),
            EmployeeSyncOutcome::Imported {
                created: 0,
                already_known,
                ..
            } => format!("No new employees; all {already_known} users already exist"),
            EmployeeSyncOutcome::Imported { created, .. } => {
                format!("Imported {created} new employees from the device")
            }
        }
    }
}

/// Candidate employees in connector order, one per identifier.
pub fn candidates(records: &[UpstreamRecord]) -> Vec<NewEmployee> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|r| {
            let fingerprint_id = r.identifier();
            if fingerprint_id.is_empty() || !seen.insert(fingerprint_id.clone()) {
                return None;
            }
            Some(NewEmployee {
                name: r
                    .name()
                    .unwrap_or_else(|| format!("Device user {fingerprint_id}")),
                department: IMPORTED_DEPARTMENT.to_string(),
                position: IMPORTED_POSITION.to_string(),
                fingerprint_id,
                status: EmployeeStatus::Active,
            })
        })
        .collect()
}

/// Pulls the connector's user export and inserts the users not yet known
/// locally.
#[instrument(name = "sync_users", skip(store, connector))]
pub async fn pull_employees(
    store: &dyn AttendanceStore,
    connector: &dyn Connector,
    device_id: u64,
) -> Result<EmployeeSyncOutcome, SyncError> {
    require_online(store, device_id).await?;

    let batch = match connector.sync_users().await {
        Ok(batch) => batch,
        Err(e) => return Err(device_unreachable(store, device_id, e).await),
    };
    stamp_last_sync(store, device_id).await?;

    let fetched = batch.records.len();
    if fetched == 0 {
        info!("Connector returned no users");
        return Ok(EmployeeSyncOutcome::NothingToImport);
    }

    let candidates = candidates(&batch.records);
    if candidates.is_empty() {
        info!(fetched, "No upstream user carried an identifier");
        return Ok(EmployeeSyncOutcome::NoUsableRecords { fetched });
    }

    let ids: Vec<String> = candidates.iter().map(|c| c.fingerprint_id.clone()).collect();
    let existing: HashSet<String> = store
        .employees_by_fingerprint(&ids)
        .await?
        .into_iter()
        .map(|e| e.fingerprint_id)
        .collect();

    let (known, fresh): (Vec<NewEmployee>, Vec<NewEmployee>) = candidates
        .into_iter()
        .partition(|c| existing.contains(&c.fingerprint_id));

    let created = if fresh.is_empty() {
        0
    } else {
        store.insert_employees(&fresh).await?
    };

    info!(fetched, created, already_known = known.len(), "Employee sync finished");
    Ok(EmployeeSyncOutcome::Imported {
        fetched,
        created,
        already_known: known.len(),
    })
}
