//! One-shot connectivity check for a registered device.

use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::{SyncError, load_device};
use crate::connector::Connector;
use crate::model::device::DeviceStatus;
use crate::store::AttendanceStore;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProbeReport {
    #[schema(example = 1)]
    pub device_id: u64,
    pub status: DeviceStatus,
    /// Steps attempted, in order, for the operator's diagnostics panel.
    #[schema(example = json!(["Starting check for device Main gate", "Connection succeeded in 12 ms"]))]
    pub trail: Vec<String>,
}

/// Asks the connector for its status and records the result on the device.
///
/// Connector failures never escape: they mark the device offline and end
/// the trail with the reason. Store failures are returned.
pub async fn probe_device(
    store: &dyn AttendanceStore,
    connector: &dyn Connector,
    device_id: u64,
) -> Result<ProbeReport, SyncError> {
    let device = load_device(store, device_id).await?;
    let mut trail = vec![
        format!("Starting check for device {}", device.name),
        format!("Reaching {}:{}", device.ip_address, device.port),
        "Sending status request to connector".to_string(),
    ];
    store
        .set_device_status(device_id, DeviceStatus::Connecting)
        .await?;

    let started = Instant::now();
    let status = match connector.status().await {
        Ok(reply) if reply.connected => {
            trail.push(format!("Serial number {} acknowledged", device.serial_number));
            trail.push(format!(
                "Connection succeeded in {} ms",
                started.elapsed().as_millis()
            ));
            DeviceStatus::Online
        }
        Ok(_) => {
            trail.push("Connector is up but reports the device unreachable".to_string());
            DeviceStatus::Offline
        }
        Err(e) => {
            trail.push(format!("Connection failed: {e}"));
            DeviceStatus::Offline
        }
    };

    if let Err(e) = store.set_device_status(device_id, status).await {
        // never leave the device in `connecting`
        if status != DeviceStatus::Offline {
            if let Err(fallback) = store.set_device_status(device_id, DeviceStatus::Offline).await {
                warn!(device_id, error = %fallback, "Could not record probe result");
            }
        }
        return Err(e.into());
    }

    match status {
        DeviceStatus::Online => info!(device_id, ?trail, "Device probe succeeded"),
        _ => warn!(device_id, ?trail, "Device probe failed"),
    }

    Ok(ProbeReport {
        device_id,
        status,
        trail,
    })
}
