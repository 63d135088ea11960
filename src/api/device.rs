use crate::{
    auth::auth::AuthUser,
    model::device::{BiometricDevice, NewDevice},
    state::AppState,
    sync::{attendance::pull_attendance, employees::pull_employees, probe::{ProbeReport, probe_device}},
};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::info;

/// List devices
#[utoipa::path(
    get,
    path = "/api/devices",
    responses(
        (status = 200, description = "Registered devices", body = [BiometricDevice]),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Device",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_devices(state: web::Data<AppState>) -> actix_web::Result<impl Responder> {
    let devices = state.store.list_devices().await?;
    Ok(HttpResponse::Ok().json(devices))
}

/// Register device
#[utoipa::path(
    post,
    path = "/api/devices",
    request_body = NewDevice,
    responses(
        (status = 201, description = "Device registered (offline until probed)", body = Object, example = json!({
            "message": "Device registered",
            "id": 1
        })),
        (status = 400, description = "Missing field"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Device",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_device(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<NewDevice>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if let Some(field) = payload.missing_field() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("{field} is required")
        })));
    }

    let id = state.store.insert_device(&payload).await?;
    info!(device_id = id, name = %payload.name, "Device registered");

    Ok(HttpResponse::Created().json(json!({
        "message": "Device registered",
        "id": id
    })))
}

/// Delete device
#[utoipa::path(
    delete,
    path = "/api/devices/{device_id}",
    params(
        ("device_id", Path, description = "Device ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Device not found")
    ),
    tag = "Device",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_device(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let device_id = path.into_inner();

    if state.store.delete_device(device_id).await? == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Device not found"
        })));
    }

    info!(device_id, by = %auth.username, "Device deleted");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

/// Check device connectivity
#[utoipa::path(
    post,
    path = "/api/devices/{device_id}/probe",
    params(
        ("device_id", Path, description = "Device ID")
    ),
    responses(
        (status = 200, description = "Probe finished; device status updated", body = ProbeReport),
        (status = 404, description = "Device not found"),
        (status = 409, description = "Another sync is running")
    ),
    tag = "Device",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn probe(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let _permit = state.sync_gate.try_begin()?;

    let report = probe_device(state.store.as_ref(), state.connector.as_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Pull employees from device
#[utoipa::path(
    post,
    path = "/api/devices/{device_id}/sync/users",
    params(
        ("device_id", Path, description = "Device ID")
    ),
    responses(
        (status = 200, description = "Sync finished", body = Object, example = json!({
            "outcome": "imported",
            "fetched": 12,
            "created": 3,
            "already_known": 9,
            "message": "Imported 3 new employees from the device"
        })),
        (status = 404, description = "Device not found"),
        (status = 409, description = "Device offline or another sync is running"),
        (status = 502, description = "Connector error"),
        (status = 503, description = "Connector not configured")
    ),
    tag = "Sync",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn sync_users(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let _permit = state.sync_gate.try_begin()?;

    let outcome = pull_employees(state.store.as_ref(), state.connector.as_ref(), path.into_inner()).await?;
    let mut body = serde_json::to_value(&outcome)?;
    body["message"] = json!(outcome.message());
    Ok(HttpResponse::Ok().json(body))
}

/// Pull attendance punches from device
#[utoipa::path(
    post,
    path = "/api/devices/{device_id}/sync/logs",
    params(
        ("device_id", Path, description = "Device ID")
    ),
    responses(
        (status = 200, description = "Sync finished", body = Object, example = json!({
            "outcome": "no_employees_to_match",
            "message": "No employees to match punches against; import employees first"
        })),
        (status = 404, description = "Device not found"),
        (status = 409, description = "Device offline or another sync is running"),
        (status = 502, description = "Connector error"),
        (status = 503, description = "Connector not configured")
    ),
    tag = "Sync",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn sync_logs(
    auth: AuthUser,
    state: web::Data<AppState>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let _permit = state.sync_gate.try_begin()?;

    let outcome = pull_attendance(state.store.as_ref(), state.connector.as_ref(), path.into_inner()).await?;
    let mut body = serde_json::to_value(&outcome)?;
    body["message"] = json!(outcome.message());
    Ok(HttpResponse::Ok().json(body))
}
