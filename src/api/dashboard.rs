use crate::{
    model::{
        attendance::{AttendanceFilter, AttendanceStatus},
        device::DeviceStatus,
    },
    state::AppState,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    #[schema(example = 42)]
    pub total_employees: i64,
    #[schema(example = 35)]
    pub present_today: usize,
    #[schema(example = 4)]
    pub late_today: usize,
    #[schema(example = 2)]
    pub online_devices: i64,
}

/// Dashboard summary
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Headline numbers for today (UTC)", body = DashboardStats),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Dashboard",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn dashboard(state: web::Data<AppState>) -> actix_web::Result<impl Responder> {
    let today = AttendanceFilter {
        date: Some(Utc::now().date_naive()),
        ..Default::default()
    };

    let total_employees = state.store.count_employees().await?;
    let logs = state.store.list_attendance(&today).await?;
    let online_devices = state
        .store
        .count_devices_with_status(DeviceStatus::Online)
        .await?;

    let count = |status: AttendanceStatus| logs.iter().filter(|l| l.status == status).count();

    Ok(HttpResponse::Ok().json(DashboardStats {
        total_employees,
        present_today: count(AttendanceStatus::Present),
        late_today: count(AttendanceStatus::Late),
        online_devices,
    }))
}
