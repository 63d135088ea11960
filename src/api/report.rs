use crate::{model::attendance::AttendanceFilter, state::AppState};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReportRequest {
    #[schema(example = "2026-01-01", format = "date", value_type = String, nullable = true)]
    pub from: Option<NaiveDate>,
    #[schema(example = "2026-01-31", format = "date", value_type = String, nullable = true)]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    #[schema(example = 120)]
    pub records: usize,
    pub report: String,
}

/// Generate narrative attendance report
#[utoipa::path(
    post,
    path = "/api/reports/attendance",
    request_body = ReportRequest,
    responses(
        (status = 200, description = "Narrative report; a fixed apology text when the model is unavailable", body = ReportResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Report",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn attendance_report(
    state: web::Data<AppState>,
    payload: Option<web::Json<ReportRequest>>,
) -> actix_web::Result<impl Responder> {
    let range = payload.map(|p| p.into_inner()).unwrap_or_default();
    let filter = AttendanceFilter {
        from: range.from,
        to: range.to,
        ..Default::default()
    };

    let mut records = state.store.list_attendance(&filter).await?;
    // chronological order reads better in the narrative
    records.reverse();

    let report = state.reports.generate(&records).await;

    Ok(HttpResponse::Ok().json(ReportResponse {
        records: records.len(),
        report,
    }))
}
