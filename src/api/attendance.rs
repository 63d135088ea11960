use crate::{
    api::IdList,
    auth::auth::AuthUser,
    model::attendance::{AttendanceFilter, AttendanceRecord},
    state::AppState,
};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::info;

/// List attendance logs
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(
        ("date", Query, description = "Exact day, YYYY-MM-DD"),
        ("employee_id", Query, description = "Filter by employee"),
        ("from", Query, description = "First day, inclusive"),
        ("to", Query, description = "Last day, inclusive")
    ),
    responses(
        (status = 200, description = "Logs, newest first", body = [AttendanceRecord]),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_attendance(
    state: web::Data<AppState>,
    query: web::Query<AttendanceFilter>,
) -> actix_web::Result<impl Responder> {
    let rows = state.store.list_attendance(&query).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Delete attendance logs
#[utoipa::path(
    delete,
    path = "/api/attendance",
    request_body = IdList,
    responses(
        (status = 200, description = "Deleted", body = Object, example = json!({
            "message": "Successfully deleted",
            "deleted": 3
        })),
        (status = 403, description = "Admin only")
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_attendance(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<IdList>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let deleted = state.store.delete_attendance(&payload.ids).await?;
    info!(deleted, by = %auth.username, "Attendance logs deleted");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted",
        "deleted": deleted
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::fake::FakeConnector;
    use crate::model::{
        attendance::{AttendanceStatus, NewAttendance},
        role::Role,
    };
    use crate::store::{AttendanceStore, memory::MemoryStore};
    use actix_web::{http::StatusCode, test};
    use chrono::NaiveDate;
    use serde_json::Value;
    use std::sync::Arc;

    macro_rules! attendance_app {
        ($store:expr, $role:expr) => {
            app_as!(
                AppState::for_tests($store, Arc::new(FakeConnector::default())),
                $role,
                get "/attendance" => list_attendance,
                delete "/attendance" => delete_attendance,
            )
        };
    }

    fn punch(employee_id: u64, date: &str, check_in: &str) -> NewAttendance {
        NewAttendance {
            employee_id,
            employee_name: format!("Employee {employee_id}"),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            check_in: check_in.to_string(),
            status: AttendanceStatus::Present,
        }
    }

    async fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_attendance_ignoring_conflicts(&[
                punch(1, "2024-05-01", "08:00"),
                punch(1, "2024-05-02", "08:10"),
                punch(2, "2024-05-01", "09:00"),
            ])
            .await
            .unwrap();
        store
    }

    macro_rules! check_ins {
        ($app:expr, $query:expr) => {{
            let req = test::TestRequest::get()
                .uri(&format!("/attendance{}", $query))
                .to_request();
            let body: Vec<Value> = test::call_and_read_body_json(&$app, req).await;
            body.iter()
                .map(|r| format!("{} {}", r["date"].as_str().unwrap(), r["check_in"].as_str().unwrap()))
                .collect::<Vec<_>>()
        }};
    }

    #[actix_web::test]
    async fn list_filters_by_date_and_employee() {
        let app = attendance_app!(seeded().await, Role::Viewer);

        assert_eq!(
            check_ins!(app, ""),
            vec!["2024-05-02 08:10", "2024-05-01 09:00", "2024-05-01 08:00"]
        );
        assert_eq!(
            check_ins!(app, "?date=2024-05-01"),
            vec!["2024-05-01 09:00", "2024-05-01 08:00"]
        );
        assert_eq!(
            check_ins!(app, "?employee_id=1"),
            vec!["2024-05-02 08:10", "2024-05-01 08:00"]
        );
        assert_eq!(
            check_ins!(app, "?date=2024-05-01&employee_id=2"),
            vec!["2024-05-01 09:00"]
        );
    }

    #[actix_web::test]
    async fn bulk_delete_is_admin_only() {
        let store = seeded().await;
        let ids: Vec<u64> = store.attendance().iter().take(2).map(|r| r.id).collect();

        let viewer = attendance_app!(store.clone(), Role::Viewer);
        let req = test::TestRequest::delete()
            .uri("/attendance")
            .set_json(serde_json::json!({ "ids": ids }))
            .to_request();
        let resp = test::call_service(&viewer, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(store.attendance().len(), 3);

        let admin = attendance_app!(store.clone(), Role::Admin);
        let req = test::TestRequest::delete()
            .uri("/attendance")
            .set_json(serde_json::json!({ "ids": ids }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&admin, req).await;
        assert_eq!(body["deleted"], 2);
        assert_eq!(store.attendance().len(), 1);
    }
}
