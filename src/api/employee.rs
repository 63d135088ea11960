use crate::{
    api::IdList,
    auth::auth::AuthUser,
    model::employee::{Employee, NewEmployee},
    state::AppState,
};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    /// Matches the name or the fingerprint id
    pub search: Option<String>,
}

/// List Employees
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Employees, newest first", body = [Employee]),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    state: web::Data<AppState>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    let employees = state.store.list_employees(query.search.as_deref()).await?;
    Ok(HttpResponse::Ok().json(employees))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = NewEmployee,
    responses(
        (status = 201, description = "Employee created", body = Object, example = json!({
            "message": "Employee created"
        })),
        (status = 400, description = "Missing name or fingerprint id"),
        (status = 409, description = "Fingerprint id already assigned"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<NewEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let mut employee = payload.into_inner();
    employee.name = employee.name.trim().to_string();
    employee.fingerprint_id = employee.fingerprint_id.trim().to_string();

    if employee.name.is_empty() || employee.fingerprint_id.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "name and fingerprint_id are required"
        })));
    }

    let taken = state
        .store
        .employees_by_fingerprint(std::slice::from_ref(&employee.fingerprint_id))
        .await?;
    if !taken.is_empty() {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "fingerprint_id is already assigned to another employee"
        })));
    }

    state.store.insert_employees(std::slice::from_ref(&employee)).await?;
    info!(fingerprint_id = %employee.fingerprint_id, by = %auth.username, "Employee created");

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee created"
    })))
}

/// Delete Employees
#[utoipa::path(
    delete,
    path = "/api/employees",
    request_body = IdList,
    responses(
        (status = 200, description = "Deleted", body = Object, example = json!({
            "message": "Successfully deleted",
            "deleted": 2
        })),
        (status = 403, description = "Admin only")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employees(
    auth: AuthUser,
    state: web::Data<AppState>,
    payload: web::Json<IdList>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let deleted = state.store.delete_employees(&payload.ids).await?;
    info!(deleted, by = %auth.username, "Employees deleted");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted",
        "deleted": deleted
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::fake::FakeConnector;
    use crate::model::role::Role;
    use crate::store::memory::MemoryStore;
    use actix_web::{http::StatusCode, test};
    use serde_json::Value;
    use std::sync::Arc;

    macro_rules! employee_app {
        ($store:expr, $role:expr) => {
            app_as!(
                AppState::for_tests($store, Arc::new(FakeConnector::default())),
                $role,
                get "/employees" => list_employees,
                post "/employees" => create_employee,
                delete "/employees" => delete_employees,
            )
        };
    }

    macro_rules! search {
        ($app:expr, $term:expr) => {{
            let req = test::TestRequest::get()
                .uri(&format!("/employees?search={}", $term))
                .to_request();
            let body: Vec<Value> = test::call_and_read_body_json(&$app, req).await;
            body.iter()
                .map(|e| e["name"].as_str().unwrap().to_string())
                .collect::<Vec<_>>()
        }};
    }

    #[actix_web::test]
    async fn search_matches_name_or_fingerprint() {
        let store = Arc::new(MemoryStore::new());
        store.seed_employee("Ali Hassan", "17");
        store.seed_employee("Sara", "42");
        store.seed_employee("Omar", "170");
        let app = employee_app!(store, Role::Viewer);

        assert_eq!(search!(app, "17"), vec!["Omar", "Ali Hassan"]);
        assert_eq!(search!(app, "Sara"), vec!["Sara"]);
        assert_eq!(search!(app, "%20%20").len(), 3);
        assert!(search!(app, "nobody").is_empty());
    }

    #[actix_web::test]
    async fn duplicate_fingerprint_is_a_conflict() {
        let store = Arc::new(MemoryStore::new());
        store.seed_employee("Ali Hassan", "17");
        let app = employee_app!(store.clone(), Role::Hr);

        let req = test::TestRequest::post()
            .uri("/employees")
            .set_json(serde_json::json!({"name": "Copy", "fingerprint_id": " 17 "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(store.employees().len(), 1);

        let req = test::TestRequest::post()
            .uri("/employees")
            .set_json(serde_json::json!({"name": " Sara ", "fingerprint_id": "18"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created = store.employees().into_iter().find(|e| e.fingerprint_id == "18").unwrap();
        assert_eq!(created.name, "Sara");
    }

    #[actix_web::test]
    async fn blank_name_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let app = employee_app!(store.clone(), Role::Admin);

        let req = test::TestRequest::post()
            .uri("/employees")
            .set_json(serde_json::json!({"name": "  ", "fingerprint_id": "5"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(store.employees().is_empty());
    }

    #[actix_web::test]
    async fn bulk_delete_is_admin_only() {
        let store = Arc::new(MemoryStore::new());
        let a = store.seed_employee("Ali", "1");
        let b = store.seed_employee("Sara", "2");
        store.seed_employee("Omar", "3");

        let hr = employee_app!(store.clone(), Role::Hr);
        let req = test::TestRequest::delete()
            .uri("/employees")
            .set_json(serde_json::json!({"ids": [a, b]}))
            .to_request();
        let resp = test::call_service(&hr, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(store.employees().len(), 3);

        let admin = employee_app!(store.clone(), Role::Admin);
        let req = test::TestRequest::delete()
            .uri("/employees")
            .set_json(serde_json::json!({"ids": [a, b]}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&admin, req).await;
        assert_eq!(body["deleted"], 2);
        assert_eq!(store.employees().len(), 1);
    }
}
