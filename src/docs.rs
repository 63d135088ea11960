use crate::api::IdList;
use crate::api::dashboard::DashboardStats;
use crate::api::report::{ReportRequest, ReportResponse};
use crate::auth::handlers::LoginResponse;
use crate::model::attendance::{AttendanceFilter, AttendanceRecord, AttendanceStatus};
use crate::model::device::{BiometricDevice, DeviceStatus, NewDevice};
use crate::model::employee::{Employee, EmployeeStatus, NewEmployee};
use crate::models::LoginReqDto;
use crate::sync::probe::ProbeReport;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biometric Attendance API",
        version = "1.0.0",
        description = r#"
## Biometric attendance backend

Serves the attendance dashboard and bridges to fingerprint devices through
an external connector service.

### Features
- **Employees**: list, search, create, bulk delete
- **Attendance**: daily logs with date and employee filters
- **Devices**: registration, connectivity check, user and punch import
- **Reports**: narrative attendance analysis from a generative model

### Security
All `/api` endpoints require a **JWT Bearer** token from `/auth/login`.
Deletes require the **Admin** role; device syncs require **Admin** or **HR**.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::employee::list_employees,
        crate::api::employee::create_employee,
        crate::api::employee::delete_employees,

        crate::api::attendance::list_attendance,
        crate::api::attendance::delete_attendance,

        crate::api::device::list_devices,
        crate::api::device::create_device,
        crate::api::device::delete_device,
        crate::api::device::probe,
        crate::api::device::sync_users,
        crate::api::device::sync_logs,

        crate::api::dashboard::dashboard,
        crate::api::report::attendance_report
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            IdList,
            Employee,
            EmployeeStatus,
            NewEmployee,
            AttendanceRecord,
            AttendanceStatus,
            AttendanceFilter,
            BiometricDevice,
            DeviceStatus,
            NewDevice,
            ProbeReport,
            DashboardStats,
            ReportRequest,
            ReportResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login"),
        (name = "Employee", description = "Employee records"),
        (name = "Attendance", description = "Attendance logs"),
        (name = "Device", description = "Biometric device registry"),
        (name = "Sync", description = "Device-backed import"),
        (name = "Dashboard", description = "Summary numbers"),
        (name = "Report", description = "Narrative reports"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
