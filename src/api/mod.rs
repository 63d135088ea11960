/// Test service whose requests arrive already authenticated as `$role`.
#[cfg(test)]
macro_rules! app_as {
    ($state:expr, $role:expr, $($method:ident $path:literal => $handler:path),+ $(,)?) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state))
                .wrap_fn(|req, srv| {
                    actix_web::HttpMessage::extensions_mut(&req).insert(
                        crate::auth::auth::AuthUser {
                            user_id: 1,
                            username: "operator".into(),
                            role: $role,
                        },
                    );
                    actix_web::dev::Service::call(srv, req)
                })
                $(.route($path, actix_web::web::$method().to($handler)))+,
        )
        .await
    };
}

pub mod attendance;
pub mod dashboard;
pub mod device;
pub mod employee;
pub mod report;

use serde::Deserialize;
use utoipa::ToSchema;

/// Body of the bulk delete endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IdList {
    #[schema(example = json!([1, 2, 3]))]
    pub ids: Vec<u64>,
}
