use crate::{
    api::{attendance, dashboard, device, employee, report},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

// Per-route limiter: burst of `requests_per_min`, refilled evenly over a minute
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst are clamped to at least 1");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = build_limiter(config.rate_login_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(login_limiter)
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .route("/dashboard", web::get().to(dashboard::dashboard))
            .service(
                web::resource("/employees")
                    .route(web::get().to(employee::list_employees))
                    .route(web::post().to(employee::create_employee))
                    .route(web::delete().to(employee::delete_employees)),
            )
            .service(
                web::resource("/attendance")
                    .route(web::get().to(attendance::list_attendance))
                    .route(web::delete().to(attendance::delete_attendance)),
            )
            .service(
                web::scope("/devices")
                    // /devices
                    .service(
                        web::resource("")
                            .route(web::get().to(device::list_devices))
                            .route(web::post().to(device::create_device)),
                    )
                    // /devices/{id}
                    .service(web::resource("/{id}").route(web::delete().to(device::delete_device)))
                    .service(web::resource("/{id}/probe").route(web::post().to(device::probe)))
                    .service(
                        web::resource("/{id}/sync/users").route(web::post().to(device::sync_users)),
                    )
                    .service(
                        web::resource("/{id}/sync/logs").route(web::post().to(device::sync_logs)),
                    ),
            )
            .route(
                "/reports/attendance",
                web::post().to(report::attendance_report),
            ),
    );
}

// LOGIN
//  └─ access_token (ACCESS_TOKEN_TTL, default 15 min)

// API REQUEST
//  └─ Authorization: Bearer access_token
//       └─ delete endpoints additionally require the Admin role
