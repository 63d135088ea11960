//! Bearer-token gate for the protected API scope.

use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{AUTHORIZATION, HeaderMap},
    web::Data,
};
use serde_json::json;
use tracing::debug;

/// Reads `Authorization: Bearer <token>` and resolves it to the caller.
fn authenticate(headers: &HeaderMap, jwt_secret: &str) -> Result<AuthUser, &'static str> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Invalid Authorization header encoding")?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or("Authorization header must use the Bearer scheme")?;

    let claims = verify_token(token, jwt_secret).map_err(|e| {
        debug!(error = %e, "Rejected access token");
        "Invalid or expired token"
    })?;
    let role = Role::from_id(claims.role).ok_or("Token carries an unknown role")?;

    Ok(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
    })
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    match authenticate(req.headers(), &config.jwt_secret) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.call(req).await
        }
        Err(message) => {
            let resp = HttpResponse::Unauthorized().json(json!({ "message": message }));
            Ok(req.into_response(resp.map_into_boxed_body()))
        }
    }
}
