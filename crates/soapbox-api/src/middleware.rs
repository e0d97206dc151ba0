use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use soapbox_types::api::Claims;
use soapbox_types::models::Role;

use crate::auth::{AppState, AppStateInner};
use crate::error::ApiError;

/// Extract and validate the JWT from the Authorization header, then make the
/// claims available to handlers through request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}

/// The one admin capability check. A caller is an admin when their persisted
/// role says so, or when they are the configured bootstrap admin address.
pub fn is_admin(state: &AppStateInner, claims: &Claims) -> bool {
    claims.role == Role::Admin || state.admin_email.as_deref() == Some(claims.email.as_str())
}
