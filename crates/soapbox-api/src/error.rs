use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use soapbox_types::models::Plan;

/// Every failure a handler can surface. Converted to the wire shape
/// `{"error": "..."}` at the response boundary; storage errors are logged
/// server-side and collapsed to a generic 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("Email already registered")]
    EmailTaken,
    #[error("{}", quota_message(.plan, .limit))]
    QuotaExceeded { plan: Plan, limit: i64, current: i64 },
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

fn quota_message(plan: &Plan, limit: &i64) -> String {
    format!(
        "Message limit reached. {} users can submit up to {} message{}.",
        match plan {
            Plan::Pro => "Pro",
            Plan::Free => "Free",
        },
        limit,
        if *limit > 1 { "s" } else { "" },
    )
}

impl ApiError {
    /// For join errors and other infrastructure failures around the handlers.
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(anyhow::anyhow!("{err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::EmailTaken => StatusCode::CONFLICT,
            ApiError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let ApiError::Internal(err) = &self {
            error!("internal error: {err:#}");
        }

        let body = match &self {
            ApiError::QuotaExceeded { limit, current, .. } => json!({
                "error": self.to_string(),
                "limit": limit,
                "current": current,
            }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// `axum::Json` with the rejection remapped to a 400 `{"error": ...}` body,
/// so malformed or incomplete request bodies match the error contract.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// Same treatment for query strings: a malformed parameter becomes a 400
/// `{"error": ...}` body instead of axum's plain-text rejection.
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}
