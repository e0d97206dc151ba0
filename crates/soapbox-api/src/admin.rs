use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use soapbox_types::api::{AdminUpdateUserRequest, AdminUserView, AdminUsersResponse, Claims, UserStats};
use soapbox_types::models::Role;

use crate::auth::AppState;
use crate::error::{ApiError, ApiJson, ApiQuery};
use crate::middleware::is_admin;
use crate::parse_timestamp;

pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    if !is_admin(&state, &claims) {
        return Err(ApiError::Forbidden);
    }

    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || db.db.list_users_with_stats())
        .await
        .map_err(ApiError::internal)??;

    let users = rows
        .into_iter()
        .map(|(user, total_messages)| AdminUserView {
            id: user.id.parse().unwrap_or_else(|e| {
                warn!("Corrupt user id '{}': {}", user.id, e);
                Uuid::default()
            }),
            email: user.email,
            name: user.name,
            role: Role::parse(&user.role).unwrap_or(Role::Member),
            subscription_status: user.subscription_status,
            created_at: parse_timestamp(&user.created_at, "user created_at"),
            stats: UserStats { total_messages },
        })
        .collect();

    Ok(Json(AdminUsersResponse { users }))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<AdminUpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !is_admin(&state, &claims) {
        return Err(ApiError::Forbidden);
    }
    if req.role.is_none() && req.subscription_status.is_none() {
        return Err(ApiError::Validation("Nothing to update".into()));
    }

    let db = state.clone();
    let id = req.user_id.to_string();
    let found = tokio::task::spawn_blocking(move || {
        db.db.update_user(
            &id,
            req.role.map(Role::as_str),
            req.subscription_status.as_deref(),
        )
    })
    .await
    .map_err(ApiError::internal)??;

    if !found {
        return Err(ApiError::NotFound("User not found"));
    }

    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserParams {
    #[serde(rename = "userId")]
    pub user_id: Option<Uuid>,
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(params): ApiQuery<DeleteUserParams>,
) -> Result<impl IntoResponse, ApiError> {
    if !is_admin(&state, &claims) {
        return Err(ApiError::Forbidden);
    }

    let user_id = params
        .user_id
        .ok_or_else(|| ApiError::Validation("User ID is required".into()))?;

    if user_id == claims.sub {
        return Err(ApiError::Validation("Cannot delete your own account".into()));
    }

    let db = state.clone();
    let id = user_id.to_string();
    let found = tokio::task::spawn_blocking(move || db.db.delete_user(&id))
        .await
        .map_err(ApiError::internal)??;

    if !found {
        return Err(ApiError::NotFound("User not found"));
    }

    Ok(Json(json!({ "success": true })))
}
