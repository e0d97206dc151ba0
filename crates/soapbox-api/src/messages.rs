use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use soapbox_db::models::{MessageRow, SubmitOutcome};
use soapbox_types::api::{
    Claims, ListMessagesResponse, MessageView, SubmitMessageRequest, SubmitMessageResponse,
    UpdateStatusRequest,
};
use soapbox_types::models::{Category, Plan, Priority, Status};

use crate::auth::AppState;
use crate::error::{ApiError, ApiJson, ApiQuery};
use crate::middleware::is_admin;
use crate::parse_timestamp;

const MAX_TITLE_CHARS: usize = 500;

pub async fn submit_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<SubmitMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() || req.content.trim().is_empty() {
        return Err(ApiError::Validation("Title and content are required".into()));
    }
    if req.title.chars().count() > MAX_TITLE_CHARS {
        return Err(ApiError::Validation(format!(
            "Title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }

    let category = req.category.unwrap_or(Category::General);
    let priority = req.priority.unwrap_or(Priority::Medium);

    // Plan lookup and count-then-insert both run on the blocking pool; the
    // store does the quota check inside one transaction.
    let db = state.clone();
    let owner = claims.sub.to_string();
    let (email, name) = (claims.email.clone(), claims.name.clone());
    let (outcome, plan) = tokio::task::spawn_blocking(move || {
        let user = db
            .db
            .get_user_by_id(&owner)
            .map_err(ApiError::from)?
            .ok_or(ApiError::NotFound("User not found"))?;
        let plan = Plan::from_subscription_status(&user.subscription_status);

        let outcome = db
            .db
            .submit_message(
                &owner,
                &email,
                &name,
                &req.title,
                &req.content,
                category.as_str(),
                priority.as_str(),
                plan.message_quota(),
            )
            .map_err(ApiError::from)?;
        Ok::<_, ApiError>((outcome, plan))
    })
    .await
    .map_err(ApiError::internal)??;

    match outcome {
        SubmitOutcome::Created { id, remaining } => Ok(Json(SubmitMessageResponse {
            message_id: id,
            remaining_slots: remaining,
        })),
        SubmitOutcome::QuotaExceeded { limit, current } => {
            Err(ApiError::QuotaExceeded { plan, limit, current })
        }
    }
}

/// Admins see every message; everyone else sees their own.
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = is_admin(&state, &claims);

    let db = state.clone();
    let caller = claims.sub.to_string();
    let rows = tokio::task::spawn_blocking(move || {
        if admin {
            db.db.list_all_messages()
        } else {
            db.db.list_messages_for_user(&caller)
        }
    })
    .await
    .map_err(ApiError::internal)??;

    let messages = rows.into_iter().map(message_view).collect();

    Ok(Json(ListMessagesResponse { messages, is_admin: admin }))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_message_write(&state, &claims, req.message_id).await?;

    let db = state.clone();
    let changed = tokio::task::spawn_blocking(move || {
        db.db.set_message_status(req.message_id, req.status.as_str())
    })
    .await
    .map_err(ApiError::internal)??;
    if !changed {
        return Err(ApiError::NotFound("Message not found"));
    }

    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub id: Option<i64>,
}

pub async fn delete_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(params): ApiQuery<DeleteParams>,
) -> Result<impl IntoResponse, ApiError> {
    let id = params
        .id
        .ok_or_else(|| ApiError::Validation("Message ID is required".into()))?;

    authorize_message_write(&state, &claims, id).await?;

    let db = state.clone();
    let removed = tokio::task::spawn_blocking(move || db.db.delete_message(id))
        .await
        .map_err(ApiError::internal)??;
    if !removed {
        return Err(ApiError::NotFound("Message not found"));
    }

    Ok(Json(json!({ "success": true })))
}

/// Owner-or-admin gate shared by status changes and deletes.
async fn authorize_message_write(
    state: &AppState,
    claims: &Claims,
    message_id: i64,
) -> Result<(), ApiError> {
    let db = state.clone();
    let owner = tokio::task::spawn_blocking(move || db.db.get_message_owner(message_id))
        .await
        .map_err(ApiError::internal)??
        .ok_or(ApiError::NotFound("Message not found"))?;

    if owner != claims.sub.to_string() && !is_admin(state, claims) {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

fn message_view(row: MessageRow) -> MessageView {
    MessageView {
        id: row.id,
        user_id: parse_user_id(&row.user_id, row.id),
        user_email: row.user_email,
        user_name: row.user_name,
        title: row.title,
        content: row.content,
        category: Category::parse(&row.category).unwrap_or_else(|| {
            warn!("Corrupt category '{}' on message {}", row.category, row.id);
            Category::General
        }),
        priority: Priority::parse(&row.priority).unwrap_or_else(|| {
            warn!("Corrupt priority '{}' on message {}", row.priority, row.id);
            Priority::Medium
        }),
        status: Status::parse(&row.status).unwrap_or_else(|| {
            warn!("Corrupt status '{}' on message {}", row.status, row.id);
            Status::Pending
        }),
        like_count: row.like_count,
        created_at: parse_timestamp(&row.created_at, "message created_at"),
        updated_at: parse_timestamp(&row.updated_at, "message updated_at"),
    }
}

pub(crate) fn parse_user_id(raw: &str, message_id: i64) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt user_id '{}' on message {}: {}", raw, message_id, e);
        Uuid::default()
    })
}
