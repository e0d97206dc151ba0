use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use soapbox_db::models::{LikeOutcome, UnlikeOutcome};
use soapbox_types::api::{Claims, LikeResponse};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn like_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user_id = claims.sub.to_string();
    let outcome = tokio::task::spawn_blocking(move || db.db.like_message(&user_id, message_id))
        .await
        .map_err(ApiError::internal)??;

    match outcome {
        LikeOutcome::Liked(like_count) => Ok(Json(LikeResponse { liked: true, like_count })),
        LikeOutcome::AlreadyLiked => Err(ApiError::Conflict("Message already liked")),
        LikeOutcome::NotFound => Err(ApiError::NotFound("Message not found")),
    }
}

pub async fn unlike_message(
    State(state): State<AppState>,
    Path(message_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user_id = claims.sub.to_string();
    let outcome = tokio::task::spawn_blocking(move || db.db.unlike_message(&user_id, message_id))
        .await
        .map_err(ApiError::internal)??;

    match outcome {
        UnlikeOutcome::Unliked(like_count) => Ok(Json(LikeResponse { liked: false, like_count })),
        UnlikeOutcome::NotLiked => Err(ApiError::NotFound("Like not found")),
        UnlikeOutcome::NotFound => Err(ApiError::NotFound("Message not found")),
    }
}
