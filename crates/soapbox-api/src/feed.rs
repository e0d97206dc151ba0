use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::Deserialize;
use tracing::warn;

use soapbox_types::api::{Claims, FeedMessage, FeedResponse, Pagination};
use soapbox_types::models::Category;

use crate::auth::AppState;
use crate::error::{ApiError, ApiQuery};
use crate::messages::parse_user_id;
use crate::parse_timestamp;

const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

/// Public feed: pending and completed messages only, most-liked first,
/// newest first within a like count. Read-only.
pub async fn get_feed(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FeedQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.max(1);
    let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
    // u64 arithmetic: page is caller-controlled and u32 * u32 can overflow
    let offset = u64::from(page - 1) * u64::from(limit);

    let db = state.clone();
    let caller = claims.sub.to_string();
    let (rows, total) =
        tokio::task::spawn_blocking(move || db.db.feed_page(&caller, limit, offset))
            .await
            .map_err(ApiError::internal)??;

    let messages: Vec<FeedMessage> = rows
        .into_iter()
        .map(|row| FeedMessage {
            id: row.id,
            user_id: parse_user_id(&row.user_id, row.id),
            user_name: row.user_name,
            title: row.title,
            content: row.content,
            category: Category::parse(&row.category).unwrap_or_else(|| {
                warn!("Corrupt category '{}' on message {}", row.category, row.id);
                Category::General
            }),
            like_count: row.like_count,
            created_at: parse_timestamp(&row.created_at, "feed created_at"),
            is_liked_by_user: row.is_liked_by_user,
        })
        .collect();

    let total_pages = (total + i64::from(limit) - 1) / i64::from(limit);

    Ok(Json(FeedResponse {
        messages,
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages,
        },
    }))
}
