use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Category, Priority, Role, Status};

// -- JWT Claims --

/// JWT claims carried on every authenticated request. Canonical definition
/// lives here so the middleware and the handlers agree on one shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub token: String,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitMessageRequest {
    pub title: String,
    pub content: String,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitMessageResponse {
    pub message_id: i64,
    pub remaining_slots: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: i64,
    pub user_id: Uuid,
    pub user_email: String,
    pub user_name: String,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub priority: Priority,
    pub status: Status,
    pub like_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageView>,
    pub is_admin: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateStatusRequest {
    pub message_id: i64,
    pub status: Status,
}

// -- Likes --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: i64,
}

// -- Feed --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMessage {
    pub id: i64,
    pub user_id: Uuid,
    pub user_name: String,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub like_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub is_liked_by_user: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub messages: Vec<FeedMessage>,
    pub pagination: Pagination,
}

// -- Admin console --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_messages: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub subscription_status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub stats: UserStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUsersResponse {
    pub users: Vec<AdminUserView>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdminUpdateUserRequest {
    pub user_id: Uuid,
    pub role: Option<Role>,
    pub subscription_status: Option<String>,
}
