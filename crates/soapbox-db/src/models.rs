//! Database row types — these map directly to SQLite rows.
//! Distinct from the soapbox-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: String,
    pub subscription_status: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: i64,
    pub user_id: String,
    pub user_email: String,
    pub user_name: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub priority: String,
    pub status: String,
    pub like_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

pub struct FeedRow {
    pub id: i64,
    pub user_id: String,
    pub user_name: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub like_count: i64,
    pub created_at: String,
    pub is_liked_by_user: bool,
}

/// Result of the transactional count-then-insert submission.
#[derive(Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created { id: i64, remaining: i64 },
    QuotaExceeded { limit: i64, current: i64 },
}

#[derive(Debug, PartialEq, Eq)]
pub enum LikeOutcome {
    Liked(i64),
    AlreadyLiked,
    NotFound,
}

#[derive(Debug, PartialEq, Eq)]
pub enum UnlikeOutcome {
    Unliked(i64),
    NotLiked,
    NotFound,
}
