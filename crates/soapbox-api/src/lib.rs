pub mod admin;
pub mod auth;
pub mod error;
pub mod feed;
pub mod likes;
pub mod messages;
pub mod middleware;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post},
};
use tracing::warn;

use auth::AppState;

/// Full HTTP surface. Public auth routes plus the JWT-protected API; the
/// server binary and the integration tests share this one assembly.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected = Router::new()
        .route(
            "/messages",
            post(messages::submit_message)
                .get(messages::list_messages)
                .put(messages::update_status)
                .delete(messages::delete_message),
        )
        .route(
            "/messages/{id}/like",
            post(likes::like_message).delete(likes::unlike_message),
        )
        .route("/feed", get(feed::get_feed))
        .route(
            "/admin/users",
            get(admin::list_users)
                .patch(admin::update_user)
                .delete(admin::delete_user),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ))
        .with_state(state);

    Router::new().merge(public).merge(protected)
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC when the RFC 3339 parse fails.
pub(crate) fn parse_timestamp(raw: &str, context: &str) -> chrono::DateTime<chrono::Utc> {
    raw.parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {}: {}", raw, context, e);
            chrono::DateTime::default()
        })
}
