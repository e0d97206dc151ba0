use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use soapbox_db::Database;
use soapbox_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use soapbox_types::models::Role;

use crate::error::{ApiError, ApiJson};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    /// Bootstrap admin address; a caller with this email is an admin even
    /// before anyone promotes their role.
    pub admin_email: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Validate input
    if !req.email.contains('@') || req.email.len() > 255 {
        return Err(ApiError::Validation("A valid email is required".into()));
    }
    if req.name.trim().is_empty() {
        return Err(ApiError::Validation("Name is required".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    let db = state.clone();
    let email = req.email.clone();
    let taken = tokio::task::spawn_blocking(move || db.db.get_user_by_email(&email))
        .await
        .map_err(ApiError::internal)??
        .is_some();
    if taken {
        return Err(ApiError::EmailTaken);
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(ApiError::internal)?
        .to_string();

    let user_id = Uuid::new_v4();

    let db = state.clone();
    let (id, email, name) = (user_id.to_string(), req.email.clone(), req.name.clone());
    tokio::task::spawn_blocking(move || db.db.create_user(&id, &email, &name, &password_hash))
        .await
        .map_err(ApiError::internal)??;

    let token = create_token(&state.jwt_secret, user_id, &req.email, &req.name, Role::Member)?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let email = req.email.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_email(&email))
        .await
        .map_err(ApiError::internal)??
        .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash = PasswordHash::new(&user.password).map_err(ApiError::internal)?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id: Uuid = user.id.parse().map_err(ApiError::internal)?;
    let role = Role::parse(&user.role).unwrap_or(Role::Member);

    let token = create_token(&state.jwt_secret, user_id, &user.email, &user.name, role)?;

    Ok(Json(LoginResponse {
        user_id,
        email: user.email,
        name: user.name,
        token,
    }))
}

fn create_token(
    secret: &str,
    user_id: Uuid,
    email: &str,
    name: &str,
    role: Role,
) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        name: name.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(ApiError::internal)?;

    Ok(token)
}
