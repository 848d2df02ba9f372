use crate::auth::{Claims, create_jwt, hash_password, verify_password};
use crate::models::user;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct SignupRequest {
    username: String,
    password: String,
}

/// Create an account and log it straight in: the response carries the token
/// the new owner uses against the dashboard routes.
pub async fn signup(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<SignupRequest>,
) -> impl IntoResponse {
    let username = payload.username.trim().to_string();
    if username.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": { "username": "username is required" } })),
        )
            .into_response();
    }
    if payload.password.chars().count() < 8 {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": { "password": "password must be at least 8 characters" } })),
        )
            .into_response();
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!("password hashing failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response();
        }
    };

    let now = chrono::Utc::now().to_rfc3339();
    let account = user::ActiveModel {
        username: Set(username),
        password_hash: Set(password_hash),
        role: Set(user::ROLE_USER.to_owned()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    match account.insert(&db).await {
        Ok(model) => match create_jwt(&model) {
            Ok(token) => (
                StatusCode::CREATED,
                Json(json!({
                    "message": "Account created",
                    "token": token,
                    "username": model.username
                })),
            )
                .into_response(),
            Err(e) => {
                tracing::error!("token creation failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        },
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": { "username": "username is already taken" } })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

pub async fn login(
    State(db): State<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    tracing::info!("Login attempt for user: {}", payload.username);

    let account = match user::Entity::find()
        .filter(user::Column::Username.eq(&payload.username))
        .one(&db)
        .await
    {
        Ok(Some(u)) => u,
        _ => {
            tracing::warn!("User not found: {}", payload.username);
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid credentials" })),
            )
                .into_response();
        }
    };

    match verify_password(&payload.password, &account.password_hash) {
        Ok(true) => match create_jwt(&account) {
            Ok(token) => (StatusCode::OK, Json(json!({ "token": token }))).into_response(),
            Err(e) => {
                tracing::error!("token creation failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        },
        _ => {
            tracing::warn!("Password verification failed for user: {}", account.username);
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid credentials" })),
            )
                .into_response()
        }
    }
}

pub async fn me(claims: Claims, State(db): State<DatabaseConnection>) -> impl IntoResponse {
    let account = user::Entity::find_by_id(claims.uid)
        .one(&db)
        .await
        .unwrap_or(None);
    match account {
        Some(account) => (
            StatusCode::OK,
            Json(json!({
                "id": account.id,
                "username": account.username,
                "role": account.role,
            })),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "User not found" })),
        )
            .into_response(),
    }
}
