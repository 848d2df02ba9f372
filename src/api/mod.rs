pub mod auth;
pub mod dashboard;
pub mod health;
pub mod me;
pub mod public;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde_json::json;

use crate::domain::DomainError;
use crate::infrastructure::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Accounts
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Public catalogue
        .route("/home", get(public::home))
        .route("/books", get(public::list_books))
        .route("/books/:slug", get(public::book_detail))
        .route("/books/:slug/read", get(public::book_read))
        .route("/categories/:slug", get(public::category_page))
        .route("/tags/:slug", get(public::tag_page))
        // Owner dashboard
        .route("/me/dashboard", get(me::dashboard))
        .route("/me/books", post(me::create_book))
        .route(
            "/me/books/:id",
            put(me::update_book).delete(me::delete_book),
        )
        // Staff dashboard
        .route("/dashboard", get(dashboard::stats))
        .route("/dashboard/books", get(dashboard::list_books))
        .route(
            "/dashboard/categories",
            get(dashboard::list_categories).post(dashboard::create_category),
        )
        .with_state(state)
}

/// Map a domain failure onto the response taxonomy: 404 for anything outside
/// the caller's view, 403 for denied edits, 422 for bad input, 500 with a
/// logged detail for the rest.
pub(crate) fn error_response(err: DomainError) -> Response {
    match err {
        DomainError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Not found" })),
        )
            .into_response(),
        DomainError::Forbidden => (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Not allowed" })),
        )
            .into_response(),
        DomainError::Validation(msg) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": msg })),
        )
            .into_response(),
        DomainError::Database(msg) | DomainError::Internal(msg) => {
            tracing::error!("request failed: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}
