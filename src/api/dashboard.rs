//! Staff dashboard: sitewide stats, the all-books admin list, and category
//! administration. Every handler checks the staff role first.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use super::error_response;
use crate::auth::Claims;
use crate::infrastructure::AppState;

fn staff_only() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(json!({ "error": "Staff only" })),
    )
        .into_response()
}

pub async fn stats(claims: Claims, State(state): State<AppState>) -> impl IntoResponse {
    if !claims.is_staff() {
        return staff_only();
    }

    let site = match state.book_repo.site_stats().await {
        Ok(site) => site,
        Err(e) => return error_response(e),
    };
    let top_categories = match state.category_repo.list_with_book_counts(Some(8)).await {
        Ok(cats) => cats,
        Err(e) => return error_response(e),
    };

    (
        StatusCode::OK,
        Json(json!({
            "total_books": site.total_books,
            "published": site.published,
            "drafts": site.drafts,
            "total_users": site.total_users,
            "top_categories": top_categories
        })),
    )
        .into_response()
}

#[derive(Deserialize)]
pub struct AdminBooksQuery {
    pub q: Option<String>,
}

pub async fn list_books(
    claims: Claims,
    State(state): State<AppState>,
    Query(params): Query<AdminBooksQuery>,
) -> impl IntoResponse {
    if !claims.is_staff() {
        return staff_only();
    }

    match state.book_repo.admin_list(params.q.as_deref()).await {
        Ok(books) => (
            StatusCode::OK,
            Json(json!({
                "books": books,
                "total": books.len(),
                "q": params.q
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn list_categories(claims: Claims, State(state): State<AppState>) -> impl IntoResponse {
    if !claims.is_staff() {
        return staff_only();
    }

    match state.category_repo.list_with_book_counts(None).await {
        Ok(categories) => (StatusCode::OK, Json(json!({ "categories": categories }))).into_response(),
        Err(e) => error_response(e),
    }
}

#[derive(Deserialize)]
pub struct CreateCategoryRequest {
    name: String,
}

pub async fn create_category(
    claims: Claims,
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    if !claims.is_staff() {
        return staff_only();
    }

    match state.category_repo.create(&payload.name).await {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(e) => error_response(e),
    }
}
