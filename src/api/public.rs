//! Anonymous catalogue: home page, filtered listing, detail, reader, and the
//! category/tag facet pages. Only published books are visible here.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::IntoParams;

use super::error_response;
use crate::domain::PublicBookQuery;
use crate::infrastructure::AppState;

#[utoipa::path(
    get,
    path = "/api/home",
    responses(
        (status = 200, description = "Latest published books with top categories and tags")
    )
)]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let latest = match state.book_repo.latest_published(9).await {
        Ok(books) => books,
        Err(e) => return error_response(e),
    };
    let categories = match state.category_repo.list_with_book_counts(Some(8)).await {
        Ok(cats) => cats,
        Err(e) => return error_response(e),
    };
    let tags = match state.tag_repo.list_with_book_counts(Some(12)).await {
        Ok(tags) => tags,
        Err(e) => return error_response(e),
    };

    (
        StatusCode::OK,
        Json(json!({
            "latest": latest,
            "categories": categories,
            "tags": tags
        })),
    )
        .into_response()
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct BookListQuery {
    /// Case-insensitive substring over title, author and description
    pub q: Option<String>,
    /// Category slug
    pub cat: Option<String>,
    /// Tag slug
    pub tag: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/books",
    params(BookListQuery),
    responses(
        (status = 200, description = "Published books matching the filters, newest first")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<BookListQuery>,
) -> impl IntoResponse {
    let books = match state
        .book_repo
        .list_public(PublicBookQuery {
            q: params.q.clone(),
            category: params.cat.clone(),
            tag: params.tag.clone(),
        })
        .await
    {
        Ok(books) => books,
        Err(e) => return error_response(e),
    };

    // Facet sidebars: every category, the 30 most used tags
    let categories = match state.category_repo.list_with_book_counts(None).await {
        Ok(cats) => cats,
        Err(e) => return error_response(e),
    };
    let tags = match state.tag_repo.list_with_book_counts(Some(30)).await {
        Ok(tags) => tags,
        Err(e) => return error_response(e),
    };

    (
        StatusCode::OK,
        Json(json!({
            "books": books,
            "total": books.len(),
            "q": params.q,
            "selected_cat": params.cat,
            "selected_tag": params.tag,
            "categories": categories,
            "tags": tags
        })),
    )
        .into_response()
}

pub async fn book_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    match state.book_repo.find_published_by_slug(&slug).await {
        Ok(Some(book)) => (StatusCode::OK, Json(book)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Book not found" })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Inline reader payload: the stored text content plus the PDF url, for the
/// front end's reader view.
pub async fn book_read(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    match state.book_repo.reader(&slug).await {
        Ok(Some(book)) => (
            StatusCode::OK,
            Json(json!({
                "title": book.title,
                "slug": book.slug,
                "content": book.content,
                "pdf_url": book.pdf_url
            })),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Book not found" })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn category_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    let category = match state.category_repo.find_by_slug(&slug).await {
        Ok(Some(c)) => c,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Category not found" })),
            )
                .into_response();
        }
        Err(e) => return error_response(e),
    };

    match state.book_repo.published_in_category(category.id).await {
        Ok(books) => (
            StatusCode::OK,
            Json(json!({
                "category": { "id": category.id, "name": category.name, "slug": category.slug },
                "books": books
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn tag_page(State(state): State<AppState>, Path(slug): Path<String>) -> impl IntoResponse {
    let tag = match state.tag_repo.find_by_slug(&slug).await {
        Ok(Some(t)) => t,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Tag not found" })),
            )
                .into_response();
        }
        Err(e) => return error_response(e),
    };

    match state.book_repo.published_with_tag(tag.id).await {
        Ok(books) => (
            StatusCode::OK,
            Json(json!({
                "tag": { "id": tag.id, "name": tag.name, "slug": tag.slug },
                "books": books
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
