//! Owner dashboard: aggregate stats plus create/update/delete on the
//! caller's own books. Staff pass the same ownership check everywhere.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sea_orm::EntityTrait;
use serde_json::json;

use super::error_response;
use crate::auth::Claims;
use crate::domain::{BookUpdate, DomainError, NewBook, can_edit};
use crate::infrastructure::AppState;
use crate::models::category;

pub async fn dashboard(claims: Claims, State(state): State<AppState>) -> impl IntoResponse {
    match state.book_repo.owner_stats(claims.uid, 8).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(json!({
                "total": stats.total,
                "published": stats.published,
                "drafts": stats.drafts,
                "books": stats.recent
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// Split a free-text tag field on commas, trimming whitespace and dropping
/// empty entries. Duplicates survive here; get-or-create and the composite
/// primary key on the association table make them harmless.
pub(crate) fn parse_tags_text(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_string())
        .collect()
}

/// Book form fields as read off the multipart body. Field errors accumulate
/// instead of aborting so the client gets the whole picture at once.
#[derive(Default)]
struct BookFormData {
    title: String,
    author_name: Option<String>,
    description: Option<String>,
    content: Option<String>,
    category_id: Option<i32>,
    is_published: bool,
    tag_names: Vec<String>,
    cover_path: Option<String>,
    pdf_path: Option<String>,
    errors: BTreeMap<String, String>,
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

async fn read_book_form(multipart: &mut Multipart, state: &AppState) -> BookFormData {
    let mut form = BookFormData::default();

    while let Some(field) = multipart.next_field().await.unwrap_or(None) {
        let Some(name) = field.name().map(|n| n.to_string()) else {
            continue;
        };
        match name.as_str() {
            "title" => {
                if let Ok(value) = field.text().await {
                    form.title = value.trim().to_string();
                }
            }
            "author_name" => {
                if let Ok(value) = field.text().await {
                    form.author_name = non_empty(value);
                }
            }
            "description" => {
                if let Ok(value) = field.text().await {
                    form.description = non_empty(value);
                }
            }
            "content" => {
                if let Ok(value) = field.text().await {
                    form.content = non_empty(value);
                }
            }
            "tags_text" => {
                if let Ok(value) = field.text().await {
                    form.tag_names = parse_tags_text(&value);
                }
            }
            "category_id" => {
                let Ok(value) = field.text().await else {
                    continue;
                };
                let value = value.trim();
                if value.is_empty() {
                    continue; // no category chosen
                }
                match value.parse::<i32>() {
                    Ok(id) => match category::Entity::find_by_id(id).one(state.db()).await {
                        Ok(Some(_)) => form.category_id = Some(id),
                        Ok(None) => {
                            form.errors
                                .insert("category_id".to_string(), "unknown category".to_string());
                        }
                        Err(e) => {
                            tracing::error!("category lookup failed: {}", e);
                            form.errors.insert(
                                "category_id".to_string(),
                                "could not verify category".to_string(),
                            );
                        }
                    },
                    Err(_) => {
                        form.errors
                            .insert("category_id".to_string(), "must be a number".to_string());
                    }
                }
            }
            "is_published" => {
                if let Ok(value) = field.text().await {
                    form.is_published = matches!(value.trim(), "true" | "on" | "1");
                }
            }
            "cover" => {
                let data = field.bytes().await.unwrap_or_default();
                if data.is_empty() {
                    continue;
                }
                match state.storage().save_cover(&data).await {
                    Ok(rel) => form.cover_path = Some(rel),
                    Err(DomainError::Validation(msg)) => {
                        form.errors.insert("cover".to_string(), msg);
                    }
                    Err(e) => {
                        tracing::error!("cover upload failed: {}", e);
                        form.errors
                            .insert("cover".to_string(), "could not store file".to_string());
                    }
                }
            }
            "pdf_file" => {
                let data = field.bytes().await.unwrap_or_default();
                if data.is_empty() {
                    continue;
                }
                match state.storage().save_pdf(&data).await {
                    Ok(rel) => form.pdf_path = Some(rel),
                    Err(DomainError::Validation(msg)) => {
                        form.errors.insert("pdf_file".to_string(), msg);
                    }
                    Err(e) => {
                        tracing::error!("pdf upload failed: {}", e);
                        form.errors
                            .insert("pdf_file".to_string(), "could not store file".to_string());
                    }
                }
            }
            _ => {}
        }
    }

    if form.title.is_empty() {
        form.errors
            .insert("title".to_string(), "title is required".to_string());
    }

    form
}

pub async fn create_book(
    claims: Claims,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let form = read_book_form(&mut multipart, &state).await;
    if !form.errors.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": form.errors })),
        )
            .into_response();
    }

    let input = NewBook {
        title: form.title,
        author_name: form.author_name,
        description: form.description,
        content: form.content,
        category_id: form.category_id,
        cover_path: form.cover_path,
        pdf_path: form.pdf_path,
        is_published: form.is_published,
        uploaded_by: claims.uid,
        tag_names: form.tag_names,
    };

    match state.book_repo.create(input).await {
        Ok(book) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Book created successfully",
                "book": book
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn update_book(
    claims: Claims,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let book_row = match state.book_repo.find_model(id).await {
        Ok(Some(row)) => row,
        Ok(None) => return error_response(DomainError::NotFound),
        Err(e) => return error_response(e),
    };
    if !can_edit(&claims, &book_row) {
        return error_response(DomainError::Forbidden);
    }

    let form = read_book_form(&mut multipart, &state).await;
    if !form.errors.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": form.errors })),
        )
            .into_response();
    }

    let input = BookUpdate {
        title: form.title,
        author_name: form.author_name,
        description: form.description,
        content: form.content,
        category_id: form.category_id,
        cover_path: form.cover_path,
        pdf_path: form.pdf_path,
        is_published: form.is_published,
        tag_names: form.tag_names,
    };

    match state.book_repo.update(id, input).await {
        Ok(book) => (
            StatusCode::OK,
            Json(json!({
                "message": "Book updated successfully",
                "book": book
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn delete_book(
    claims: Claims,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> impl IntoResponse {
    let book_row = match state.book_repo.find_model(id).await {
        Ok(Some(row)) => row,
        Ok(None) => return error_response(DomainError::NotFound),
        Err(e) => return error_response(e),
    };
    if !can_edit(&claims, &book_row) {
        return error_response(DomainError::Forbidden);
    }

    match state.book_repo.delete(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Book deleted successfully" })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_tags_text;

    #[test]
    fn tags_text_is_trimmed_and_empties_dropped() {
        assert_eq!(
            parse_tags_text("bayt, python , , python"),
            vec!["bayt", "python", "python"]
        );
        assert_eq!(parse_tags_text("  "), Vec::<String>::new());
        assert_eq!(parse_tags_text(""), Vec::<String>::new());
        assert_eq!(parse_tags_text("solo"), vec!["solo"]);
    }
}
