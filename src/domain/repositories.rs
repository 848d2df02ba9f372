//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;

use super::DomainError;
use crate::models::book::{self, Book};
use crate::models::{category, tag};

/// Filters for the public catalogue listing. All three combine with AND;
/// empty/absent values are ignored.
#[derive(Debug, Default, Clone)]
pub struct PublicBookQuery {
    /// Case-insensitive substring over title, author name and description
    pub q: Option<String>,
    /// Category slug
    pub category: Option<String>,
    /// Tag slug
    pub tag: Option<String>,
}

/// Fields accepted when an owner creates a book.
#[derive(Debug, Default, Clone)]
pub struct NewBook {
    pub title: String,
    pub author_name: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<i32>,
    pub cover_path: Option<String>,
    pub pdf_path: Option<String>,
    pub is_published: bool,
    pub uploaded_by: i32,
    /// Parsed tag names, already trimmed and non-empty
    pub tag_names: Vec<String>,
}

/// Fields accepted when editing a book. Slug, uploader and created_at are
/// never touched by an update; `cover_path`/`pdf_path` of `None` keep the
/// stored files.
#[derive(Debug, Default, Clone)]
pub struct BookUpdate {
    pub title: String,
    pub author_name: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<i32>,
    pub cover_path: Option<String>,
    pub pdf_path: Option<String>,
    pub is_published: bool,
    pub tag_names: Vec<String>,
}

/// Owner dashboard aggregates, scoped to one uploader.
#[derive(Debug)]
pub struct OwnerStats {
    pub total: u64,
    pub published: u64,
    pub drafts: u64,
    pub recent: Vec<Book>,
}

/// Sitewide aggregates for the staff dashboard. `total_users` counts distinct
/// uploaders; accounts that never uploaded anything are not counted.
#[derive(Debug)]
pub struct SiteStats {
    pub total_books: u64,
    pub published: u64,
    pub drafts: u64,
    pub total_users: u64,
}

/// Category facet with its live book count. Counts include drafts even
/// though the listings themselves are published-only.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CategoryWithCount {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub total: u64,
}

/// Tag facet with its live book count (drafts included, as above).
#[derive(Debug, Clone, serde::Serialize)]
pub struct TagWithCount {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub total: u64,
}

/// Repository trait for Book entity
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Published books matching the public filters, newest first.
    async fn list_public(&self, query: PublicBookQuery) -> Result<Vec<Book>, DomainError>;

    /// Most recent published books for the home page.
    async fn latest_published(&self, limit: u64) -> Result<Vec<Book>, DomainError>;

    /// Published book by slug; unpublished books are invisible here.
    async fn find_published_by_slug(&self, slug: &str) -> Result<Option<Book>, DomainError>;

    /// Reader payload: like `find_published_by_slug` but with the inline
    /// text content included.
    async fn reader(&self, slug: &str) -> Result<Option<Book>, DomainError>;

    /// Raw row by id, any publish state. Used for ownership checks before
    /// mutation.
    async fn find_model(&self, id: i32) -> Result<Option<book::Model>, DomainError>;

    /// Published books in a category, newest first.
    async fn published_in_category(&self, category_id: i32) -> Result<Vec<Book>, DomainError>;

    /// Published books carrying a tag, newest first.
    async fn published_with_tag(&self, tag_id: i32) -> Result<Vec<Book>, DomainError>;

    /// Create a book: assigns the slug (numbered on collision) and fans the
    /// tag names out into get-or-create tag rows.
    async fn create(&self, input: NewBook) -> Result<Book, DomainError>;

    /// Update a book in place. Tags from `tag_names` are added; existing
    /// associations are kept.
    async fn update(&self, id: i32, input: BookUpdate) -> Result<Book, DomainError>;

    /// Delete a book and its tag associations.
    async fn delete(&self, id: i32) -> Result<(), DomainError>;

    /// Aggregates for one owner's dashboard.
    async fn owner_stats(&self, user_id: i32, recent_limit: u64)
    -> Result<OwnerStats, DomainError>;

    /// Sitewide aggregates for the staff dashboard.
    async fn site_stats(&self) -> Result<SiteStats, DomainError>;

    /// All books, any state, newest first, with uploader usernames; `q`
    /// matches title or uploader username.
    async fn admin_list(&self, q: Option<&str>) -> Result<Vec<Book>, DomainError>;
}

/// Repository trait for Category entity
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Categories with book counts, most used first.
    async fn list_with_book_counts(
        &self,
        limit: Option<u64>,
    ) -> Result<Vec<CategoryWithCount>, DomainError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<category::Model>, DomainError>;

    /// Create a category; the slug is derived from the name. A duplicate
    /// name or an unsluggable one is a validation failure.
    async fn create(&self, name: &str) -> Result<category::Model, DomainError>;
}

/// Repository trait for Tag entity
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Tags with book counts, most used first.
    async fn list_with_book_counts(
        &self,
        limit: Option<u64>,
    ) -> Result<Vec<TagWithCount>, DomainError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<tag::Model>, DomainError>;

    /// Find a tag by exact name or create it, deriving the slug.
    async fn get_or_create(&self, name: &str) -> Result<tag::Model, DomainError>;
}
