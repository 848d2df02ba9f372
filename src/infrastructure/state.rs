//! Application state containing repositories and shared resources

use sea_orm::DatabaseConnection;
use std::path::PathBuf;
use std::sync::Arc;

use crate::domain::{BookRepository, CategoryRepository, TagRepository};
use crate::infrastructure::{
    SeaOrmBookRepository, SeaOrmCategoryRepository, SeaOrmTagRepository,
};
use crate::storage::Storage;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    storage: Storage,
    /// Book repository
    pub book_repo: Arc<dyn BookRepository>,
    /// Category repository
    pub category_repo: Arc<dyn CategoryRepository>,
    /// Tag repository
    pub tag_repo: Arc<dyn TagRepository>,
}

impl AppState {
    /// Create a new AppState with all repositories initialized
    pub fn new(db: DatabaseConnection, uploads_dir: impl Into<PathBuf>) -> Self {
        let book_repo = Arc::new(SeaOrmBookRepository::new(db.clone()));
        let category_repo = Arc::new(SeaOrmCategoryRepository::new(db.clone()));
        let tag_repo = Arc::new(SeaOrmTagRepository::new(db.clone()));

        Self {
            db,
            storage: Storage::new(uploads_dir),
            book_repo,
            category_repo,
            tag_repo,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

// Allow handlers that only talk to the database to extract it directly
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
