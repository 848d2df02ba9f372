//! SeaORM implementation of CategoryRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, SqlErr,
};

use crate::domain::{CategoryRepository, CategoryWithCount, DomainError};
use crate::models::{book, category};
use crate::slug;

/// SeaORM-based implementation of CategoryRepository
pub struct SeaOrmCategoryRepository {
    db: DatabaseConnection,
}

impl SeaOrmCategoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryRepository for SeaOrmCategoryRepository {
    async fn list_with_book_counts(
        &self,
        limit: Option<u64>,
    ) -> Result<Vec<CategoryWithCount>, DomainError> {
        let categories = category::Entity::find().all(&self.db).await?;

        // Counts include drafts as well as published books.
        let mut counted = Vec::with_capacity(categories.len());
        for c in categories {
            let total = book::Entity::find()
                .filter(book::Column::CategoryId.eq(c.id))
                .count(&self.db)
                .await?;
            counted.push(CategoryWithCount {
                id: c.id,
                name: c.name,
                slug: c.slug,
                total,
            });
        }

        counted.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
        if let Some(limit) = limit {
            counted.truncate(limit as usize);
        }
        Ok(counted)
    }

    async fn find_by_slug(
        &self,
        category_slug: &str,
    ) -> Result<Option<category::Model>, DomainError> {
        Ok(category::Entity::find()
            .filter(category::Column::Slug.eq(category_slug))
            .one(&self.db)
            .await?)
    }

    async fn create(&self, name: &str) -> Result<category::Model, DomainError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation("name is required".to_string()));
        }

        let category_slug = slug::slugify(name);
        if category_slug.is_empty() {
            return Err(DomainError::Validation(
                "name contains no sluggable characters".to_string(),
            ));
        }

        let now = chrono::Utc::now().to_rfc3339();
        let new_category = category::ActiveModel {
            name: Set(name.to_owned()),
            slug: Set(category_slug),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        match new_category.insert(&self.db).await {
            Ok(model) => Ok(model),
            // Collisions are a storage-layer constraint here, not resolved
            // with numbered suffixes the way book slugs are.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
                DomainError::Validation(format!("category '{}' already exists", name)),
            ),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;

    #[tokio::test]
    async fn create_derives_slug_once() {
        let db = init_db("sqlite::memory:").await.expect("Failed to init db");
        let repo = SeaOrmCategoryRepository::new(db);

        let created = repo.create("Web Development").await.unwrap();
        assert_eq!(created.slug, "web-development");

        let found = repo.find_by_slug("web-development").await.unwrap();
        assert_eq!(found.unwrap().id, created.id);
    }

    #[tokio::test]
    async fn duplicate_names_fail_validation() {
        let db = init_db("sqlite::memory:").await.expect("Failed to init db");
        let repo = SeaOrmCategoryRepository::new(db);

        repo.create("Fiction").await.unwrap();
        let err = repo.create("Fiction").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
