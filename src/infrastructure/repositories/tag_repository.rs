//! SeaORM implementation of TagRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, SqlErr,
};

use crate::domain::{DomainError, TagRepository, TagWithCount};
use crate::models::{book_tags, tag};
use crate::slug;

/// Find a tag by exact name or insert it. Racing creators both land on the
/// same row: the loser's UNIQUE violation is resolved by re-reading.
pub(crate) async fn get_or_create_tag(
    db: &DatabaseConnection,
    name: &str,
) -> Result<tag::Model, DomainError> {
    if let Some(existing) = tag::Entity::find()
        .filter(tag::Column::Name.eq(name))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let tag_slug = slug::slugify(name);
    if tag_slug.is_empty() {
        return Err(DomainError::Validation(format!(
            "tag name '{}' contains no sluggable characters",
            name
        )));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let new_tag = tag::ActiveModel {
        name: Set(name.to_owned()),
        slug: Set(tag_slug),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    match new_tag.insert(db).await {
        Ok(model) => Ok(model),
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            // Either we lost a race on the name, or two distinct names
            // derive the same slug. Only the first case has a row to return.
            tag::Entity::find()
                .filter(tag::Column::Name.eq(name))
                .one(db)
                .await?
                .ok_or_else(|| {
                    DomainError::Validation(format!(
                        "tag name '{}' collides with an existing tag's slug",
                        name
                    ))
                })
        }
        Err(e) => Err(e.into()),
    }
}

/// SeaORM-based implementation of TagRepository
pub struct SeaOrmTagRepository {
    db: DatabaseConnection,
}

impl SeaOrmTagRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TagRepository for SeaOrmTagRepository {
    async fn list_with_book_counts(
        &self,
        limit: Option<u64>,
    ) -> Result<Vec<TagWithCount>, DomainError> {
        let tags = tag::Entity::find().all(&self.db).await?;

        // Counts include drafts as well as published books.
        let mut counted = Vec::with_capacity(tags.len());
        for t in tags {
            let total = book_tags::Entity::find()
                .filter(book_tags::Column::TagId.eq(t.id))
                .count(&self.db)
                .await?;
            counted.push(TagWithCount {
                id: t.id,
                name: t.name,
                slug: t.slug,
                total,
            });
        }

        counted.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
        if let Some(limit) = limit {
            counted.truncate(limit as usize);
        }
        Ok(counted)
    }

    async fn find_by_slug(&self, tag_slug: &str) -> Result<Option<tag::Model>, DomainError> {
        Ok(tag::Entity::find()
            .filter(tag::Column::Slug.eq(tag_slug))
            .one(&self.db)
            .await?)
    }

    async fn get_or_create(&self, name: &str) -> Result<tag::Model, DomainError> {
        get_or_create_tag(&self.db, name).await
    }
}
