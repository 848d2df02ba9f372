//! SeaORM implementation of BookRepository

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    Statement,
};

use crate::domain::{
    BookRepository, BookUpdate, DomainError, NewBook, OwnerStats, PublicBookQuery, SiteStats,
};
use crate::models::book::{Book, CategoryRef, TagRef};
use crate::models::{book, book_tags, category, tag, user};
use crate::slug;

use super::tag_repository::get_or_create_tag;

/// Two identical titles can race past the free-slug probe; the UNIQUE
/// constraint rejects the loser and we re-probe this many times before
/// giving up.
const SLUG_INSERT_RETRIES: u32 = 5;

/// SeaORM-based implementation of BookRepository
pub struct SeaOrmBookRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lowest-numbered free slug for a base: `base`, then `base-2`, `base-3`, ...
    async fn next_free_slug(&self, base: &str) -> Result<String, DomainError> {
        let mut attempt = 1u32;
        loop {
            let candidate = slug::numbered(base, attempt);
            let taken = book::Entity::find()
                .filter(book::Column::Slug.eq(&candidate))
                .count(&self.db)
                .await?
                > 0;
            if !taken {
                return Ok(candidate);
            }
            attempt += 1;
        }
    }

    /// Fan parsed tag names out into get-or-create tag rows and associate
    /// them with the book. Adding an existing association is a no-op.
    async fn attach_tags(&self, book_id: i32, names: &[String]) -> Result<(), DomainError> {
        for name in names {
            let tag_row = get_or_create_tag(&self.db, name).await?;
            let link = book_tags::ActiveModel {
                book_id: Set(book_id),
                tag_id: Set(tag_row.id),
            };
            match book_tags::Entity::insert(link)
                .on_conflict(
                    OnConflict::columns([book_tags::Column::BookId, book_tags::Column::TagId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec(&self.db)
                .await
            {
                Ok(_) => {}
                // do_nothing on an existing association
                Err(DbErr::RecordNotInserted) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Convert a row to the response DTO, fetching its category and tags.
    async fn hydrate(&self, model: book::Model) -> Result<Book, DomainError> {
        let tags = model.find_related(tag::Entity).all(&self.db).await?;
        let category_row = match model.category_id {
            Some(id) => category::Entity::find_by_id(id).one(&self.db).await?,
            None => None,
        };

        let mut dto = Book::from(model);
        dto.category = category_row.map(|c| CategoryRef {
            id: c.id,
            name: c.name,
            slug: c.slug,
        });
        dto.tags = tags
            .into_iter()
            .map(|t| TagRef {
                id: t.id,
                name: t.name,
                slug: t.slug,
            })
            .collect();
        Ok(dto)
    }

    async fn hydrate_all(&self, models: Vec<book::Model>) -> Result<Vec<Book>, DomainError> {
        let mut dtos = Vec::with_capacity(models.len());
        for model in models {
            dtos.push(self.hydrate(model).await?);
        }
        Ok(dtos)
    }
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    async fn list_public(&self, query: PublicBookQuery) -> Result<Vec<Book>, DomainError> {
        let mut condition = Condition::all().add(book::Column::IsPublished.eq(true));

        if let Some(q) = &query.q
            && !q.is_empty()
        {
            condition = condition.add(
                Condition::any()
                    .add(book::Column::Title.contains(q))
                    .add(book::Column::AuthorName.contains(q))
                    .add(book::Column::Description.contains(q)),
            );
        }

        if let Some(cat_slug) = &query.category
            && !cat_slug.is_empty()
        {
            let Some(cat) = category::Entity::find()
                .filter(category::Column::Slug.eq(cat_slug))
                .one(&self.db)
                .await?
            else {
                return Ok(Vec::new());
            };
            condition = condition.add(book::Column::CategoryId.eq(cat.id));
        }

        if let Some(tag_slug) = &query.tag
            && !tag_slug.is_empty()
        {
            let Some(tag_row) = tag::Entity::find()
                .filter(tag::Column::Slug.eq(tag_slug))
                .one(&self.db)
                .await?
            else {
                return Ok(Vec::new());
            };
            // Resolving the tag's book ids up front keeps the listing free of
            // join-duplicated rows.
            let book_ids: Vec<i32> = book_tags::Entity::find()
                .filter(book_tags::Column::TagId.eq(tag_row.id))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|link| link.book_id)
                .collect();
            if book_ids.is_empty() {
                return Ok(Vec::new());
            }
            condition = condition.add(book::Column::Id.is_in(book_ids));
        }

        let models = book::Entity::find()
            .filter(condition)
            .order_by_desc(book::Column::CreatedAt)
            .order_by_desc(book::Column::Id)
            .all(&self.db)
            .await?;

        self.hydrate_all(models).await
    }

    async fn latest_published(&self, limit: u64) -> Result<Vec<Book>, DomainError> {
        let models = book::Entity::find()
            .filter(book::Column::IsPublished.eq(true))
            .order_by_desc(book::Column::CreatedAt)
            .order_by_desc(book::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;
        self.hydrate_all(models).await
    }

    async fn find_published_by_slug(&self, book_slug: &str) -> Result<Option<Book>, DomainError> {
        let model = book::Entity::find()
            .filter(book::Column::Slug.eq(book_slug))
            .filter(book::Column::IsPublished.eq(true))
            .one(&self.db)
            .await?;

        match model {
            Some(model) => Ok(Some(self.hydrate(model).await?)),
            None => Ok(None),
        }
    }

    async fn reader(&self, book_slug: &str) -> Result<Option<Book>, DomainError> {
        let model = book::Entity::find()
            .filter(book::Column::Slug.eq(book_slug))
            .filter(book::Column::IsPublished.eq(true))
            .one(&self.db)
            .await?;

        match model {
            Some(model) => {
                let content = model.content.clone();
                let mut dto = self.hydrate(model).await?;
                dto.content = content.or(Some(String::new()));
                Ok(Some(dto))
            }
            None => Ok(None),
        }
    }

    async fn find_model(&self, id: i32) -> Result<Option<book::Model>, DomainError> {
        Ok(book::Entity::find_by_id(id).one(&self.db).await?)
    }

    async fn published_in_category(&self, category_id: i32) -> Result<Vec<Book>, DomainError> {
        let models = book::Entity::find()
            .filter(book::Column::IsPublished.eq(true))
            .filter(book::Column::CategoryId.eq(category_id))
            .order_by_desc(book::Column::CreatedAt)
            .order_by_desc(book::Column::Id)
            .all(&self.db)
            .await?;
        self.hydrate_all(models).await
    }

    async fn published_with_tag(&self, tag_id: i32) -> Result<Vec<Book>, DomainError> {
        let book_ids: Vec<i32> = book_tags::Entity::find()
            .filter(book_tags::Column::TagId.eq(tag_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|link| link.book_id)
            .collect();
        if book_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = book::Entity::find()
            .filter(book::Column::IsPublished.eq(true))
            .filter(book::Column::Id.is_in(book_ids))
            .order_by_desc(book::Column::CreatedAt)
            .order_by_desc(book::Column::Id)
            .all(&self.db)
            .await?;
        self.hydrate_all(models).await
    }

    async fn create(&self, input: NewBook) -> Result<Book, DomainError> {
        let base = slug::slugify(&input.title);
        if base.is_empty() {
            return Err(DomainError::Validation(
                "title must contain at least one letter or digit".to_string(),
            ));
        }

        let now = chrono::Utc::now().to_rfc3339();
        let mut last_err: Option<DbErr> = None;

        for _ in 0..SLUG_INSERT_RETRIES {
            let candidate = self.next_free_slug(&base).await?;

            let new_book = book::ActiveModel {
                title: Set(input.title.clone()),
                slug: Set(candidate.clone()),
                author_name: Set(input.author_name.clone()),
                description: Set(input.description.clone()),
                cover_path: Set(input.cover_path.clone()),
                pdf_path: Set(input.pdf_path.clone()),
                content: Set(input.content.clone()),
                category_id: Set(input.category_id),
                is_published: Set(input.is_published),
                uploaded_by: Set(input.uploaded_by),
                created_at: Set(now.clone()),
                updated_at: Set(now.clone()),
                ..Default::default()
            };

            match new_book.insert(&self.db).await {
                Ok(model) => {
                    self.attach_tags(model.id, &input.tag_names).await?;
                    return self.hydrate(model).await;
                }
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    tracing::warn!("slug '{}' taken concurrently, re-deriving", candidate);
                    last_err = Some(e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DomainError::Database(
            last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "could not assign a unique slug".to_string()),
        ))
    }

    async fn update(&self, id: i32, input: BookUpdate) -> Result<Book, DomainError> {
        let existing = book::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DomainError::NotFound)?;

        // Slug, uploader and created_at stay as first saved.
        let mut active: book::ActiveModel = existing.into();
        active.title = Set(input.title);
        active.author_name = Set(input.author_name);
        active.description = Set(input.description);
        active.content = Set(input.content);
        active.category_id = Set(input.category_id);
        active.is_published = Set(input.is_published);
        if let Some(path) = input.cover_path {
            active.cover_path = Set(Some(path));
        }
        if let Some(path) = input.pdf_path {
            active.pdf_path = Set(Some(path));
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active.update(&self.db).await?;
        self.attach_tags(model.id, &input.tag_names).await?;
        self.hydrate(model).await
    }

    async fn delete(&self, id: i32) -> Result<(), DomainError> {
        let result = book::Entity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound);
        }

        Ok(())
    }

    async fn owner_stats(
        &self,
        user_id: i32,
        recent_limit: u64,
    ) -> Result<OwnerStats, DomainError> {
        let total = book::Entity::find()
            .filter(book::Column::UploadedBy.eq(user_id))
            .count(&self.db)
            .await?;
        let published = book::Entity::find()
            .filter(book::Column::UploadedBy.eq(user_id))
            .filter(book::Column::IsPublished.eq(true))
            .count(&self.db)
            .await?;

        let recent_models = book::Entity::find()
            .filter(book::Column::UploadedBy.eq(user_id))
            .order_by_desc(book::Column::CreatedAt)
            .order_by_desc(book::Column::Id)
            .limit(recent_limit)
            .all(&self.db)
            .await?;

        Ok(OwnerStats {
            total,
            published,
            drafts: total - published,
            recent: self.hydrate_all(recent_models).await?,
        })
    }

    async fn site_stats(&self) -> Result<SiteStats, DomainError> {
        let total_books = book::Entity::find().count(&self.db).await?;
        let published = book::Entity::find()
            .filter(book::Column::IsPublished.eq(true))
            .count(&self.db)
            .await?;

        // "Total users" is really distinct uploaders; accounts that never
        // uploaded a book are not counted.
        let row = self
            .db
            .query_one(Statement::from_string(
                self.db.get_database_backend(),
                "SELECT COUNT(DISTINCT uploaded_by) AS cnt FROM books".to_owned(),
            ))
            .await?;
        let total_users = row
            .map(|r| r.try_get::<i64>("", "cnt").unwrap_or(0))
            .unwrap_or(0) as u64;

        Ok(SiteStats {
            total_books,
            published,
            drafts: total_books - published,
            total_users,
        })
    }

    async fn admin_list(&self, q: Option<&str>) -> Result<Vec<Book>, DomainError> {
        let mut condition = Condition::all();

        if let Some(q) = q
            && !q.is_empty()
        {
            let uploader_ids: Vec<i32> = user::Entity::find()
                .filter(user::Column::Username.contains(q))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|u| u.id)
                .collect();

            let mut any = Condition::any().add(book::Column::Title.contains(q));
            if !uploader_ids.is_empty() {
                any = any.add(book::Column::UploadedBy.is_in(uploader_ids));
            }
            condition = condition.add(any);
        }

        let models = book::Entity::find()
            .filter(condition)
            .order_by_desc(book::Column::CreatedAt)
            .order_by_desc(book::Column::Id)
            .all(&self.db)
            .await?;

        let mut dtos = Vec::with_capacity(models.len());
        for model in models {
            let uploader = user::Entity::find_by_id(model.uploaded_by)
                .one(&self.db)
                .await?;
            let mut dto = self.hydrate(model).await?;
            dto.uploader = uploader.map(|u| u.username);
            dtos.push(dto);
        }
        Ok(dtos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::domain::TagRepository;
    use crate::infrastructure::repositories::SeaOrmTagRepository;

    async fn setup() -> (DatabaseConnection, SeaOrmBookRepository) {
        let db = init_db("sqlite::memory:").await.expect("Failed to init db");
        let repo = SeaOrmBookRepository::new(db.clone());
        (db, repo)
    }

    async fn insert_user(db: &DatabaseConnection, username: &str, role: &str) -> i32 {
        let now = chrono::Utc::now().to_rfc3339();
        let account = user::ActiveModel {
            username: Set(username.to_owned()),
            password_hash: Set("x".to_owned()),
            role: Set(role.to_owned()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };
        account.insert(db).await.expect("Failed to insert user").id
    }

    fn new_book(title: &str, uploader: i32) -> NewBook {
        NewBook {
            title: title.to_owned(),
            is_published: true,
            uploaded_by: uploader,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn colliding_titles_get_numbered_slugs() {
        let (db, repo) = setup().await;
        let alice = insert_user(&db, "alice", user::ROLE_USER).await;
        let bob = insert_user(&db, "bob", user::ROLE_USER).await;

        let first = repo.create(new_book("X", alice)).await.unwrap();
        let second = repo.create(new_book("X", bob)).await.unwrap();
        let third = repo.create(new_book("X", alice)).await.unwrap();

        assert_eq!(first.slug, "x");
        assert_eq!(second.slug, "x-2");
        assert_eq!(third.slug, "x-3");
    }

    #[tokio::test]
    async fn slug_survives_title_edits() {
        let (db, repo) = setup().await;
        let alice = insert_user(&db, "alice", user::ROLE_USER).await;

        let created = repo.create(new_book("Original Title", alice)).await.unwrap();
        assert_eq!(created.slug, "original-title");

        let updated = repo
            .update(
                created.id,
                BookUpdate {
                    title: "Renamed Completely".to_owned(),
                    is_published: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Renamed Completely");
        assert_eq!(updated.slug, "original-title");
    }

    #[tokio::test]
    async fn update_never_reassigns_uploader() {
        let (db, repo) = setup().await;
        let alice = insert_user(&db, "alice", user::ROLE_USER).await;

        let created = repo.create(new_book("Owned", alice)).await.unwrap();
        let updated = repo
            .update(
                created.id,
                BookUpdate {
                    title: "Owned".to_owned(),
                    is_published: false,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.uploaded_by, alice);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn drafts_never_leak_into_public_listing() {
        let (db, repo) = setup().await;
        let alice = insert_user(&db, "alice", user::ROLE_USER).await;

        repo.create(new_book("Visible", alice)).await.unwrap();
        repo.create(NewBook {
            title: "Hidden Draft".to_owned(),
            is_published: false,
            uploaded_by: alice,
            ..Default::default()
        })
        .await
        .unwrap();

        let all = repo.list_public(PublicBookQuery::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Visible");

        // Matching q does not resurrect the draft
        let searched = repo
            .list_public(PublicBookQuery {
                q: Some("Hidden".to_owned()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(searched.is_empty());

        assert!(
            repo.find_published_by_slug("hidden-draft")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn search_matches_description_case_insensitively() {
        let (db, repo) = setup().await;
        let alice = insert_user(&db, "alice", user::ROLE_USER).await;

        repo.create(NewBook {
            title: "Web Framework Guide".to_owned(),
            description: Some("Covers Django deployment end to end".to_owned()),
            is_published: true,
            uploaded_by: alice,
            ..Default::default()
        })
        .await
        .unwrap();

        let hits = repo
            .list_public(PublicBookQuery {
                q: Some("django".to_owned()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Web Framework Guide");
    }

    #[tokio::test]
    async fn duplicate_tag_names_collapse_to_one_association() {
        let (db, repo) = setup().await;
        let alice = insert_user(&db, "alice", user::ROLE_USER).await;

        let created = repo
            .create(NewBook {
                title: "Tagged".to_owned(),
                is_published: true,
                uploaded_by: alice,
                tag_names: vec!["bayt".to_owned(), "python".to_owned(), "python".to_owned()],
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(created.tags.len(), 2);
        let names: Vec<&str> = created.tags.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"bayt"));
        assert!(names.contains(&"python"));

        // Re-attaching through an update stays idempotent
        let updated = repo
            .update(
                created.id,
                BookUpdate {
                    title: "Tagged".to_owned(),
                    is_published: true,
                    tag_names: vec!["python".to_owned()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.tags.len(), 2);
    }

    #[tokio::test]
    async fn tag_filter_is_deduplicated_and_published_only() {
        let (db, repo) = setup().await;
        let alice = insert_user(&db, "alice", user::ROLE_USER).await;

        repo.create(NewBook {
            title: "Published Python".to_owned(),
            is_published: true,
            uploaded_by: alice,
            tag_names: vec!["python".to_owned(), "web".to_owned()],
            ..Default::default()
        })
        .await
        .unwrap();
        repo.create(NewBook {
            title: "Draft Python".to_owned(),
            is_published: false,
            uploaded_by: alice,
            tag_names: vec!["python".to_owned()],
            ..Default::default()
        })
        .await
        .unwrap();

        let tag_repo = SeaOrmTagRepository::new(db.clone());
        let python = tag_repo.find_by_slug("python").await.unwrap().unwrap();

        let by_filter = repo
            .list_public(PublicBookQuery {
                tag: Some("python".to_owned()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_filter.len(), 1);
        assert_eq!(by_filter[0].title, "Published Python");

        let by_page = repo.published_with_tag(python.id).await.unwrap();
        assert_eq!(by_page.len(), 1);
    }

    #[tokio::test]
    async fn delete_cascades_tag_associations() {
        let (db, repo) = setup().await;
        let alice = insert_user(&db, "alice", user::ROLE_USER).await;

        let created = repo
            .create(NewBook {
                title: "Doomed".to_owned(),
                is_published: true,
                uploaded_by: alice,
                tag_names: vec!["gone".to_owned()],
                ..Default::default()
            })
            .await
            .unwrap();

        repo.delete(created.id).await.unwrap();

        let links = book_tags::Entity::find()
            .filter(book_tags::Column::BookId.eq(created.id))
            .all(&db)
            .await
            .unwrap();
        assert!(links.is_empty());

        assert!(matches!(
            repo.delete(created.id).await,
            Err(DomainError::NotFound)
        ));
    }

    #[tokio::test]
    async fn owner_stats_are_scoped_to_the_uploader() {
        let (db, repo) = setup().await;
        let alice = insert_user(&db, "alice", user::ROLE_USER).await;
        let bob = insert_user(&db, "bob", user::ROLE_USER).await;

        repo.create(new_book("A1", alice)).await.unwrap();
        repo.create(NewBook {
            title: "A2".to_owned(),
            is_published: false,
            uploaded_by: alice,
            ..Default::default()
        })
        .await
        .unwrap();
        repo.create(new_book("B1", bob)).await.unwrap();

        let stats = repo.owner_stats(alice, 8).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.published, 1);
        assert_eq!(stats.drafts, 1);
        assert_eq!(stats.recent.len(), 2);

        let site = repo.site_stats().await.unwrap();
        assert_eq!(site.total_books, 3);
        assert_eq!(site.total_users, 2);
    }

    #[tokio::test]
    async fn admin_list_searches_title_and_uploader() {
        let (db, repo) = setup().await;
        let alice = insert_user(&db, "alice", user::ROLE_USER).await;
        let bob = insert_user(&db, "bob", user::ROLE_USER).await;

        repo.create(new_book("Compilers", alice)).await.unwrap();
        repo.create(new_book("Gardening", bob)).await.unwrap();

        let by_title = repo.admin_list(Some("compil")).await.unwrap();
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].uploader.as_deref(), Some("alice"));

        let by_user = repo.admin_list(Some("bob")).await.unwrap();
        assert_eq!(by_user.len(), 1);
        assert_eq!(by_user[0].title, "Gardening");

        let everything = repo.admin_list(None).await.unwrap();
        assert_eq!(everything.len(), 2);
    }
}
