use crate::auth::hash_password;
use crate::domain::{BookRepository, CategoryRepository, NewBook};
use crate::infrastructure::{SeaOrmBookRepository, SeaOrmCategoryRepository};
use crate::models::{book, user};
use sea_orm::*;

pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    // 1. Create Users
    let admin_password = hash_password("admin123!").unwrap();
    let writer_password = hash_password("writer123!").unwrap();

    let now = chrono::Utc::now().to_rfc3339();
    let admin = user::ActiveModel {
        username: Set("admin".to_owned()),
        password_hash: Set(admin_password),
        role: Set(user::ROLE_STAFF.to_owned()),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    };

    let writer = user::ActiveModel {
        username: Set("writer".to_owned()),
        password_hash: Set(writer_password),
        role: Set(user::ROLE_USER.to_owned()),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    };

    for account in [admin, writer] {
        match user::Entity::insert(account)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(user::Column::Username)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await
        {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    // Books only on a fresh database; the slug probe makes re-runs noisy
    // otherwise.
    if book::Entity::find().count(db).await? > 0 {
        return Ok(());
    }

    let writer_id = user::Entity::find()
        .filter(user::Column::Username.eq("writer"))
        .one(db)
        .await?
        .map(|u| u.id)
        .unwrap_or(1);

    // 2. Categories
    let category_repo = SeaOrmCategoryRepository::new(db.clone());
    let mut programming_id = None;
    for name in ["Programming", "Fiction", "Science"] {
        match category_repo.create(name).await {
            Ok(model) => {
                if name == "Programming" {
                    programming_id = Some(model.id);
                }
            }
            Err(e) => tracing::warn!("seed category '{}' skipped: {}", name, e),
        }
    }

    // 3. Books (tags fan out through the normal create path)
    let book_repo = SeaOrmBookRepository::new(db.clone());
    let samples = [
        (
            "Practical Rust Services",
            "Building web backends with axum and SeaORM.",
            "rust, web",
            true,
        ),
        (
            "Learning Python the Long Way",
            "A meandering introduction to Python.",
            "python, beginners",
            true,
        ),
        (
            "Unfinished Field Notes",
            "Draft chapters, not yet ready.",
            "notes",
            false,
        ),
    ];

    for (title, description, tags_text, published) in samples {
        let input = NewBook {
            title: title.to_owned(),
            author_name: Some("Demo Author".to_owned()),
            description: Some(description.to_owned()),
            category_id: programming_id,
            is_published: published,
            uploaded_by: writer_id,
            tag_names: tags_text.split(", ").map(|s| s.to_owned()).collect(),
            ..Default::default()
        };
        if let Err(e) = book_repo.create(input).await {
            tracing::warn!("seed book '{}' skipped: {}", title, e);
        }
    }

    Ok(())
}
