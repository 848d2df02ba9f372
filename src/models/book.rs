use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub author_name: Option<String>,
    pub description: Option<String>,
    pub cover_path: Option<String>,
    pub pdf_path: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<i32>,
    pub is_published: bool,
    pub uploaded_by: i32,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UploadedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::book_tags::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::book_tags::Relation::Book.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Category as embedded in a book response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

/// Tag as embedded in a book response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRef {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

// DTO for API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub author_name: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub category: Option<CategoryRef>,
    pub tags: Vec<TagRef>,
    pub is_published: bool,
    pub uploaded_by: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
    pub created_at: String,
}

impl From<Model> for Book {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            author_name: model.author_name,
            description: model.description,
            cover_url: model.cover_path.map(|p| crate::storage::public_url(&p)),
            pdf_url: model.pdf_path.map(|p| crate::storage::public_url(&p)),
            content: None, // only the reader payload carries content
            category: None,
            tags: Vec::new(),
            is_published: model.is_published,
            uploaded_by: model.uploaded_by,
            uploader: None,
            created_at: model.created_at,
        }
    }
}
