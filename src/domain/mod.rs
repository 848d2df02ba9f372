pub mod authz;
pub mod errors;
pub mod repositories;

pub use authz::can_edit;
pub use errors::DomainError;
pub use repositories::{
    BookRepository, BookUpdate, CategoryRepository, CategoryWithCount, NewBook, OwnerStats,
    PublicBookQuery, SiteStats, TagRepository, TagWithCount,
};
