//! SeaORM repository implementations

pub mod book_repository;
pub mod category_repository;
pub mod tag_repository;

pub use book_repository::SeaOrmBookRepository;
pub use category_repository::SeaOrmCategoryRepository;
pub use tag_repository::SeaOrmTagRepository;
