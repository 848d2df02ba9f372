pub mod repositories;
pub mod state;

pub use repositories::{SeaOrmBookRepository, SeaOrmCategoryRepository, SeaOrmTagRepository};
pub use state::AppState;
