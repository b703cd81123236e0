pub mod filters;
pub mod table_repository;
pub mod traits;

pub use filters::SearchFilters;
pub use table_repository::TableRepository;
pub use traits::BaseRepository;
