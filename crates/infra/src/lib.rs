pub mod contentful;
pub mod db;
pub mod file_store;
pub mod memory;

pub use contentful::{ContentfulConfig, ContentfulError, ContentfulStore};
pub use db::PostgresStore;
pub use file_store::{FileStoreError, JsonFileStore};
pub use memory::MemoryStore;
