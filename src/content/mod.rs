pub mod catalog;
pub mod memory;
pub mod sqlite;

pub use catalog::{ContentError, DefinitionCatalog};
pub use memory::{ContentFile, StaticCatalog, CONTENT_SCHEMA_VERSION};
pub use sqlite::SqliteCatalog;
