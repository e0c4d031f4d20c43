pub mod lookup;
pub mod registry;

pub use lookup::LookupTables;
pub use registry::{DefinitionRegistry, RegistryConfig};
