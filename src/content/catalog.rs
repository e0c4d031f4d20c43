use crate::rules::{AbilityDef, RealmProfile, SynergyDef, TalentDef, TechniqueDef};

/// Errors surfaced by a catalog backend. The registry treats any of these as
/// a failed build and keeps serving its previous generation.
#[derive(Debug)]
pub enum ContentError {
    Io { path: String, source: std::io::Error },
    Json { path: String, source: serde_json::Error },
    Sqlite(rusqlite::Error),
    Validation(String),
    Unavailable(String),
}

impl std::fmt::Display for ContentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentError::Io { path, source } => write!(f, "failed to read {}: {}", path, source),
            ContentError::Json { path, source } => write!(f, "failed to parse {}: {}", path, source),
            ContentError::Sqlite(source) => write!(f, "content database error: {}", source),
            ContentError::Validation(message) => write!(f, "{}", message),
            ContentError::Unavailable(message) => write!(f, "catalog unavailable: {}", message),
        }
    }
}

impl std::error::Error for ContentError {}

impl From<rusqlite::Error> for ContentError {
    fn from(source: rusqlite::Error) -> Self {
        ContentError::Sqlite(source)
    }
}

/// Read-only boundary to the static definition set. The engine never mutates
/// a catalog; it only enumerates it while building a registry generation, and
/// assumes the content is stable for the duration of one build.
pub trait DefinitionCatalog {
    fn abilities(&self) -> Result<Vec<AbilityDef>, ContentError>;
    fn techniques(&self) -> Result<Vec<TechniqueDef>, ContentError>;
    fn synergies(&self) -> Result<Vec<SynergyDef>, ContentError>;
    fn talents(&self) -> Result<Vec<TalentDef>, ContentError>;
    fn realm_profiles(&self) -> Result<Vec<RealmProfile>, ContentError>;
}
