use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlannerError {
    /// The recipe catalog could not be fetched, parsed or validated.
    #[error("failed to load recipes: {0}")]
    Load(String),

    /// A selection change was requested before the catalog finished loading.
    #[error("recipe catalog is not available")]
    CatalogNotReady,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type PlannerResult<T> = std::result::Result<T, PlannerError>;
