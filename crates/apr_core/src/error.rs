use thiserror::Error;

/// Fatal validation errors, raised before aggregation begins.
///
/// Everything else the pipeline encounters (unknown flight codes, missing
/// metadata, unresolved conflicts) is non-fatal and accumulates into the
/// diagnostics report instead.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Duplicate team id in directory: {id}")]
    DuplicateTeamId { id: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported schema version: found {found}, expected {expected}")]
    SchemaVersion { found: u8, expected: u8 },

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
