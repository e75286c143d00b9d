use thiserror::Error;

/// Why an elements document could not be loaded.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("elements document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("elements document has no workspace rectangle")]
    MissingWorkspace,

    #[error("object {index} ({kind}) has invalid geometry: {reason}")]
    InvalidGeometry {
        index: usize,
        kind: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid editor config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid editor config: {0}")]
    Invalid(String),
}
