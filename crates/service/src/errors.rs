use thiserror::Error;

/// Failures of a directory request.
///
/// Every variant is terminal for the request; nothing is persisted once one
/// is raised.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Conflict(String),
    #[error("unsupported action; use list | login | create | edit | delete")]
    UnsupportedAction,
    #[error("storage unavailable: {0}")]
    Storage(String),
    #[error("hashing error: {0}")]
    Hash(String),
}

impl DirectoryError {
    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    pub fn index_not_found() -> Self { Self::NotFound("the given index does not exist".into()) }

    /// HTTP status the error maps to.
    pub fn status(&self) -> u16 {
        match self {
            DirectoryError::Validation(_) => 422,
            DirectoryError::NotFound(_) => 404,
            DirectoryError::Unauthorized(_) => 401,
            DirectoryError::Conflict(_) => 409,
            DirectoryError::UnsupportedAction => 400,
            DirectoryError::Storage(_) | DirectoryError::Hash(_) => 500,
        }
    }

    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DirectoryError::Validation(_) => "validation",
            DirectoryError::NotFound(_) => "not_found",
            DirectoryError::Unauthorized(_) => "unauthorized",
            DirectoryError::Conflict(_) => "conflict",
            DirectoryError::UnsupportedAction => "unsupported_action",
            DirectoryError::Storage(_) => "storage",
            DirectoryError::Hash(_) => "hash",
        }
    }

    /// Server-side faults, as opposed to problems with the request itself.
    pub fn is_internal(&self) -> bool { self.status() >= 500 }
}

impl From<std::io::Error> for DirectoryError {
    fn from(e: std::io::Error) -> Self { Self::Storage(e.to_string()) }
}

impl From<serde_json::Error> for DirectoryError {
    fn from(e: serde_json::Error) -> Self { Self::Storage(e.to_string()) }
}
