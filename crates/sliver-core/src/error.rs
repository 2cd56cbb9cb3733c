/// Errors reported by the symbol store and retrieval layers.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("ambiguous name '{name}': {} candidates", candidates.len())]
    Ambiguous {
        name: String,
        /// Qualified names the caller can use to requalify.
        candidates: Vec<String>,
    },

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn ambiguous(name: impl Into<String>, candidates: Vec<String>) -> Self {
        StoreError::Ambiguous {
            name: name.into(),
            candidates,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound(what.into())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Internal(format!("snapshot serialization: {e}"))
    }
}

/// Errors from resolving a user-supplied path hint against the index.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no indexed file matches '{0}'")]
    NotFound(String),

    #[error("'{hint}' matches {} files", candidates.len())]
    Ambiguous {
        hint: String,
        candidates: Vec<String>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
