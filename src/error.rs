use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("{entity} already exists: {name}")]
    DuplicateKey { entity: &'static str, name: String },

    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{path}: {message}")]
    SourceFile { path: String, message: String },

    #[error("{entity} not found: {name}")]
    NotFound { entity: &'static str, name: String },

    #[error("{0}")]
    Precondition(String),
}

pub type RosterResult<T> = Result<T, RosterError>;

impl RosterError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn source_file(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceFile {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateKey { .. } => "duplicate_key",
            Self::Validation { .. } => "validation_failed",
            Self::Store(_) | Self::Io(_) => "store_io_failed",
            Self::SourceFile { .. } => "source_file_invalid",
            Self::NotFound { .. } => "not_found",
            Self::Precondition(_) => "precondition_failed",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::DuplicateKey { entity, name } | Self::NotFound { entity, name } => {
                Some(json!({ "entity": entity, "name": name }))
            }
            Self::Validation { field, .. } => Some(json!({ "field": field })),
            Self::SourceFile { path, .. } => Some(json!({ "path": path })),
            _ => None,
        }
    }
}

/// Maps a UNIQUE violation on insert/update to `DuplicateKey`; other errors pass through.
pub fn map_unique(e: rusqlite::Error, entity: &'static str, name: &str) -> RosterError {
    match &e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RosterError::DuplicateKey {
                entity,
                name: name.to_string(),
            }
        }
        _ => RosterError::Store(e),
    }
}
