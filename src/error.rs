// src/error.rs
use crate::config::ConfigError;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Failures of the connection provider. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("error creating {table} table: {source}")]
    Schema {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("database did not answer ping: {0}")]
    Ping(#[source] sqlx::Error),
}

/// Outcome of a repository call that did not succeed.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },
    #[error("failed to query {entity}: {source}")]
    Query {
        entity: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("failed to insert {entity}: {source}")]
    Insert {
        entity: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("failed to update {entity}: {source}")]
    Update {
        entity: &'static str,
        #[source]
        source: sqlx::Error,
    },
    #[error("failed to delete {entity}: {source}")]
    Delete {
        entity: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    /// True when the store rejected a write because of a unique constraint.
    pub fn is_unique_violation(&self) -> bool {
        let source = match self {
            StorageError::NotFound { .. } => return false,
            StorageError::Query { source, .. }
            | StorageError::Insert { source, .. }
            | StorageError::Update { source, .. }
            | StorageError::Delete { source, .. } => source,
        };
        matches!(source, sqlx::Error::Database(db) if db.is_unique_violation())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Error returned by request handlers. The message is what the client sees.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    /// Maps a repository failure for `label` onto a client-facing error.
    /// Store failures are logged here and never leak into the response.
    pub fn from_storage(err: StorageError, label: &str) -> Self {
        match err {
            StorageError::NotFound { id, .. } => {
                tracing::warn!(id, "{} not found", label);
                ApiError::NotFound(format!("{} not found", label))
            }
            other => {
                tracing::error!(error = %other, "{} storage failure", label);
                ApiError::Internal
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({"error": self.to_string()}))
    }
}
