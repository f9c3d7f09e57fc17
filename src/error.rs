// src/error.rs

//! Unified error handling for the crawler application.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A session could not be established for a credential
    #[error("Authentication failed for {identity}: {message}")]
    Authentication { identity: String, message: String },

    /// The provider kept rate-limiting a call after every retry
    #[error("Rate limit retries exhausted for {context}")]
    RateLimit { context: String },

    /// Network-level failure that may succeed on a later attempt
    #[error("Transient network error for {context}: {message}")]
    TransientNetwork { context: String, message: String },

    /// A record failed schema validation
    #[error("Malformed record {job_id}: {message}")]
    MalformedRecord { job_id: String, message: String },

    /// The final partition write could not complete
    #[error("Storage write failed at {location}: {message}")]
    StorageWrite { location: String, message: String },

    /// AWS S3 error
    #[error("S3 error: {0}")]
    S3(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Parquet encoding or decoding failed
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Arrow batch construction failed
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create an authentication error for a credential identity.
    pub fn authentication(identity: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Authentication {
            identity: identity.into(),
            message: message.to_string(),
        }
    }

    /// Create a rate-limit exhaustion error.
    pub fn rate_limit(context: impl Into<String>) -> Self {
        Self::RateLimit {
            context: context.into(),
        }
    }

    /// Create a transient network error with context.
    pub fn transient(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::TransientNetwork {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a schema validation error for one record.
    pub fn malformed(job_id: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::MalformedRecord {
            job_id: job_id.into(),
            message: message.to_string(),
        }
    }

    /// Create a storage write error.
    pub fn storage_write(location: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::StorageWrite {
            location: location.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error ends the run instead of being isolated to one item or page.
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::StorageWrite { .. })
    }
}
