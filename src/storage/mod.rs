// src/storage/mod.rs

//! Storage abstractions for crawl output.
//!
//! Each run produces one parquet file under a date and keyword partition:
//!
//! ```text
//! {prefix}/
//! └── YYYY/
//!     └── MM/
//!         └── DD/
//!             └── {keyword}/
//!                 └── {keyword}-YYYYMMDD.parquet
//! ```
//!
//! Spaces in the keyword become underscores.

pub mod codec;
pub mod local;
#[cfg(feature = "s3")]
pub mod s3;
pub mod writer;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;
#[cfg(feature = "s3")]
pub use s3::S3Storage;
pub use writer::{SchemaValidatedWriter, WriteResult};

/// Minimal object store contract.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, returning a displayable location.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String>;

    /// Fetch the object at `key`, `None` if it does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Displayable location of a key without touching the store.
    fn location(&self, key: &str) -> String;
}

/// Keyword as it appears in partition paths.
pub fn partition_keyword(keyword: &str) -> String {
    keyword.trim().replace([' ', '/'], "_")
}

/// Partition directory for a keyword on a given day.
pub fn partition_dir(prefix: &str, keyword: &str, date: NaiveDate) -> String {
    let base = format!(
        "{:04}/{:02}/{:02}/{}",
        date.year(),
        date.month(),
        date.day(),
        partition_keyword(keyword)
    );
    match prefix.trim_matches('/') {
        "" => base,
        prefix => format!("{}/{}", prefix, base),
    }
}

/// Full object key of a run's partition file.
pub fn partition_key(prefix: &str, keyword: &str, date: NaiveDate) -> String {
    format!(
        "{}/{}-{}.parquet",
        partition_dir(prefix, keyword, date),
        partition_keyword(keyword),
        date.format("%Y%m%d")
    )
}
