// src/pipeline/mod.rs

//! Pipeline stages and entry points for a crawl run.
//!
//! - `run_crawl`: paginate, fetch, admit and write one keyword's partition
//! - `run_validate`: check configuration and credential files

pub mod admission;
pub mod crawl;
pub mod normalize;
pub mod paginate;
pub mod validate;

pub use admission::{Deduplicator, TimeWindowFilter};
pub use crawl::{CrawlRun, run_crawl};
pub use normalize::RecordNormalizer;
pub use paginate::{DriverState, Page, PaginationDriver};
pub use validate::run_validate;
