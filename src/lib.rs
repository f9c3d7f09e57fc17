// src/lib.rs

//! Job listing crawler library.
//!
//! Paginates a rate-limited listing provider with role-bound sessions,
//! enriches each result with detail and skills lookups, and writes one
//! schema-checked parquet partition per run.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(feature = "lambda")]
pub mod lambda;
