// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::error::Result;
use crate::models::ProviderConfig;

/// Create a configured asynchronous HTTP client.
///
/// Redirects are not followed; the provider answers expired sessions with a
/// redirect to its login page, which must surface as an auth failure.
pub fn create_async_client(config: &ProviderConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        "x-restli-protocol-version",
        HeaderValue::from_static("2.0.0"),
    );
    headers.insert("x-li-lang", HeaderValue::from_static("en_US"));

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    Ok(client)
}
