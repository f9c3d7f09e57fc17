// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{CrawlRequest, Role};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Search query and pagination settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Evasion delay and retry budget
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Listing provider endpoint settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Output location settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Authenticated accounts, one session each
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Override settings from the serverless environment.
    ///
    /// Unset or unparsable variables leave the current value untouched.
    pub fn apply_env(&mut self) {
        env_string("SEARCH_KEYWORD", &mut self.search.keyword);
        env_string("SEARCH_LOCATION", &mut self.search.location);
        env_parse("SEARCH_LIMIT", &mut self.search.page_size);
        env_parse("NUMBER_OF_PAGES", &mut self.search.max_pages);
        env_parse("WINDOW_HOURS", &mut self.search.window_hours);
        env_parse("LISTED_AT", &mut self.search.listed_after_secs);

        // Evasion bounds are set in seconds in the environment.
        let mut min_secs: Option<u64> = None;
        let mut max_secs: Option<u64> = None;
        env_parse_opt("SLEEP_TIME_MIN", &mut min_secs);
        env_parse_opt("SLEEP_TIME_MAX", &mut max_secs);
        if let Some(secs) = min_secs {
            self.rate_limit.min_delay_ms = secs * 1000;
        }
        if let Some(secs) = max_secs {
            self.rate_limit.max_delay_ms = secs * 1000;
        }
        env_parse("RETRY_DELAY_MS", &mut self.rate_limit.retry_delay_ms);
        env_parse("MAX_RETRIES", &mut self.rate_limit.max_retries);

        env_string("JOB_DECORATION_ID", &mut self.provider.job_decoration_id);
        env_string("DATALAKE_BUCKET", &mut self.storage.bucket);
        env_string("COOKIES_DIR", &mut self.storage.cookies_dir);
        env_string("COOKIES_BUCKET", &mut self.storage.cookies_bucket);

        // ACCOUNT1 searches, ACCOUNT2 fetches details, ACCOUNT3 fetches skills.
        let roles = [Role::Search, Role::Detail, Role::Skills];
        let from_env: Vec<AccountConfig> = roles
            .iter()
            .enumerate()
            .filter_map(|(i, role)| {
                let identity = std::env::var(format!("ACCOUNT{}_EMAIL", i + 1)).ok()?;
                let cookie_file = std::env::var(format!("ACCOUNT{}_COOKIE_FILE", i + 1)).ok()?;
                Some(AccountConfig {
                    identity,
                    role: *role,
                    cookie_file,
                })
            })
            .collect();
        if !from_env.is_empty() {
            self.accounts = from_env;
        }
    }

    /// Produce the run snapshot for one invocation.
    pub fn with_request(&self, request: &CrawlRequest) -> Self {
        let mut config = self.clone();
        if let Some(keyword) = &request.keyword {
            config.search.keyword = keyword.clone();
        }
        if let Some(location) = &request.location {
            config.search.location = location.clone();
        }
        if let Some(hours) = request.window_hours {
            config.search.window_hours = hours;
        }
        if let Some(pages) = request.max_pages {
            config.search.max_pages = pages;
        }
        if let Some(size) = request.page_size {
            config.search.page_size = size;
        }
        if let Some(delay) = request.base_delay_ms {
            config.rate_limit.min_delay_ms = delay;
            config.rate_limit.max_delay_ms = config.rate_limit.max_delay_ms.max(delay);
        }
        if let Some(delay) = request.retry_delay_ms {
            config.rate_limit.retry_delay_ms = delay;
        }
        if let Some(retries) = request.max_retries {
            config.rate_limit.max_retries = retries;
        }
        config
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        self.validate_run()?;
        for role in [Role::Search, Role::Detail, Role::Skills] {
            if !self.accounts.iter().any(|a| a.role == role) {
                return Err(AppError::validation(format!(
                    "No account configured for role '{}'",
                    role
                )));
            }
        }
        Ok(())
    }

    /// Validate the settings a crawl run consumes, leaving accounts aside.
    pub fn validate_run(&self) -> Result<()> {
        if self.search.keyword.trim().is_empty() {
            return Err(AppError::validation("search.keyword is empty"));
        }
        if self.search.page_size == 0 {
            return Err(AppError::validation("search.page_size must be > 0"));
        }
        if self.search.max_pages == 0 {
            return Err(AppError::validation("search.max_pages must be > 0"));
        }
        if self.search.window_hours == 0 {
            return Err(AppError::validation("search.window_hours must be > 0"));
        }
        if self.rate_limit.min_delay_ms > self.rate_limit.max_delay_ms {
            return Err(AppError::validation(
                "rate_limit.min_delay_ms must not exceed rate_limit.max_delay_ms",
            ));
        }
        if self.provider.timeout_secs == 0 {
            return Err(AppError::validation("provider.timeout_secs must be > 0"));
        }
        if self.provider.user_agent.trim().is_empty() {
            return Err(AppError::validation("provider.user_agent is empty"));
        }
        Ok(())
    }
}

fn env_string(name: &str, target: &mut String) {
    if let Ok(value) = std::env::var(name) {
        if !value.trim().is_empty() {
            *target = value;
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, target: &mut T) {
    if let Ok(value) = std::env::var(name) {
        if let Ok(parsed) = value.trim().parse() {
            *target = parsed;
        }
    }
}

fn env_parse_opt<T: std::str::FromStr>(name: &str, target: &mut Option<T>) {
    if let Ok(value) = std::env::var(name) {
        *target = value.trim().parse().ok();
    }
}

/// Search query and pagination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search keyword; also the partition key component
    #[serde(default)]
    pub keyword: String,

    /// Location name passed to the search operation
    #[serde(default = "defaults::location")]
    pub location: String,

    /// Admission window length, anchored to run start
    #[serde(default = "defaults::window_hours")]
    pub window_hours: u32,

    /// Maximum number of search pages requested per run
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,

    /// Items requested per search page
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Provider-side "listed within the last N seconds" filter
    #[serde(default = "defaults::listed_after_secs")]
    pub listed_after_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            location: defaults::location(),
            window_hours: defaults::window_hours(),
            max_pages: defaults::max_pages(),
            page_size: defaults::page_size(),
            listed_after_secs: defaults::listed_after_secs(),
        }
    }
}

/// Evasion delay and retry budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Lower bound of the randomized pre-call delay
    #[serde(default = "defaults::min_delay")]
    pub min_delay_ms: u64,

    /// Upper bound of the randomized pre-call delay
    #[serde(default = "defaults::max_delay")]
    pub max_delay_ms: u64,

    /// Base wait between rate-limited retries, scaled linearly by attempt
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_ms: u64,

    /// Retries allowed after the first rate-limited attempt
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Consecutive pages with exhausted item retries before the run is truncated
    #[serde(default = "defaults::max_rate_limited_pages")]
    pub max_rate_limited_pages: u32,

    /// Consecutive failed search pages tolerated before the run is truncated
    #[serde(default = "defaults::max_search_errors")]
    pub max_search_errors: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: defaults::min_delay(),
            max_delay_ms: defaults::max_delay(),
            retry_delay_ms: defaults::retry_delay(),
            max_retries: defaults::max_retries(),
            max_rate_limited_pages: defaults::max_rate_limited_pages(),
            max_search_errors: defaults::max_search_errors(),
        }
    }
}

/// Listing provider endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider origin, e.g. `https://www.linkedin.com`
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-call timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Decoration id sent with detail lookups
    #[serde(default = "defaults::job_decoration_id")]
    pub job_decoration_id: String,

    /// Prefix for canonical job URLs
    #[serde(default = "defaults::job_url_base")]
    pub job_url_base: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            job_decoration_id: defaults::job_decoration_id(),
            job_url_base: defaults::job_url_base(),
        }
    }
}

/// Output location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Object store bucket for partition files
    #[serde(default = "defaults::bucket")]
    pub bucket: String,

    /// Root of the partition layout inside the bucket
    #[serde(default = "defaults::prefix")]
    pub prefix: String,

    /// Directory used by the local filesystem backend
    #[serde(default = "defaults::local_dir")]
    pub local_dir: String,

    /// Directory holding account cookie files
    #[serde(default = "defaults::cookies_dir")]
    pub cookies_dir: String,

    /// Bucket holding account cookie files for serverless runs
    #[serde(default = "defaults::cookies_bucket")]
    pub cookies_bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: defaults::bucket(),
            prefix: defaults::prefix(),
            local_dir: defaults::local_dir(),
            cookies_dir: defaults::cookies_dir(),
            cookies_bucket: defaults::cookies_bucket(),
        }
    }
}

/// One provider account bound to a session role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountConfig {
    /// Account identity, used for logging and error messages
    pub identity: String,

    /// Role the session serves for the whole run
    pub role: Role,

    /// Cookie file name, resolved against `storage.cookies_dir`
    pub cookie_file: String,
}

mod defaults {
    // Search defaults
    pub fn location() -> String {
        "Australia".into()
    }
    pub fn window_hours() -> u32 {
        24
    }
    pub fn max_pages() -> u32 {
        5
    }
    pub fn page_size() -> u32 {
        20
    }
    pub fn listed_after_secs() -> u64 {
        86_400
    }

    // Rate limit defaults
    pub fn min_delay() -> u64 {
        2_000
    }
    pub fn max_delay() -> u64 {
        5_000
    }
    pub fn retry_delay() -> u64 {
        10_000
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn max_rate_limited_pages() -> u32 {
        2
    }
    pub fn max_search_errors() -> u32 {
        3
    }

    // Provider defaults
    pub fn base_url() -> String {
        "https://www.linkedin.com".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn job_decoration_id() -> String {
        "com.linkedin.voyager.deco.jobs.web.shared.WebFullJobPosting-65".into()
    }
    pub fn job_url_base() -> String {
        "https://www.linkedin.com/jobs/view".into()
    }

    // Storage defaults
    pub fn bucket() -> String {
        "job-data-lake".into()
    }
    pub fn prefix() -> String {
        "raw".into()
    }
    pub fn local_dir() -> String {
        "storage".into()
    }
    pub fn cookies_dir() -> String {
        "cookies".into()
    }
    pub fn cookies_bucket() -> String {
        "job-crawler-cookies".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.search.keyword = "data engineer".to_string();
        config.accounts = vec![
            AccountConfig {
                identity: "search@example.com".into(),
                role: Role::Search,
                cookie_file: "search.json".into(),
            },
            AccountConfig {
                identity: "detail@example.com".into(),
                role: Role::Detail,
                cookie_file: "detail.json".into(),
            },
            AccountConfig {
                identity: "skills@example.com".into(),
                role: Role::Skills,
                cookie_file: "skills.json".into(),
            },
        ];
        config
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_keyword() {
        let mut config = valid_config();
        config.search.keyword = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_role() {
        let mut config = valid_config();
        config.accounts.retain(|a| a.role != Role::Skills);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("skills"));
    }

    #[test]
    fn validate_rejects_inverted_delay_bounds() {
        let mut config = valid_config();
        config.rate_limit.min_delay_ms = 10;
        config.rate_limit.max_delay_ms = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config: Config = toml::from_str(
            r#"
[search]
keyword = "data engineer"
page_size = 10

[[accounts]]
identity = "a@example.com"
role = "search"
cookie_file = "a.json"
"#,
        )
        .unwrap();

        assert_eq!(config.search.page_size, 10);
        assert_eq!(config.search.window_hours, 24);
        assert_eq!(config.rate_limit.max_retries, 3);
        assert_eq!(config.accounts[0].role, Role::Search);
        assert_eq!(config.storage.prefix, "raw");
    }

    #[test]
    fn request_overrides_only_given_fields() {
        let config = valid_config();
        let request = CrawlRequest {
            keyword: Some("ml engineer".into()),
            page_size: Some(25),
            base_delay_ms: Some(8_000),
            ..CrawlRequest::default()
        };

        let merged = config.with_request(&request);
        assert_eq!(merged.search.keyword, "ml engineer");
        assert_eq!(merged.search.page_size, 25);
        assert_eq!(merged.search.location, config.search.location);
        assert_eq!(merged.rate_limit.min_delay_ms, 8_000);
        assert!(merged.rate_limit.max_delay_ms >= 8_000);
    }
}
