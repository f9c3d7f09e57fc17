// src/config.rs

//! Configuration and credential loading.
//!
//! Both loaders read through an [`ObjectStore`], so the same code serves
//! a local directory for the CLI and a bucket for the serverless handler.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{AccountConfig, Config, Credential};
use crate::storage::ObjectStore;

/// Supplies the credentials a run authenticates with.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Resolve one credential per configured account, in account order.
    async fn load(&self, accounts: &[AccountConfig]) -> Result<Vec<Credential>>;
}

/// Reads one JSON cookie file per account.
pub struct CookieFileCredentials {
    store: Arc<dyn ObjectStore>,
}

/// Accepted cookie file layouts.
#[derive(Deserialize)]
#[serde(untagged)]
enum CookieFile {
    Map(BTreeMap<String, String>),
    List(Vec<CookieEntry>),
}

/// One entry of a browser cookie export.
#[derive(Deserialize)]
struct CookieEntry {
    name: String,
    value: String,
}

impl CookieFileCredentials {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    async fn load_one(&self, account: &AccountConfig) -> Result<Credential> {
        let location = self.store.location(&account.cookie_file);
        let bytes = self
            .store
            .get(&account.cookie_file)
            .await
            .map_err(|e| AppError::authentication(&account.identity, e))?
            .ok_or_else(|| {
                AppError::authentication(
                    &account.identity,
                    format!("cookie file not found: {}", location),
                )
            })?;

        let file: CookieFile = serde_json::from_slice(&bytes).map_err(|e| {
            AppError::authentication(
                &account.identity,
                format!("cookie file {} is not valid: {}", location, e),
            )
        })?;
        let cookies: BTreeMap<String, String> = match file {
            CookieFile::Map(map) => map,
            CookieFile::List(entries) => entries.into_iter().map(|c| (c.name, c.value)).collect(),
        };
        if cookies.is_empty() {
            return Err(AppError::authentication(
                &account.identity,
                format!("cookie file {} holds no cookies", location),
            ));
        }

        log::debug!(
            "Loaded {} cookies for {} ({})",
            cookies.len(),
            account.identity,
            account.role
        );
        Ok(Credential {
            identity: account.identity.clone(),
            role: account.role,
            cookies,
        })
    }
}

#[async_trait]
impl CredentialSource for CookieFileCredentials {
    async fn load(&self, accounts: &[AccountConfig]) -> Result<Vec<Credential>> {
        let mut credentials = Vec::with_capacity(accounts.len());
        for account in accounts {
            credentials.push(self.load_one(account).await?);
        }
        Ok(credentials)
    }
}

/// Load a TOML configuration object from `store`.
///
/// A missing object yields the defaults, matching `Config::load_or_default`.
pub async fn load_config_from_store(store: &dyn ObjectStore, key: &str) -> Result<Config> {
    let Some(bytes) = store.get(key).await? else {
        log::warn!(
            "Config not found at {}, using defaults",
            store.location(key)
        );
        return Ok(Config::default());
    };

    let content = String::from_utf8(bytes).map_err(|e| {
        AppError::config(format!("Config file {} is not valid UTF-8: {}", key, e))
    })?;
    Ok(toml::from_str(&content)?)
}
