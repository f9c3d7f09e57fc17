// src/models/session.rs

//! Session roles, credentials and per-session transport state.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Cookie carrying the CSRF token expected back in the `csrf-token` header.
pub const CSRF_COOKIE: &str = "JSESSIONID";

/// Fixed role a session serves for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Search,
    Detail,
    Skills,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Search => "search",
            Role::Detail => "detail",
            Role::Skills => "skills",
        })
    }
}

/// Account identity plus the cookies that authenticate it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub identity: String,
    pub role: Role,
    pub cookies: BTreeMap<String, String>,
}

// Cookie values stay out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identity", &self.identity)
            .field("role", &self.role)
            .field("cookies", &self.cookies.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Mutable transport state of one authenticated session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub cookies: BTreeMap<String, String>,
    pub csrf_token: Option<String>,
}

impl SessionState {
    /// Seed a session from a credential's cookies.
    pub fn from_credential(credential: &Credential) -> Self {
        let mut state = Self {
            cookies: credential.cookies.clone(),
            csrf_token: None,
        };
        state.refresh_csrf();
        state
    }

    /// Render the `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Apply one `Set-Cookie` response header.
    ///
    /// Attributes after the first `;` are ignored. An empty value removes the cookie.
    pub fn absorb_set_cookie(&mut self, header: &str) {
        let pair = header.split(';').next().unwrap_or_default();
        let Some((name, value)) = pair.split_once('=') else {
            return;
        };
        let name = name.trim();
        if name.is_empty() {
            return;
        }

        let value = value.trim();
        if value.is_empty() || value == "\"\"" || value.eq_ignore_ascii_case("delete me") {
            self.cookies.remove(name);
        } else {
            self.cookies.insert(name.to_string(), value.to_string());
        }

        if name == CSRF_COOKIE {
            self.refresh_csrf();
        }
    }

    fn refresh_csrf(&mut self) {
        self.csrf_token = self
            .cookies
            .get(CSRF_COOKIE)
            .map(|v| v.trim_matches('"').to_string())
            .filter(|v| !v.is_empty());
    }
}
