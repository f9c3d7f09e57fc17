// src/services/provider.rs

//! Listing provider contract and its HTTP implementation.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{COOKIE, SET_COOKIE};
use serde_json::Value;
use thiserror::Error;

use crate::error::Result;
use crate::models::{Credential, DetailRecord, ProviderConfig, SearchResult, SessionState, SkillSet};
use crate::utils::{endpoint, http::create_async_client};

/// Decoration id of the skill match insight resource.
const SKILLS_DECORATION_ID: &str =
    "com.linkedin.voyager.dash.deco.assessments.FullJobSkillMatchInsight-17";

/// Failure of a single provider call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("rate limited (HTTP {status})")]
    RateLimited { status: u16 },

    #[error("request timed out")]
    Timeout,

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Fatal(String),
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

impl ProviderError {
    /// Classify a non-success HTTP status.
    ///
    /// 999 is the provider's own "request denied" code and behaves like 429.
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            429 | 999 => Self::RateLimited {
                status: status.as_u16(),
            },
            401 | 403 => Self::Unauthorized(format!("HTTP {}", status)),
            300..=399 => Self::Unauthorized(format!("HTTP {} (session redirected)", status)),
            500..=599 => Self::Transient(format!("HTTP {}", status)),
            _ => Self::Fatal(format!("HTTP {}", status)),
        }
    }

    /// Classify a transport error.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::Fatal(format!("undecodable response: {}", error))
        } else {
            Self::Transient(error.to_string())
        }
    }
}

/// Parameters of one search page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub location: String,
    pub limit: u32,
    pub offset: u32,
    /// Only postings listed within this many seconds
    pub listed_after_secs: u64,
}

/// One page of search results.
///
/// `returned` counts every element the provider sent, including ones
/// dropped for lacking an identifier; pagination decisions use it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub results: Vec<SearchResult>,
    pub returned: usize,
}

impl SearchPage {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self {
            returned: results.len(),
            results,
        }
    }
}

/// The three logical operations of the listing provider, plus session setup.
///
/// Calls take the session state mutably; the provider may rotate cookies on
/// any response.
#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// Establish a session for a credential with one outbound exchange.
    async fn authenticate(&self, credential: &Credential) -> ProviderResult<SessionState>;

    async fn search(
        &self,
        session: &mut SessionState,
        query: &SearchQuery,
    ) -> ProviderResult<SearchPage>;

    async fn detail(&self, session: &mut SessionState, job_id: &str)
    -> ProviderResult<DetailRecord>;

    async fn skills(&self, session: &mut SessionState, job_id: &str) -> ProviderResult<SkillSet>;
}

/// HTTP client for the provider's voyager API.
pub struct VoyagerClient {
    client: reqwest::Client,
    base_url: String,
    job_decoration_id: String,
}

impl VoyagerClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
            base_url: config.base_url.clone(),
            job_decoration_id: config.job_decoration_id.clone(),
        })
    }

    async fn get_json(
        &self,
        session: &mut SessionState,
        path: &str,
        query: &[(&str, String)],
    ) -> ProviderResult<Value> {
        let url = endpoint(&self.base_url, path).map_err(|e| ProviderError::Fatal(e.to_string()))?;

        let mut request = self
            .client
            .get(url)
            .query(query)
            .header(COOKIE, session.cookie_header());
        if let Some(token) = &session.csrf_token {
            request = request.header("csrf-token", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&e))?;

        for header in response.headers().get_all(SET_COOKIE) {
            if let Ok(value) = header.to_str() {
                session.absorb_set_cookie(value);
            }
        }

        let status = response.status();
        if !status.is_success() {
            log::debug!("{} answered {}", path, status);
            return Err(ProviderError::from_status(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::from_reqwest(&e))?;
        serde_json::from_slice(&body)
            .map_err(|e| ProviderError::Fatal(format!("undecodable response: {}", e)))
    }
}

#[async_trait]
impl ListingProvider for VoyagerClient {
    async fn authenticate(&self, credential: &Credential) -> ProviderResult<SessionState> {
        if credential.cookies.is_empty() {
            return Err(ProviderError::Unauthorized("no session cookies".into()));
        }

        let mut state = SessionState::from_credential(credential);
        self.get_json(&mut state, "voyager/api/me", &[]).await?;
        Ok(state)
    }

    async fn search(
        &self,
        session: &mut SessionState,
        query: &SearchQuery,
    ) -> ProviderResult<SearchPage> {
        let params = [
            ("q", "jobSearch".to_string()),
            ("keywords", query.keyword.clone()),
            ("location", query.location.clone()),
            ("count", query.limit.to_string()),
            ("start", query.offset.to_string()),
            ("listedAt", format!("r{}", query.listed_after_secs)),
        ];
        let payload = self
            .get_json(session, "voyager/api/voyagerJobsDashJobCards", &params)
            .await?;

        let elements = payload
            .get("elements")
            .or_else(|| payload.get("included"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let results = elements
            .iter()
            .filter_map(|element| {
                let item = SearchResult::from_payload(element);
                if item.is_none() {
                    log::debug!("Search element without identifier skipped");
                }
                item
            })
            .collect();
        Ok(SearchPage {
            results,
            returned: elements.len(),
        })
    }

    async fn detail(
        &self,
        session: &mut SessionState,
        job_id: &str,
    ) -> ProviderResult<DetailRecord> {
        let path = format!("voyager/api/jobs/jobPostings/{}", job_id);
        let params = [("decorationId", self.job_decoration_id.clone())];
        let payload = self.get_json(session, &path, &params).await?;

        let record = DetailRecord::from_payload(&payload);
        if record == DetailRecord::default() && payload.get("status").is_some() {
            log::info!(
                "Detail request for {} soft-failed: {}",
                job_id,
                payload
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("no message")
            );
        }
        Ok(record)
    }

    async fn skills(&self, session: &mut SessionState, job_id: &str) -> ProviderResult<SkillSet> {
        let path = format!(
            "voyager/api/voyagerAssessmentsDashJobSkillMatchInsight/urn:li:fsd_jobSkillMatchInsight:{}",
            job_id
        );
        let params = [("decorationId", SKILLS_DECORATION_ID.to_string())];
        let payload = self.get_json(session, &path, &params).await?;
        Ok(SkillSet::from_payload(&payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use serde_json::json;
    use std::collections::BTreeMap;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> VoyagerClient {
        let config = ProviderConfig {
            base_url: server.uri(),
            ..ProviderConfig::default()
        };
        VoyagerClient::new(&config).unwrap()
    }

    fn credential() -> Credential {
        Credential {
            identity: "search@example.com".into(),
            role: Role::Search,
            cookies: BTreeMap::from([
                ("li_at".to_string(), "secret".to_string()),
                ("JSESSIONID".to_string(), "\"ajax:1\"".to_string()),
            ]),
        }
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            ProviderError::from_status(StatusCode::TOO_MANY_REQUESTS),
            ProviderError::RateLimited { status: 429 }
        );
        assert!(matches!(
            ProviderError::from_status(StatusCode::from_u16(999).unwrap()),
            ProviderError::RateLimited { status: 999 }
        ));
        assert!(matches!(
            ProviderError::from_status(StatusCode::BAD_GATEWAY),
            ProviderError::Transient(_)
        ));
        assert!(matches!(
            ProviderError::from_status(StatusCode::UNAUTHORIZED),
            ProviderError::Unauthorized(_)
        ));
        assert!(matches!(
            ProviderError::from_status(StatusCode::NOT_FOUND),
            ProviderError::Fatal(_)
        ));
    }

    #[tokio::test]
    async fn test_authenticate_sends_session_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/voyager/api/me"))
            .and(header("csrf-token", "ajax:1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "lidc=fresh; Path=/")
                    .set_body_json(json!({ "plainId": 1 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let state = client(&server).authenticate(&credential()).await.unwrap();
        assert_eq!(state.cookies.get("lidc").map(String::as_str), Some("fresh"));
    }

    #[tokio::test]
    async fn test_authenticate_rejected() {
        let server = MockServer::start().await;
        Mock::given(path("/voyager/api/me"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server).authenticate(&credential()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_search_parses_elements() {
        let server = MockServer::start().await;
        Mock::given(path("/voyager/api/voyagerJobsDashJobCards"))
            .and(query_param("start", "20"))
            .and(query_param("count", "20"))
            .and(query_param("listedAt", "r86400"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "elements": [
                    { "entityUrn": "urn:li:fs_normalized_jobPosting:1", "title": "A" },
                    { "title": "no id" },
                    { "id": "2", "title": "B" }
                ]
            })))
            .mount(&server)
            .await;

        let query = SearchQuery {
            keyword: "data engineer".into(),
            location: "Australia".into(),
            limit: 20,
            offset: 20,
            listed_after_secs: 86_400,
        };
        let mut state = SessionState::from_credential(&credential());
        let page = client(&server).search(&mut state, &query).await.unwrap();

        let ids: Vec<_> = page.results.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(page.returned, 3);
    }

    #[tokio::test]
    async fn test_detail_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(path("/voyager/api/jobs/jobPostings/7"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let mut state = SessionState::from_credential(&credential());
        let err = client(&server).detail(&mut state, "7").await.unwrap_err();
        assert_eq!(err, ProviderError::RateLimited { status: 429 });
    }

    #[tokio::test]
    async fn test_detail_sends_decoration_id() {
        let server = MockServer::start().await;
        Mock::given(path("/voyager/api/jobs/jobPostings/7"))
            .and(query_param(
                "decorationId",
                ProviderConfig::default().job_decoration_id,
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "companyName": "Acme",
                "formattedEmploymentStatus": "Full-time"
            })))
            .mount(&server)
            .await;

        let mut state = SessionState::from_credential(&credential());
        let detail = client(&server).detail(&mut state, "7").await.unwrap();
        assert_eq!(detail.company_name.as_deref(), Some("Acme"));
        assert_eq!(detail.employment_type.as_deref(), Some("Full-time"));
    }
}
