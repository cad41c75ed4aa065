use crate::error::ApiError;
use crate::responses::{OrganizationResponse, SearchResponse};
use async_trait::async_trait;
use configuration::RegistryConfig;
use core_types::{Organization, SearchResults};
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

pub mod error;
pub mod generation;
pub mod responses;
pub mod retry;
// --- Public API ---
pub use generation::{RequestGeneration, Ticket};
pub use retry::{Endpoint, RetryPolicy};

/// The abstract interface for a nonprofit registry client.
/// This trait is the contract the command handlers use, allowing the
/// underlying implementation (live or mock) to be swapped out.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Searches the registry for organizations matching `term`.
    ///
    /// Fails with `ApiError::EmptySearchTerm` before any I/O when the term is blank.
    async fn search_organizations(&self, term: &str) -> Result<SearchResults, ApiError>;

    /// Fetches one organization and its filings.
    ///
    /// Fails with `ApiError::NotFound` when the registry has no such record.
    async fn get_organization_detail(&self, ein: &str) -> Result<Organization, ApiError>;
}

/// A concrete implementation of the `RegistryClient` for the ProPublica
/// Nonprofit Explorer API.
#[derive(Clone)]
pub struct ProPublicaClient {
    client: reqwest::Client,
    base_url: Url,
    retry_policy: RetryPolicy,
}

impl ProPublicaClient {
    pub fn new(config: &RegistryConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            retry_policy: RetryPolicy::from_config(&config.endpoints),
        })
    }

    /// Replaces the endpoints taken from configuration.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    fn resource_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Fetches `target` through each endpoint of the retry policy in turn.
    ///
    /// Returns `Ok(None)` when the registry itself answers 404, which is final
    /// and is not retried through the remaining endpoints. A 404 from a proxy
    /// only says the relay could not be reached and moves on to the next one.
    async fn fetch_json(&self, target: &Url) -> Result<Option<Value>, ApiError> {
        let mut last_error = None;

        for (attempt, endpoint) in self.retry_policy.endpoints().iter().enumerate() {
            let url = endpoint.resolve(target.as_str());
            tracing::debug!(attempt = attempt + 1, %endpoint, %url, "Requesting registry resource.");

            match self.attempt(endpoint, &url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    tracing::warn!(error = %e, %endpoint, "Registry endpoint failed.");
                    last_error = Some(e);
                }
            }
        }

        Err(ApiError::Exhausted {
            attempts: self.retry_policy.endpoints().len(),
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no endpoints configured".to_string()),
        })
    }

    async fn attempt(&self, endpoint: &Endpoint, url: &str) -> Result<Option<Value>, ApiError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND && *endpoint == Endpoint::Direct {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| ApiError::Deserialization(format!("{e}. Original text: {}", preview(&text))))?;
        if !body.is_object() {
            return Err(ApiError::InvalidResponse(
                "expected a JSON object at the top level".to_string(),
            ));
        }
        Ok(Some(body))
    }
}

#[async_trait]
impl RegistryClient for ProPublicaClient {
    async fn search_organizations(&self, term: &str) -> Result<SearchResults, ApiError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ApiError::EmptySearchTerm);
        }

        let mut url = self.resource_url(&["search.json"])?;
        url.query_pairs_mut().append_pair("q", term);

        // The registry answers a search without hits with a 404.
        let Some(body) = self.fetch_json(&url).await? else {
            tracing::info!(term, "Search returned no organizations.");
            return Ok(SearchResults::default());
        };

        if !body.get("organizations").is_some_and(Value::is_array) {
            return Err(ApiError::InvalidResponse(
                "search response is missing the `organizations` collection".to_string(),
            ));
        }

        let response: SearchResponse =
            serde_json::from_value(body).map_err(|e| ApiError::Deserialization(e.to_string()))?;
        let results = SearchResults::from(response);
        tracing::info!(
            term,
            returned = results.organizations.len(),
            total = results.total_results,
            "Search complete."
        );
        Ok(results)
    }

    async fn get_organization_detail(&self, ein: &str) -> Result<Organization, ApiError> {
        let ein: String = ein.trim().chars().filter(|c| *c != '-').collect();
        if ein.is_empty() {
            return Err(ApiError::EmptyIdentifier);
        }

        let url = self.resource_url(&["organizations", &format!("{ein}.json")])?;

        let Some(body) = self.fetch_json(&url).await? else {
            return Err(ApiError::NotFound(ein));
        };

        if !body.get("organization").is_some_and(Value::is_object) {
            return Err(ApiError::InvalidResponse(
                "organization response is missing the `organization` record".to_string(),
            ));
        }

        let response: OrganizationResponse =
            serde_json::from_value(body).map_err(|e| ApiError::Deserialization(e.to_string()))?;
        let organization = Organization::try_from(response)?;
        tracing::info!(
            ein = %organization.ein,
            filings = organization.filings.len(),
            "Organization detail fetched."
        );
        Ok(organization)
    }
}

/// The first 200 characters of a response body, for error messages.
fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(200).collect();
    if text.chars().nth(200).is_some() {
        preview.push_str("...");
    }
    preview
}
