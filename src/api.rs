//! Query client for the JobTech job-search API.
//!
//! Builds paginated search requests from a [`SearchSpec`], decodes the
//! hits/total envelope and runs every hit through the normalizer. All
//! parameter construction is pure so it can be tested without a network.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::mapping;
use crate::models::{JobPosting, SortKey};
use crate::normalize::{normalize, RawJobHit};

const API_BASE_URL: &str = "https://jobsearch.api.jobtechdev.se/search";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search request failed with status {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed search response: {0}")]
    Malformed(String),
}

/// Fully resolved query against the search API. Built by the job store from
/// its current filter, sort and page; field labels are still the local ones,
/// translation to API vocabulary happens in [`build_search_params`].
#[derive(Debug, Clone, Default)]
pub struct SearchSpec {
    pub query: String,
    pub page: usize,
    pub limit: usize,
    pub category: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub remote: Option<bool>,
    pub sort: Option<SortKey>,
}

/// One page of normalized results.
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub jobs: Vec<JobPosting>,
    pub total_jobs: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

/// Translates a [`SearchSpec`] into query parameters.
///
/// A location constraint is AND-ed into the free-text query as a disjunction
/// over municipality, city and region, so a single term matches any address
/// granularity. Parameters whose mapped value is `None` are omitted entirely.
pub fn build_search_params(spec: &SearchSpec) -> Vec<(String, String)> {
    let page = spec.page.max(1);
    let offset = (page - 1) * spec.limit;

    let mut params = vec![
        ("offset".to_string(), offset.to_string()),
        ("limit".to_string(), spec.limit.to_string()),
    ];

    let mut q = if spec.query.is_empty() {
        "*".to_string()
    } else {
        spec.query.clone()
    };
    if let Some(location) = &spec.location {
        q = format!(
            "{q} AND (workplace-address.municipality:{location} \
             OR workplace-address.city:{location} \
             OR workplace-address.region:{location})"
        );
    }
    params.push(("q".to_string(), q));

    if let Some(occupation) = mapping::occupation_field_code(spec.category.as_deref()) {
        params.push(("occupation".to_string(), occupation));
    }
    if let Some(employment) = mapping::employment_type_code(spec.employment_type.as_deref()) {
        params.push(("employment-type".to_string(), employment));
    }
    if let Some(remote) = spec.remote {
        params.push(("remote".to_string(), remote.to_string()));
    }
    if let Some(sort) = spec.sort {
        params.push(("sort".to_string(), sort.as_param().to_string()));
    }

    params
}

#[derive(Debug, Deserialize)]
struct TotalCount {
    value: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    hits: Option<Vec<RawJobHit>>,
    total: Option<TotalCount>,
}

/// Seam between the job store and the network. The store is generic over this
/// so tests can drive it with a scripted provider.
pub trait SearchProvider {
    fn search(
        &self,
        spec: &SearchSpec,
    ) -> impl std::future::Future<Output = Result<SearchPage, SearchError>> + Send;

    fn fetch_by_id(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Option<JobPosting>> + Send;
}

pub struct HttpSearchClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSearchClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            base_url: API_BASE_URL.to_string(),
        }
    }

    async fn get_envelope(&self, params: &[(String, String)]) -> Result<SearchEnvelope, SearchError> {
        debug!(?params, "querying search API");

        let response = self
            .client
            .get(&self.base_url)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status));
        }

        let envelope: SearchEnvelope = response
            .json()
            .await
            .map_err(|e| SearchError::Malformed(e.to_string()))?;

        if envelope.hits.is_none() {
            return Err(SearchError::Malformed("missing hits array".to_string()));
        }

        Ok(envelope)
    }

    /// Total hit count for a specification, without fetching the hits
    /// themselves. A one-record probe against the same parameters.
    pub async fn total_hits(&self, spec: &SearchSpec) -> Result<usize, SearchError> {
        let probe = SearchSpec {
            page: 1,
            limit: 1,
            ..spec.clone()
        };
        let params = build_search_params(&probe);
        let envelope = self.get_envelope(&params).await?;
        Ok(envelope.total.and_then(|t| t.value).unwrap_or(0))
    }
}

impl SearchProvider for HttpSearchClient {
    async fn search(&self, spec: &SearchSpec) -> Result<SearchPage, SearchError> {
        let params = build_search_params(spec);
        let envelope = self.get_envelope(&params).await?;

        // get_envelope already rejected a missing hits array.
        let hits = envelope.hits.unwrap_or_default();
        let total_jobs = envelope.total.and_then(|t| t.value).unwrap_or(0);
        let jobs: Vec<JobPosting> = hits.into_iter().map(normalize).collect();

        let page = spec.page.max(1);
        let total_pages = if spec.limit == 0 { 0 } else { total_jobs.div_ceil(spec.limit) };

        debug!(count = jobs.len(), total_jobs, "search complete");

        Ok(SearchPage {
            jobs,
            total_jobs,
            total_pages,
            current_page: page,
        })
    }

    /// Best-effort single-record lookup. Any failure degrades to `None`; the
    /// detail view shows an empty state instead of an error.
    async fn fetch_by_id(&self, id: &str) -> Option<JobPosting> {
        let params = vec![("id".to_string(), id.to_string())];
        match self.get_envelope(&params).await {
            Ok(envelope) => envelope
                .hits
                .unwrap_or_default()
                .into_iter()
                .next()
                .map(normalize),
            Err(e) => {
                warn!(id, error = %e, "job lookup failed");
                None
            }
        }
    }
}

impl Default for HttpSearchClient {
    fn default() -> Self {
        Self::new()
    }
}
