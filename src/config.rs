use std::sync::Arc;
use std::time::Duration;

use crate::apis::{self, PaperSource};

/// Default port for the HTTP API.
const DEFAULT_PORT: u16 = 5000;

/// Papers published before this year are dropped by every adapter.
const DEFAULT_MIN_YEAR: u16 = 2022;

/// Per-provider result cap for one aggregate request.
const DEFAULT_FETCH_LIMIT: u32 = 50;

/// Max retries after a Semantic Scholar 429 before giving up.
const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;

/// Base delay between 429 retries, scaled by the attempt number.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

const SEMANTIC_SCHOLAR_URL: &str = "https://api.semanticscholar.org/graph/v1";
const CROSSREF_URL: &str = "https://api.crossref.org/works";
const PUBMED_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const SCHOLAR_PROXY_URL: &str = "http://127.0.0.1:5001";
const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const GEMINI_MODEL: &str = "gemini-pro";

/// Service configuration. Provider base URLs are per-instance so tests
/// can substitute a mock server.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub semantic_scholar_url: String,
    pub semantic_scholar_api_key: Option<String>,
    pub crossref_url: String,
    pub pubmed_url: String,
    pub scholar_proxy_url: String,
    pub gemini_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub min_year: u16,
    pub fetch_limit: u32,
    pub retry_max_attempts: u32,
    pub retry_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let scholar_proxy_url = std::env::var("SCHOLAR_PROXY_URL")
            .unwrap_or_else(|_| SCHOLAR_PROXY_URL.to_string());

        let gemini_model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| GEMINI_MODEL.to_string());

        Self {
            port,
            semantic_scholar_url: SEMANTIC_SCHOLAR_URL.to_string(),
            semantic_scholar_api_key: std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok(),
            crossref_url: CROSSREF_URL.to_string(),
            pubmed_url: PUBMED_URL.to_string(),
            scholar_proxy_url,
            gemini_url: GEMINI_URL.to_string(),
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
            gemini_model,
            min_year: DEFAULT_MIN_YEAR,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            retry_max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Configuration with every provider pointed at one mock server.
    /// Retry delays are zeroed so retry paths run instantly in tests.
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            port: 0,
            semantic_scholar_url: format!("{}/graph/v1", base_url),
            semantic_scholar_api_key: None,
            crossref_url: format!("{}/works", base_url),
            pubmed_url: format!("{}/entrez/eutils", base_url),
            scholar_proxy_url: base_url.to_string(),
            gemini_url: format!("{}/v1beta", base_url),
            gemini_api_key: Some("test-key".to_string()),
            gemini_model: GEMINI_MODEL.to_string(),
            min_year: DEFAULT_MIN_YEAR,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            retry_max_attempts: 2,
            retry_delay: Duration::from_millis(0),
        }
    }

    /// Build the source list in the order aggregate results are merged:
    /// Semantic Scholar, CrossRef, PubMed, Google-Scholar proxy. The
    /// Semantic Scholar client is shared with the summarizer, so the
    /// caller constructs it and passes it in.
    pub fn build_sources(
        &self,
        semantic_scholar: Arc<apis::semantic_scholar::SemanticScholarClient>,
    ) -> Vec<Arc<dyn PaperSource>> {
        vec![
            semantic_scholar,
            Arc::new(apis::crossref::CrossRefClient::new(self)),
            Arc::new(apis::pubmed::PubMedClient::new(self)),
            Arc::new(apis::scholar_proxy::ScholarProxyClient::new(self)),
        ]
    }
}
