use async_trait::async_trait;
use serde::Deserialize;

use super::{PaperRecord, PaperSource, PaperYear, SourceError};
use crate::config::Config;

/// Adapter for the local Google-Scholar proxy service. The proxy already
/// returns records close to the common shape; years arrive as strings.
pub struct ScholarProxyClient {
    client: reqwest::Client,
    base_url: String,
    min_year: u16,
}

impl ScholarProxyClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("paper-scout/0.1")
                .build()
                .unwrap(),
            base_url: config.scholar_proxy_url.clone(),
            min_year: config.min_year,
        }
    }
}

#[derive(Deserialize)]
struct ProxyResponse {
    #[serde(default)]
    papers: Vec<ProxyPaper>,
}

#[derive(Deserialize)]
struct ProxyPaper {
    title: Option<String>,
    authors: Option<String>,
    year: Option<PaperYear>,
    link: Option<String>,
    citations: Option<u32>,
}

fn proxy_to_record(p: &ProxyPaper) -> PaperRecord {
    PaperRecord {
        title: p.title.clone().unwrap_or_else(|| "No title".to_string()),
        authors: p.authors.clone().unwrap_or_else(|| "Unknown".to_string()),
        year: p.year.unwrap_or(PaperYear::Unknown),
        link: p.link.clone().unwrap_or_else(|| "No link".to_string()),
        citations: p.citations,
        journal: None,
    }
}

#[async_trait]
impl PaperSource for ScholarProxyClient {
    fn name(&self) -> &str {
        "google_scholar"
    }

    async fn fetch(&self, field: &str) -> Result<Vec<PaperRecord>, SourceError> {
        let url = format!("{}/api/scholar", self.base_url);
        let resp = self.client.get(&url).query(&[("field", field)]).send().await?;
        if !resp.status().is_success() {
            return Err(SourceError::Api(format!(
                "Google Scholar proxy error: {}",
                resp.status()
            )));
        }
        let body: ProxyResponse = resp.json().await?;

        Ok(body
            .papers
            .iter()
            .filter(|p| {
                p.year
                    .and_then(PaperYear::known)
                    .is_some_and(|y| y >= self.min_year)
            })
            .map(proxy_to_record)
            .collect())
    }
}
