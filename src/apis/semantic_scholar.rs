use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{PaperRecord, PaperSource, PaperYear, SourceError};
use crate::config::Config;

const SEARCH_FIELDS: &str = "title,year,url,authors,citationCount";
const MATCH_FIELDS: &str = "paperId,title,abstract,year,authors,citationCount";
const DETAIL_FIELDS: &str =
    "title,abstract,year,authors,citationCount,venue,publicationVenue,openAccessPdf";

pub struct SemanticScholarClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    min_year: u16,
    fetch_limit: u32,
    retry_max_attempts: u32,
    retry_delay: Duration,
}

impl SemanticScholarClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("paper-scout/0.1")
                .build()
                .unwrap(),
            base_url: config.semantic_scholar_url.clone(),
            api_key: config.semantic_scholar_api_key.clone(),
            min_year: config.min_year,
            fetch_limit: config.fetch_limit,
            retry_max_attempts: config.retry_max_attempts,
            retry_delay: config.retry_delay,
        }
    }

    fn add_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("x-api-key", key),
            None => req,
        }
    }

    /// GET with a bounded retry loop on 429. The delay grows linearly
    /// with the attempt number; exhausting the budget is an error.
    async fn get_with_retry(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response, SourceError> {
        let mut attempt = 0u32;
        loop {
            let resp = self.add_auth(self.client.get(url).query(query)).send().await?;
            if resp.status() != reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Ok(resp);
            }
            if attempt >= self.retry_max_attempts {
                return Err(SourceError::RateLimited { retries: attempt });
            }
            attempt += 1;
            tokio::time::sleep(self.retry_delay * attempt).await;
        }
    }

    /// Find the paper best matching a title and year among the top 5
    /// search candidates: case-insensitive title equality plus a year
    /// match wins, otherwise the first candidate is taken.
    pub async fn match_paper(
        &self,
        title: &str,
        year: PaperYear,
    ) -> Result<Option<String>, SourceError> {
        let url = format!("{}/paper/search", self.base_url);
        let resp = self
            .get_with_retry(&url, &[("query", title), ("limit", "5"), ("fields", MATCH_FIELDS)])
            .await?;
        if !resp.status().is_success() {
            return Err(SourceError::Api(format!(
                "Semantic Scholar API error: {}",
                resp.status()
            )));
        }
        let body: S2SearchResponse = resp.json().await?;
        let candidates = body.data.unwrap_or_default();

        let wanted_title = title.to_lowercase();
        let best = candidates
            .iter()
            .find(|p| {
                p.title.as_ref().is_some_and(|t| t.to_lowercase() == wanted_title)
                    && year.known().is_some_and(|y| p.year == Some(y))
            })
            .or_else(|| candidates.first());
        Ok(best.and_then(|p| p.paper_id.clone()))
    }

    /// Fetch the full detail record for a paper ID.
    pub async fn get_paper(&self, paper_id: &str) -> Result<Option<PaperDetails>, SourceError> {
        let url = format!("{}/paper/{}", self.base_url, paper_id);
        let resp = self.get_with_retry(&url, &[("fields", DETAIL_FIELDS)]).await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(SourceError::Api(format!(
                "Semantic Scholar API error: {}",
                resp.status()
            )));
        }
        let paper: S2Paper = resp.json().await?;
        Ok(Some(PaperDetails {
            title: paper.title.clone().unwrap_or_else(|| "No title".to_string()),
            year: paper.year.into(),
            authors: join_authors(paper.authors.as_deref()),
            venue: paper.venue.clone().filter(|v| !v.is_empty()),
            citation_count: paper.citation_count,
            abstract_text: paper.abstract_text.clone().filter(|a| !a.is_empty()),
            open_access_pdf: paper.open_access_pdf.and_then(|pdf| pdf.url),
        }))
    }
}

/// Detail record backing the summarizer's official-abstract path.
#[derive(Debug, Clone)]
pub struct PaperDetails {
    pub title: String,
    pub year: PaperYear,
    pub authors: String,
    pub venue: Option<String>,
    pub citation_count: Option<u32>,
    pub abstract_text: Option<String>,
    pub open_access_pdf: Option<String>,
}

#[derive(Deserialize)]
struct S2SearchResponse {
    data: Option<Vec<S2Paper>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Paper {
    paper_id: Option<String>,
    title: Option<String>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    year: Option<u16>,
    authors: Option<Vec<S2Author>>,
    citation_count: Option<u32>,
    url: Option<String>,
    venue: Option<String>,
    open_access_pdf: Option<S2Pdf>,
}

#[derive(Deserialize)]
struct S2Author {
    name: Option<String>,
}

#[derive(Deserialize)]
struct S2Pdf {
    url: Option<String>,
}

fn join_authors(authors: Option<&[S2Author]>) -> String {
    authors
        .map(|a| a.iter().filter_map(|a| a.name.clone()).collect::<Vec<_>>().join(", "))
        .filter(|joined| !joined.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn s2_to_record(p: &S2Paper) -> PaperRecord {
    PaperRecord {
        title: p.title.clone().unwrap_or_else(|| "No title".to_string()),
        authors: join_authors(p.authors.as_deref()),
        year: p.year.into(),
        link: p.url.clone().unwrap_or_else(|| "No link".to_string()),
        citations: Some(p.citation_count.unwrap_or(0)),
        journal: None,
    }
}

#[async_trait]
impl PaperSource for SemanticScholarClient {
    fn name(&self) -> &str {
        "semantic_scholar"
    }

    async fn fetch(&self, field: &str) -> Result<Vec<PaperRecord>, SourceError> {
        let url = format!("{}/paper/search", self.base_url);
        let limit = self.fetch_limit.to_string();
        let resp = self
            .get_with_retry(
                &url,
                &[("query", field), ("limit", limit.as_str()), ("fields", SEARCH_FIELDS)],
            )
            .await?;
        if !resp.status().is_success() {
            return Err(SourceError::Api(format!(
                "Semantic Scholar API error: {}",
                resp.status()
            )));
        }
        let body: S2SearchResponse = resp.json().await?;

        let mut papers: Vec<PaperRecord> = body
            .data
            .unwrap_or_default()
            .iter()
            .filter(|p| p.year.is_some_and(|y| y >= self.min_year))
            .map(s2_to_record)
            .collect();
        papers.sort_by(|a, b| b.citations.unwrap_or(0).cmp(&a.citations.unwrap_or(0)));
        Ok(papers)
    }
}
