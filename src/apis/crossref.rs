use async_trait::async_trait;
use serde::Deserialize;

use super::{PaperRecord, PaperSource, PaperYear, SourceError};
use crate::config::Config;

const SELECT_FIELDS: &str =
    "DOI,title,author,published-print,published-online,is-referenced-by-count,container-title";

pub struct CrossRefClient {
    client: reqwest::Client,
    base_url: String,
    min_year: u16,
    fetch_limit: u32,
}

impl CrossRefClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("paper-scout/0.1 (mailto:research@example.com)")
                .build()
                .unwrap(),
            base_url: config.crossref_url.clone(),
            min_year: config.min_year,
            fetch_limit: config.fetch_limit,
        }
    }
}

#[derive(Deserialize)]
struct CRResponse {
    message: Option<CRMessage>,
}

#[derive(Deserialize)]
struct CRMessage {
    items: Option<Vec<CRItem>>,
}

#[derive(Deserialize)]
struct CRItem {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    title: Option<Vec<String>>,
    author: Option<Vec<CRAuthor>>,
    #[serde(rename = "published-print")]
    published_print: Option<CRDate>,
    #[serde(rename = "published-online")]
    published_online: Option<CRDate>,
    #[serde(rename = "is-referenced-by-count")]
    citation_count: Option<u32>,
    #[serde(rename = "container-title")]
    container_title: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct CRAuthor {
    given: Option<String>,
    family: Option<String>,
}

#[derive(Deserialize)]
struct CRDate {
    #[serde(rename = "date-parts")]
    date_parts: Option<Vec<Vec<u32>>>,
}

fn date_year(date: Option<&CRDate>) -> Option<u16> {
    date?
        .date_parts
        .as_ref()?
        .first()?
        .first()
        .and_then(|y| u16::try_from(*y).ok())
}

/// Print publication date wins over online when both are present.
fn item_year(item: &CRItem) -> Option<u16> {
    date_year(item.published_print.as_ref()).or_else(|| date_year(item.published_online.as_ref()))
}

fn item_to_record(item: &CRItem) -> PaperRecord {
    let authors = item
        .author
        .as_ref()
        .map(|a| {
            a.iter()
                .map(|a| {
                    format!(
                        "{} {}",
                        a.given.as_deref().unwrap_or(""),
                        a.family.as_deref().unwrap_or("")
                    )
                    .trim()
                    .to_string()
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .filter(|joined| !joined.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    PaperRecord {
        title: item
            .title
            .as_ref()
            .and_then(|t| t.first())
            .cloned()
            .unwrap_or_else(|| "No title".to_string()),
        authors,
        year: item_year(item).into(),
        link: item
            .doi
            .as_ref()
            .map(|doi| format!("https://doi.org/{}", doi))
            .unwrap_or_else(|| "No link".to_string()),
        citations: item.citation_count,
        journal: item.container_title.as_ref().and_then(|t| t.first()).cloned(),
    }
}

#[async_trait]
impl PaperSource for CrossRefClient {
    fn name(&self) -> &str {
        "crossref"
    }

    async fn fetch(&self, field: &str) -> Result<Vec<PaperRecord>, SourceError> {
        let rows = self.fetch_limit.to_string();
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("query", field),
                ("rows", rows.as_str()),
                ("sort", "score"),
                ("select", SELECT_FIELDS),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(SourceError::Api(format!("CrossRef API error: {}", resp.status())));
        }
        let body: CRResponse = resp.json().await?;

        Ok(body
            .message
            .and_then(|m| m.items)
            .unwrap_or_default()
            .iter()
            .filter(|item| item_year(item).is_some_and(|y| y >= self.min_year))
            .map(item_to_record)
            .collect())
    }
}
