use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use super::{PaperRecord, PaperSource, PaperYear, SourceError};
use crate::config::Config;

pub struct PubMedClient {
    client: reqwest::Client,
    base_url: String,
    min_year: u16,
    fetch_limit: u32,
}

impl PubMedClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("paper-scout/0.1")
                .build()
                .unwrap(),
            base_url: config.pubmed_url.clone(),
            min_year: config.min_year,
            fetch_limit: config.fetch_limit,
        }
    }

    /// esearch: resolve a field query to a list of PMIDs.
    async fn esearch(&self, field: &str) -> Result<Vec<String>, SourceError> {
        let url = format!("{}/esearch.fcgi", self.base_url);
        let retmax = self.fetch_limit.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("db", "pubmed"),
                ("term", field),
                ("retmode", "json"),
                ("retmax", retmax.as_str()),
                ("sort", "pub date"),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(SourceError::Api(format!("PubMed API error: {}", resp.status())));
        }
        let body: ESearchResponse = resp.json().await?;
        Ok(body.esearchresult.map(|r| r.idlist).unwrap_or_default())
    }

    /// esummary: fetch summary documents for a list of PMIDs.
    async fn esummary(&self, pmids: &[String]) -> Result<Vec<PubMedDoc>, SourceError> {
        let url = format!("{}/esummary.fcgi", self.base_url);
        let ids = pmids.join(",");
        let resp = self
            .client
            .get(&url)
            .query(&[("db", "pubmed"), ("id", ids.as_str()), ("retmode", "json")])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(SourceError::Api(format!("PubMed API error: {}", resp.status())));
        }
        let body: ESummaryResponse = resp.json().await?;

        let Some(result) = body.result else {
            return Ok(Vec::new());
        };
        // The result object maps each uid to its document, plus a "uids"
        // key listing them; walk the uid list to keep the API's order.
        Ok(result
            .uids
            .iter()
            .filter_map(|uid| result.docs.get(uid))
            .filter_map(|doc| serde_json::from_value::<PubMedDoc>(doc.clone()).ok())
            .collect())
    }
}

#[derive(Deserialize)]
struct ESearchResponse {
    esearchresult: Option<ESearchResult>,
}

#[derive(Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

#[derive(Deserialize)]
struct ESummaryResponse {
    result: Option<ESummaryResult>,
}

#[derive(Deserialize)]
struct ESummaryResult {
    #[serde(default)]
    uids: Vec<String>,
    #[serde(flatten)]
    docs: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct PubMedDoc {
    uid: Option<String>,
    title: Option<String>,
    pubdate: Option<String>,
    #[serde(default)]
    authors: Vec<PubMedAuthor>,
    fulljournalname: Option<String>,
}

#[derive(Deserialize)]
struct PubMedAuthor {
    name: Option<String>,
}

/// Leading token of an esummary pubdate, e.g. `"2023 Jan 15"` -> 2023.
fn pubdate_year(pubdate: &str) -> Option<u16> {
    pubdate.split_whitespace().next()?.parse().ok()
}

fn doc_to_record(doc: &PubMedDoc) -> PaperRecord {
    let authors = doc
        .authors
        .iter()
        .filter_map(|a| a.name.clone())
        .collect::<Vec<_>>()
        .join(", ");

    PaperRecord {
        title: doc
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "No title".to_string()),
        authors: if authors.is_empty() { "Unknown".to_string() } else { authors },
        year: doc.pubdate.as_deref().and_then(pubdate_year).into(),
        link: format!(
            "https://pubmed.ncbi.nlm.nih.gov/{}/",
            doc.uid.as_deref().unwrap_or_default()
        ),
        citations: None,
        journal: doc.fulljournalname.clone().filter(|j| !j.is_empty()),
    }
}

#[async_trait]
impl PaperSource for PubMedClient {
    fn name(&self) -> &str {
        "pubmed"
    }

    async fn fetch(&self, field: &str) -> Result<Vec<PaperRecord>, SourceError> {
        let pmids = self.esearch(field).await?;
        if pmids.is_empty() {
            return Ok(Vec::new());
        }

        let docs = self.esummary(&pmids).await?;
        Ok(docs
            .iter()
            .filter(|doc| {
                doc.pubdate
                    .as_deref()
                    .and_then(pubdate_year)
                    .is_some_and(|y| y >= self.min_year)
            })
            .map(doc_to_record)
            .collect())
    }
}
