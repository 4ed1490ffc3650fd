pub mod crossref;
pub mod pubmed;
pub mod scholar_proxy;
pub mod semantic_scholar;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Publication year as exposed to clients: a JSON number when known,
/// the literal string `"Unknown"` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperYear {
    Known(u16),
    Unknown,
}

impl PaperYear {
    pub fn known(self) -> Option<u16> {
        match self {
            PaperYear::Known(y) => Some(y),
            PaperYear::Unknown => None,
        }
    }

    /// Parse a provider year token, e.g. `"2023"`.
    pub fn parse(token: &str) -> Self {
        token
            .trim()
            .parse::<u16>()
            .map(PaperYear::Known)
            .unwrap_or(PaperYear::Unknown)
    }
}

impl From<Option<u16>> for PaperYear {
    fn from(year: Option<u16>) -> Self {
        year.map(PaperYear::Known).unwrap_or(PaperYear::Unknown)
    }
}

impl std::fmt::Display for PaperYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaperYear::Known(y) => write!(f, "{}", y),
            PaperYear::Unknown => write!(f, "Unknown"),
        }
    }
}

impl Serialize for PaperYear {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PaperYear::Known(y) => serializer.serialize_u16(*y),
            PaperYear::Unknown => serializer.serialize_str("Unknown"),
        }
    }
}

impl<'de> Deserialize<'de> for PaperYear {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::Number(n) => n
                .as_u64()
                .and_then(|y| u16::try_from(y).ok())
                .map(PaperYear::Known)
                .unwrap_or(PaperYear::Unknown),
            serde_json::Value::String(s) => PaperYear::parse(&s),
            _ => PaperYear::Unknown,
        })
    }
}

/// Normalized paper record shared by all source adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRecord {
    pub title: String,
    pub authors: String,
    pub year: PaperYear,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limited, gave up after {retries} retries")]
    RateLimited { retries: u32 },
}

#[async_trait]
pub trait PaperSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch records for a field query and normalize them.
    async fn fetch(&self, field: &str) -> Result<Vec<PaperRecord>, SourceError>;

    /// Like [`PaperSource::fetch`], but failures collapse to an empty
    /// list. One misbehaving provider must never abort an aggregate
    /// request.
    async fn search(&self, field: &str) -> Vec<PaperRecord> {
        match self.fetch(field).await {
            Ok(papers) => papers,
            Err(e) => {
                tracing::warn!("Source {} failed: {}", self.name(), e);
                Vec::new()
            }
        }
    }
}
