use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::aggregate::{self, Filters};
use crate::apis::semantic_scholar::SemanticScholarClient;
use crate::apis::PaperSource;
use crate::config::Config;
use crate::llm::GeminiClient;
use crate::summarize::{SummarizeRequest, Summarizer};

#[derive(Clone)]
pub struct AppState {
    pub sources: Arc<Vec<Arc<dyn PaperSource>>>,
    pub summarizer: Arc<Summarizer>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        let scholar = Arc::new(SemanticScholarClient::new(config));
        let sources = config.build_sources(Arc::clone(&scholar));
        let summarizer = Summarizer::new(scholar, GeminiClient::new(config));
        Self { sources: Arc::new(sources), summarizer: Arc::new(summarizer) }
    }
}

/// JSON error body for 4xx/5xx responses.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
struct SummaryResult {
    summary: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/research", get(research))
        .route("/api/summarize", post(summarize))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ResearchParams {
    field: Option<String>,
    year: Option<u16>,
    author: Option<String>,
    journal: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

async fn research(
    State(state): State<AppState>,
    Query(params): Query<ResearchParams>,
) -> Response {
    let Some(field) = params.field.filter(|f| !f.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiError { error: "Research field is required.".to_string(), details: None }),
        )
            .into_response();
    };

    // Zero counts as unset, so page=0 or limit=0 fall back to defaults.
    let page = params.page.filter(|&p| p > 0).unwrap_or(aggregate::DEFAULT_PAGE);
    let limit = params.limit.filter(|&l| l > 0).unwrap_or(aggregate::DEFAULT_PER_PAGE);
    let filters =
        Filters { year: params.year, author: params.author, journal: params.journal };

    let result = aggregate::aggregate_search(&state.sources, &field, &filters, page, limit).await;
    Json(result).into_response()
}

async fn summarize(
    State(state): State<AppState>,
    Json(req): Json<SummarizeRequest>,
) -> Response {
    tracing::info!(title = %req.title, link = %req.link, "Summarize request");
    match state.summarizer.summarize(&req).await {
        Ok(summary) => Json(SummaryResult { summary }).into_response(),
        Err(e) => {
            tracing::error!("Error in summarization endpoint: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError {
                    error: "Failed to retrieve or generate summary. Please try again later."
                        .to_string(),
                    details: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}
