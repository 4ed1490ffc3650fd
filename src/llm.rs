use serde_json::Value;
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("GEMINI_API_KEY is not set")]
    MissingKey,
    #[error("Gemini authentication failed")]
    AuthFailed,
    #[error("Gemini rate limited")]
    RateLimited,
    #[error("Gemini request failed: {0}")]
    Request(String),
    #[error("Failed to parse Gemini response: {0}")]
    ResponseParse(String),
}

/// Minimal Gemini client for single-turn text generation.
///
/// Auth is a `?key=` query parameter; the response text is the
/// concatenation of the first candidate's text parts.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("paper-scout/0.1")
                .build()
                .unwrap(),
            base_url: config.gemini_url.clone(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
        }
    }

    /// Generate text for a prompt via `generateContent`.
    pub async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingKey)?;
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );
        let body = serde_json::json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}]
        });

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Request(format!("Request to Gemini API failed: {}", e)))?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| LlmError::ResponseParse(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthFailed,
                429 => LlmError::RateLimited,
                _ => LlmError::Request(format!("HTTP {} from Gemini API: {}", status, body_text)),
            });
        }

        let json: Value = serde_json::from_str(&body_text)
            .map_err(|e| LlmError::ResponseParse(format!("Invalid JSON in response: {}", e)))?;
        extract_text(&json)
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

/// Concatenated text parts of the first candidate.
fn extract_text(body: &Value) -> Result<String, LlmError> {
    let candidates = body["candidates"]
        .as_array()
        .ok_or_else(|| LlmError::ResponseParse("Missing 'candidates' array".to_string()))?;
    let first = candidates
        .first()
        .ok_or_else(|| LlmError::ResponseParse("Empty 'candidates' array".to_string()))?;
    let parts = first["content"]["parts"]
        .as_array()
        .ok_or_else(|| LlmError::ResponseParse("Missing 'parts' array".to_string()))?;

    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if text.is_empty() {
        return Err(LlmError::ResponseParse("No text in candidate parts".to_string()));
    }
    Ok(text)
}
