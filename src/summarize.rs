use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::apis::semantic_scholar::{PaperDetails, SemanticScholarClient};
use crate::apis::{PaperYear, SourceError};
use crate::llm::{GeminiClient, LlmError};

/// Paper identity sent by the client when requesting a summary.
#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub title: String,
    pub authors: String,
    pub year: PaperYear,
    #[serde(default)]
    pub link: String,
}

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("LLM analysis failed: {0}")]
    Llm(#[from] LlmError),
}

/// Produces the display block for a selected paper: the official
/// Semantic Scholar abstract when one exists, an LLM-generated analysis
/// otherwise.
pub struct Summarizer {
    scholar: Arc<SemanticScholarClient>,
    llm: GeminiClient,
}

impl Summarizer {
    pub fn new(scholar: Arc<SemanticScholarClient>, llm: GeminiClient) -> Self {
        Self { scholar, llm }
    }

    pub async fn summarize(&self, req: &SummarizeRequest) -> Result<String, SummarizeError> {
        // A lookup failure is not fatal; it just means no official
        // abstract, same as an empty search result.
        let details = match self.lookup_details(&req.title, req.year).await {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!("Semantic Scholar fetch failed: {}", e);
                None
            }
        };

        if let Some(details) = details.filter(|d| d.abstract_text.is_some()) {
            return Ok(format_abstract_block(&details));
        }

        let prompt = analysis_prompt(&req.title, &req.authors, req.year);
        let analysis = self.llm.generate(&prompt).await?;
        Ok(format_analysis_block(&req.title, &req.authors, req.year, &analysis))
    }

    async fn lookup_details(
        &self,
        title: &str,
        year: PaperYear,
    ) -> Result<Option<PaperDetails>, SourceError> {
        let Some(paper_id) = self.scholar.match_paper(title, year).await? else {
            return Ok(None);
        };
        self.scholar.get_paper(&paper_id).await
    }
}

fn format_abstract_block(details: &PaperDetails) -> String {
    let mut block = format!(
        "📑 RESEARCH PAPER DETAILS\n\nTitle: {}\nYear: {}\nAuthors: {}\n",
        details.title, details.year, details.authors
    );
    if let Some(venue) = &details.venue {
        block.push_str(&format!("Venue: {}\n", venue));
    }
    if let Some(citations) = details.citation_count.filter(|&c| c > 0) {
        block.push_str(&format!("Citations: {}\n", citations));
    }
    block.push_str(&format!(
        "\n📌 ABSTRACT\n\n{}\n",
        details.abstract_text.as_deref().unwrap_or_default()
    ));
    if let Some(pdf) = &details.open_access_pdf {
        block.push_str(&format!("\n🔓 Open Access PDF available at: {}\n", pdf));
    }
    block.push_str(&format!(
        "\n---\nSource: Semantic Scholar\nRetrieved: {}",
        chrono::Local::now().format("%Y-%m-%d")
    ));
    block
}

fn analysis_prompt(title: &str, authors: &str, year: PaperYear) -> String {
    format!(
        r#"Analyze this research paper:
Title: "{title}"
Year: {year}
Authors: {authors}

Please provide a structured analysis in the following format:

📌 RESEARCH OVERVIEW
• Field of Study:
• Main Research Question:
• Key Objectives:

🔍 POTENTIAL METHODOLOGY
• Likely Research Methods:
• Possible Data Sources:
• Expected Approach:

💡 EXPECTED CONTRIBUTIONS
• Potential Findings:
• Likely Impact:
• Applications:

Note: This is an AI analysis based on the paper's metadata as the full text was not accessible."#
    )
}

fn format_analysis_block(title: &str, authors: &str, year: PaperYear, analysis: &str) -> String {
    format!(
        "⚠️ ABSTRACT NOT AVAILABLE\n\n\
         We could not retrieve the official abstract for this paper. Below is an \
         AI-generated analysis based on the available metadata:\n\n\
         {analysis}\n\n\
         ---\n\
         Paper Details:\n\
         • Title: {title}\n\
         • Authors: {authors}\n\
         • Year: {year}\n\
         • Note: This is an AI-generated analysis, not the official abstract.\n\
         • Last Updated: {date}",
        date = chrono::Local::now().format("%Y-%m-%d")
    )
}
