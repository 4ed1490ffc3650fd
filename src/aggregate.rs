use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::apis::{PaperRecord, PaperSource, PaperYear};

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PER_PAGE: usize = 5;

/// Optional filters applied to the merged result set.
#[derive(Debug, Default, Clone)]
pub struct Filters {
    pub year: Option<u16>,
    pub author: Option<String>,
    pub journal: Option<String>,
}

/// One page of the merged result set plus navigation metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub total_results: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub per_page: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub papers: Vec<PaperRecord>,
}

/// Query every source concurrently, then merge, dedupe, filter, sort,
/// and paginate. Sources swallow their own failures, so the aggregate
/// always produces a result; a provider outage just shrinks it.
pub async fn aggregate_search(
    sources: &[Arc<dyn PaperSource>],
    field: &str,
    filters: &Filters,
    page: usize,
    limit: usize,
) -> SearchResult {
    let handles: Vec<_> = sources
        .iter()
        .map(|source| {
            let source = Arc::clone(source);
            let field = field.to_string();
            tokio::spawn(async move { source.search(&field).await })
        })
        .collect();

    // Handles are awaited in spawn order, which keeps the merge in
    // source-priority order for first-seen-wins deduplication.
    let mut all_records = Vec::new();
    for outcome in futures::future::join_all(handles).await {
        match outcome {
            Ok(records) => all_records.extend(records),
            Err(e) => tracing::warn!("Source task panicked: {}", e),
        }
    }

    let mut papers = dedupe_by_title(all_records);
    apply_filters(&mut papers, filters);
    sort_by_citations(&mut papers);
    paginate(papers, page, limit)
}

/// First-seen-wins on the exact, case-sensitive title string. Two
/// distinct papers with identical titles collapse into one.
fn dedupe_by_title(records: Vec<PaperRecord>) -> Vec<PaperRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    records.into_iter().filter(|p| seen.insert(p.title.clone())).collect()
}

fn apply_filters(papers: &mut Vec<PaperRecord>, filters: &Filters) {
    if let Some(year) = filters.year {
        papers.retain(|p| p.year == PaperYear::Known(year));
    }
    if let Some(author) = &filters.author {
        let needle = author.to_lowercase();
        papers.retain(|p| p.authors.to_lowercase().contains(&needle));
    }
    if let Some(journal) = &filters.journal {
        let needle = journal.to_lowercase();
        papers.retain(|p| {
            p.journal
                .as_ref()
                .is_some_and(|j| j.to_lowercase().contains(&needle))
        });
    }
}

/// Citation count descending, missing counts as zero. The sort is
/// stable, so ties keep merge order.
fn sort_by_citations(papers: &mut [PaperRecord]) {
    papers.sort_by(|a, b| b.citations.unwrap_or(0).cmp(&a.citations.unwrap_or(0)));
}

fn paginate(papers: Vec<PaperRecord>, page: usize, limit: usize) -> SearchResult {
    let total_results = papers.len();
    let total_pages = total_results.div_ceil(limit);
    let start = (page - 1) * limit;
    let page_records: Vec<PaperRecord> = papers.into_iter().skip(start).take(limit).collect();

    SearchResult {
        total_results,
        total_pages,
        current_page: page,
        per_page: limit,
        has_next_page: page < total_pages,
        has_previous_page: page > 1,
        papers: page_records,
    }
}
