//! Adapter tests against a mock HTTP server.
//!
//! Every provider failure mode must collapse to an empty result list;
//! an aggregate request never fails because one provider did.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use paper_scout::apis::crossref::CrossRefClient;
use paper_scout::apis::pubmed::PubMedClient;
use paper_scout::apis::scholar_proxy::ScholarProxyClient;
use paper_scout::apis::semantic_scholar::SemanticScholarClient;
use paper_scout::apis::{PaperSource, PaperYear};
use paper_scout::config::Config;

fn s2_paper(title: &str, year: u16, citations: u32) -> serde_json::Value {
    json!({
        "paperId": format!("id-{}", title),
        "title": title,
        "year": year,
        "citationCount": citations,
        "url": format!("https://www.semanticscholar.org/paper/{}", title),
        "authors": [{"name": "Test Author"}]
    })
}

// ── Semantic Scholar ────────────────────────────────────────────────────────

#[tokio::test]
async fn semantic_scholar_filters_and_sorts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .and(query_param("query", "quantum computing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 3,
            "data": [
                s2_paper("Old Paper", 2021, 900),
                s2_paper("Recent Low", 2023, 5),
                s2_paper("Recent High", 2024, 50),
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = SemanticScholarClient::new(&Config::for_testing(&mock_server.uri()));
    let papers = client.search("quantum computing").await;

    let titles: Vec<&str> = papers.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Recent High", "Recent Low"]);
    assert_eq!(papers[0].citations, Some(50));
    assert_eq!(papers[0].year, PaperYear::Known(2024));
}

#[tokio::test]
async fn semantic_scholar_retries_once_after_rate_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [s2_paper("After Retry", 2023, 1)]
        })))
        .mount(&mock_server)
        .await;

    let client = SemanticScholarClient::new(&Config::for_testing(&mock_server.uri()));
    let papers = client.search("ai").await;

    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].title, "After Retry");
}

#[tokio::test]
async fn semantic_scholar_gives_up_after_bounded_retries() {
    let mock_server = MockServer::start().await;

    // for_testing allows 2 retries: 3 requests total, never more.
    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = SemanticScholarClient::new(&Config::for_testing(&mock_server.uri()));
    let papers = client.search("ai").await;
    assert!(papers.is_empty());
}

#[tokio::test]
async fn semantic_scholar_server_error_yields_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = SemanticScholarClient::new(&Config::for_testing(&mock_server.uri()));
    assert!(client.search("ai").await.is_empty());
}

#[tokio::test]
async fn semantic_scholar_malformed_body_yields_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = SemanticScholarClient::new(&Config::for_testing(&mock_server.uri()));
    assert!(client.search("ai").await.is_empty());
}

#[tokio::test]
async fn semantic_scholar_matches_title_and_year() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/search"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"paperId": "wrong-year", "title": "Deep Learning", "year": 2015},
                {"paperId": "exact", "title": "deep learning", "year": 2023},
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = SemanticScholarClient::new(&Config::for_testing(&mock_server.uri()));

    let id = client.match_paper("Deep Learning", PaperYear::Known(2023)).await.unwrap();
    assert_eq!(id.as_deref(), Some("exact"));

    // No title+year match falls back to the first candidate.
    let id = client.match_paper("Deep Learning", PaperYear::Known(1999)).await.unwrap();
    assert_eq!(id.as_deref(), Some("wrong-year"));
}

#[tokio::test]
async fn semantic_scholar_paper_details() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "paperId": "abc123",
            "title": "A Detailed Paper",
            "abstract": "This paper studies things.",
            "year": 2023,
            "authors": [{"name": "Ada Lovelace"}],
            "citationCount": 42,
            "venue": "ICML",
            "openAccessPdf": {"url": "https://example.org/paper.pdf"}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/graph/v1/paper/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = SemanticScholarClient::new(&Config::for_testing(&mock_server.uri()));

    let details = client.get_paper("abc123").await.unwrap().unwrap();
    assert_eq!(details.title, "A Detailed Paper");
    assert_eq!(details.abstract_text.as_deref(), Some("This paper studies things."));
    assert_eq!(details.venue.as_deref(), Some("ICML"));
    assert_eq!(details.open_access_pdf.as_deref(), Some("https://example.org/paper.pdf"));

    assert!(client.get_paper("missing").await.unwrap().is_none());
}

// ── CrossRef ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn crossref_maps_and_filters_items() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/works"))
        .and(query_param("query", "genomics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": {
                "items": [
                    {
                        "DOI": "10.1/new",
                        "title": ["A 2023 Work"],
                        "author": [{"given": "Rosalind", "family": "Franklin"}],
                        "published-print": {"date-parts": [[2023, 4]]},
                        "is-referenced-by-count": 8,
                        "container-title": ["Journal of Examples"]
                    },
                    {
                        "DOI": "10.1/old",
                        "title": ["A 2019 Work"],
                        "published-online": {"date-parts": [[2019]]}
                    }
                ]
            }
        })))
        .mount(&mock_server)
        .await;

    let client = CrossRefClient::new(&Config::for_testing(&mock_server.uri()));
    let papers = client.search("genomics").await;

    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].title, "A 2023 Work");
    assert_eq!(papers[0].authors, "Rosalind Franklin");
    assert_eq!(papers[0].link, "https://doi.org/10.1/new");
    assert_eq!(papers[0].citations, Some(8));
    assert_eq!(papers[0].journal.as_deref(), Some("Journal of Examples"));
}

#[tokio::test]
async fn crossref_failure_yields_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/works"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let client = CrossRefClient::new(&Config::for_testing(&mock_server.uri()));
    assert!(client.search("genomics").await.is_empty());
}

// ── PubMed ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn pubmed_two_step_search() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/entrez/eutils/esearch.fcgi"))
        .and(query_param("term", "oncology"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "esearchresult": {"idlist": ["111", "222"]}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/entrez/eutils/esummary.fcgi"))
        .and(query_param("id", "111,222"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "uids": ["111", "222"],
                "111": {
                    "uid": "111",
                    "title": "A Recent Trial",
                    "pubdate": "2023 Jun 1",
                    "authors": [{"name": "Curie M"}],
                    "fulljournalname": "The Lancet"
                },
                "222": {
                    "uid": "222",
                    "title": "An Older Trial",
                    "pubdate": "2020 Jan 1",
                    "authors": []
                }
            }
        })))
        .mount(&mock_server)
        .await;

    let client = PubMedClient::new(&Config::for_testing(&mock_server.uri()));
    let papers = client.search("oncology").await;

    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].title, "A Recent Trial");
    assert_eq!(papers[0].link, "https://pubmed.ncbi.nlm.nih.gov/111/");
    assert_eq!(papers[0].journal.as_deref(), Some("The Lancet"));
}

#[tokio::test]
async fn pubmed_empty_id_list_skips_summary_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/entrez/eutils/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "esearchresult": {"idlist": []}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/entrez/eutils/esummary.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = PubMedClient::new(&Config::for_testing(&mock_server.uri()));
    assert!(client.search("oncology").await.is_empty());
}

#[tokio::test]
async fn pubmed_failure_yields_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/entrez/eutils/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>error</html>"))
        .mount(&mock_server)
        .await;

    let client = PubMedClient::new(&Config::for_testing(&mock_server.uri()));
    assert!(client.search("oncology").await.is_empty());
}

// ── Google-Scholar proxy ────────────────────────────────────────────────────

#[tokio::test]
async fn scholar_proxy_parses_string_years() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/scholar"))
        .and(query_param("field", "robotics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "papers": [
                {
                    "title": "A Scholar Paper",
                    "authors": "Noether E",
                    "year": "2023",
                    "link": "https://example.org/1",
                    "citations": 17
                },
                {"title": "Undated Paper", "year": "Unknown"},
                {"title": "Too Old", "year": "2018"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = ScholarProxyClient::new(&Config::for_testing(&mock_server.uri()));
    let papers = client.search("robotics").await;

    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].title, "A Scholar Paper");
    assert_eq!(papers[0].year, PaperYear::Known(2023));
    assert_eq!(papers[0].citations, Some(17));
}

#[tokio::test]
async fn scholar_proxy_failure_yields_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/scholar"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "Failed to fetch Google Scholar data"
        })))
        .mount(&mock_server)
        .await;

    let client = ScholarProxyClient::new(&Config::for_testing(&mock_server.uri()));
    assert!(client.search("robotics").await.is_empty());
}

#[tokio::test]
async fn unreachable_provider_yields_empty() {
    // Nothing is listening on this port.
    let config = Config::for_testing("http://127.0.0.1:9");
    let client = ScholarProxyClient::new(&config);
    assert!(client.search("robotics").await.is_empty());
}
