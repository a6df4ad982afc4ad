//! Wikipedia context retriever.
//!
//! Two lookups per query: a full-text search picks the top-ranked page
//! title, then the REST summary endpoint returns that page's extract. The
//! summary endpoint only accepts an exact canonical title, so a free-text
//! query cannot go there directly.

use crate::retriever::ContextRetriever;
use crate::types::Context;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use veriqa_core::config::RetrievalConfig;
use veriqa_core::{AppError, AppResult};

/// MediaWiki `list=search` response. Every level is optional because the API
/// answers errors with a different shape.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Option<Vec<SearchHit>>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

/// REST `page/summary` response.
#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    extract: Option<String>,
}

/// Context retriever backed by the Wikipedia APIs.
#[derive(Debug, Clone)]
pub struct WikipediaRetriever {
    client: Client,
    search_url: Url,
    summary_url: Url,
}

impl WikipediaRetriever {
    /// Create a retriever from the retrieval section of the app config.
    pub fn new(config: &RetrievalConfig) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Retrieval(format!("Failed to create HTTP client: {}", e)))?;

        let search_url = Url::parse(&config.search_url).map_err(|e| {
            AppError::Retrieval(format!("Invalid search URL '{}': {}", config.search_url, e))
        })?;
        let summary_url = Url::parse(&config.summary_url).map_err(|e| {
            AppError::Retrieval(format!(
                "Invalid summary URL '{}': {}",
                config.summary_url, e
            ))
        })?;

        if summary_url.cannot_be_a_base() {
            return Err(AppError::Retrieval(format!(
                "Summary URL cannot take a path segment: {}",
                config.summary_url
            )));
        }

        Ok(Self {
            client,
            search_url,
            summary_url,
        })
    }

    /// Summary URL for a title: spaces become underscores, then the title is
    /// appended as one percent-encoded path segment.
    fn summary_url_for(&self, title: &str) -> Url {
        let canonical = title.trim().replace(' ', "_");
        let mut url = self.summary_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&canonical);
        }
        url
    }

    /// Search step: the top-ranked hit's title, if any.
    #[instrument(skip(self))]
    async fn top_title(&self, query: &str) -> AppResult<Option<String>> {
        let response = self
            .client
            .get(self.search_url.clone())
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("list", "search"),
                ("srsearch", query),
                ("utf8", "1"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Search request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Retrieval(format!(
                "Search returned status {}",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Malformed search response: {}", e)))?;

        Ok(first_title(body))
    }

    /// Summary step: the extract for an exact title, if present.
    #[instrument(skip(self))]
    async fn extract_for(&self, title: &str) -> AppResult<Option<String>> {
        let url = self.summary_url_for(title);
        debug!("Fetching summary from {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Summary request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Retrieval(format!(
                "Summary returned status {}",
                response.status()
            )));
        }

        let body: SummaryResponse = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Malformed summary response: {}", e)))?;

        Ok(body.extract.filter(|e| !e.trim().is_empty()))
    }
}

fn first_title(body: SearchResponse) -> Option<String> {
    body.query
        .and_then(|q| q.search)
        .and_then(|hits| hits.into_iter().next())
        .map(|hit| hit.title)
}

#[async_trait::async_trait]
impl ContextRetriever for WikipediaRetriever {
    fn source_name(&self) -> &str {
        "wikipedia"
    }

    async fn retrieve(&self, query: &str) -> Context {
        if query.trim().is_empty() {
            debug!("Empty query, skipping search");
            return Context::not_found();
        }

        let title = match self.top_title(query).await {
            Ok(Some(title)) => title,
            Ok(None) => {
                debug!("Search returned no hits");
                return Context::not_found();
            }
            Err(e) => {
                warn!("Context search failed: {}", e);
                return Context::not_found();
            }
        };

        match self.extract_for(&title).await {
            Ok(Some(extract)) => {
                debug!(title = %title, bytes = extract.len(), "Retrieved summary");
                Context::article(title, extract)
            }
            Ok(None) => {
                debug!(title = %title, "Summary has no extract");
                Context::no_summary(title)
            }
            Err(e) => {
                warn!(title = %title, "Summary lookup failed: {}", e);
                Context::no_summary(title)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContextSource, NOT_FOUND_FALLBACK, NO_SUMMARY_FALLBACK};
    use veriqa_core::testing::{CannedServer, RecordedRequest};

    const EIFFEL_SEARCH: &str = r#"{"query": {"search": [{"title": "Eiffel Tower"}]}}"#;

    fn retriever_at(base: &str) -> WikipediaRetriever {
        let config = RetrievalConfig {
            search_url: format!("{}/w/api.php", base),
            summary_url: format!("{}/api/rest_v1/page/summary", base),
            timeout_secs: 2,
            ..RetrievalConfig::default()
        };
        WikipediaRetriever::new(&config).unwrap()
    }

    #[test]
    fn test_first_title_picks_top_hit() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"query": {"search": [{"title": "Paris", "pageid": 1}, {"title": "France"}]}}"#,
        )
        .unwrap();
        assert_eq!(first_title(body), Some("Paris".to_string()));
    }

    #[test]
    fn test_first_title_empty_hits() {
        let body: SearchResponse =
            serde_json::from_str(r#"{"query": {"search": []}}"#).unwrap();
        assert_eq!(first_title(body), None);
    }

    #[test]
    fn test_first_title_error_shape() {
        let body: SearchResponse =
            serde_json::from_str(r#"{"error": {"code": "nosrsearch"}}"#).unwrap();
        assert_eq!(first_title(body), None);

        let body: SearchResponse = serde_json::from_str(r#"{"query": {}}"#).unwrap();
        assert_eq!(first_title(body), None);
    }

    #[test]
    fn test_summary_without_extract() {
        let body: SummaryResponse = serde_json::from_str(
            r#"{"title": "Not found.", "type": "https://mediawiki.org/wiki/errors/not_found"}"#,
        )
        .unwrap();
        assert!(body.extract.is_none());
    }

    #[test]
    fn test_summary_url_encoding() {
        let retriever = retriever_at("https://en.wikipedia.org");
        let url = retriever.summary_url_for("Eiffel Tower");
        assert_eq!(
            url.as_str(),
            "https://en.wikipedia.org/api/rest_v1/page/summary/Eiffel_Tower"
        );

        let url = retriever.summary_url_for("AC/DC");
        assert_eq!(
            url.as_str(),
            "https://en.wikipedia.org/api/rest_v1/page/summary/AC%2FDC"
        );
    }

    #[test]
    fn test_invalid_urls_rejected() {
        let config = RetrievalConfig {
            search_url: "not a url".to_string(),
            ..RetrievalConfig::default()
        };
        assert!(WikipediaRetriever::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_empty_query_short_circuits() {
        let retriever = retriever_at("http://127.0.0.1:9");
        let context = retriever.retrieve("   ").await;
        assert_eq!(context.source, ContextSource::NotFound);
    }

    #[tokio::test]
    async fn test_unreachable_source_degrades_to_fallback() {
        let retriever = retriever_at("http://127.0.0.1:9");
        let context = retriever.retrieve("What is the capital of France?").await;
        assert_eq!(context.text, NOT_FOUND_FALLBACK);
        assert_eq!(context.source, ContextSource::NotFound);
    }

    /// Serves the search reply on `/w/api.php` and `summary` on any other path.
    async fn wiki_server(search: &'static str, summary: (u16, &'static str)) -> CannedServer {
        CannedServer::start(move |request: &RecordedRequest| {
            if request.path() == "/w/api.php" {
                (200, search.to_string())
            } else {
                (summary.0, summary.1.to_string())
            }
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_then_summary() {
        let server = wiki_server(
            EIFFEL_SEARCH,
            (200, r#"{"title": "Eiffel Tower", "extract": "A wrought-iron tower in Paris."}"#),
        )
        .await;
        let retriever = retriever_at(server.base_url());

        let context = retriever.retrieve("eiffel tower height").await;
        assert_eq!(context.text, "A wrought-iron tower in Paris.");
        assert_eq!(
            context.source,
            ContextSource::Article {
                title: "Eiffel Tower".to_string()
            }
        );

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].path(), "/w/api.php");
        assert!(requests[0].target.contains("list=search"));
        assert!(requests[0].target.contains("srsearch=eiffel+tower+height"));
        assert_eq!(requests[1].path(), "/api/rest_v1/page/summary/Eiffel_Tower");
    }

    #[tokio::test]
    async fn test_no_hits_skips_summary() {
        let server = wiki_server(r#"{"query": {"search": []}}"#, (200, "{}")).await;
        let retriever = retriever_at(server.base_url());

        let context = retriever.retrieve("qwxzv").await;
        assert_eq!(context.text, NOT_FOUND_FALLBACK);
        assert_eq!(context.source, ContextSource::NotFound);
        assert_eq!(server.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_summary_without_extract_falls_back() {
        let server = wiki_server(EIFFEL_SEARCH, (200, r#"{"title": "Eiffel Tower"}"#)).await;
        let retriever = retriever_at(server.base_url());

        let context = retriever.retrieve("eiffel tower").await;
        assert_eq!(context.text, NO_SUMMARY_FALLBACK);
        assert_eq!(
            context.source,
            ContextSource::NoSummary {
                title: "Eiffel Tower".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_summary_error_status_falls_back() {
        let server = wiki_server(EIFFEL_SEARCH, (404, r#"{"title": "Not found."}"#)).await;
        let retriever = retriever_at(server.base_url());

        let context = retriever.retrieve("eiffel tower").await;
        assert_eq!(context.text, NO_SUMMARY_FALLBACK);
        assert_eq!(server.requests().len(), 2);
    }
}
