use crate::error::RetrievalError;
use crate::llm::build_http_client;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use url::Url;

const MAX_TITLES: usize = 5;

// Snippet — one retrieved topic summary with its canonical page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

pub type RetrievalFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RetrievalError>> + Send + 'a>>;

/// Title search plus per-title summaries.
pub trait RetrievalBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Candidate titles for a free-text query, best first.
    fn search_titles<'a>(&'a self, query: &'a str, limit: usize) -> RetrievalFuture<'a, Vec<String>>;

    /// Summary for one title; `None` when the page has no extract.
    fn summary<'a>(&'a self, title: &'a str) -> RetrievalFuture<'a, Option<Snippet>>;
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    #[serde(default)]
    desktop: Option<PageUrl>,
}

#[derive(Debug, Deserialize)]
struct PageUrl {
    #[serde(default)]
    page: Option<String>,
}

/// MediaWiki `opensearch` + REST `page/summary` backend.
pub struct WikipediaBackend {
    client: Client,
    search_url: Url,
    summary_url: Url,
}

impl WikipediaBackend {
    pub fn new(search_url: &str, summary_url: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs),
            search_url: Url::parse(search_url)?,
            summary_url: Url::parse(summary_url.trim_end_matches('/'))?,
        })
    }

    fn summary_endpoint(&self, title: &str) -> Result<Url, RetrievalError> {
        let mut url = self.summary_url.clone();
        url.path_segments_mut()
            .map_err(|()| RetrievalError::Request("summary url cannot be a base".into()))?
            .push(&title.replace(' ', "_"));
        Ok(url)
    }

    fn wiki_page(&self, title: &str) -> String {
        let mut url = self.summary_url.clone();
        url.set_path("/wiki/");
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&title.replace(' ', "_"));
        }
        url.to_string()
    }

    async fn fetch_titles(&self, query: &str, limit: usize) -> Result<Vec<String>, RetrievalError> {
        let limit = limit.clamp(1, MAX_TITLES).to_string();
        let response = self
            .client
            .get(self.search_url.clone())
            .query(&[
                ("action", "opensearch"),
                ("search", query),
                ("limit", limit.as_str()),
                ("namespace", "0"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| RetrievalError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RetrievalError::Request(format!(
                "title search returned {}",
                response.status()
            )));
        }
        let payload: Value = response
            .json()
            .await
            .map_err(|e| RetrievalError::Decode(e.to_string()))?;
        let titles = payload
            .get(1)
            .and_then(Value::as_array)
            .ok_or_else(|| RetrievalError::Decode("opensearch payload has no title list".into()))?;
        Ok(titles
            .iter()
            .filter_map(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn fetch_summary(&self, title: &str) -> Result<Option<Snippet>, RetrievalError> {
        let url = self.summary_endpoint(title)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RetrievalError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RetrievalError::Request(format!(
                "summary for {title} returned {}",
                response.status()
            )));
        }
        let body: SummaryResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Decode(e.to_string()))?;

        let extract = body.extract.unwrap_or_default().trim().to_string();
        if extract.is_empty() {
            return Ok(None);
        }
        let url = body
            .content_urls
            .and_then(|c| c.desktop)
            .and_then(|d| d.page)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.wiki_page(title));
        Ok(Some(Snippet {
            title: body
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| title.to_string()),
            snippet: extract,
            url,
        }))
    }
}

impl RetrievalBackend for WikipediaBackend {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn search_titles<'a>(&'a self, query: &'a str, limit: usize) -> RetrievalFuture<'a, Vec<String>> {
        Box::pin(self.fetch_titles(query, limit))
    }

    fn summary<'a>(&'a self, title: &'a str) -> RetrievalFuture<'a, Option<Snippet>> {
        Box::pin(self.fetch_summary(title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn backend(server: &MockServer) -> WikipediaBackend {
        WikipediaBackend::new(
            &format!("{}/w/api.php", server.uri()),
            &format!("{}/api/rest_v1/page/summary", server.uri()),
            5,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn opensearch_titles_are_read_from_second_element() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("action", "opensearch"))
            .and(query_param("search", "riemann hypothesis"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                "riemann hypothesis",
                ["Riemann hypothesis", "", "Riemann zeta function"],
                [],
                []
            ])))
            .mount(&server)
            .await;

        let titles = backend(&server)
            .await
            .search_titles("riemann hypothesis", 9)
            .await
            .unwrap();
        assert_eq!(titles, ["Riemann hypothesis", "Riemann zeta function"]);
    }

    #[tokio::test]
    async fn summary_uses_underscored_title_and_canonical_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Graph_theory"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Graph theory",
                "extract": "In mathematics, graph theory is the study of graphs.",
                "content_urls": {"desktop": {"page": "https://en.wikipedia.org/wiki/Graph_theory"}}
            })))
            .mount(&server)
            .await;

        let snippet = backend(&server)
            .await
            .summary("Graph theory")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snippet.title, "Graph theory");
        assert_eq!(snippet.url, "https://en.wikipedia.org/wiki/Graph_theory");
    }

    #[tokio::test]
    async fn summary_without_url_falls_back_to_wiki_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Topology"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "extract": "Topology studies properties preserved under deformation."
            })))
            .mount(&server)
            .await;

        let snippet = backend(&server)
            .await
            .summary("Topology")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snippet.title, "Topology");
        assert_eq!(snippet.url, format!("{}/wiki/Topology", server.uri()));
    }

    #[tokio::test]
    async fn empty_extract_is_none_and_errors_are_typed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Empty"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"extract": "  "})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let backend = backend(&server).await;
        assert_eq!(backend.summary("Empty").await.unwrap(), None);
        assert!(matches!(
            backend.summary("Missing").await,
            Err(RetrievalError::Request(_))
        ));
    }
}
