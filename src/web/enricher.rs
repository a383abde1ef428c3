use super::retrieval::{RetrievalBackend, Snippet, WikipediaBackend};
use crate::config::WebConfig;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::{debug, warn};

const TOPIC_TRIGGERS: &[&str] = &[
    "hamiltonian",
    "graph theory",
    "riemann",
    "conjecture",
    "category theory",
    "topology",
    "number theory",
    "spectral graph",
    "open problem",
    "latest research",
    "from web",
    "from wikipedia",
    "recent",
    "latest",
];

const LOW_CONFIDENCE_MARKERS: &[&str] = &[
    "i don't have a specific lesson",
    "could not generate",
    "not available",
    "no catalog lesson matched",
];

const EXISTING_WEB_MARKERS: &[&str] = &["web-verified notes", "web rag notes", "**sources**"];

const MAX_NOTES: usize = 3;
const SHORT_SENTENCE_CHARS: usize = 20;
const NOTE_FALLBACK_CHARS: usize = 220;
const DEFAULT_QUERY: &str = "mathematics";

static QUERY_NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(explain|with visualization|visualization|show|please|now)\b")
        .expect("valid query noise regex")
});
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Optional retrieval step. Every failure degrades to "no enrichment".
pub struct WebEnricher {
    backend: Arc<dyn RetrievalBackend>,
    enabled: bool,
    timeout: Duration,
    limit: usize,
}

impl WebEnricher {
    pub fn new(backend: Arc<dyn RetrievalBackend>, enabled: bool, timeout: Duration, limit: usize) -> Self {
        Self {
            backend,
            enabled,
            timeout,
            limit: limit.max(1),
        }
    }

    pub fn from_config(config: &WebConfig) -> anyhow::Result<Self> {
        let backend = WikipediaBackend::new(&config.search_url, &config.summary_url, config.timeout_secs)?;
        Ok(Self::new(
            Arc::new(backend),
            config.enabled,
            Duration::from_secs(config.timeout_secs),
            config.limit,
        ))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Long-tail topic or low-confidence draft, and not already enriched.
    pub fn should_enrich(&self, question: &str, draft_answer: &str) -> bool {
        if !self.enabled {
            return false;
        }
        let q = question.to_lowercase();
        let a = draft_answer.to_lowercase();
        if EXISTING_WEB_MARKERS.iter().any(|m| a.contains(m)) {
            return false;
        }
        TOPIC_TRIGGERS.iter().any(|t| q.contains(t))
            || LOW_CONFIDENCE_MARKERS.iter().any(|m| a.contains(m))
    }

    /// Up to `limit` summaries; titles whose summary fails are skipped.
    pub async fn retrieve(&self, question: &str, limit: usize) -> Vec<Snippet> {
        let limit = limit.max(1);
        let query = clean_query(question);
        let titles = match tokio::time::timeout(self.timeout, self.backend.search_titles(&query, limit)).await {
            Ok(Ok(titles)) => titles,
            Ok(Err(e)) => {
                warn!(backend = self.backend.name(), "web title search failed: {e}");
                return Vec::new();
            }
            Err(_) => {
                warn!(backend = self.backend.name(), "web title search timed out");
                return Vec::new();
            }
        };

        let mut snippets = Vec::new();
        for title in titles {
            match tokio::time::timeout(self.timeout, self.backend.summary(&title)).await {
                Ok(Ok(Some(snippet))) => snippets.push(snippet),
                Ok(Ok(None)) => debug!(title = %title, "summary has no extract"),
                Ok(Err(e)) => debug!(title = %title, "summary fetch failed: {e}"),
                Err(_) => debug!(title = %title, "summary fetch timed out"),
            }
            if snippets.len() >= limit {
                break;
            }
        }
        snippets
    }

    /// `answer` plus a notes section and source list when anything was found.
    pub async fn enrich(&self, question: &str, answer: &str) -> String {
        if !self.should_enrich(question, answer) {
            return answer.to_string();
        }
        let snippets = self.retrieve(question, self.limit).await;
        if snippets.is_empty() {
            return answer.to_string();
        }
        let sources = snippets
            .iter()
            .map(|s| format!("- {}: {}", s.title, s.url))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "{}\n\n🌐 **Web RAG Notes**\n{}\n\n**Sources**\n{}",
            answer.trim_end(),
            build_notes(&snippets),
            sources
        )
        .trim()
        .to_string()
    }
}

/// Question minus presentation words, whitespace collapsed.
pub fn clean_query(question: &str) -> String {
    let stripped = QUERY_NOISE_RE.replace_all(question.trim(), " ");
    let collapsed = WHITESPACE_RE.replace_all(&stripped, " ");
    let query = collapsed.trim();
    if query.is_empty() {
        DEFAULT_QUERY.to_string()
    } else {
        query.to_string()
    }
}

fn build_notes(snippets: &[Snippet]) -> String {
    snippets
        .iter()
        .take(MAX_NOTES)
        .map(|item| {
            let first = item.snippet.split('.').next().unwrap_or_default().trim();
            let sentence = if first.chars().count() < SHORT_SENTENCE_CHARS {
                item.snippet
                    .chars()
                    .take(NOTE_FALLBACK_CHARS)
                    .collect::<String>()
                    .trim()
                    .to_string()
            } else {
                first.to_string()
            };
            format!("- **{}**: {sentence}.", item.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::RetrievalError;
    use crate::web::retrieval::RetrievalFuture;
    use std::sync::Mutex;

    /// Canned backend: every search returns `titles`, summaries come from `pages`.
    pub(crate) struct StaticBackend {
        pub titles: Vec<String>,
        pub pages: Vec<Snippet>,
        pub fail_search: bool,
        pub queries: Mutex<Vec<String>>,
    }

    impl StaticBackend {
        pub fn with_pages(pages: Vec<Snippet>) -> Self {
            Self {
                titles: pages.iter().map(|p| p.title.clone()).collect(),
                pages,
                fail_search: false,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    impl RetrievalBackend for StaticBackend {
        fn name(&self) -> &str {
            "static"
        }

        fn search_titles<'a>(&'a self, query: &'a str, limit: usize) -> RetrievalFuture<'a, Vec<String>> {
            self.queries.lock().unwrap().push(query.to_string());
            let result = if self.fail_search {
                Err(RetrievalError::Request("offline".into()))
            } else {
                Ok(self.titles.iter().take(limit).cloned().collect())
            };
            Box::pin(async move { result })
        }

        fn summary<'a>(&'a self, title: &'a str) -> RetrievalFuture<'a, Option<Snippet>> {
            let found = self.pages.iter().find(|p| p.title == title).cloned();
            Box::pin(async move {
                found
                    .map(Some)
                    .ok_or_else(|| RetrievalError::Decode(format!("no page {title}")))
            })
        }
    }

    pub(crate) fn snippet(title: &str, text: &str) -> Snippet {
        Snippet {
            title: title.into(),
            snippet: text.into(),
            url: format!("https://example.org/wiki/{}", title.replace(' ', "_")),
        }
    }

    fn enricher(backend: StaticBackend) -> WebEnricher {
        WebEnricher::new(Arc::new(backend), true, Duration::from_secs(2), 2)
    }

    #[test]
    fn query_cleaning() {
        assert_eq!(
            clean_query("Please explain   graph theory with visualization now"),
            "graph theory"
        );
        assert_eq!(clean_query("Show please"), "mathematics");
        assert_eq!(clean_query("showcase topology"), "showcase topology");
    }

    #[test]
    fn enrichment_triggers() {
        let e = enricher(StaticBackend::with_pages(vec![]));
        assert!(e.should_enrich("What is the Riemann hypothesis?", "draft"));
        assert!(e.should_enrich("Explain limits", "Sorry, this is not available."));
        assert!(!e.should_enrich("Explain limits", "A limit is..."));
        assert!(!e.should_enrich("Latest results on topology", "x\n\n**Sources**\n- a"));

        let disabled = WebEnricher::new(
            Arc::new(StaticBackend::with_pages(vec![])),
            false,
            Duration::from_secs(1),
            2,
        );
        assert!(!disabled.should_enrich("riemann", "draft"));
    }

    #[test]
    fn notes_use_first_sentence_or_prefix() {
        let notes = build_notes(&[
            snippet("Graph theory", "Graph theory is the study of graphs. It has many uses."),
            snippet("Short", "Tiny. Then a much longer continuation follows here."),
        ]);
        assert_eq!(
            notes,
            "- **Graph theory**: Graph theory is the study of graphs.\n\
             - **Short**: Tiny. Then a much longer continuation follows here.."
        );
    }

    #[tokio::test]
    async fn retrieve_skips_failed_summaries_and_caps() {
        let mut backend = StaticBackend::with_pages(vec![
            snippet("A", "Alpha is the first letter of the Greek alphabet."),
            snippet("C", "Gamma is the third letter of the Greek alphabet."),
        ]);
        backend.titles = vec!["A".into(), "B".into(), "C".into()];
        let e = enricher(backend);
        let found = e.retrieve("greek letters", 5).await;
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].title, "C");
    }

    #[tokio::test]
    async fn search_failure_means_no_enrichment() {
        let mut backend = StaticBackend::with_pages(vec![snippet("Topology", "Topology is a field.")]);
        backend.fail_search = true;
        let e = enricher(backend);
        assert_eq!(e.enrich("topology basics", "Draft.").await, "Draft.");
    }

    #[tokio::test]
    async fn enrich_appends_notes_and_sources_once() {
        let backend = StaticBackend::with_pages(vec![snippet(
            "Hamiltonian path",
            "A Hamiltonian path visits each vertex exactly once. More text.",
        )]);
        let e = enricher(backend);
        let enriched = e.enrich("Explain a hamiltonian path", "Draft answer.  ").await;
        assert!(enriched.starts_with("Draft answer.\n\n🌐 **Web RAG Notes**\n"));
        assert!(enriched.contains("- **Hamiltonian path**: A Hamiltonian path visits each vertex exactly once."));
        assert!(enriched.ends_with("**Sources**\n- Hamiltonian path: https://example.org/wiki/Hamiltonian_path"));

        let again = e.enrich("Explain a hamiltonian path", &enriched).await;
        assert_eq!(again, enriched);
    }
}
