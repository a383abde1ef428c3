use euclid_tutor::Config;
use euclid_tutor::checker::SymbolicChecker;
use euclid_tutor::error::{RetrievalError, VisualizationError};
use euclid_tutor::llm::ScriptedProvider;
use euclid_tutor::observability::AgentMetricsRegistry;
use euclid_tutor::tutor::{TutorDeps, TutorService};
use euclid_tutor::visualization::VisualizationExecutor;
use euclid_tutor::visualization::sandbox::{RunFuture, ScriptRunner};
use euclid_tutor::web::retrieval::{RetrievalBackend, RetrievalFuture, Snippet};
use euclid_tutor::web::WebEnricher;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub const PLANNER_MARKER: &str = "Return the JSON object now.";
pub const PLAN_JSON: &str =
    r#"{"solution": "Set the factors to zero: x = 2 or x = 3.", "needs_visualization": false}"#;

/// Planner prompts get `PLAN_JSON`, agents get `agent_reply`.
pub fn planner_then(agent_reply: &'static str) -> Arc<ScriptedProvider> {
    scripted(move |prompt| {
        if prompt.contains(PLANNER_MARKER) {
            Ok(PLAN_JSON.to_string())
        } else {
            Ok(agent_reply.to_string())
        }
    })
}

pub fn scripted(
    reply: impl Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static,
) -> Arc<ScriptedProvider> {
    Arc::new(ScriptedProvider::new(reply))
}

/// Renders every chart as the same fixed figure; fails on request.
pub struct ChartRunner {
    fail: bool,
    runs: Mutex<usize>,
}

impl ChartRunner {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            runs: Mutex::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            runs: Mutex::new(0),
        })
    }

    pub fn runs(&self) -> usize {
        *self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ScriptRunner for ChartRunner {
    fn run<'a>(
        &'a self,
        _program: &'a str,
        _args: &'a [String],
        workdir: &'a Path,
        _timeout: Duration,
    ) -> RunFuture<'a> {
        Box::pin(async move {
            *self.runs.lock().unwrap_or_else(PoisonError::into_inner) += 1;
            if self.fail {
                return Err(VisualizationError::Failed {
                    diagnostics: "ModuleNotFoundError: plotly".into(),
                });
            }
            std::fs::write(
                workdir.join("figure.json"),
                r#"{"data":[{"type":"scatter","y":[4,1,0,1,4]}],"layout":{"title":{"text":"y = x^2"}}}"#,
            )?;
            Ok(())
        })
    }
}

/// In-memory encyclopedia keyed by title.
pub struct PagesBackend {
    pages: Vec<Snippet>,
}

impl PagesBackend {
    pub fn new(pages: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            pages: pages
                .iter()
                .map(|(title, text)| Snippet {
                    title: (*title).to_string(),
                    snippet: (*text).to_string(),
                    url: format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_")),
                })
                .collect(),
        })
    }
}

impl RetrievalBackend for PagesBackend {
    fn name(&self) -> &str {
        "pages"
    }

    fn search_titles<'a>(&'a self, _query: &'a str, limit: usize) -> RetrievalFuture<'a, Vec<String>> {
        let titles = self.pages.iter().take(limit).map(|p| p.title.clone()).collect();
        Box::pin(async move { Ok(titles) })
    }

    fn summary<'a>(&'a self, title: &'a str) -> RetrievalFuture<'a, Option<Snippet>> {
        let page = self.pages.iter().find(|p| p.title == title).cloned();
        Box::pin(async move {
            page.map(Some)
                .ok_or_else(|| RetrievalError::Decode(format!("missing page {title}")))
        })
    }
}

pub fn web(backend: Arc<dyn RetrievalBackend>, enabled: bool) -> WebEnricher {
    WebEnricher::new(backend, enabled, Duration::from_secs(2), 2)
}

pub struct Harness {
    pub service: TutorService,
    pub provider: Arc<ScriptedProvider>,
    pub runner: Arc<ChartRunner>,
    _media: tempfile::TempDir,
}

pub fn harness(
    provider: Arc<ScriptedProvider>,
    runner: Arc<ChartRunner>,
    tweak: impl FnOnce(&mut Config),
) -> Harness {
    let media = tempfile::tempdir().expect("tempdir");
    let mut config = Config::default();
    tweak(&mut config);

    let deps = TutorDeps {
        engine: provider.engine(Duration::from_secs(5)),
        web: Arc::new(web(PagesBackend::new(&[]), false)),
        executor: Arc::new(VisualizationExecutor::new(
            runner.clone(),
            "python3",
            Duration::from_secs(5),
            media.path().to_path_buf(),
            "gif",
        )),
        checker: SymbolicChecker::default(),
        metrics: Arc::new(AgentMetricsRegistry::new()),
    };
    let service = TutorService::new(&config, deps).expect("service builds");
    Harness {
        service,
        provider,
        runner,
        _media: media,
    }
}
