use crate::cli::{Cli, Commands, ConfigCommands};
use anyhow::{Context, Result, bail};
use euclid_tutor::checker::SymbolicChecker;
use euclid_tutor::tutor::{
    ExplanationMode, HistoryTurn, LearnerLevel, TutorAnswer, TutorService, VisualizationPayload,
    didactics, plan_parser,
};
use euclid_tutor::Config;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const JOB_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Config {
            config_command: ConfigCommands::Show,
        } => {
            let rendered = toml::to_string_pretty(&config).context("Failed to serialize config")?;
            println!("# {}", config.config_path.display());
            print!("{rendered}");
            Ok(())
        }
        Commands::Parse { raw } => run_parse(&read_input(&raw)?),
        Commands::Check {
            question,
            solution,
            mode,
            level,
        } => {
            let level = LearnerLevel::parse_lossy(&level);
            run_check(
                &SymbolicChecker::default(),
                &question,
                &read_input(&solution)?,
                mode,
                level,
            );
            Ok(())
        }
        Commands::Ask {
            question,
            history_file,
            json,
        } => {
            let history = match history_file {
                Some(path) => load_history(&path)?,
                None => Vec::new(),
            };
            with_service(&config, |svc| async move {
                run_ask(svc, &question, &history, json).await
            })
            .await
        }
        Commands::Visualize { question } => {
            with_service(&config, |svc| async move {
                match svc.fallback_visualization(&question).await {
                    Some(payload) => print_payload(&payload),
                    None => println!("No deterministic visualization for this question."),
                }
                Ok(())
            })
            .await
        }
        Commands::Diagram { question, wait } => {
            with_service(&config, |svc| async move { run_diagram(svc, &question, wait).await })
                .await
        }
        Commands::Agents => {
            with_service(&config, |svc| async move {
                for (id, metric) in svc.agent_metrics() {
                    let last = metric
                        .last_run_ms
                        .map_or_else(|| "-".to_string(), |ms| format!("{ms}ms"));
                    println!(
                        "{id:<20} {:<8} runs={:<4} last={last:<8} {}",
                        metric.status,
                        metric.run_count,
                        metric.last_error.as_deref().unwrap_or("")
                    );
                }
                Ok(())
            })
            .await
        }
    }
}

/// Build the service, run `f`, then drain the diagram workers.
async fn with_service<F, Fut>(config: &Config, f: F) -> Result<()>
where
    F: FnOnce(Arc<TutorService>) -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    let svc = Arc::new(TutorService::from_config(config)?);
    let result = f(Arc::clone(&svc)).await;
    svc.shutdown().await;
    result
}

async fn run_ask(
    svc: Arc<TutorService>,
    question: &str,
    history: &[HistoryTurn],
    json: bool,
) -> Result<()> {
    let Some(answer) = svc.answer(question, history).await else {
        bail!("Tutor is unavailable: check that the model provider is running");
    };
    let answer = TutorAnswer {
        solution: svc.enrich_with_web_context(question, &answer.solution).await,
        ..answer
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }
    println!("{}", answer.solution);
    if let Some(payload) = &answer.visualization {
        println!();
        print_payload(payload);
    }
    Ok(())
}

async fn run_diagram(svc: Arc<TutorService>, question: &str, wait: bool) -> Result<()> {
    let mut job = svc.start_diagram_job(question)?;
    info!(job_id = %job.id, "diagram job submitted");
    if wait {
        while !job.status.is_terminal() {
            tokio::time::sleep(JOB_POLL_INTERVAL).await;
            job = svc.get_diagram_job(&job.id);
        }
    }
    println!("{}", serde_json::to_string_pretty(&job)?);
    Ok(())
}

fn run_parse(raw: &str) -> Result<()> {
    let parsed = plan_parser::parse(raw)?;
    if parsed.is_fallback() {
        info!("completion had no recognizable structure, using raw text");
    }
    println!("{}", serde_json::to_string_pretty(parsed.plan())?);
    Ok(())
}

fn run_check(
    checker: &SymbolicChecker,
    question: &str,
    solution: &str,
    mode: ExplanationMode,
    level: LearnerLevel,
) {
    let report = didactics::build_structured_explanations(checker, question, solution);
    let plain = didactics::adapt_plain_for_level(&report.plain, level, question);
    println!(
        "{}\n",
        didactics::compose_solution_for_mode(mode, &plain, &report.axiomatic)
    );
    for check in &report.checks {
        println!("[{}] {}: {}", check.status, check.name, check.details);
    }
    if !report.hints.is_empty() {
        println!("\nHints:");
        for hint in &report.hints {
            println!("- {hint}");
        }
    }
    if let Some(note) = didactics::build_self_correction(checker, question, &report.checks) {
        println!("\n{note}");
    }

    let aids = didactics::build_learning_aids(question, &report.plain, &report.checks, level);
    println!("\nTakeaways:");
    for line in &aids.takeaways {
        println!("- {line}");
    }
    println!("\nTry next:");
    for line in &aids.next_questions {
        println!("- {line}");
    }
}

fn print_payload(payload: &VisualizationPayload) {
    println!("Visualization [{}] {}: {}", payload.kind, payload.id, payload.title);
    if let Some(url) = payload.data.get("url").and_then(|u| u.as_str()) {
        println!("{url}");
    }
}

fn load_history(path: &Path) -> Result<Vec<HistoryTurn>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file {}", path.display()))?;
    serde_json::from_str(&text).context("History file must be a JSON array of {role, content}")
}

/// File contents, or stdin for `-`.
fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(source).with_context(|| format!("Failed to read {source}"))
}
