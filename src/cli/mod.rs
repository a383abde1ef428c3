use clap::{Parser, Subcommand};
use euclid_tutor::tutor::ExplanationMode;
use std::path::PathBuf;

/// `euclid-tutor` - local math tutor answer orchestration.
#[derive(Parser, Debug)]
#[command(name = "euclid-tutor")]
#[command(version = "0.1.0")]
#[command(about = "Ask math questions against a local model, with checks and diagrams.", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a question through the full pipeline
    Ask {
        question: String,

        /// JSON array of prior turns: [{"role": "user", "content": "..."}]
        #[arg(long)]
        history_file: Option<PathBuf>,

        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the symbolic and quality checks over a solution
    Check {
        question: String,

        /// Solution file, or `-` for stdin
        solution: String,

        /// Which explanation to print: plain, axiomatic or both
        #[arg(long, default_value = "both")]
        mode: ExplanationMode,

        /// Audience for follow-up questions: kids, teen, college or adult
        #[arg(long, default_value = "teen")]
        level: String,
    },

    /// Parse a raw model completion into a plan
    Parse {
        /// Raw completion file, or `-` for stdin
        raw: String,
    },

    /// Render the deterministic recipe for a question, if any
    Visualize { question: String },

    /// Queue a background diagram job
    Diagram {
        question: String,

        /// Poll until the job settles
        #[arg(long)]
        wait: bool,
    },

    /// Show per-agent metrics
    Agents,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, ConfigCommands, ExplanationMode};
    use clap::CommandFactory;
    use clap::Parser;

    #[test]
    fn cli_definition_has_no_flag_conflicts() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_ask_with_history_and_json() {
        let cli = Cli::parse_from([
            "euclid-tutor",
            "ask",
            "What is a derivative?",
            "--history-file",
            "turns.json",
            "--json",
        ]);

        match cli.command {
            Commands::Ask {
                question,
                history_file,
                json,
            } => {
                assert_eq!(question, "What is a derivative?");
                assert_eq!(history_file.unwrap().to_str(), Some("turns.json"));
                assert!(json);
            }
            other => panic!("expected ask command, got {other:?}"),
        }
    }

    #[test]
    fn verbose_is_accepted_after_subcommand() {
        let cli = Cli::parse_from(["euclid-tutor", "diagram", "parabola", "--wait", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Diagram { wait: true, .. }));
    }

    #[test]
    fn check_mode_parses_case_insensitively() {
        let cli = Cli::parse_from(["euclid-tutor", "check", "Solve x = 1", "-", "--mode", "Plain"]);
        match cli.command {
            Commands::Check { mode, level, .. } => {
                assert_eq!(mode, ExplanationMode::Plain);
                assert_eq!(level, "teen");
            }
            other => panic!("expected check command, got {other:?}"),
        }
    }

    #[test]
    fn config_show_parses() {
        let cli = Cli::parse_from(["euclid-tutor", "config", "show"]);
        assert!(matches!(
            cli.command,
            Commands::Config {
                config_command: ConfigCommands::Show
            }
        ));
    }
}
