//! agentloop - planner / reviewer / supervisor loop CLI
//!
//! Runs the tagging loop against an Ollama server and prints every step.
//!
//! ## Commands
//!
//! - `run`: execute the loop on the built-in article (default)
//! - `prompt`: print the planner prompt without calling a model

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use agentloop_core::{
    init_tracing, planner_prompt, AgentState, Engine, LoopConfig, OllamaClient, StepRecord,
};

#[derive(Parser)]
#[command(name = "agentloop")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Planner / reviewer / supervisor tagging loop", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Ollama server URL
    #[arg(long, global = true)]
    ollama_url: Option<String>,

    /// Model identifier
    #[arg(long, global = true)]
    model: Option<String>,

    /// Sampling temperature in [0, 1]
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Hard cap on planner rounds
    #[arg(long, global = true)]
    max_turns: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the loop and print each step result
    Run,

    /// Print the planner prompt for the built-in article
    Prompt,
}

fn initial_state() -> AgentState {
    AgentState::new(
        "Vector Clocks and Conflict Resolution",
        "Explains vector clocks, partial ordering, and how conflicts are detected and resolved across replicas.",
    )
    .with_email("")
    .with_strict(true)
    .with_task("generate-tags-and-summary")
}

impl Cli {
    /// `AGENTLOOP_*` environment settings with command-line flags on top.
    ///
    /// The environment is read only through [`LoopConfig::from_env`], so bad
    /// values there fall back to defaults instead of failing argument parsing.
    fn loop_config(&self) -> LoopConfig {
        self.apply_overrides(LoopConfig::from_env())
    }

    fn apply_overrides(&self, mut config: LoopConfig) -> LoopConfig {
        if let Some(url) = &self.ollama_url {
            config.ollama_url = url.clone();
        }
        if let Some(model) = &self.model {
            config.model.model = model.clone();
        }
        if let Some(t) = self.temperature {
            config.model.temperature = t;
        }
        if let Some(n) = self.max_turns {
            config.max_turns = n;
        }
        config
    }
}

fn render_step(out: &mut impl Write, record: &StepRecord) -> Result<()> {
    writeln!(out, "\n--- Step Result ---")?;
    writeln!(out, "{}", serde_json::to_string(record)?)?;
    Ok(())
}

async fn cmd_run(config: LoopConfig) -> Result<()> {
    config
        .model
        .validate()
        .context("Invalid model configuration")?;
    let client = OllamaClient::new(&config.ollama_url, config.request_timeout())
        .context("Failed to create Ollama client")?;
    info!(url = %client.base_url(), model = %config.model.model, "starting loop");

    let engine = Engine::new(Arc::new(client))
        .with_model_config(config.model.clone())
        .with_max_turns(config.max_turns);

    let mut run = engine.start(initial_state());
    let stdout = std::io::stdout();
    while let Some(step) = run.next_step().await {
        let record = step.context("Loop run failed")?;
        render_step(&mut stdout.lock(), &record)?;
    }

    let state = run.into_state();
    if let Some(proposal) = &state.planner_proposal {
        println!("\n--- Final Proposal ---");
        println!("{}", serde_json::to_string_pretty(proposal)?);
    }
    Ok(())
}

fn cmd_prompt() -> Result<()> {
    print!("{}", planner_prompt(&initial_state()));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let config = cli.loop_config();
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cmd_run(config).await,
        Commands::Prompt => cmd_prompt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentloop_core::ModelConfig;

    #[test]
    fn test_cli_defaults_to_run() {
        let cli = Cli::try_parse_from(["agentloop"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "agentloop",
            "--model",
            "llama3",
            "--temperature",
            "0.5",
            "--max-turns",
            "6",
            "--ollama-url",
            "http://box:11434",
            "run",
        ])
        .unwrap();
        let config = cli.loop_config();
        assert_eq!(config.model, ModelConfig::new("llama3", 0.5));
        assert_eq!(config.max_turns, 6);
        assert_eq!(config.ollama_url, "http://box:11434");
    }

    #[test]
    fn test_unparseable_env_falls_back_to_default() {
        std::env::set_var("AGENTLOOP_TEMPERATURE", "warm");
        let parsed = Cli::try_parse_from(["agentloop", "run"]);
        let config = parsed.as_ref().map(|cli| cli.loop_config());
        std::env::remove_var("AGENTLOOP_TEMPERATURE");

        let config = config.expect("bad env value must not fail argument parsing");
        assert_eq!(config.model.temperature, ModelConfig::default().temperature);
    }

    #[test]
    fn test_flags_win_over_environment_values() {
        let cli = Cli::try_parse_from(["agentloop", "--max-turns", "2"]).unwrap();
        let base = LoopConfig {
            max_turns: 9,
            ollama_url: "http://from-env:11434".to_string(),
            ..LoopConfig::default()
        };
        let config = cli.apply_overrides(base);
        assert_eq!(config.max_turns, 2);
        assert_eq!(config.ollama_url, "http://from-env:11434");
    }

    #[test]
    fn test_initial_state_is_hardcoded_article() {
        let state = initial_state();
        assert_eq!(state.title, "Vector Clocks and Conflict Resolution");
        assert!(state.strict);
        assert_eq!(state.task, "generate-tags-and-summary");
        assert_eq!(state.turn_count, 0);
    }

    #[test]
    fn test_render_step_prints_header_and_json() {
        let record = StepRecord {
            role: agentloop_core::AgentRole::Supervisor,
            update: agentloop_core::StateUpdate::TurnCount(1),
        };
        let mut buf = Vec::new();
        render_step(&mut buf, &record).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("--- Step Result ---"));
        assert!(text.contains(r#"{"supervisor":{"turn_count":1}}"#));
    }
}
