//! CLI surface for the `retrieve` binary: a one-shot `--query` mode and an
//! interactive REPL, with a `dirs`-rooted rustyline history file and a
//! handful of `/`-prefixed commands.

use crate::config::OrchestratorConfig;
use crate::lane::LaneID;
use crate::orchestrator::Orchestrator;
use crate::query::{Query, QueryClass};
use anyhow::Result;
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "retrieve", about = "Always-on multi-lane retrieval orchestrator")]
pub struct Args {
    /// One-shot query; without this flag, starts an interactive REPL.
    #[arg(short, long)]
    pub query: Option<String>,

    /// Path to a TOML config file; defaults to ~/.retrieval-orchestrator/config.toml.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Query class, selecting a budget profile.
    #[arg(long, default_value = "simple")]
    pub class: String,

    /// Restrict to specific lanes (comma-separated: web,news,markets,vector,kg,keyword).
    #[arg(long, value_delimiter = ',')]
    pub lanes: Vec<String>,

    /// Print the fused response as JSON instead of a human-readable summary.
    #[arg(long)]
    pub json: bool,

    /// Skip startup warmup (faster start, cold caches).
    #[arg(long)]
    pub no_warmup: bool,
}

fn history_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".retrieval-orchestrator")
        .join("history")
}

fn parse_class(s: &str) -> QueryClass {
    match s.to_lowercase().as_str() {
        "technical" => QueryClass::Technical,
        "research" => QueryClass::Research,
        "multimedia" => QueryClass::Multimedia,
        _ => QueryClass::Simple,
    }
}

fn parse_requested_lanes(raw: &[String]) -> Option<HashSet<LaneID>> {
    if raw.is_empty() {
        return None;
    }
    Some(raw.iter().filter_map(|s| LaneID::parse(s)).collect())
}

pub fn build_config(args: &Args) -> OrchestratorConfig {
    match &args.config {
        Some(path) => OrchestratorConfig::load_from(path).unwrap_or_default(),
        None => OrchestratorConfig::load(),
    }
}

pub async fn run_once(orchestrator: &Orchestrator, args: &Args, text: &str) -> Result<()> {
    let mut query = Query::new(text, parse_class(&args.class), uuid::Uuid::new_v4().to_string());
    query.requested_lanes = parse_requested_lanes(&args.lanes);

    let response = orchestrator.retrieve(query).await?;
    print_response(&response, args.json);
    Ok(())
}

pub async fn run_repl(orchestrator: &Orchestrator, args: &Args) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let history_file = history_path();
    let _ = rl.load_history(&history_file);

    println!("retrieve - type /help for commands, /exit to quit");

    loop {
        match rl.readline(">>> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                if line.starts_with('/') {
                    if handle_command(orchestrator, line).await {
                        break;
                    }
                    continue;
                }

                match run_once(orchestrator, args, line).await {
                    Ok(()) => {}
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    if let Some(parent) = history_file.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = rl.save_history(&history_file);

    Ok(())
}

async fn handle_command(orchestrator: &Orchestrator, cmd: &str) -> bool {
    match cmd {
        "/exit" | "/quit" => return true,
        "/help" => {
            println!("Commands:");
            println!("  /exit     - quit");
            println!("  /help     - show commands");
            println!("  /health   - show lane readiness and breaker states");
            println!("  /metrics  - dump Prometheus text exposition");
        }
        "/health" => {
            let snapshot = orchestrator.health().await;
            println!("ready: {}", snapshot.ready);
            for (lane, health) in &snapshot.lanes {
                println!("  {}: enabled={} breaker={}", lane, health.enabled, health.breaker_state);
            }
        }
        "/metrics" => {
            println!("{}", orchestrator.telemetry().render());
        }
        other => println!("Unknown command: {}", other),
    }
    false
}

fn print_response(response: &crate::evidence::FusedResponse, json: bool) {
    if json {
        match serde_json::to_string_pretty(response) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("failed to serialize response: {}", e),
        }
        return;
    }

    println!(
        "trace {} | {} ms | budget_exceeded={}",
        response.trace_id, response.total_elapsed_ms, response.budget_exceeded
    );
    for (lane, summary) in &response.lanes {
        println!(
            "  [{}] {} in {}ms ({} items, cache_hit={})",
            lane, summary.status, summary.elapsed_ms, summary.items_returned, summary.cache_hit
        );
    }
    println!();
    for (i, evidence) in response.evidence.iter().enumerate() {
        println!("{}. [{}] {} (score {:.3})", i + 1, evidence.lane, evidence.title, evidence.score);
        println!("   {}", evidence.snippet);
    }
}
