//! `retrieve` binary: one-shot query or interactive REPL over the retrieval
//! orchestrator. Thin `main()` over the library.

use anyhow::Result;
use clap::Parser;
use retrieval_orchestrator::cli::{self, Args};
use retrieval_orchestrator::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = cli::build_config(&args);
    let orchestrator = Orchestrator::new(config)?;

    if !args.no_warmup {
        orchestrator.warmup().await;
    }

    if let Some(query) = &args.query {
        cli::run_once(&orchestrator, &args, query).await
    } else {
        cli::run_repl(&orchestrator, &args).await
    }
}
