// Defensive programming lints - prevent panics and unsafe patterns
#![deny(clippy::indexing_slicing)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::fallible_impl_from)]
#![warn(clippy::wildcard_enum_match_arm)]
#![warn(clippy::fn_params_excessive_bools)]
// Idiomatic Rust lints
#![warn(clippy::needless_return)]
#![warn(clippy::let_and_return)]
#![warn(clippy::must_use_candidate)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::map_unwrap_or)]
#![warn(clippy::explicit_iter_loop)]
#![cfg_attr(
    test,
    allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)
)]

mod agents;
mod config;
mod pipeline;
mod server;
mod services;
mod storage;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use agents::brave::BraveSearch;
use agents::openai_compat::OpenAICompatClient;
use color_eyre::Result;
use config::Config;
use pipeline::DecisionPipeline;
use pipeline::context::ContextAssembler;
use pipeline::search::SearchGateway;
use storage::HistoryStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    color_eyre::install()?;
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;

    // Check for command-line arguments
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        return handle_cli_args(&args, &config).await;
    }

    config.validate()?;

    let history = HistoryStore::open(&config.storage.data_dir).await?;
    let search = match config.brave_key() {
        Some(key) => SearchGateway::new(Arc::new(BraveSearch::new(key, &config.timeouts)?)),
        None => {
            tracing::warn!("BRAVE_API_KEY not set, web search disabled");
            SearchGateway::disabled()
        }
    };
    let completion = OpenAICompatClient::groq(&config.groq, &config.timeouts)?;

    let pipeline = DecisionPipeline::new(
        ContextAssembler::new(history.clone(), search),
        Arc::new(completion),
        history,
        config.models.clone(),
    );

    server::start_server(server::AppState { pipeline }, &config.server.bind).await
}

async fn handle_cli_args(args: &[String], config: &Config) -> Result<()> {
    let cmd = args
        .get(1)
        .ok_or_else(|| color_eyre::eyre::eyre!("No command provided"))?;
    let program_name = args.first().map_or("vizwiz", String::as_str);

    match cmd.as_str() {
        "--help" | "-h" | "help" => print_help(program_name),
        "--version" | "-v" => println!("VizWiz v{}", env!("CARGO_PKG_VERSION")),
        "history" => {
            let history = HistoryStore::open(&config.storage.data_dir).await?;
            let total = history.count().await?;
            let limit = match args.get(2) {
                Some(value) => value.parse()?,
                None => total,
            };
            if total == 0 {
                println!("No history.");
            } else {
                println!("{}", history.history_text(limit).await?);
                println!();
                println!("{} turns stored", total);
            }
        }
        "reset" => {
            let history = HistoryStore::open(&config.storage.data_dir).await?;
            history.clear().await?;
            println!("Memory cleared");
        }
        cmd_str => {
            eprintln!("Unknown command: {}", cmd_str);
            eprintln!("Run with --help for available commands.");
            std::process::exit(1);
        }
    }
    Ok(())
}

fn print_help(program_name: &str) {
    println!("VizWiz - analytics answers with chart-ready output");
    println!();
    println!("Usage: {} [command]", program_name);
    println!();
    println!("Commands:");
    println!("  history [n] - Print the last n stored turns (default all)");
    println!("  reset       - Delete the stored conversation");
    println!("  --help      - Show this help");
    println!("  --version   - Show version");
    println!();
    println!("Run without arguments to start the HTTP server.");
    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}
