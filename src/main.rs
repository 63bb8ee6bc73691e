//! Binary entry point: argument parsing, config resolution, REPL launch.

use std::path::PathBuf;

use clap::Parser;

use localchat::inference::config::{self, ClientConfig};

/// Terminal chat client for local reasoning models.
#[derive(Debug, Parser)]
#[command(name = "localchat", version, about)]
struct Args {
    /// Path to a config file (default: search upward for localchat.yaml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Inference server base URL (overrides config).
    #[arg(long)]
    base_url: Option<String>,

    /// Model identifier to chat with (overrides config).
    #[arg(long)]
    model: Option<String>,

    /// Start with reasoning blocks hidden.
    #[arg(long)]
    no_thinking: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    localchat::init_tracing();

    let mut cfg = match &args.config {
        Some(path) => config::load_config(path)?,
        None => match config::find_config_path(&std::env::current_dir()?) {
            Some(path) => config::load_config(&path)?,
            None => ClientConfig::default(),
        },
    };

    if let Some(base_url) = args.base_url {
        cfg.base_url = base_url;
    }
    if let Some(model) = args.model {
        cfg.model = model;
    }
    if args.no_thinking {
        cfg.show_reasoning = false;
    }
    cfg.validate()?;

    localchat::repl::run(cfg).await
}
