//! tablelink CLI
//!
//! Resolves one table and prints its summary.
//!
//! # Architecture Overview
//!
//! ```text
//!   config (TOML + env)
//!          │
//!          ▼
//!   ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//!   │  connection  │────▶│   resolver   │────▶│    model     │
//!   │   manager    │     │ locate /     │     │   adapter    │
//!   │ (ws session) │     │ ephemeral    │     │  (summary)   │
//!   └──────┬───────┘     └──────────────┘     └──────────────┘
//!          │
//!          ▼
//!      teardown (always)
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use tablelink::config::load_config;
use tablelink::flow::{ResolutionFlow, SummaryAdapter, ViewState};
use tablelink::lifecycle::{spawn_signal_handler, Shutdown};
use tablelink::net::WsConnector;
use tablelink::observability::{logging, metrics};
use tablelink::resolver::Selection;

#[derive(Parser)]
#[command(name = "tablelink", version)]
#[command(about = "Open a table on a remote computation service", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// URL query string, e.g. "queryName=Q1&tableName=T1"
    #[arg(long, conflicts_with_all = ["query_name", "table_name"])]
    query: Option<String>,

    /// Group to search for the table
    #[arg(long)]
    query_name: Option<String>,

    /// Table inside the group
    #[arg(long)]
    table_name: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("tablelink v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let selection = match &cli.query {
        Some(query) => Selection::from_query(query),
        None => Selection::new(cli.query_name.as_deref(), cli.table_name.as_deref()),
    };

    let connector = WsConnector::new(Duration::from_secs(config.timeouts.request_secs));
    let flow = match ResolutionFlow::from_config(connector, &config) {
        Ok(flow) => flow,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return ExitCode::from(2);
        }
    };

    let shutdown = Shutdown::new();
    let _signals = spawn_signal_handler(shutdown.clone());

    let result = flow.run(&selection, &SummaryAdapter, shutdown.subscribe()).await;
    match ViewState::from_result(result) {
        ViewState::Ready(summary) => {
            println!("{}", summary);
            ExitCode::SUCCESS
        }
        ViewState::Failed(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
        ViewState::Loading => ExitCode::FAILURE,
    }
}
