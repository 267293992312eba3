use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use futuresbot::analysis;
use futuresbot::config::Config;
use futuresbot::engine::LiveEngine;
use futuresbot::model::artifacts_exist;
use futuresbot::persistence::TradeLogs;
use futuresbot::server::{self, AppState};
use futuresbot::Result;

#[derive(Parser)]
#[command(name = "futuresbot", about = "Crypto futures ML trading bot")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the live trading loop and HTTP API
    Live {
        /// Stop after this many ticks (runs until Ctrl+C by default)
        #[arg(long)]
        cycles: Option<u64>,
        /// HTTP API port
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Run a single evaluation tick and print the result
    Predict,
    /// Summarize trade performance from the persisted logs
    Analyze,
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("futuresbot=info")),
        )
        .init();
}

/// Live trading refuses to start without a resolvable model + scaler.
/// Read-only surfaces (analyze) skip this gate.
fn require_artifacts(config: &Config) -> Result<()> {
    if artifacts_exist(&config.models_dir) {
        return Ok(());
    }
    Err(format!(
        "❌ Required model/scaler artifacts not found under {}. Run the retraining pipeline first.",
        config.models_dir.display()
    )
    .into())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Command::Live { cycles, port } => {
            require_artifacts(&config)?;

            tracing::info!("🚀 futuresbot starting");
            tracing::info!("  Symbol: {} ({})", config.symbol, config.timeframe);
            tracing::info!("  Binance env: {}", config.binance_env);
            tracing::info!("  Initial balance: ${:.2}", config.initial_balance);
            tracing::info!("  Tick interval: {}s", config.interval_secs);
            tracing::info!(
                "  Order forwarding: {}",
                if config.trade_live { "LIVE" } else { "paper" }
            );

            let engine = LiveEngine::new(config.clone())?;
            let (commands, command_rx) = mpsc::channel(8);

            let state = Arc::new(AppState {
                api_token: config.api_token.clone(),
                commands,
                snapshot: engine.snapshot_handle(),
                logs: TradeLogs::new(&config.logs_dir),
            });
            let server_task = tokio::spawn(server::serve(state, port));

            engine.run(command_rx, cycles).await;
            server_task.abort();

            tracing::info!("👋 futuresbot stopped");
        }
        Command::Predict => {
            require_artifacts(&config)?;

            let mut engine = LiveEngine::new(config)?;
            let (signal, confidence) = engine.tick("manual").await;
            println!("Signal: {} | Confidence: {:.4}", signal, confidence);
        }
        Command::Analyze => {
            let logs = TradeLogs::new(&config.logs_dir);
            analysis::report(&logs)?;
        }
    }

    Ok(())
}
