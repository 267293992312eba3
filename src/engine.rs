//! Live trading engine: one task that owns the position, the CSV
//! writers and the tick pipeline.
//!
//! Other surfaces never share this state. The HTTP API requests
//! evaluations over a command channel and reads position data from a
//! published snapshot, so every mutation happens on exactly one task
//! and each transition completes atomically between awaits.

use std::sync::{Arc, RwLock};

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, MissedTickBehavior};

use crate::alerts::TelegramNotifier;
use crate::analysis;
use crate::api::{BinanceClient, TwitterClient};
use crate::api::twitter::{DEFAULT_MAX_RESULTS, DEFAULT_QUERY};
use crate::config::Config;
use crate::error::TickError;
use crate::execution::{OrderRouter, Position, PositionSnapshot, Transition};
use crate::features::{average_sentiment, build_features};
use crate::model::load_artifacts;
use crate::persistence::{ClosedPositionRow, ConfidenceRow, TradeLogRow, TradeLogs};
use crate::signal::{Evaluation, Signal, SignalGenerator};

/// Requests other surfaces may send to the engine task.
pub enum EngineCommand {
    /// Run one evaluation tick now and report its outcome.
    Evaluate {
        respond_to: oneshot::Sender<(Signal, f64)>,
    },
}

pub struct LiveEngine {
    config: Config,
    binance: BinanceClient,
    twitter: Option<TwitterClient>,
    position: Position,
    logs: TradeLogs,
    router: OrderRouter,
    alerts: TelegramNotifier,
    snapshot: Arc<RwLock<PositionSnapshot>>,
}

impl LiveEngine {
    pub fn new(config: Config) -> crate::Result<Self> {
        let binance = BinanceClient::from_config(&config);
        let twitter = config
            .twitter_bearer_token
            .clone()
            .map(TwitterClient::new);

        let router = if config.trade_live {
            OrderRouter::live(binance.clone(), config.symbol.clone(), config.trade_amount)
        } else {
            OrderRouter::paper(config.symbol.clone(), config.trade_amount)
        };

        let logs = TradeLogs::new(&config.logs_dir);
        logs.init_log_files()?;

        let position = Position::new(config.initial_balance);
        let snapshot = Arc::new(RwLock::new(position.snapshot()));
        let alerts = TelegramNotifier::from_config(&config);

        Ok(Self {
            config,
            binance,
            twitter,
            position,
            logs,
            router,
            alerts,
            snapshot,
        })
    }

    /// Handle for read-only observers of the position state.
    pub fn snapshot_handle(&self) -> Arc<RwLock<PositionSnapshot>> {
        self.snapshot.clone()
    }

    /// Run one full tick: fetch, evaluate, trade, log.
    ///
    /// Never fails the caller; every fault is contained inside the tick
    /// so the next scheduled tick always runs.
    pub async fn tick(&mut self, source: &str) -> (Signal, f64) {
        let evaluation = match self.evaluate_market().await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                if e.is_error_tick() {
                    tracing::warn!("❌ Tick skipped ({} source): {}", source, e);
                } else {
                    tracing::error!("❌ Tick failed ({} source): {}", source, e);
                }
                return (Signal::Error, 0.0);
            }
        };

        tracing::info!(
            "📢 Signal: {} | RSI: {:.2} | Confidence: {:.2}%",
            evaluation.signal,
            evaluation.rsi,
            evaluation.confidence * 100.0
        );

        // The confidence sample lands before any trade record from this
        // tick, so dashboards can always find the triggering sample.
        if let Err(e) = self
            .logs
            .append_confidence(&ConfidenceRow::from_evaluation(&evaluation, source))
        {
            tracing::error!("{}", e);
        }

        self.apply_signal(&evaluation).await;

        if let Ok(mut snap) = self.snapshot.write() {
            *snap = self.position.snapshot();
        }

        (evaluation.signal, evaluation.confidence)
    }

    /// Fetch market data and sentiment, load artifacts, evaluate.
    async fn evaluate_market(&self) -> Result<Evaluation, TickError> {
        let candles = self
            .binance
            .fetch_klines(
                &self.config.symbol,
                &self.config.timeframe,
                self.config.ohlcv_limit,
            )
            .await
            .map_err(|e| TickError::DataUnavailable(e.to_string()))?;

        let tweets = match &self.twitter {
            Some(client) => client
                .fetch_sentiment(DEFAULT_QUERY, DEFAULT_MAX_RESULTS)
                .await
                .map_err(|e| TickError::DataUnavailable(e.to_string()))?,
            None => Vec::new(),
        };

        let artifacts = load_artifacts(&self.config.models_dir)?;

        let features = build_features(&candles, average_sentiment(&tweets));
        SignalGenerator::new(artifacts).evaluate(&features)
    }

    /// Feed the evaluation into the lifecycle manager and run the
    /// side effects of whatever transition results.
    async fn apply_signal(&mut self, evaluation: &Evaluation) {
        if evaluation.signal == Signal::Error {
            return;
        }

        let now = chrono::Utc::now();
        let transition =
            match self
                .position
                .handle_signal(evaluation.signal, evaluation.price, now)
            {
                Ok(transition) => transition,
                Err(e) => {
                    tracing::error!("Signal rejected: {}", e);
                    return;
                }
            };

        match transition {
            Transition::Opened { side, entry_price } => {
                self.log_trade_row(
                    evaluation,
                    &format!("Enter {} @ {:.2}", side, entry_price),
                    0.0,
                    self.position.balance(),
                );

                // Fire-and-forget: the transition above stands even if
                // the exchange leg fails.
                self.router.forward_entry(side).await;
                self.alerts.position_opened(side, entry_price).await;
            }
            Transition::Closed(trade) => {
                if let Err(e) = self.logs.append_closed(&ClosedPositionRow::from(&trade)) {
                    // In-memory state is now ahead of the on-disk log
                    tracing::error!("{}", e);
                }

                self.log_trade_row(
                    evaluation,
                    &format!(
                        "Exit {} @ {:.2} | PnL: {:.2}%",
                        trade.side,
                        trade.exit_price,
                        trade.pnl * 100.0
                    ),
                    trade.pnl * 100.0,
                    trade.balance_after,
                );

                if let Err(e) = analysis::refresh_summary(&self.logs) {
                    tracing::warn!("Summary refresh failed: {}", e);
                }
                self.alerts.position_closed(&trade).await;
            }
            Transition::CooldownSkip { until } => {
                tracing::info!("⏳ In cooldown until {}. Skipping trade.", until);
                self.log_trade_row(
                    evaluation,
                    "Cooldown - skipped",
                    0.0,
                    self.position.balance(),
                );
            }
            Transition::Held | Transition::NoOp => {}
        }
    }

    fn log_trade_row(&self, evaluation: &Evaluation, action: &str, pnl: f64, balance: f64) {
        let row = TradeLogRow::new(
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            evaluation.signal.to_string(),
            evaluation.price,
            action.to_string(),
            pnl,
            balance,
        );
        if let Err(e) = self.logs.append_trade(&row) {
            tracing::error!("{}", e);
        }
    }

    /// Main loop: scheduled ticks, on-demand evaluations, and a clean
    /// stop on Ctrl+C that never interrupts a tick in flight.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<EngineCommand>,
        max_cycles: Option<u64>,
    ) {
        self.alerts.startup().await;

        let mut interval = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cycles = 0u64;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    cycles += 1;
                    tracing::info!("🔄 Cycle {} running...", cycles);
                    self.tick("live").await;

                    if let Some(max) = max_cycles {
                        if cycles >= max {
                            tracing::info!("✅ Live loop complete ({} cycles)", max);
                            break;
                        }
                    }
                }
                Some(command) = commands.recv() => {
                    match command {
                        EngineCommand::Evaluate { respond_to } => {
                            let outcome = self.tick("api").await;
                            let _ = respond_to.send(outcome);
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("⚠️ Received Ctrl+C, shutting down...");
                    break;
                }
            }
        }
    }
}
