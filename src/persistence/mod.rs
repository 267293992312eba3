// Append-only CSV sinks for predictions, trades and closed positions.
//
// Exactly one task writes these files (the engine); dashboards and the
// analyzer only ever read them. Headers are written once, on first
// creation, and all numeric rounding happens here at the edge.

use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::TickError;
use crate::execution::ClosedTrade;
use crate::signal::Evaluation;

pub const CONFIDENCE_LOG: &str = "confidence_log.csv";
pub const TRADE_LOG: &str = "trade_log.csv";
pub const POSITIONS_LOG: &str = "virtual_positions.csv";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One row per signal-generator invocation, trade or no trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceRow {
    pub timestamp: String,
    pub signal: String,
    pub confidence: f64,
    pub rsi: f64,
    pub price: f64,
    pub source: String,
}

impl ConfidenceRow {
    pub fn from_evaluation(evaluation: &Evaluation, source: &str) -> Self {
        Self {
            timestamp: evaluation.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            signal: evaluation.signal.to_string(),
            confidence: round4(evaluation.confidence),
            rsi: round2(evaluation.rsi),
            price: round2(evaluation.price),
            source: source.to_string(),
        }
    }
}

/// One row per admitted directional signal the lifecycle manager handled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeLogRow {
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Signal")]
    pub signal: String,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "PnL")]
    pub pnl: f64,
    #[serde(rename = "Balance")]
    pub balance: f64,
}

impl TradeLogRow {
    pub fn new(time: String, signal: String, price: f64, action: String, pnl: f64, balance: f64) -> Self {
        Self {
            time,
            signal,
            price: round2(price),
            action,
            pnl: round2(pnl),
            balance: round2(balance),
        }
    }
}

/// One row per closed position, written exactly once per close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedPositionRow {
    pub timestamp: String,
    pub entry_time: String,
    pub signal: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl_percent: f64,
    pub balance_after: f64,
}

impl From<&ClosedTrade> for ClosedPositionRow {
    fn from(trade: &ClosedTrade) -> Self {
        Self {
            timestamp: trade.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            entry_time: trade.entry_time.format(TIMESTAMP_FORMAT).to_string(),
            signal: trade.side.to_string(),
            entry_price: round2(trade.entry_price),
            exit_price: round2(trade.exit_price),
            pnl_percent: round2(trade.pnl * 100.0),
            balance_after: round2(trade.balance_after),
        }
    }
}

/// The single designated writer for all three log files.
pub struct TradeLogs {
    logs_dir: PathBuf,
}

impl TradeLogs {
    pub fn new(logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            logs_dir: logs_dir.into(),
        }
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Create all three log files with their headers when missing or
    /// empty. Safe to call repeatedly.
    pub fn init_log_files(&self) -> crate::Result<()> {
        std::fs::create_dir_all(&self.logs_dir)?;

        self.ensure_header(
            CONFIDENCE_LOG,
            &["timestamp", "signal", "confidence", "rsi", "price", "source"],
        )?;
        self.ensure_header(
            TRADE_LOG,
            &["Time", "Signal", "Price", "Action", "PnL", "Balance"],
        )?;
        self.ensure_header(
            POSITIONS_LOG,
            &[
                "timestamp",
                "entry_time",
                "signal",
                "entry_price",
                "exit_price",
                "pnl_percent",
                "balance_after",
            ],
        )?;

        Ok(())
    }

    pub fn append_confidence(&self, row: &ConfidenceRow) -> Result<(), TickError> {
        self.append_record(CONFIDENCE_LOG, row)
    }

    pub fn append_trade(&self, row: &TradeLogRow) -> Result<(), TickError> {
        self.append_record(TRADE_LOG, row)
    }

    pub fn append_closed(&self, row: &ClosedPositionRow) -> Result<(), TickError> {
        self.append_record(POSITIONS_LOG, row)
    }

    /// Read the full closed-position projection, oldest first.
    pub fn read_closed(&self) -> crate::Result<Vec<ClosedPositionRow>> {
        let path = self.logs_dir.join(POSITIONS_LOG);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let mut rows = Vec::new();
        for record in reader.deserialize() {
            rows.push(record?);
        }
        Ok(rows)
    }

    /// Most recent closed trade, if any. Used by the dashboard surface.
    pub fn last_closed_trade(&self) -> Option<ClosedPositionRow> {
        self.read_closed().ok()?.pop()
    }

    fn ensure_header(&self, name: &str, header: &[&str]) -> crate::Result<()> {
        let path = self.logs_dir.join(name);
        if path.exists() && std::fs::metadata(&path)?.len() > 0 {
            return Ok(());
        }

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(header)?;
        writer.flush()?;
        Ok(())
    }

    /// Open-append-flush for one record; the header rides along only
    /// when the file is brand new.
    fn append_record<T: Serialize>(&self, name: &str, record: &T) -> Result<(), TickError> {
        let path = self.logs_dir.join(name);
        let needs_header = !path.exists()
            || std::fs::metadata(&path)
                .map(|m| m.len() == 0)
                .unwrap_or(true);

        let append = || -> crate::Result<()> {
            std::fs::create_dir_all(&self.logs_dir)?;
            let file = OpenOptions::new().append(true).create(true).open(&path)?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(needs_header)
                .from_writer(file);
            writer.serialize(record)?;
            writer.flush()?;
            Ok(())
        };

        append().map_err(|e| TickError::Persistence(format!("{}: {}", name, e)))
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::Side;
    use chrono::Utc;

    fn sample_close(n: u32) -> ClosedTrade {
        ClosedTrade {
            timestamp: Utc::now(),
            entry_time: Utc::now(),
            side: Side::Long,
            entry_price: 100.0,
            exit_price: 100.0 + n as f64,
            pnl: n as f64 / 100.0,
            balance_after: 10_000.0 * (1.0 + n as f64 / 100.0),
        }
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let logs = TradeLogs::new(dir.path());
        logs.init_log_files().unwrap();
        logs.init_log_files().unwrap(); // idempotent

        logs.append_closed(&(&sample_close(1)).into()).unwrap();
        logs.append_closed(&(&sample_close(2)).into()).unwrap();

        let contents = std::fs::read_to_string(dir.path().join(POSITIONS_LOG)).unwrap();
        let header_count = contents
            .lines()
            .filter(|l| l.starts_with("timestamp,"))
            .count();
        assert_eq!(header_count, 1);
        assert_eq!(contents.lines().count(), 3);
    }

    #[test]
    fn test_n_closes_yield_n_records_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let logs = TradeLogs::new(dir.path());

        for n in 1..=5 {
            logs.append_closed(&(&sample_close(n)).into()).unwrap();
        }

        let rows = logs.read_closed().unwrap();
        assert_eq!(rows.len(), 5);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.exit_price, 101.0 + i as f64);
        }

        // Re-reading changes nothing
        assert_eq!(logs.read_closed().unwrap().len(), 5);
    }

    #[test]
    fn test_rounding_at_persistence() {
        let trade = ClosedTrade {
            timestamp: Utc::now(),
            entry_time: Utc::now(),
            side: Side::Short,
            entry_price: 100.123456,
            exit_price: 90.987654,
            pnl: 0.0913579,
            balance_after: 10_913.579999,
        };

        let row = ClosedPositionRow::from(&trade);
        assert_eq!(row.entry_price, 100.12);
        assert_eq!(row.exit_price, 90.99);
        assert_eq!(row.pnl_percent, 9.14);
        assert_eq!(row.balance_after, 10_913.58);
        assert_eq!(row.signal, "SHORT");
    }

    #[test]
    fn test_trade_log_header_spelling() {
        let dir = tempfile::tempdir().unwrap();
        let logs = TradeLogs::new(dir.path());
        logs.append_trade(&TradeLogRow {
            time: "2026-08-01 12:00:00".to_string(),
            signal: "LONG".to_string(),
            price: 100.0,
            action: "Enter Long @ 100.00".to_string(),
            pnl: 0.0,
            balance: 10_000.0,
        })
        .unwrap();

        let contents = std::fs::read_to_string(dir.path().join(TRADE_LOG)).unwrap();
        assert!(contents.starts_with("Time,Signal,Price,Action,PnL,Balance\n"));
    }

    #[test]
    fn test_last_closed_trade() {
        let dir = tempfile::tempdir().unwrap();
        let logs = TradeLogs::new(dir.path());
        assert!(logs.last_closed_trade().is_none());

        logs.append_closed(&(&sample_close(1)).into()).unwrap();
        logs.append_closed(&(&sample_close(7)).into()).unwrap();

        let last = logs.last_closed_trade().unwrap();
        assert_eq!(last.exit_price, 107.0);
    }

    #[test]
    fn test_confidence_row_from_evaluation() {
        let evaluation = Evaluation {
            signal: crate::signal::Signal::Filtered,
            confidence: 0.654321,
            rsi: 45.678,
            price: 64000.123,
            timestamp: Utc::now(),
        };

        let row = ConfidenceRow::from_evaluation(&evaluation, "live");
        assert_eq!(row.signal, "FILTERED");
        assert_eq!(row.confidence, 0.6543);
        assert_eq!(row.rsi, 45.68);
        assert_eq!(row.price, 64000.12);
        assert_eq!(row.source, "live");
    }
}
