//! Trade performance summary over the persisted CSV projection.
//!
//! Read-only consumer: it never touches live position state, only the
//! closed-position log the engine writes.

use std::fmt::Write as _;

use crate::persistence::TradeLogs;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub total_trades: usize,
    pub total_pnl_percent: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub max_drawdown: f64,
    pub final_balance: f64,
}

impl PerformanceSummary {
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "📊 Trade Performance Summary");
        let _ = writeln!(out, "────────────────────────────");
        let _ = writeln!(out, "📈 Total Trades:       {}", self.total_trades);
        let _ = writeln!(out, "💰 Total PnL:          {:.2}%", self.total_pnl_percent);
        let _ = writeln!(out, "🏆 Win Rate:           {:.2}%", self.win_rate);
        let _ = writeln!(out, "📊 Avg Win:            {:.2}%", self.avg_win);
        let _ = writeln!(out, "📉 Avg Loss:           {:.2}%", self.avg_loss);
        let _ = writeln!(out, "🔻 Max Drawdown:       {:.2}%", self.max_drawdown);
        let _ = writeln!(out, "🏦 Final Balance:      ${:.2}", self.final_balance);
        out
    }
}

/// Summarize the closed-position log. Returns `None` when there are too
/// few trades to say anything useful.
pub fn analyze_performance(logs: &TradeLogs) -> crate::Result<Option<PerformanceSummary>> {
    let rows = logs.read_closed()?;

    if rows.len() < 2 {
        tracing::warn!("⚠️ Not enough trade data to analyze ({} rows)", rows.len());
        return Ok(None);
    }

    let wins: Vec<f64> = rows
        .iter()
        .map(|r| r.pnl_percent)
        .filter(|&p| p > 0.0)
        .collect();
    let losses: Vec<f64> = rows
        .iter()
        .map(|r| r.pnl_percent)
        .filter(|&p| p < 0.0)
        .collect();

    let total_trades = rows.len();
    let total_pnl_percent: f64 = rows.iter().map(|r| r.pnl_percent).sum();
    let win_rate = wins.len() as f64 / total_trades as f64 * 100.0;
    let avg_win = mean(&wins);
    let avg_loss = mean(&losses);
    let max_drawdown = rows
        .iter()
        .map(|r| r.pnl_percent)
        .fold(f64::INFINITY, f64::min);
    let final_balance = rows.last().map(|r| r.balance_after).unwrap_or(0.0);

    Ok(Some(PerformanceSummary {
        total_trades,
        total_pnl_percent,
        win_rate,
        avg_win,
        avg_loss,
        max_drawdown,
        final_balance,
    }))
}

/// Rewrite `performance_summary.txt` from the current log contents.
/// The engine calls this after every close.
pub fn refresh_summary(logs: &TradeLogs) -> crate::Result<()> {
    let Some(summary) = analyze_performance(logs)? else {
        return Ok(());
    };

    let path = logs.logs_dir().join("performance_summary.txt");
    std::fs::write(&path, summary.render())?;
    Ok(())
}

/// Print the summary and persist it next to the logs.
pub fn report(logs: &TradeLogs) -> crate::Result<()> {
    let Some(summary) = analyze_performance(logs)? else {
        println!("⚠️ Not enough trade data to analyze.");
        return Ok(());
    };

    let rendered = summary.render();
    println!("{}", rendered);

    let path = logs.logs_dir().join("performance_summary.txt");
    std::fs::write(&path, &rendered)?;
    tracing::info!("📝 Summary saved to {}", path.display());
    Ok(())
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
