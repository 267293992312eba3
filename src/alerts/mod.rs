//! Telegram notifications for trade events

use crate::config::Config;
use crate::execution::{ClosedTrade, Side};

/// Sends trade alerts to a Telegram chat.
///
/// Alerting is best-effort: a failed or disabled send is logged and
/// swallowed, it never affects the trading path.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: Option<String>,
    chat_id: Option<String>,
    enabled: bool,
}

impl TelegramNotifier {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token: config.telegram_bot_token.clone(),
            chat_id: config.telegram_chat_id.clone(),
            enabled: config.telegram_enabled(),
        }
    }

    /// Disabled notifier for tests and silent mode
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token: None,
            chat_id: None,
            enabled: false,
        }
    }

    pub async fn send(&self, message: &str) {
        if !self.enabled {
            return;
        }
        let (Some(bot_token), Some(chat_id)) = (&self.bot_token, &self.chat_id) else {
            return;
        };

        let url = format!("https://api.telegram.org/bot{}/sendMessage", bot_token);
        let params = [("chat_id", chat_id.as_str()), ("text", message)];

        match self.client.post(&url).form(&params).send().await {
            Ok(resp) if !resp.status().is_success() => {
                tracing::warn!("Telegram send failed: {}", resp.status());
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Telegram error: {}", e);
            }
        }
    }

    pub async fn position_opened(&self, side: Side, price: f64) {
        self.send(&format!("📥 Position OPENED: {}\n@ ${:.2}", side, price))
            .await;
    }

    pub async fn position_closed(&self, trade: &ClosedTrade) {
        self.send(&format!(
            "📤 CLOSED {} @ ${:.2}\nPnL: {:.2}%",
            trade.side,
            trade.exit_price,
            trade.pnl * 100.0
        ))
        .await;
    }

    pub async fn startup(&self) {
        self.send("🚀 futuresbot started\nWatching for signals...")
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_disabled_notifier_is_a_noop() {
        let notifier = TelegramNotifier::disabled();
        notifier.send("hello").await;
        notifier.position_opened(Side::Long, 100.0).await;
        notifier
            .position_closed(&ClosedTrade {
                timestamp: Utc::now(),
                entry_time: Utc::now(),
                side: Side::Long,
                entry_price: 100.0,
                exit_price: 110.0,
                pnl: 0.1,
                balance_after: 11_000.0,
            })
            .await;
    }
}
