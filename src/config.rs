use std::path::PathBuf;

/// Binance Futures REST endpoints. Testnet is the default so a fresh
/// checkout never trades real funds by accident.
pub const BINANCE_TESTNET_URL: &str = "https://testnet.binancefuture.com";
pub const BINANCE_MAINNET_URL: &str = "https://fapi.binance.com";

/// Runtime configuration, read once from the environment at startup.
///
/// Secrets come from `.env` / process env; everything else has the same
/// defaults the bot has always shipped with.
#[derive(Debug, Clone)]
pub struct Config {
    /// `testnet` or `mainnet`, selects the Binance base URL.
    pub binance_env: String,
    pub binance_api_key: Option<String>,
    pub binance_api_secret: Option<String>,
    pub symbol: String,
    pub timeframe: String,
    pub ohlcv_limit: usize,

    pub twitter_bearer_token: Option<String>,

    /// Static bearer token protecting the HTTP surface.
    pub api_token: String,

    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    /// Suppress Telegram alerts without removing credentials.
    pub silent_mode: bool,

    /// Forward admitted entries/exits to the exchange when true;
    /// paper-trade otherwise.
    pub trade_live: bool,
    /// Contract quantity for forwarded market orders.
    pub trade_amount: f64,

    pub initial_balance: f64,
    /// Seconds between live-loop ticks.
    pub interval_secs: u64,

    pub models_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let binance_env = env_or("BINANCE_ENV", "testnet").to_lowercase();

        let (key_var, secret_var) = if binance_env == "testnet" {
            ("BINANCE_TEST_API_KEY", "BINANCE_TEST_API_SECRET")
        } else {
            ("BINANCE_API_KEY", "BINANCE_SECRET")
        };

        Self {
            binance_env,
            binance_api_key: std::env::var(key_var).ok(),
            binance_api_secret: std::env::var(secret_var).ok(),
            symbol: env_or("BINANCE_SYMBOL", "BTCUSDT"),
            timeframe: env_or("BINANCE_TIMEFRAME", "5m"),
            ohlcv_limit: env_parse("OHLCV_LIMIT", 500),
            twitter_bearer_token: std::env::var("TWITTER_BEARER_TOKEN").ok(),
            api_token: env_or("API_TOKEN", "secret-ml-token"),
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN").ok(),
            telegram_chat_id: std::env::var("TELEGRAM_CHAT_ID").ok(),
            silent_mode: env_parse("SILENT_MODE", false),
            trade_live: env_parse("TRADE_LIVE", false),
            trade_amount: env_parse("TRADE_AMOUNT", 0.001),
            initial_balance: env_parse("INITIAL_BALANCE", 10_000.0),
            interval_secs: env_parse("INTERVAL_SECONDS", 900),
            models_dir: PathBuf::from(env_or("MODELS_DIR", "models")),
            logs_dir: PathBuf::from(env_or("LOGS_DIR", "logs")),
        }
    }

    pub fn binance_base_url(&self) -> &'static str {
        if self.binance_env == "mainnet" {
            BINANCE_MAINNET_URL
        } else {
            BINANCE_TESTNET_URL
        }
    }

    pub fn telegram_enabled(&self) -> bool {
        !self.silent_mode
            && self.telegram_bot_token.is_some()
            && self.telegram_chat_id.is_some()
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_selection() {
        let mut config = Config::from_env();
        config.binance_env = "testnet".to_string();
        assert_eq!(config.binance_base_url(), BINANCE_TESTNET_URL);

        config.binance_env = "mainnet".to_string();
        assert_eq!(config.binance_base_url(), BINANCE_MAINNET_URL);
    }

    #[test]
    fn test_telegram_disabled_without_credentials() {
        let mut config = Config::from_env();
        config.telegram_bot_token = None;
        config.telegram_chat_id = None;
        assert!(!config.telegram_enabled());
    }
}
