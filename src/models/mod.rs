use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candlestick snapshot, immutable once fetched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A scored tweet from the sentiment pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetSentiment {
    pub text: String,
    /// Polarity in [-1.0, 1.0]
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_creation() {
        let candle = Candle {
            timestamp: Utc::now(),
            open: 100.0,
            high: 105.0,
            low: 99.0,
            close: 104.0,
            volume: 1250.0,
        };

        assert!(candle.high >= candle.low);
        assert_eq!(candle.close, 104.0);
    }
}
