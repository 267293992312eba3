// Feature pipeline: indicator columns + sentiment merged into one frame

use chrono::{DateTime, Utc};

use crate::indicators::{ema_series, macd_series, rsi_series};
use crate::models::{Candle, TweetSentiment};

pub const RSI_PERIOD: usize = 14;
pub const EMA_PERIOD: usize = 21;

/// One fully-populated row of the model's feature frame.
///
/// Field order here matches the fixed feature set the model was trained
/// on: rsi_14, ema_21, macd, sentiment.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub rsi_14: f64,
    pub ema_21: f64,
    pub macd: f64,
    pub sentiment: f64,
}

impl FeatureRow {
    /// Feature vector in model input order
    pub fn as_vector(&self) -> [f64; 4] {
        [self.rsi_14, self.ema_21, self.macd, self.sentiment]
    }
}

/// Average the per-tweet polarity scores into a single sentiment value.
///
/// An empty tweet set yields 0.0 (neutral), not an error.
pub fn average_sentiment(tweets: &[TweetSentiment]) -> f64 {
    if tweets.is_empty() {
        return 0.0;
    }
    tweets.iter().map(|t| t.score).sum::<f64>() / tweets.len() as f64
}

/// Build the feature frame from candles and a sentiment score.
///
/// Computes RSI(14), EMA(21) and MACD over the close series, broadcasts
/// the sentiment score across every row, and drops warmup rows where any
/// indicator is still unavailable.
pub fn build_features(candles: &[Candle], sentiment: f64) -> Vec<FeatureRow> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let rsi = rsi_series(&closes, RSI_PERIOD);
    let ema = ema_series(&closes, EMA_PERIOD);
    let macd = macd_series(&closes);

    candles
        .iter()
        .enumerate()
        .filter_map(|(i, candle)| {
            Some(FeatureRow {
                timestamp: candle.timestamp,
                close: candle.close,
                rsi_14: rsi[i]?,
                ema_21: ema[i]?,
                macd: macd[i]?,
                sentiment,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_candles(closes: &[f64]) -> Vec<Candle> {
        let start = Utc::now() - Duration::minutes(5 * closes.len() as i64);
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: start + Duration::minutes(5 * i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn test_warmup_rows_dropped() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64).sin()).collect();
        let candles = make_candles(&closes);

        let features = build_features(&candles, 0.2);

        // MACD's slow EMA (26) is the longest warmup: rows 0..25 drop
        assert_eq!(features.len(), 40 - 25);
        assert!(features.iter().all(|r| r.sentiment == 0.2));
    }

    #[test]
    fn test_insufficient_candles_yield_empty_frame() {
        let candles = make_candles(&[100.0, 101.0, 102.0]);
        assert!(build_features(&candles, 0.0).is_empty());
    }

    #[test]
    fn test_average_sentiment() {
        let tweets = vec![
            TweetSentiment { text: "btc pumping".into(), score: 0.8 },
            TweetSentiment { text: "bearish".into(), score: -0.4 },
        ];
        assert!((average_sentiment(&tweets) - 0.2).abs() < 1e-12);
        assert_eq!(average_sentiment(&[]), 0.0);
    }

    #[test]
    fn test_feature_vector_order() {
        let row = FeatureRow {
            timestamp: Utc::now(),
            close: 100.0,
            rsi_14: 55.0,
            ema_21: 99.5,
            macd: 0.3,
            sentiment: -0.1,
        };
        assert_eq!(row.as_vector(), [55.0, 99.5, 0.3, -0.1]);
    }
}
