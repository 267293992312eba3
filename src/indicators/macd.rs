use super::ema_series;

const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;

/// Calculate the MACD line series: EMA(12) - EMA(26).
///
/// One entry per input price; entries are `None` until the slow EMA has
/// warmed up.
pub fn macd_series(prices: &[f64]) -> Vec<Option<f64>> {
    let fast = ema_series(prices, MACD_FAST);
    let slow = ema_series(prices, MACD_SLOW);

    fast.iter()
        .zip(slow.iter())
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_warmup() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let macd = macd_series(&prices);

        assert_eq!(macd.len(), prices.len());
        assert!(macd[24].is_none());
        assert!(macd[25].is_some());
    }

    #[test]
    fn test_macd_positive_in_uptrend() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64) * 2.0).collect();
        let macd = macd_series(&prices);

        // Fast EMA tracks a steady uptrend more closely than the slow one
        assert!(macd.last().unwrap().unwrap() > 0.0);
    }

    #[test]
    fn test_macd_insufficient_data() {
        let prices = vec![100.0; 10];
        let macd = macd_series(&prices);
        assert!(macd.iter().all(|v| v.is_none()));
    }
}
