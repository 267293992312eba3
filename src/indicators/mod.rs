// Technical indicators module
// Implements the RSI / EMA / MACD columns the feature pipeline needs

pub mod macd;
pub mod moving_average;
pub mod rsi;

pub use macd::macd_series;
pub use moving_average::{calculate_sma, ema_series};
pub use rsi::rsi_series;
