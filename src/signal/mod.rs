// Signal generation: model confidence -> directional signal, gated by
// the RSI admission filter

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TickError;
use crate::features::FeatureRow;
use crate::model::ModelArtifacts;

/// Feature window length the model was trained on
pub const WINDOW_SIZE: usize = 10;

/// Primary confidence thresholds
pub const LONG_THRESHOLD: f64 = 0.6;
pub const SHORT_THRESHOLD: f64 = 0.4;

/// Admission filter: directional signals also need conviction plus an
/// oversold/overbought RSI reading. All comparisons are strict.
pub const FILTER_CONFIDENCE: f64 = 0.7;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// Discrete trade direction hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Long,
    Short,
    Hold,
    /// Directional signal that failed the admission filter
    Filtered,
    /// Data or artifact failure; callers treat the tick as a no-op
    Error,
}

impl Signal {
    /// Whether this signal may reach the position lifecycle as an entry
    /// or exit trigger.
    pub fn is_directional(&self) -> bool {
        matches!(self, Signal::Long | Signal::Short)
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Signal::Long => "LONG",
            Signal::Short => "SHORT",
            Signal::Hold => "HOLD",
            Signal::Filtered => "FILTERED",
            Signal::Error => "ERROR",
        };
        write!(f, "{}", s)
    }
}

/// One signal-generator invocation's output
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub signal: Signal,
    pub confidence: f64,
    /// RSI(14) at evaluation time, used by the admission filter
    pub rsi: f64,
    /// Close price at evaluation time
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// Map raw model confidence to a directional signal.
pub fn map_confidence(confidence: f64) -> Signal {
    if confidence > LONG_THRESHOLD {
        Signal::Long
    } else if confidence < SHORT_THRESHOLD {
        Signal::Short
    } else {
        Signal::Hold
    }
}

/// Admission filter: downgrade directional signals without both an
/// extreme RSI and high conviction to `Filtered`.
pub fn admit(signal: Signal, rsi: f64, confidence: f64) -> Signal {
    match signal {
        Signal::Long if rsi < RSI_OVERSOLD && confidence > FILTER_CONFIDENCE => Signal::Long,
        Signal::Short if rsi > RSI_OVERBOUGHT && confidence > FILTER_CONFIDENCE => Signal::Short,
        Signal::Long | Signal::Short => Signal::Filtered,
        other => other,
    }
}

/// Runs the loaded model over the latest feature window and applies the
/// threshold and filter rules.
pub struct SignalGenerator {
    artifacts: ModelArtifacts,
}

impl SignalGenerator {
    pub fn new(artifacts: ModelArtifacts) -> Self {
        Self { artifacts }
    }

    /// Evaluate the most recent feature window.
    ///
    /// Fewer than `WINDOW_SIZE` usable rows is a data problem, not a
    /// model problem; callers turn it into an `ERROR` tick.
    pub fn evaluate(&self, features: &[FeatureRow]) -> Result<Evaluation, TickError> {
        if features.len() < WINDOW_SIZE {
            return Err(TickError::DataUnavailable(format!(
                "need {} feature rows, have {}",
                WINDOW_SIZE,
                features.len()
            )));
        }

        let window: Vec<Vec<f64>> = features[features.len() - WINDOW_SIZE..]
            .iter()
            .map(|row| self.artifacts.scaler.transform(&row.as_vector()))
            .collect();

        let confidence = self
            .artifacts
            .model
            .predict(&window)
            .map_err(|e| TickError::DataUnavailable(e.to_string()))?;

        let latest = features.last().expect("window checked non-empty");
        let signal = admit(map_confidence(confidence), latest.rsi_14, confidence);

        Ok(Evaluation {
            signal,
            confidence,
            rsi: latest.rsi_14,
            price: latest.close,
            timestamp: latest.timestamp,
        })
    }
}
