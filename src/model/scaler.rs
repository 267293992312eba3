use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-feature min-max scaler fitted at training time.
///
/// Maps each feature to `(x - min) / (max - min)` with the bounds the
/// training pipeline observed. Live inputs outside the fitted range map
/// outside [0, 1], same as scikit-learn's `MinMaxScaler.transform`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub data_min: Vec<f64>,
    pub data_max: Vec<f64>,
}

impl MinMaxScaler {
    pub fn load(path: &Path) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let scaler: MinMaxScaler = serde_json::from_str(&raw)?;
        if scaler.data_min.len() != scaler.data_max.len() {
            return Err(format!(
                "Scaler dimension mismatch: {} mins vs {} maxs",
                scaler.data_min.len(),
                scaler.data_max.len()
            )
            .into());
        }
        Ok(scaler)
    }

    pub fn n_features(&self) -> usize {
        self.data_min.len()
    }

    /// Scale one feature vector in place-order. Degenerate columns
    /// (min == max) map to 0.0.
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.data_min.iter().zip(self.data_max.iter()))
            .map(|(&x, (&min, &max))| {
                let range = max - min;
                if range == 0.0 {
                    0.0
                } else {
                    (x - min) / range
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaler() -> MinMaxScaler {
        MinMaxScaler {
            data_min: vec![0.0, 10.0, -5.0, -1.0],
            data_max: vec![100.0, 20.0, 5.0, 1.0],
        }
    }

    #[test]
    fn test_transform_maps_fitted_range_to_unit() {
        let s = scaler();
        assert_eq!(s.transform(&[0.0, 10.0, -5.0, -1.0]), vec![0.0, 0.0, 0.0, 0.0]);
        assert_eq!(s.transform(&[100.0, 20.0, 5.0, 1.0]), vec![1.0, 1.0, 1.0, 1.0]);
        assert_eq!(s.transform(&[50.0, 15.0, 0.0, 0.0]), vec![0.5, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_transform_does_not_clamp() {
        let s = scaler();
        let out = s.transform(&[200.0, 10.0, -5.0, -1.0]);
        assert_eq!(out[0], 2.0);
    }

    #[test]
    fn test_degenerate_column_maps_to_zero() {
        let s = MinMaxScaler {
            data_min: vec![5.0],
            data_max: vec![5.0],
        };
        assert_eq!(s.transform(&[7.0]), vec![0.0]);
    }
}
