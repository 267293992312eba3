use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One LSTM cell's weights: four gates, each with input weights, hidden
/// weights and a bias.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmCell {
    pub input_size: usize,
    pub hidden_size: usize,

    // Input gate
    w_ii: Array2<f64>,
    w_hi: Array2<f64>,
    b_i: Array1<f64>,

    // Forget gate
    w_if: Array2<f64>,
    w_hf: Array2<f64>,
    b_f: Array1<f64>,

    // Cell candidate
    w_ig: Array2<f64>,
    w_hg: Array2<f64>,
    b_g: Array1<f64>,

    // Output gate
    w_io: Array2<f64>,
    w_ho: Array2<f64>,
    b_o: Array1<f64>,
}

impl LstmCell {
    /// All-zero weights. Only useful for tests and as a weight container
    /// to fill from a trained artifact.
    pub fn zeros(input_size: usize, hidden_size: usize) -> Self {
        Self {
            input_size,
            hidden_size,
            w_ii: Array2::zeros((hidden_size, input_size)),
            w_hi: Array2::zeros((hidden_size, hidden_size)),
            b_i: Array1::zeros(hidden_size),
            w_if: Array2::zeros((hidden_size, input_size)),
            w_hf: Array2::zeros((hidden_size, hidden_size)),
            b_f: Array1::zeros(hidden_size),
            w_ig: Array2::zeros((hidden_size, input_size)),
            w_hg: Array2::zeros((hidden_size, hidden_size)),
            b_g: Array1::zeros(hidden_size),
            w_io: Array2::zeros((hidden_size, input_size)),
            w_ho: Array2::zeros((hidden_size, hidden_size)),
            b_o: Array1::zeros(hidden_size),
        }
    }

    /// Forward pass for one time step.
    ///
    /// Returns the next hidden state and cell state.
    pub fn step(
        &self,
        x: &Array1<f64>,
        h_prev: &Array1<f64>,
        c_prev: &Array1<f64>,
    ) -> (Array1<f64>, Array1<f64>) {
        let i_gate = sigmoid(&(self.w_ii.dot(x) + self.w_hi.dot(h_prev) + &self.b_i));
        let f_gate = sigmoid(&(self.w_if.dot(x) + self.w_hf.dot(h_prev) + &self.b_f));
        let g = tanh(&(self.w_ig.dot(x) + self.w_hg.dot(h_prev) + &self.b_g));
        let o_gate = sigmoid(&(self.w_io.dot(x) + self.w_ho.dot(h_prev) + &self.b_o));

        let c_next = &f_gate * c_prev + &i_gate * &g;
        let h_next = &o_gate * &tanh(&c_next);

        (h_next, c_next)
    }

    pub fn init_hidden(&self) -> (Array1<f64>, Array1<f64>) {
        (
            Array1::zeros(self.hidden_size),
            Array1::zeros(self.hidden_size),
        )
    }
}

/// Sigmoid output head mapping the final hidden state to a scalar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseHead {
    pub weights: Array1<f64>,
    pub bias: f64,
}

/// Pre-trained sequence model: one LSTM cell unrolled over the feature
/// window, sigmoid head producing a confidence scalar in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmModel {
    pub cell: LstmCell,
    pub head: DenseHead,
}

impl LstmModel {
    pub fn load(path: &Path) -> crate::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let model: LstmModel = serde_json::from_str(&raw)?;
        if model.head.weights.len() != model.cell.hidden_size {
            return Err(format!(
                "Model head expects {} hidden units, cell has {}",
                model.head.weights.len(),
                model.cell.hidden_size
            )
            .into());
        }
        Ok(model)
    }

    pub fn input_size(&self) -> usize {
        self.cell.input_size
    }

    /// Run the window through the cell and squash the final hidden state
    /// to a confidence scalar.
    ///
    /// `window` is ordered oldest-first; each row must have
    /// `input_size` features.
    pub fn predict(&self, window: &[Vec<f64>]) -> crate::Result<f64> {
        if window.is_empty() {
            return Err("Empty input window".into());
        }

        let (mut h, mut c) = self.cell.init_hidden();
        for row in window {
            if row.len() != self.cell.input_size {
                return Err(format!(
                    "Feature row has {} values, model expects {}",
                    row.len(),
                    self.cell.input_size
                )
                .into());
            }
            let x = Array1::from_vec(row.clone());
            let (h_next, c_next) = self.cell.step(&x, &h, &c);
            h = h_next;
            c = c_next;
        }

        let logit = self.head.weights.dot(&h) + self.head.bias;
        Ok(scalar_sigmoid(logit))
    }
}

fn sigmoid(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(scalar_sigmoid)
}

fn tanh(x: &Array1<f64>) -> Array1<f64> {
    x.mapv(f64::tanh)
}

fn scalar_sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Model with zero cell weights: the hidden state stays at zero, so
    /// the output is exactly sigmoid(head.bias). Handy for pinning the
    /// confidence in tests.
    pub fn constant_model(bias: f64) -> LstmModel {
        LstmModel {
            cell: LstmCell::zeros(4, 8),
            head: DenseHead {
                weights: Array1::zeros(8),
                bias,
            },
        }
    }

    #[test]
    fn test_predict_is_bounded() {
        let model = constant_model(0.0);
        let window = vec![vec![0.5, 0.5, 0.5, 0.5]; 10];
        let confidence = model.predict(&window).unwrap();
        assert!(confidence > 0.0 && confidence < 1.0);
        assert!((confidence - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_bias_drives_confidence() {
        let bullish = constant_model(2.0);
        let bearish = constant_model(-2.0);
        let window = vec![vec![0.1, 0.2, 0.3, 0.4]; 10];

        assert!(bullish.predict(&window).unwrap() > 0.7);
        assert!(bearish.predict(&window).unwrap() < 0.3);
    }

    #[test]
    fn test_predict_is_deterministic() {
        let model = constant_model(0.7);
        let window = vec![vec![0.9, 0.1, 0.4, 0.6]; 10];
        let a = model.predict(&window).unwrap();
        let b = model.predict(&window).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let model = constant_model(0.0);
        let window = vec![vec![0.5, 0.5]; 10];
        assert!(model.predict(&window).is_err());
    }

    #[test]
    fn test_roundtrip_through_json() {
        let model = constant_model(1.5);
        let json = serde_json::to_string(&model).unwrap();
        let restored: LstmModel = serde_json::from_str(&json).unwrap();

        let window = vec![vec![0.2, 0.4, 0.6, 0.8]; 10];
        assert_eq!(
            model.predict(&window).unwrap(),
            restored.predict(&window).unwrap()
        );
    }
}
