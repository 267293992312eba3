// Model inference: pre-trained LSTM weights + feature scaler loaded from
// disk artifacts. Training lives in a separate pipeline; this module only
// consumes what it produces.

pub mod artifacts;
pub mod lstm;
pub mod scaler;

pub use artifacts::{artifacts_exist, load_artifacts, ModelArtifacts};
pub use lstm::{DenseHead, LstmCell, LstmModel};
pub use scaler::MinMaxScaler;
