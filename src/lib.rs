// Core modules
pub mod alerts;
pub mod analysis;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod execution;
pub mod features;
pub mod indicators;
pub mod model;
pub mod models;
pub mod persistence;
pub mod server;
pub mod signal;

// Re-export commonly used types
pub use config::Config;
pub use error::TickError;
pub use execution::{Position, PositionSnapshot, Side, Transition};
pub use models::Candle;
pub use signal::{Evaluation, Signal, SignalGenerator};

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
