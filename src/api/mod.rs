pub mod binance;
pub mod twitter;

pub use binance::{BinanceClient, OrderAck};
pub use twitter::TwitterClient;
