use crate::api::BinanceClient;
use crate::execution::Side;

/// Forwards entry orders to the exchange, fire-and-forget.
///
/// The position transition is already recorded by the time this runs; a
/// venue failure is reported but never rolls the transition back. In
/// paper mode no client is attached and orders are only logged.
pub struct OrderRouter {
    client: Option<BinanceClient>,
    symbol: String,
    quantity: f64,
}

impl OrderRouter {
    pub fn paper(symbol: String, quantity: f64) -> Self {
        Self {
            client: None,
            symbol,
            quantity,
        }
    }

    pub fn live(client: BinanceClient, symbol: String, quantity: f64) -> Self {
        Self {
            client: Some(client),
            symbol,
            quantity,
        }
    }

    pub fn is_live(&self) -> bool {
        self.client.is_some()
    }

    /// Forward a market order matching a freshly opened position.
    pub async fn forward_entry(&self, side: Side) {
        let order_side = match side {
            Side::Long => "BUY",
            Side::Short => "SELL",
        };

        let Some(client) = &self.client else {
            tracing::info!(
                "📝 Paper order: {} {} {}",
                order_side,
                self.quantity,
                self.symbol
            );
            return;
        };

        match client
            .place_market_order(&self.symbol, order_side, self.quantity)
            .await
        {
            Ok(ack) => {
                tracing::info!(
                    "✅ Order executed: {} {} {} (id {})",
                    order_side,
                    self.quantity,
                    self.symbol,
                    ack.order_id
                );
            }
            Err(e) => {
                // State transition stands; the exchange leg is lossy
                tracing::error!("❌ Failed to place order: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_paper_router_never_calls_out() {
        let router = OrderRouter::paper("BTCUSDT".to_string(), 0.001);
        assert!(!router.is_live());
        // Must complete without a network stack
        router.forward_entry(Side::Long).await;
        router.forward_entry(Side::Short).await;
    }
}
