use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TickError;
use crate::signal::Signal;

/// Entries are blocked for this long after every close.
pub const COOLDOWN_MINUTES: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

/// The open half of a trade. Only exists while a position is open, so a
/// flat position can never carry a stale side or entry price.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenLeg {
    pub id: Uuid,
    pub side: Side,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
}

/// A realized round trip, produced exactly once per close.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub timestamp: DateTime<Utc>,
    pub entry_time: DateTime<Utc>,
    pub side: Side,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Signed PnL fraction, exact f64. Rounding happens at persistence.
    pub pnl: f64,
    pub balance_after: f64,
}

/// What a signal did to the position.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Opened { side: Side, entry_price: f64 },
    Closed(ClosedTrade),
    /// Open position held through a same-direction or neutral signal
    Held,
    /// Entry evaluation blocked by an active cooldown
    CooldownSkip { until: DateTime<Utc> },
    /// Neutral signal while flat
    NoOp,
}

/// The single source of truth for "are we in a trade, and since when".
///
/// Owned by exactly one task; every other surface reads a `snapshot()`
/// or the persisted CSV projection, never this struct directly.
#[derive(Debug)]
pub struct Position {
    open: Option<OpenLeg>,
    cooldown_until: Option<DateTime<Utc>>,
    balance: f64,
}

impl Position {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            open: None,
            cooldown_until: None,
            balance: initial_balance,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn open_leg(&self) -> Option<&OpenLeg> {
        self.open.as_ref()
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn cooldown_until(&self) -> Option<DateTime<Utc>> {
        self.cooldown_until
    }

    /// Apply one admitted signal at the given price and time.
    ///
    /// Transitions complete fully or not at all: the price guard runs
    /// before any mutation, and each arm performs a single state update.
    /// Cooldown gates entries only; exits are never blocked by it.
    pub fn handle_signal(
        &mut self,
        signal: Signal,
        price: f64,
        t: DateTime<Utc>,
    ) -> Result<Transition, TickError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(TickError::InvalidPrice(price));
        }

        let Some(leg) = &self.open else {
            // Flat: cooldown blocks all entry evaluation until elapsed
            if let Some(until) = self.cooldown_until {
                if t < until {
                    return Ok(Transition::CooldownSkip { until });
                }
            }

            let side = match signal {
                Signal::Long => Side::Long,
                Signal::Short => Side::Short,
                _ => return Ok(Transition::NoOp),
            };

            self.open = Some(OpenLeg {
                id: Uuid::new_v4(),
                side,
                entry_price: price,
                entry_time: t,
            });
            self.cooldown_until = None;

            tracing::info!("📥 Position OPENED: {} @ {:.2}", side, price);
            return Ok(Transition::Opened {
                side,
                entry_price: price,
            });
        };

        let opposite = matches!(
            (leg.side, signal),
            (Side::Long, Signal::Short) | (Side::Short, Signal::Long)
        );

        if !opposite {
            tracing::debug!("🔁 Ignoring signal: {} | Position: {}", signal, leg.side);
            return Ok(Transition::Held);
        }

        // Close: realize PnL, start the re-entry cooldown. The opposite
        // signal never opens a new leg in the same tick.
        let pnl = match leg.side {
            Side::Long => (price - leg.entry_price) / leg.entry_price,
            Side::Short => (leg.entry_price - price) / leg.entry_price,
        };
        let balance_after = self.balance * (1.0 + pnl);

        let closed = ClosedTrade {
            timestamp: t,
            entry_time: leg.entry_time,
            side: leg.side,
            entry_price: leg.entry_price,
            exit_price: price,
            pnl,
            balance_after,
        };

        self.open = None;
        self.balance = balance_after;
        self.cooldown_until = Some(t + Duration::minutes(COOLDOWN_MINUTES));

        tracing::info!(
            "📤 Position CLOSED: {} | PnL: {:.2}%",
            closed.side,
            pnl * 100.0
        );
        Ok(Transition::Closed(closed))
    }

    /// Immutable view for dashboards and the HTTP surface.
    pub fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot {
            is_open: self.open.is_some(),
            side: self.open.as_ref().map(|leg| leg.side),
            entry_price: self.open.as_ref().map(|leg| leg.entry_price).unwrap_or(0.0),
            entry_time: self.open.as_ref().map(|leg| leg.entry_time),
            cooldown_until: self.cooldown_until,
            balance: self.balance,
        }
    }
}

/// Read-only projection of the live position state.
#[derive(Debug, Clone, Serialize)]
pub struct PositionSnapshot {
    pub is_open: bool,
    pub side: Option<Side>,
    pub entry_price: f64,
    pub entry_time: Option<DateTime<Utc>>,
    pub cooldown_until: Option<DateTime<Utc>>,
    pub balance: f64,
}
