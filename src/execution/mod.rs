// Position lifecycle and order forwarding
pub mod position;
pub mod venue;

pub use position::{
    ClosedTrade, OpenLeg, Position, PositionSnapshot, Side, Transition, COOLDOWN_MINUTES,
};
pub use venue::OrderRouter;
