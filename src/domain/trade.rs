// ============================================================================
// Trade Domain Model
// ============================================================================

use super::{Commodity, OrderId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Process-unique trade identifier, monotonically increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TradeId(u64);

impl TradeId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An execution between a buy and a sell order.
///
/// Trades are terminal facts: once constructed they are never mutated or
/// removed, only handed to listeners.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trade {
    pub id: TradeId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub commodity: Commodity,
    /// Execution price, always the resting order's quote.
    pub price: Decimal,
    /// Executed quantity.
    pub quantity: u64,
    /// Time from submission of the aggressor to this execution.
    pub latency: Duration,
    pub timestamp: DateTime<Utc>,
}

impl Trade {
    pub fn new(
        id: TradeId,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        commodity: Commodity,
        price: Decimal,
        quantity: u64,
        latency: Duration,
    ) -> Self {
        Self {
            id,
            buy_order_id,
            sell_order_id,
            commodity,
            price,
            quantity,
            latency,
            timestamp: Utc::now(),
        }
    }

    /// Notional value of the trade (price times quantity).
    pub fn notional_value(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Processing latency in microseconds.
    pub fn latency_micros(&self) -> f64 {
        self.latency.as_nanos() as f64 / 1_000.0
    }
}
