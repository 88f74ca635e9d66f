// ============================================================================
// Order Domain Model
// ============================================================================

use super::Commodity;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Value Objects
// ============================================================================

/// Process-unique order identifier, monotonically increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderId(u64);

impl OrderId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrderType {
    Limit,
    Market,
}

// ============================================================================
// Order Entity
// ============================================================================

/// A buy or sell order for one commodity.
///
/// Identity and economic terms are immutable; the only mutable field is the
/// remaining quantity, which starts equal to `quantity` and only ever
/// decreases. It is stored atomically so book readers on other threads can
/// observe fills without synchronizing with the matching thread.
#[derive(Debug)]
pub struct Order {
    pub id: OrderId,
    pub commodity: Commodity,
    pub side: Side,
    pub order_type: OrderType,
    /// Limit price. `None` for market orders, which take whatever the book
    /// quotes.
    pub price: Option<Decimal>,
    /// Original quantity.
    pub quantity: u64,
    remaining_quantity: AtomicU64,
    /// Wall-clock submission time.
    pub timestamp: DateTime<Utc>,
    /// Arrival sequence used for time-priority tie-breaks. Strictly
    /// increasing and unaffected by wall-clock adjustments.
    pub sequence: u64,
}

impl Order {
    /// Quantity not yet executed. `0 <= remaining <= quantity` always holds.
    pub fn remaining_quantity(&self) -> u64 {
        self.remaining_quantity.load(Ordering::Acquire)
    }

    /// Quantity executed so far.
    pub fn filled_quantity(&self) -> u64 {
        self.quantity - self.remaining_quantity()
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity() == 0
    }

    pub fn is_market_order(&self) -> bool {
        matches!(self.order_type, OrderType::Market)
    }

    pub fn is_limit_order(&self) -> bool {
        matches!(self.order_type, OrderType::Limit)
    }

    /// Atomically consume `quantity` from the remaining amount.
    ///
    /// Returns false, leaving the order untouched, if less than `quantity`
    /// remains.
    pub fn try_fill(&self, quantity: u64) -> bool {
        loop {
            let current = self.remaining_quantity.load(Ordering::Acquire);

            if current < quantity {
                return false;
            }

            if self
                .remaining_quantity
                .compare_exchange(
                    current,
                    current - quantity,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                return true;
            }
            // CAS lost, retry
        }
    }
}

impl Clone for Order {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            commodity: self.commodity,
            side: self.side,
            order_type: self.order_type,
            price: self.price,
            quantity: self.quantity,
            remaining_quantity: AtomicU64::new(self.remaining_quantity.load(Ordering::Acquire)),
            timestamp: self.timestamp,
            sequence: self.sequence,
        }
    }
}

// ============================================================================
// Order Factory
// ============================================================================

/// Creates orders with process-unique ids and arrival sequence numbers.
///
/// The counters live here rather than in statics so that independent engines
/// in the same process (and in tests) do not share id spaces.
pub struct OrderFactory {
    next_order_id: AtomicU64,
    next_sequence: AtomicU64,
}

impl OrderFactory {
    pub fn new() -> Self {
        Self {
            next_order_id: AtomicU64::new(1),
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Build a limit order resting at `price` until matched or removed.
    pub fn limit_order(
        &self,
        commodity: Commodity,
        side: Side,
        price: Decimal,
        quantity: u64,
    ) -> Order {
        self.build(commodity, side, OrderType::Limit, Some(price), quantity)
    }

    /// Build a market order. It carries no price of its own and is never
    /// rested on the book.
    pub fn market_order(&self, commodity: Commodity, side: Side, quantity: u64) -> Order {
        self.build(commodity, side, OrderType::Market, None, quantity)
    }

    fn build(
        &self,
        commodity: Commodity,
        side: Side,
        order_type: OrderType,
        price: Option<Decimal>,
        quantity: u64,
    ) -> Order {
        Order {
            id: OrderId::new(self.next_order_id.fetch_add(1, Ordering::AcqRel)),
            commodity,
            side,
            order_type,
            price,
            quantity,
            remaining_quantity: AtomicU64::new(quantity),
            timestamp: Utc::now(),
            sequence: self.next_sequence.fetch_add(1, Ordering::AcqRel),
        }
    }
}

impl Default for OrderFactory {
    fn default() -> Self {
        Self::new()
    }
}
