// ============================================================================
// Commodity Matching Engine Library
// Price-time-priority order matching for a fixed set of commodity markets
// ============================================================================

//! # Commodity Matching Engine
//!
//! A real-time order matching engine for a closed set of commodities. Orders
//! arrive from many producer threads, are serialized through a bounded queue
//! and matched by a single consumer thread against per-commodity order books
//! ranked by price-time priority.
//!
//! ## Features
//!
//! - **Single-writer matching loop**: all book mutation happens on one
//!   dedicated consumer thread, so the matching path needs no locks
//! - **Concurrently readable books**: lock-free skip-list sides let other
//!   threads take depth snapshots while matching runs
//! - **Limit and market orders** with partial-fill semantics
//! - **Listener fan-out** for trades and accepted orders, with per-callback
//!   failure isolation
//! - **Pluggable metrics sink** recording fills, trades, slippage and
//!   processing latency
//!
//! ## Example
//!
//! ```rust
//! use commodity_matching_engine::prelude::*;
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! let mut engine = MatchingEngine::new(Arc::new(NoOpMetrics));
//! let orders = OrderFactory::new();
//!
//! engine
//!     .submit_order(orders.limit_order(Commodity::Gold, Side::Sell, Decimal::from(1800), 10))
//!     .unwrap();
//! engine
//!     .submit_order(orders.limit_order(Commodity::Gold, Side::Buy, Decimal::from(1800), 10))
//!     .unwrap();
//!
//! // drain the queue, then inspect the book
//! engine.shutdown();
//!
//! let book = engine.order_book(Commodity::Gold);
//! assert_eq!(book.buy_order_count(), 0);
//! assert_eq!(book.sell_order_count(), 0);
//! ```

pub mod domain;
pub mod engine;
pub mod interfaces;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        Commodity, Order, OrderBook, OrderFactory, OrderId, OrderType, Side, Trade, TradeId,
    };
    pub use crate::engine::{EngineError, EngineResult, MatchingEngine};
    pub use crate::interfaces::{
        CommodityMetrics, CounterMetrics, EngineMetrics, ListenerRegistry, MetricsSink,
        NoOpMetrics,
    };
}
