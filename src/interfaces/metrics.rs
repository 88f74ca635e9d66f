// ============================================================================
// Metrics Interface
// Sink trait consumed by the matching path, plus a counter implementation
// ============================================================================

use crate::domain::{Commodity, Trade};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Sink for engine observability events.
///
/// Called from the consumer thread at fixed points of the matching pipeline;
/// implementations must be fast and non-blocking, since a slow sink stalls
/// all subsequent matching.
pub trait MetricsSink: Send + Sync {
    /// An order was dequeued for processing.
    fn record_order_received(&self, commodity: Commodity);

    /// A limit order rested on the book without matching anything.
    fn record_order_added(&self, commodity: Commodity);

    /// An order's quantity was fully executed in its matching pass.
    fn record_complete_fill(&self, commodity: Commodity);

    /// An order finished its matching pass with quantity left over.
    fn record_partial_fill(&self, commodity: Commodity);

    /// A trade executed. `slippage` is the unsigned distance between the
    /// aggressor's intended price and the realized trade price.
    fn record_trade(&self, trade: &Trade, slippage: Decimal);

    /// One order's full processing step finished, measured from enqueue.
    fn record_processing_time(&self, elapsed: Duration);
}

/// Sink that discards everything. For tests and benchmarks.
pub struct NoOpMetrics;

impl MetricsSink for NoOpMetrics {
    fn record_order_received(&self, _commodity: Commodity) {}
    fn record_order_added(&self, _commodity: Commodity) {}
    fn record_complete_fill(&self, _commodity: Commodity) {}
    fn record_partial_fill(&self, _commodity: Commodity) {}
    fn record_trade(&self, _trade: &Trade, _slippage: Decimal) {}
    fn record_processing_time(&self, _elapsed: Duration) {}
}

// ============================================================================
// Counter Metrics
// ============================================================================

#[derive(Default)]
struct CommodityCounters {
    orders_received: AtomicU64,
    trades_executed: AtomicU64,
    complete_fills: AtomicU64,
    partial_fills: AtomicU64,
    orders_added: AtomicU64,
    /// Cumulative slippage in price micro-units.
    slippage_micros: AtomicU64,
}

/// Lock-free counter sink with one slot per commodity.
///
/// `snapshot` aggregates the counters into plain records suitable for
/// reporting surfaces.
pub struct CounterMetrics {
    per_commodity: [CommodityCounters; Commodity::COUNT],
    total_orders: AtomicU64,
    total_trades: AtomicU64,
    latency_nanos: AtomicU64,
    latency_count: AtomicU64,
}

impl CounterMetrics {
    pub fn new() -> Self {
        Self {
            per_commodity: std::array::from_fn(|_| CommodityCounters::default()),
            total_orders: AtomicU64::new(0),
            total_trades: AtomicU64::new(0),
            latency_nanos: AtomicU64::new(0),
            latency_count: AtomicU64::new(0),
        }
    }

    fn counters(&self, commodity: Commodity) -> &CommodityCounters {
        &self.per_commodity[commodity.index()]
    }

    /// Average order processing latency in microseconds.
    pub fn avg_latency_micros(&self) -> f64 {
        let count = self.latency_count.load(Ordering::Acquire);
        if count == 0 {
            return 0.0;
        }
        self.latency_nanos.load(Ordering::Acquire) as f64 / count as f64 / 1_000.0
    }

    /// Aggregate the counters into an immutable report.
    pub fn snapshot(&self) -> EngineMetrics {
        let commodities = Commodity::ALL
            .iter()
            .map(|&commodity| {
                let counters = self.counters(commodity);
                let complete = counters.complete_fills.load(Ordering::Acquire);
                let partial = counters.partial_fills.load(Ordering::Acquire);
                let trades = counters.trades_executed.load(Ordering::Acquire);

                let total_fills = complete + partial;
                let fill_rate = if total_fills > 0 {
                    complete as f64 / total_fills as f64 * 100.0
                } else {
                    0.0
                };

                let avg_slippage = if trades > 0 {
                    counters.slippage_micros.load(Ordering::Acquire) as f64
                        / 1_000_000.0
                        / trades as f64
                } else {
                    0.0
                };

                CommodityMetrics {
                    commodity: commodity.symbol(),
                    orders_received: counters.orders_received.load(Ordering::Acquire),
                    trades_executed: trades,
                    complete_fills: complete,
                    partial_fills: partial,
                    orders_added: counters.orders_added.load(Ordering::Acquire),
                    fill_rate,
                    avg_slippage,
                }
            })
            .collect();

        EngineMetrics {
            total_orders: self.total_orders.load(Ordering::Acquire),
            total_trades: self.total_trades.load(Ordering::Acquire),
            avg_latency_micros: self.avg_latency_micros(),
            commodities,
        }
    }
}

impl Default for CounterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink for CounterMetrics {
    fn record_order_received(&self, commodity: Commodity) {
        self.counters(commodity)
            .orders_received
            .fetch_add(1, Ordering::AcqRel);
        self.total_orders.fetch_add(1, Ordering::AcqRel);
    }

    fn record_order_added(&self, commodity: Commodity) {
        self.counters(commodity)
            .orders_added
            .fetch_add(1, Ordering::AcqRel);
    }

    fn record_complete_fill(&self, commodity: Commodity) {
        self.counters(commodity)
            .complete_fills
            .fetch_add(1, Ordering::AcqRel);
    }

    fn record_partial_fill(&self, commodity: Commodity) {
        self.counters(commodity)
            .partial_fills
            .fetch_add(1, Ordering::AcqRel);
    }

    fn record_trade(&self, trade: &Trade, slippage: Decimal) {
        let counters = self.counters(trade.commodity);
        counters.trades_executed.fetch_add(1, Ordering::AcqRel);
        counters
            .slippage_micros
            .fetch_add(decimal_to_micros(slippage), Ordering::AcqRel);
        self.total_trades.fetch_add(1, Ordering::AcqRel);
    }

    fn record_processing_time(&self, elapsed: Duration) {
        self.latency_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::AcqRel);
        self.latency_count.fetch_add(1, Ordering::AcqRel);
    }
}

fn decimal_to_micros(value: Decimal) -> u64 {
    (value * Decimal::from(1_000_000)).to_u64().unwrap_or(0)
}

// ============================================================================
// Metric Snapshots
// ============================================================================

/// Per-commodity counter snapshot.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CommodityMetrics {
    pub commodity: &'static str,
    pub orders_received: u64,
    pub trades_executed: u64,
    pub complete_fills: u64,
    pub partial_fills: u64,
    pub orders_added: u64,
    /// Complete fills as a percentage of all fills.
    pub fill_rate: f64,
    /// Average slippage per trade, in price units.
    pub avg_slippage: f64,
}

/// Engine-wide counter snapshot.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EngineMetrics {
    pub total_orders: u64,
    pub total_trades: u64,
    pub avg_latency_micros: f64,
    pub commodities: Vec<CommodityMetrics>,
}
