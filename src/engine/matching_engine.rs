// ============================================================================
// Matching Engine
// Single-writer event loop draining a bounded multi-producer queue
// ============================================================================

use crate::domain::{Commodity, Order, OrderBook, OrderType, Trade, TradeId};
use crate::engine::errors::{EngineError, EngineResult};
use crate::interfaces::{ListenerRegistry, MetricsSink};
use crossbeam::channel::{bounded, Receiver, Sender};
use rust_decimal::Decimal;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

/// Capacity of the submission queue. Producers block when it is full.
const QUEUE_CAPACITY: usize = 64 * 1024;

/// State shared between the submission facade and the consumer thread.
pub(crate) struct EngineCore {
    books: [Arc<OrderBook>; Commodity::COUNT],
    trade_ids: AtomicU64,
    pub(crate) metrics: Arc<dyn MetricsSink>,
    pub(crate) trade_listeners: ListenerRegistry<Trade>,
    pub(crate) order_listeners: ListenerRegistry<Order>,
}

impl EngineCore {
    pub(crate) fn new(metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            books: Commodity::ALL.map(|commodity| Arc::new(OrderBook::new(commodity))),
            trade_ids: AtomicU64::new(1),
            metrics,
            trade_listeners: ListenerRegistry::new("trade"),
            order_listeners: ListenerRegistry::new("order"),
        }
    }

    pub(crate) fn order_book(&self, commodity: Commodity) -> &Arc<OrderBook> {
        &self.books[commodity.index()]
    }

    pub(crate) fn next_trade_id(&self) -> TradeId {
        TradeId::new(self.trade_ids.fetch_add(1, Ordering::AcqRel))
    }
}

enum Command {
    Submit { order: Order, enqueued_at: Instant },
    Shutdown,
}

/// Multi-producer, single-consumer matching engine.
///
/// `submit_order` may be called from any number of threads; one dedicated
/// consumer thread drains the queue and performs every book mutation, so the
/// matching path itself needs no locks. Orders are processed in exactly the
/// order they were enqueued, on one global FIFO lane shared by all
/// commodities.
pub struct MatchingEngine {
    core: Arc<EngineCore>,
    submissions: Sender<Command>,
    consumer: Option<JoinHandle<()>>,
}

impl MatchingEngine {
    /// Start an engine with one order book per commodity and a running
    /// consumer thread.
    pub fn new(metrics: Arc<dyn MetricsSink>) -> Self {
        let core = Arc::new(EngineCore::new(metrics));
        let (submissions, queue) = bounded(QUEUE_CAPACITY);
        let consumer = Self::spawn_consumer(Arc::clone(&core), queue);

        tracing::info!(
            commodities = Commodity::COUNT,
            queue_capacity = QUEUE_CAPACITY,
            "matching engine started"
        );

        Self {
            core,
            submissions,
            consumer: Some(consumer),
        }
    }

    fn spawn_consumer(core: Arc<EngineCore>, queue: Receiver<Command>) -> JoinHandle<()> {
        std::thread::Builder::new()
            .name("matching-engine".to_string())
            .spawn(move || {
                while let Ok(command) = queue.recv() {
                    match command {
                        Command::Submit { order, enqueued_at } => {
                            let order_id = order.id;
                            let step =
                                catch_unwind(AssertUnwindSafe(|| core.process(order, enqueued_at)));
                            if step.is_err() {
                                // one bad order must not halt the engine
                                tracing::error!(%order_id, "order processing panicked, continuing");
                            }
                        }
                        Command::Shutdown => break,
                    }
                }
            })
            .expect("failed to spawn matching-engine consumer thread")
    }

    /// Validate and enqueue an order for asynchronous matching.
    ///
    /// Returns once the order sits in the submission queue. If the queue is
    /// full the call blocks until space frees up; orders are never dropped or
    /// reordered under load.
    pub fn submit_order(&self, order: Order) -> EngineResult<()> {
        Self::validate_order(&order)?;

        tracing::debug!(
            order_id = %order.id,
            commodity = %order.commodity,
            side = ?order.side,
            price = ?order.price,
            quantity = order.quantity,
            "order submitted"
        );

        self.submissions
            .send(Command::Submit {
                order,
                enqueued_at: Instant::now(),
            })
            .map_err(|_| EngineError::Unavailable)
    }

    fn validate_order(order: &Order) -> EngineResult<()> {
        if order.quantity == 0 {
            return Err(EngineError::InvalidOrder(
                "quantity must be positive".to_string(),
            ));
        }

        match order.order_type {
            OrderType::Limit => match order.price {
                None => Err(EngineError::InvalidOrder(
                    "limit orders must have a price".to_string(),
                )),
                Some(price) if price <= Decimal::ZERO => Err(EngineError::InvalidOrder(
                    "price must be positive".to_string(),
                )),
                Some(_) => Ok(()),
            },
            OrderType::Market => Ok(()),
        }
    }

    /// Live book for a commodity.
    ///
    /// Book queries race with the consumer by design and may observe a state
    /// slightly behind the writer.
    pub fn order_book(&self, commodity: Commodity) -> Arc<OrderBook> {
        Arc::clone(self.core.order_book(commodity))
    }

    /// Register an observer invoked for every executed trade, in execution
    /// order. Runs on the consumer thread; panics are caught and logged
    /// per invocation.
    pub fn add_trade_listener<F>(&self, listener: F)
    where
        F: Fn(&Trade) + Send + Sync + 'static,
    {
        self.core.trade_listeners.register(listener);
    }

    /// Register an observer invoked for every accepted order before it is
    /// matched. Same execution contract as trade listeners.
    pub fn add_order_listener<F>(&self, listener: F)
    where
        F: Fn(&Order) + Send + Sync + 'static,
    {
        self.core.order_listeners.register(listener);
    }

    /// Stop the consumer after it drains everything already enqueued, and
    /// wait for it to exit.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.consumer.take() else {
            return;
        };

        let _ = self.submissions.send(Command::Shutdown);
        if handle.join().is_err() {
            tracing::error!("matching-engine consumer terminated by panic");
        } else {
            tracing::info!("matching engine shut down");
        }
    }
}

impl Drop for MatchingEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrderFactory, Side};
    use crate::interfaces::NoOpMetrics;

    fn engine() -> MatchingEngine {
        MatchingEngine::new(Arc::new(NoOpMetrics))
    }

    #[test]
    fn test_rejects_zero_quantity() {
        let engine = engine();
        let factory = OrderFactory::new();
        let order = factory.limit_order(Commodity::Gold, Side::Buy, Decimal::from(1800), 0);

        assert_eq!(
            engine.submit_order(order),
            Err(EngineError::InvalidOrder(
                "quantity must be positive".to_string()
            ))
        );
    }

    #[test]
    fn test_rejects_non_positive_limit_price() {
        let engine = engine();
        let factory = OrderFactory::new();
        let order = factory.limit_order(Commodity::Gold, Side::Buy, Decimal::from(-5), 10);

        assert!(matches!(
            engine.submit_order(order),
            Err(EngineError::InvalidOrder(_))
        ));
    }

    #[test]
    fn test_accepts_market_order_without_price() {
        let engine = engine();
        let factory = OrderFactory::new();
        let order = factory.market_order(Commodity::Gold, Side::Buy, 10);

        assert!(engine.submit_order(order).is_ok());
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let mut engine = engine();
        let factory = OrderFactory::new();

        engine.shutdown();

        let order = factory.limit_order(Commodity::Gold, Side::Buy, Decimal::from(1800), 10);
        assert_eq!(engine.submit_order(order), Err(EngineError::Unavailable));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut engine = engine();
        engine.shutdown();
        engine.shutdown();
    }

    #[test]
    fn test_shutdown_drains_pending_submissions() {
        let mut engine = engine();
        let factory = OrderFactory::new();

        for i in 0..100 {
            let order =
                factory.limit_order(Commodity::Copper, Side::Buy, Decimal::from(4 + i), 10);
            engine.submit_order(order).unwrap();
        }

        engine.shutdown();

        assert_eq!(engine.order_book(Commodity::Copper).buy_order_count(), 100);
    }
}
