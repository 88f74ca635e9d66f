// ============================================================================
// Matching Algorithms
// Limit and market order matching with price-time priority
// ============================================================================

use super::matching_engine::EngineCore;
use crate::domain::{Order, OrderBook, OrderType, Side, Trade};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;

/// Depth bound for the counter-side candidate pool of one matching pass.
pub(crate) const MATCH_DEPTH: usize = 100;

impl EngineCore {
    /// Apply one dequeued order.
    ///
    /// Runs on the consumer thread, the engine's single point of book
    /// mutation. Order listeners are notified before any matching occurs.
    pub(crate) fn process(&self, order: Order, enqueued_at: Instant) {
        let order = Arc::new(order);

        self.metrics.record_order_received(order.commodity);
        self.order_listeners.notify(&order);

        let book = self.order_book(order.commodity);
        match order.order_type {
            OrderType::Market => self.match_market_order(&order, book, enqueued_at),
            OrderType::Limit => self.match_limit_order(&order, book, enqueued_at),
        }

        let elapsed = enqueued_at.elapsed();
        self.metrics.record_processing_time(elapsed);

        tracing::debug!(
            order_id = %order.id,
            elapsed_nanos = elapsed.as_nanos() as u64,
            "order processed"
        );
    }

    /// Sweep the opposite side from best price to worst.
    ///
    /// The candidate pool is a rank-ordered snapshot of the counter side
    /// taken once at the start of the pass, so the scan never observes
    /// mid-pass mutation. Whatever cannot be filled from that pool is
    /// dropped; a market order never rests on the book.
    fn match_market_order(&self, order: &Arc<Order>, book: &OrderBook, enqueued_at: Instant) {
        let pool = match order.side {
            Side::Buy => book.sell_orders(MATCH_DEPTH),
            Side::Sell => book.buy_orders(MATCH_DEPTH),
        };

        for counter in pool {
            if order.is_filled() {
                break;
            }
            if counter.is_filled() {
                continue;
            }
            let Some(counter_price) = counter.price else {
                continue; // the book rests limit orders only
            };

            self.execute_trade(order, &counter, counter_price, book, enqueued_at);
        }

        if order.is_filled() {
            self.metrics.record_complete_fill(order.commodity);
        } else {
            // the unmatched remainder is discarded, not preserved
            self.metrics.record_partial_fill(order.commodity);
        }
    }

    /// Consume the opposite side while prices cross, then rest any
    /// remainder on the order's own side of the book.
    fn match_limit_order(&self, order: &Arc<Order>, book: &OrderBook, enqueued_at: Instant) {
        let Some(limit) = order.price else {
            // admission guarantees a limit price
            return;
        };

        let pool = match order.side {
            Side::Buy => book.sell_orders(MATCH_DEPTH),
            Side::Sell => book.buy_orders(MATCH_DEPTH),
        };

        let mut matched = false;
        for counter in pool {
            if order.is_filled() {
                break;
            }
            if counter.is_filled() {
                continue;
            }
            let Some(counter_price) = counter.price else {
                continue;
            };

            let crosses = match order.side {
                Side::Buy => limit >= counter_price,
                Side::Sell => limit <= counter_price,
            };
            if !crosses {
                // the pool is rank-ordered, nothing further can cross
                break;
            }

            self.execute_trade(order, &counter, counter_price, book, enqueued_at);
            matched = true;
        }

        if order.is_filled() {
            self.metrics.record_complete_fill(order.commodity);
        } else {
            book.add_order(Arc::clone(order));
            if matched {
                self.metrics.record_partial_fill(order.commodity);
            } else {
                self.metrics.record_order_added(order.commodity);
            }
        }
    }

    /// Execute one fill between the aggressor and a resting counter order,
    /// always at the resting order's price.
    fn execute_trade(
        &self,
        aggressor: &Arc<Order>,
        passive: &Arc<Order>,
        trade_price: Decimal,
        book: &OrderBook,
        enqueued_at: Instant,
    ) {
        let quantity = aggressor
            .remaining_quantity()
            .min(passive.remaining_quantity());
        if quantity == 0 {
            return;
        }

        if !(passive.try_fill(quantity) && aggressor.try_fill(quantity)) {
            // callers pre-check remaining quantity, so this cannot fire on
            // the single mutating thread
            return;
        }

        if passive.is_filled() {
            // evict immediately so no later step can match it again
            book.remove_order(passive.id);
        }

        let (buy_order_id, sell_order_id) = match aggressor.side {
            Side::Buy => (aggressor.id, passive.id),
            Side::Sell => (passive.id, aggressor.id),
        };

        let trade = Trade::new(
            self.next_trade_id(),
            buy_order_id,
            sell_order_id,
            aggressor.commodity,
            trade_price,
            quantity,
            enqueued_at.elapsed(),
        );

        // limit orders: distance from the intended price; a market order has
        // no intended price, so the realized price stands in
        let slippage = match aggressor.price {
            Some(intended) => (intended - trade_price).abs(),
            None => trade_price,
        };

        self.metrics.record_trade(&trade, slippage);
        self.trade_listeners.notify(&trade);

        tracing::debug!(
            trade_id = %trade.id,
            commodity = %trade.commodity,
            price = %trade_price,
            quantity,
            %slippage,
            "trade executed"
        );
    }
}
