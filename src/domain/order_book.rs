// ============================================================================
// Order Book Domain Model
// ============================================================================

use crossbeam_skiplist::SkipMap;
use parking_lot::RwLock;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use super::{Commodity, Order, OrderId, Side};

/// Ranking key for one side of the book.
///
/// Lexicographic order over `(price_key, sequence)` yields price-time
/// priority: `price_key` is the limit price in micro-units, negated on the
/// bid side so that ascending key order walks better prices first, and
/// `sequence` breaks price ties in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct RankKey {
    price_key: i64,
    sequence: u64,
}

impl RankKey {
    fn for_order(order: &Order) -> Self {
        // only limit orders rest on the book, so a price is always present
        let price = order.price.unwrap_or(Decimal::ZERO);
        let micros = price_to_micros(price);

        Self {
            price_key: match order.side {
                Side::Buy => -micros,
                Side::Sell => micros,
            },
            sequence: order.sequence,
        }
    }
}

fn price_to_micros(price: Decimal) -> i64 {
    (price * Decimal::from(1_000_000)).to_i64().unwrap_or(0)
}

struct IndexEntry {
    side: Side,
    key: RankKey,
}

/// Per-commodity order book with price-time-ranked bid and ask sides.
///
/// The sides are lock-free skip maps, so snapshot queries (best price, depth,
/// counts) may run on any thread while the single matching thread mutates the
/// book. Readers may observe a state slightly behind the writer but never a
/// torn ranking. Orders that are filled but not yet evicted are skipped by
/// every query.
pub struct OrderBook {
    commodity: Commodity,
    bids: SkipMap<RankKey, Arc<Order>>,
    asks: SkipMap<RankKey, Arc<Order>>,
    index: RwLock<HashMap<OrderId, IndexEntry>>,
}

impl OrderBook {
    pub fn new(commodity: Commodity) -> Self {
        Self {
            commodity,
            bids: SkipMap::new(),
            asks: SkipMap::new(),
            index: RwLock::new(HashMap::new()),
        }
    }

    pub fn commodity(&self) -> Commodity {
        self.commodity
    }

    /// Rest an order on its side and index it for O(1) removal.
    ///
    /// No validation beyond side dispatch: callers only rest orders with
    /// remaining quantity.
    pub fn add_order(&self, order: Arc<Order>) {
        let key = RankKey::for_order(&order);
        let entry = IndexEntry {
            side: order.side,
            key,
        };

        self.side(order.side).insert(key, Arc::clone(&order));
        self.index.write().insert(order.id, entry);
    }

    /// Remove an order from its side and the index.
    ///
    /// Removing an id that is not present is a no-op, so a second removal of
    /// the same order has no further effect.
    pub fn remove_order(&self, order_id: OrderId) {
        let Some(entry) = self.index.write().remove(&order_id) else {
            return;
        };
        self.side(entry.side).remove(&entry.key);
    }

    /// Highest-ranked bid that still has quantity.
    pub fn best_bid(&self) -> Option<Arc<Order>> {
        Self::first_open(&self.bids)
    }

    /// Highest-ranked ask that still has quantity.
    pub fn best_ask(&self) -> Option<Arc<Order>> {
        Self::first_open(&self.asks)
    }

    /// Up to `limit` open bids in rank order: price descending, arrival
    /// sequence ascending within a price.
    pub fn buy_orders(&self, limit: usize) -> Vec<Arc<Order>> {
        Self::ranked(&self.bids, limit)
    }

    /// Up to `limit` open asks in rank order: price ascending, arrival
    /// sequence ascending within a price.
    pub fn sell_orders(&self, limit: usize) -> Vec<Arc<Order>> {
        Self::ranked(&self.asks, limit)
    }

    /// Count of resting, unfilled bids.
    pub fn buy_order_count(&self) -> usize {
        Self::open_count(&self.bids)
    }

    /// Count of resting, unfilled asks.
    pub fn sell_order_count(&self) -> usize {
        Self::open_count(&self.asks)
    }

    fn side(&self, side: Side) -> &SkipMap<RankKey, Arc<Order>> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn first_open(side: &SkipMap<RankKey, Arc<Order>>) -> Option<Arc<Order>> {
        side.iter()
            .map(|entry| Arc::clone(entry.value()))
            .find(|order| !order.is_filled())
    }

    fn ranked(side: &SkipMap<RankKey, Arc<Order>>, limit: usize) -> Vec<Arc<Order>> {
        side.iter()
            .map(|entry| Arc::clone(entry.value()))
            .filter(|order| !order.is_filled())
            .take(limit)
            .collect()
    }

    fn open_count(side: &SkipMap<RankKey, Arc<Order>>) -> usize {
        side.iter().filter(|entry| !entry.value().is_filled()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderFactory;

    fn book() -> OrderBook {
        OrderBook::new(Commodity::Gold)
    }

    #[test]
    fn test_add_buy_order() {
        let book = book();
        let factory = OrderFactory::new();
        let order = Arc::new(factory.limit_order(
            Commodity::Gold,
            Side::Buy,
            Decimal::from(1800),
            10,
        ));

        book.add_order(Arc::clone(&order));

        assert_eq!(book.buy_order_count(), 1);
        assert_eq!(book.best_bid().unwrap().id, order.id);
    }

    #[test]
    fn test_add_sell_order() {
        let book = book();
        let factory = OrderFactory::new();
        let order = Arc::new(factory.limit_order(
            Commodity::Gold,
            Side::Sell,
            Decimal::from(1800),
            10,
        ));

        book.add_order(Arc::clone(&order));

        assert_eq!(book.sell_order_count(), 1);
        assert_eq!(book.best_ask().unwrap().id, order.id);
    }

    #[test]
    fn test_bid_side_price_priority() {
        let book = book();
        let factory = OrderFactory::new();

        for price in [1800, 1805, 1795] {
            book.add_order(Arc::new(factory.limit_order(
                Commodity::Gold,
                Side::Buy,
                Decimal::from(price),
                10,
            )));
        }

        assert_eq!(book.best_bid().unwrap().price, Some(Decimal::from(1805)));

        let ranked = book.buy_orders(10);
        let prices: Vec<Decimal> = ranked.iter().filter_map(|o| o.price).collect();
        assert_eq!(
            prices,
            vec![Decimal::from(1805), Decimal::from(1800), Decimal::from(1795)]
        );
    }

    #[test]
    fn test_ask_side_price_priority() {
        let book = book();
        let factory = OrderFactory::new();

        for price in [1800, 1795, 1805] {
            book.add_order(Arc::new(factory.limit_order(
                Commodity::Gold,
                Side::Sell,
                Decimal::from(price),
                10,
            )));
        }

        assert_eq!(book.best_ask().unwrap().price, Some(Decimal::from(1795)));
    }

    #[test]
    fn test_equal_prices_rank_by_arrival() {
        let book = book();
        let factory = OrderFactory::new();

        let first = Arc::new(factory.limit_order(
            Commodity::Gold,
            Side::Sell,
            Decimal::from(1800),
            10,
        ));
        let second = Arc::new(factory.limit_order(
            Commodity::Gold,
            Side::Sell,
            Decimal::from(1800),
            10,
        ));

        // insert newest first; arrival sequence must still win the tie
        book.add_order(Arc::clone(&second));
        book.add_order(Arc::clone(&first));

        let ranked = book.sell_orders(10);
        assert_eq!(ranked[0].id, first.id);
        assert_eq!(ranked[1].id, second.id);
    }

    #[test]
    fn test_remove_order_is_idempotent() {
        let book = book();
        let factory = OrderFactory::new();
        let order = Arc::new(factory.limit_order(
            Commodity::Gold,
            Side::Buy,
            Decimal::from(1800),
            10,
        ));

        book.add_order(Arc::clone(&order));
        assert_eq!(book.buy_order_count(), 1);

        book.remove_order(order.id);
        assert_eq!(book.buy_order_count(), 0);

        // second removal is a no-op
        book.remove_order(order.id);
        assert_eq!(book.buy_order_count(), 0);
        assert!(book.best_bid().is_none());
    }

    #[test]
    fn test_depth_query_respects_limit() {
        let book = book();
        let factory = OrderFactory::new();

        for i in 0..10 {
            book.add_order(Arc::new(factory.limit_order(
                Commodity::Gold,
                Side::Buy,
                Decimal::from(1800 + i),
                10,
            )));
        }

        assert_eq!(book.buy_orders(5).len(), 5);
        assert_eq!(book.buy_order_count(), 10);
    }

    #[test]
    fn test_filled_orders_invisible_to_queries() {
        let book = book();
        let factory = OrderFactory::new();

        let filled = Arc::new(factory.limit_order(
            Commodity::Gold,
            Side::Buy,
            Decimal::from(1805),
            10,
        ));
        let open = Arc::new(factory.limit_order(
            Commodity::Gold,
            Side::Buy,
            Decimal::from(1800),
            10,
        ));

        book.add_order(Arc::clone(&filled));
        book.add_order(Arc::clone(&open));

        // fill the better-ranked order without evicting it yet
        assert!(filled.try_fill(10));

        assert_eq!(book.best_bid().unwrap().id, open.id);
        assert_eq!(book.buy_order_count(), 1);

        let ranked = book.buy_orders(10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, open.id);
    }

    #[test]
    fn test_fractional_prices_rank_correctly() {
        let book = OrderBook::new(Commodity::Copper);
        let factory = OrderFactory::new();

        let cheap = Arc::new(factory.limit_order(
            Commodity::Copper,
            Side::Sell,
            Decimal::new(405, 2), // 4.05
            10,
        ));
        let cheaper = Arc::new(factory.limit_order(
            Commodity::Copper,
            Side::Sell,
            Decimal::new(404, 2), // 4.04
            10,
        ));

        book.add_order(Arc::clone(&cheap));
        book.add_order(Arc::clone(&cheaper));

        assert_eq!(book.best_ask().unwrap().id, cheaper.id);
    }
}
