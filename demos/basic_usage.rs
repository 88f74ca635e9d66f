// ============================================================================
// Basic Usage Example
// ============================================================================

use commodity_matching_engine::prelude::*;
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Reference price per commodity, in declaration order.
const BASE_PRICES: [i64; Commodity::COUNT] = [75, 2000, 25, 4, 3];

fn main() {
    println!("=== Commodity Matching Engine Example ===\n");

    let metrics = Arc::new(CounterMetrics::new());
    let mut engine = MatchingEngine::new(Arc::clone(&metrics) as Arc<dyn MetricsSink>);
    let orders = OrderFactory::new();

    engine.add_trade_listener(|trade: &Trade| {
        println!(
            "  Trade #{}: {} {} @ {} (buy #{} / sell #{})",
            trade.id,
            trade.quantity,
            trade.commodity,
            trade.price,
            trade.buy_order_id,
            trade.sell_order_id,
        );
    });

    // Seed the gold book with resting orders on both sides
    println!("Seeding the GOLD book...");
    for i in 0i64..5 {
        engine
            .submit_order(orders.limit_order(
                Commodity::Gold,
                Side::Sell,
                Decimal::from(2000 + i * 5),
                100,
            ))
            .unwrap();
        engine
            .submit_order(orders.limit_order(
                Commodity::Gold,
                Side::Buy,
                Decimal::from(1995 - i * 5),
                100,
            ))
            .unwrap();
    }

    // A crossing limit buy takes out the two cheapest asks
    println!("\nSubmitting a crossing limit buy...");
    engine
        .submit_order(orders.limit_order(Commodity::Gold, Side::Buy, Decimal::from(2005), 150))
        .unwrap();

    // A market sell sweeps the bid side
    println!("\nSubmitting a market sell...");
    engine
        .submit_order(orders.market_order(Commodity::Gold, Side::Sell, 120))
        .unwrap();

    // Random flow across every commodity, in the shape of a load generator
    println!("\nSubmitting random flow across all commodities...");
    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        let commodity = Commodity::ALL[rng.gen_range(0..Commodity::COUNT)];
        let side = if rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        };
        let quantity = (rng.gen_range(1..=20)) * 100;

        let order = if rng.gen_bool(0.9) {
            let base = BASE_PRICES[Commodity::ALL
                .iter()
                .position(|&c| c == commodity)
                .unwrap()];
            // price within a couple of percent of the reference, in cents
            let cents = base * 100 + rng.gen_range(-base * 2..=base * 2);
            orders.limit_order(commodity, side, Decimal::new(cents, 2), quantity)
        } else {
            orders.market_order(commodity, side, quantity)
        };

        engine.submit_order(order).unwrap();
    }

    // Drain everything, then report
    engine.shutdown();

    println!("\n=== Final Books ===");
    for commodity in Commodity::ALL {
        let book = engine.order_book(commodity);
        println!(
            "{:<8} best bid: {:<12} best ask: {:<12} ({} bids / {} asks)",
            commodity.symbol(),
            book.best_bid()
                .and_then(|o| o.price)
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            book.best_ask()
                .and_then(|o| o.price)
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-".to_string()),
            book.buy_order_count(),
            book.sell_order_count(),
        );
    }

    println!("\n=== Metrics ===");
    let snapshot = metrics.snapshot();
    println!("Total orders: {}", snapshot.total_orders);
    println!("Total trades: {}", snapshot.total_trades);
    println!("Avg latency:  {:.1} us", snapshot.avg_latency_micros);
    for c in &snapshot.commodities {
        println!(
            "{:<8} received: {:<5} trades: {:<5} fill rate: {:>5.1}%  avg slippage: {:.4}",
            c.commodity, c.orders_received, c.trades_executed, c.fill_rate, c.avg_slippage,
        );
    }
}
