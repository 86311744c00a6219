//! Admission throughput over a randomized order stream.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use matching_engine::{NoopOrderRepository, OrderBook, TradeBook};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::sync::Arc;
use types::ids::{CustomerId, OrderId};
use types::numeric::Price;
use types::order::{Order, OrderParams, OrderType, Side};

const INSTRUMENT: &str = "BENCH";

fn random_order(rng: &mut StdRng, id: u64) -> Order {
    let is_market = rng.gen_ratio(1, 20);
    let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
    let qty: i64 = rng.gen_range(10..200);

    let (order_type, price) = if is_market {
        (OrderType::Market, Price::ZERO)
    } else {
        // two-decimal prices around the 20.25 seed
        let ticks = 2025 + rng.gen_range(-100..100);
        (OrderType::Limit, Price::new(Decimal::new(ticks, 2)))
    };

    Order::new(
        OrderId::new(id),
        INSTRUMENT,
        CustomerId::nil(),
        order_type,
        OrderParams::NONE,
        qty,
        price,
        Price::ZERO,
        side,
        id as i64,
    )
}

fn bench_add(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);

    c.bench_function("order_book_add_1k", |b| {
        b.iter_batched(
            || {
                let trade_book = Arc::new(TradeBook::new(INSTRUMENT));
                let book = OrderBook::new(
                    INSTRUMENT,
                    Price::new(Decimal::new(2025, 2)),
                    trade_book,
                    Arc::new(NoopOrderRepository),
                );
                let orders: Vec<Order> = (1..=1000).map(|id| random_order(&mut rng, id)).collect();
                (book, orders)
            },
            |(book, orders)| {
                for order in orders {
                    let _ = book.add(order);
                }
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_add);
criterion_main!(benches);
