//! Concurrent pricing and redemption against a shared discount book.

use std::{sync::Barrier, thread};

use rust_decimal::Decimal;
use rusty_money::{Money, iso::GBP};
use slotmap::SlotMap;
use testresult::TestResult;

use pricewise::{
    cart::{Cart, CartOwner, CheckoutError, checkout},
    categories::{Category, CategoryTree},
    clock::{Clock, FixedClock},
    config::EngineConfig,
    discounts::{DiscountBook, DiscountKind, DiscountRule, DiscountTarget, UsageLedger},
    pricing::PricingEngine,
    products::{Product, ProductKey},
};

const THREADS: usize = 8;

fn clock() -> Result<FixedClock, jiff::Error> {
    Ok(FixedClock::new("2026-06-15T09:30:00Z".parse()?))
}

#[test]
fn exactly_one_racer_redeems_the_last_use() -> TestResult {
    let mut book = DiscountBook::new();
    let last = book.insert(
        DiscountRule::new(
            "Last One",
            DiscountKind::Limited,
            Decimal::from(50),
            DiscountTarget::Product(ProductKey::default()),
        )
        .with_usage_limit(3)
        .with_usage_count(2),
    );

    let now = clock()?.now();
    let barrier = Barrier::new(THREADS);

    let wins = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    book.redeem(last, now).is_ok()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or(false))
            .filter(|won| *won)
            .count()
    });

    assert_eq!(wins, 1);
    assert_eq!(book.get(last).map(|rule| rule.usage_count), Some(3));

    Ok(())
}

#[test]
fn concurrent_checkouts_share_a_capped_rule() -> TestResult {
    let tree = CategoryTree::new();
    let config = EngineConfig::default();
    let mut products = SlotMap::with_key();
    let lamp = products.insert_with_key(|key| {
        Product::new(key, "Desk Lamp", Money::from_minor(6_000, GBP))
    });

    let mut book = DiscountBook::new();
    let flash = book.insert(
        DiscountRule::new(
            "Flash Sale",
            DiscountKind::Product,
            Decimal::from(25),
            DiscountTarget::Product(lamp),
        )
        .with_usage_limit(2),
    );

    let engine = PricingEngine::with_clock(&book, &tree, &config, clock()?);
    let product = products.get(lamp).ok_or("missing lamp")?;

    // Every cart priced the lamp while two uses were left.
    let mut carts = Vec::with_capacity(THREADS);

    for _ in 0..THREADS {
        let mut cart = Cart::new(CartOwner::guest(), GBP, engine.now());

        cart.add_item(&engine, product, 1)?;
        carts.push(cart);
    }

    let barrier = Barrier::new(THREADS);

    let outcomes: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = carts
            .iter_mut()
            .map(|cart| {
                let engine = &engine;
                let book = &book;
                let barrier = &barrier;

                scope.spawn(move || {
                    barrier.wait();
                    checkout(engine, book, cart).map(|order| order.totals.final_total)
                })
            })
            .collect();

        handles
            .into_iter()
            .filter_map(|handle| handle.join().ok())
            .collect()
    });

    let completed = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    let rejected = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Err(CheckoutError::DiscountUnavailable { .. })))
        .count();

    assert_eq!(completed, 2);
    assert_eq!(rejected, THREADS - 2);
    assert_eq!(book.get(flash).map(|rule| rule.usage_count), Some(2));
    assert_eq!(
        carts.iter().filter(|cart| cart.completion().is_some()).count(),
        2
    );

    Ok(())
}

#[test]
fn readers_price_concurrently_with_a_shared_category_cache() -> TestResult {
    let mut tree = CategoryTree::new();
    let audio = tree.insert(
        Category::new("Audio", "audio").with_discount(Decimal::from(15)),
        None,
    )?;
    let headphones = tree.insert(
        Category::new("Headphones", "headphones").with_discount(Decimal::from(5)),
        Some(audio),
    )?;

    let mut keys = SlotMap::<ProductKey, ()>::with_key();
    let product = Product::new(keys.insert(()), "Earbuds", Money::from_minor(10_000, GBP))
        .in_categories([headphones]);

    let book = DiscountBook::new();
    let config = EngineConfig::default();
    let engine = PricingEngine::with_clock(&book, &tree, &config, clock()?);

    let prices: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| scope.spawn(|| engine.price_entity(&product, 1, None)))
            .collect();

        handles
            .into_iter()
            .filter_map(|handle| handle.join().ok())
            .collect::<Result<Vec<_>, _>>()
    })?;

    assert_eq!(prices.len(), THREADS);

    // 15% and 5% compound to 19.25%, reported as 19
    assert!(
        prices
            .iter()
            .all(|result| result.final_price == Money::from_minor(8_100, GBP)),
        "every reader sees the same price"
    );

    Ok(())
}
