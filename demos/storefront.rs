//! Storefront Example
//!
//! This example prices the fixture cart against the fixture discounts and prints a receipt.
//!
//! Use `-f` to load a fixture set by name
//! Use `-c` to price for a customer from the fixture set instead of a guest
//! Use `--config` to point at an engine configuration file
//! Use `--checkout` to complete the order and redeem the applied discounts
//!
//! Run with: `cargo run --example storefront -- -c alice --checkout`

use std::{io, time::Instant};

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pricewise::{
    cart::checkout,
    config::EngineConfig,
    fixtures::Fixture,
    pricing::PricingEngine,
    receipt::Receipt,
    utils::ExampleStorefrontArgs,
};

/// Storefront Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = ExampleStorefrontArgs::parse();

    let config = EngineConfig::load(&args.config)?;
    let fixture = Fixture::from_set(&args.fixture)?;

    let customer = args
        .customer
        .as_deref()
        .map(|customer| fixture.customer_key(customer))
        .transpose()?;

    let engine = PricingEngine::new(fixture.discounts(), fixture.categories(), &config);

    let start = Instant::now();

    let mut cart = fixture.cart(&engine, customer)?;

    let receipt = if args.checkout {
        let order = checkout(&engine, fixture.discounts(), &mut cart)?;

        for redemption in &order.redemptions {
            println!(
                "Redeemed {:?} ({}), saved {}, used {} times",
                redemption.discount, redemption.kind, redemption.amount_saved, redemption.usage_count
            );
        }

        Receipt::from_order(cart.items(), &order)
    } else {
        let totals = engine.price_cart(cart.items(), cart.customer(), cart.currency())?;

        Receipt::new(cart.items(), totals)
    };

    let elapsed = start.elapsed().as_secs_f32();

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    receipt.write_to(&mut handle, fixture.product_meta_map())?;

    println!("\nPriced in {elapsed}s");

    Ok(())
}
