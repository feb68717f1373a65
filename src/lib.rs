//! Pricewise
//!
//! Pricewise resolves which discounts apply to a product or a cart in a storefront, combines them
//! into a single price, and carries carts through to a completed order.
//!
//! Rules are read through a [`discounts::DiscountRepository`], turned into candidates by the
//! [`sources::DiscountSource`] resolvers, and combined by [`pricing::best_combination`]. Carts
//! freeze each item's price when it is added; [`cart::checkout`] redeems the rules a cart used.

pub mod cart;
pub mod categories;
pub mod clock;
pub mod config;
pub mod customers;
pub mod discounts;
pub mod fixtures;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod sources;
pub mod utils;
