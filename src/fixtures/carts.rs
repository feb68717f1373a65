//! Cart Fixtures

use serde::Deserialize;

/// Wrapper for a cart in YAML
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CartFixture {
    /// Key of the customer who owns the cart, absent for a guest cart
    #[serde(default)]
    pub customer: Option<String>,

    /// Lines in the cart
    pub items: Vec<CartLineFixture>,
}

/// Cart line fixture from YAML
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CartLineFixture {
    /// Product key
    pub product: String,

    /// Quantity
    #[serde(default = "one")]
    pub quantity: u32,
}

fn one() -> u32 {
    1
}
