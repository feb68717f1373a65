//! Product Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Map of product key -> product fixture
    pub products: FxHashMap<String, ProductFixture>,
}

/// Product fixture from YAML
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductFixture {
    /// Product name
    pub name: String,

    /// Price (e.g., "2.99 GBP")
    pub price: String,

    /// Keys of the categories the product is filed under
    #[serde(default)]
    pub categories: Vec<String>,
}
