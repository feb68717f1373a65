//! Products

use rusty_money::{Money, iso::Currency};
use slotmap::new_key_type;
use smallvec::SmallVec;

use crate::categories::CategoryKey;

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Read-only product snapshot handed to the engine by the catalogue layer.
#[derive(Debug, Clone)]
pub struct Product<'a> {
    /// Product key
    pub key: ProductKey,

    /// Product name
    pub name: String,

    /// List price before any discount
    pub price: Money<'a, Currency>,

    /// Categories the product is filed under
    pub categories: SmallVec<[CategoryKey; 4]>,
}

impl<'a> Product<'a> {
    /// Create a product snapshot that is not filed under any category.
    pub fn new(key: ProductKey, name: impl Into<String>, price: Money<'a, Currency>) -> Self {
        Self {
            key,
            name: name.into(),
            price,
            categories: SmallVec::new(),
        }
    }

    /// File the product under the given categories.
    #[must_use]
    pub fn in_categories(mut self, categories: impl IntoIterator<Item = CategoryKey>) -> Self {
        self.categories.extend(categories);
        self
    }
}
