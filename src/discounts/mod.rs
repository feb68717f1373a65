//! Discounts
//!
//! Discount rules as read from storage, the flat candidates the source resolvers derive from
//! them, and the percentage arithmetic shared by every stage of the engine.
//!
//! All percentages are expressed in percent points (`15` means 15%) and compound against the
//! remaining price rather than adding up: two discounts of 10% and 5% retain `0.9 * 0.95` of the
//! price, an effective 14.5%.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{categories::CategoryKey, customers::CustomerKey, products::ProductKey};

pub mod book;
pub mod candidate;
pub mod redemption;
pub mod repository;
pub mod rule;

pub use book::DiscountBook;
pub use candidate::{CandidateDiscount, CandidateSource};
pub use redemption::{Redemption, RedemptionError, UsageLedger};
pub use repository::{DiscountRepository, RepositoryError};
pub use rule::{DiscountKey, DiscountRule, StackingRules};

/// The "type" tag of a discount.
///
/// The set is open: unrecognised tags are kept verbatim in [`DiscountKind::Other`]. The tag only
/// drives stacking eligibility; no kind changes how a percentage is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiscountKind {
    /// Owned by a product
    Product,

    /// Owned by a category, or derived from the category hierarchy
    Category,

    /// Owned by a customer
    Customer,

    /// Quantity based
    Volume,

    /// Order value threshold, evaluated on the cart subtotal
    OrderValue,

    /// Time-window campaign
    Seasonal,

    /// Limited-run promotion
    Limited,

    /// First-order incentive
    NewCustomer,

    /// Customer-specific discount on the whole cart
    CustomerCart,

    /// Any other tag
    Other(String),
}

impl DiscountKind {
    /// Storage representation of the tag.
    pub fn as_str(&self) -> &str {
        match self {
            DiscountKind::Product => "product",
            DiscountKind::Category => "category",
            DiscountKind::Customer => "customer",
            DiscountKind::Volume => "volume",
            DiscountKind::OrderValue => "order_value",
            DiscountKind::Seasonal => "seasonal",
            DiscountKind::Limited => "limited",
            DiscountKind::NewCustomer => "new_customer",
            DiscountKind::CustomerCart => "customer_cart",
            DiscountKind::Other(other) => other,
        }
    }

    /// Whether this kind is evaluated against a cart subtotal rather than a single item.
    pub fn is_cart_level(&self) -> bool {
        matches!(self, DiscountKind::OrderValue | DiscountKind::CustomerCart)
    }
}

impl From<&str> for DiscountKind {
    fn from(value: &str) -> Self {
        match value.trim() {
            "product" => DiscountKind::Product,
            "category" => DiscountKind::Category,
            "customer" => DiscountKind::Customer,
            "volume" => DiscountKind::Volume,
            "order_value" => DiscountKind::OrderValue,
            "seasonal" => DiscountKind::Seasonal,
            "limited" => DiscountKind::Limited,
            "new_customer" => DiscountKind::NewCustomer,
            "customer_cart" => DiscountKind::CustomerCart,
            other => DiscountKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity that owns a discount rule.
///
/// A rule belongs to exactly one target and goes away with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscountTarget {
    /// Owned by a product
    Product(ProductKey),

    /// Owned by a category
    Category(CategoryKey),

    /// Owned by a customer
    Customer(CustomerKey),
}

/// Clamp a percentage into `[0, 100]`.
pub fn clamp_percent(percentage: Decimal) -> Decimal {
    percentage.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}

/// Fraction of the price retained after applying `percentage`.
///
/// Out of range percentages are clamped first, so the result is always within `[0, 1]`.
pub fn retained_fraction(percentage: Decimal) -> Decimal {
    Decimal::ONE - clamp_percent(percentage) / Decimal::ONE_HUNDRED
}

/// Compound a sequence of percentages into the fraction of the price retained.
pub fn compound<I>(percentages: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    percentages
        .into_iter()
        .fold(Decimal::ONE, |retained, percentage| {
            retained * retained_fraction(percentage)
        })
}

/// Round a percentage to whole points, half away from zero.
pub fn round_percent(percentage: Decimal) -> Decimal {
    percentage.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a monetary amount to two decimal places, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Whole percentage points taken off `original` to arrive at `discounted`.
///
/// Returns zero for non-positive originals.
pub fn percent_off(original: Decimal, discounted: Decimal) -> Decimal {
    if original <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    round_percent(Decimal::ONE_HUNDRED - discounted / original * Decimal::ONE_HUNDRED)
}
