//! Redemption
//!
//! Consuming a rule's usage allowance happens only when an order completes. Pricing previews
//! never touch usage counters.

use jiff::Timestamp;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    customers::CustomerKey,
    discounts::{DiscountKind, rule::DiscountKey},
    products::ProductKey,
};

/// Errors raised while redeeming a rule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RedemptionError {
    /// The rule does not exist (any more).
    #[error("discount {0:?} not found")]
    UnknownDiscount(DiscountKey),

    /// The rule is inactive, outside its window, or its usage cap was reached first by someone
    /// else. The caller must reprice without it.
    #[error("discount {0:?} is no longer available")]
    NoLongerAvailable(DiscountKey),
}

/// Storage for usage counters.
///
/// Increments must be atomic: when several checkouts race for the last redemption of a capped
/// rule, exactly one wins and the others fail closed.
pub trait UsageLedger {
    /// Consume one use of `discount`, returning the new usage count.
    ///
    /// # Errors
    ///
    /// - [`RedemptionError::UnknownDiscount`]: no such rule.
    /// - [`RedemptionError::NoLongerAvailable`]: the rule cannot be redeemed at `now`.
    fn redeem(&self, discount: DiscountKey, now: Timestamp) -> Result<u32, RedemptionError>;

    /// Give back one use of `discount` after a checkout was abandoned part way.
    fn release(&self, discount: DiscountKey);
}

impl<L: UsageLedger + ?Sized> UsageLedger for &L {
    fn redeem(&self, discount: DiscountKey, now: Timestamp) -> Result<u32, RedemptionError> {
        (**self).redeem(discount, now)
    }

    fn release(&self, discount: DiscountKey) {
        (**self).release(discount);
    }
}

/// A completed redemption.
#[derive(Debug, Clone, PartialEq)]
pub struct Redemption {
    /// Redeemed rule
    pub discount: DiscountKey,

    /// Kind the rule was applied as
    pub kind: DiscountKind,

    /// Percentage points applied
    pub percentage_applied: Decimal,

    /// Amount the rule took off, in the order currency
    pub amount_saved: Decimal,

    /// Product the rule was applied to, for item-level rules
    pub product: Option<ProductKey>,

    /// Customer who placed the order
    pub customer: Option<CustomerKey>,

    /// Usage count after this redemption
    pub usage_count: u32,

    /// When the order completed
    pub redeemed_at: Timestamp,
}
