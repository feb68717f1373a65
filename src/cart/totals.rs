//! Cart Totals

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use tracing::{debug, trace};

use crate::{
    cart::CartItem,
    config::CartConfig,
    discounts::{
        CandidateDiscount, CandidateSource, DiscountKind, DiscountRule, compound, percent_off,
        round_money,
    },
};

/// Money figures for a priced cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartTotals<'a> {
    /// Sum of the undiscounted line prices
    pub original_subtotal: Money<'a, Currency>,

    /// Sum of the discounted line prices
    pub subtotal: Money<'a, Currency>,

    /// Cart-level discounts applied to the subtotal, in application order
    pub cart_discounts: Vec<CandidateDiscount>,

    /// Amount the cart-level discounts took off the subtotal
    pub total_savings: Money<'a, Currency>,

    /// Amount payable
    pub final_total: Money<'a, Currency>,
}

impl<'a> CartTotals<'a> {
    /// Totals of an empty cart.
    pub fn zero(currency: &'a Currency) -> Self {
        let zero = Money::from_decimal(Decimal::ZERO, currency);

        Self {
            original_subtotal: zero,
            subtotal: zero,
            cart_discounts: Vec::new(),
            total_savings: zero,
            final_total: zero,
        }
    }

    /// Everything saved, item and cart discounts together.
    pub fn overall_savings(&self) -> Money<'a, Currency> {
        Money::from_decimal(
            *self.original_subtotal.amount() - *self.final_total.amount(),
            self.final_total.currency(),
        )
    }

    /// Whole percentage points taken off the undiscounted subtotal.
    pub fn overall_discount_percentage(&self) -> Decimal {
        percent_off(*self.original_subtotal.amount(), *self.final_total.amount())
    }
}

/// Apply cart-level discounts on top of the items' frozen prices.
///
/// The configured order value discount applies once the subtotal reaches its threshold. Valid
/// cart-level `cart_rules` follow, each gated on its own minimum order amount. Discounts compound
/// in that order.
pub fn cart_totals<'a>(
    items: &[CartItem<'a>],
    cart_rules: &[DiscountRule],
    config: &CartConfig,
    now: Timestamp,
    currency: &'a Currency,
) -> CartTotals<'a> {
    if items.is_empty() {
        return CartTotals::zero(currency);
    }

    let original: Decimal = items.iter().map(CartItem::original_amount).sum();
    let subtotal: Decimal = items.iter().map(CartItem::subtotal_amount).sum();

    let mut cart_discounts = Vec::new();

    if let Some(big_spender) = &config.big_spender
        && subtotal > Decimal::ZERO
        && subtotal >= big_spender.threshold
    {
        cart_discounts.push(CandidateDiscount::new(
            DiscountKind::OrderValue,
            big_spender.percentage,
            big_spender.name.clone(),
            CandidateSource::OrderThreshold,
        ));
    }

    for rule in cart_rules {
        if rule.kind.is_cart_level() && rule.is_valid(now) && rule.admits_subtotal(subtotal) {
            cart_discounts.push(CandidateDiscount::from_rule(rule, rule.kind.clone(), "Cart"));
        } else {
            trace!(discount = ?rule.key, %subtotal, "cart discount not applicable");
        }
    }

    let final_total = round_money(
        (subtotal * compound(cart_discounts.iter().map(|d| d.percentage))).max(Decimal::ZERO),
    );

    debug!(
        %subtotal,
        %final_total,
        cart_discounts = cart_discounts.len(),
        "computed cart totals"
    );

    CartTotals {
        original_subtotal: Money::from_decimal(original, currency),
        subtotal: Money::from_decimal(subtotal, currency),
        cart_discounts,
        total_savings: Money::from_decimal(subtotal - final_total, currency),
        final_total: Money::from_decimal(final_total, currency),
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use rusty_money::iso::GBP;
    use slotmap::SlotMap;
    use testresult::TestResult;

    use crate::{
        config::BigSpender,
        customers::CustomerKey,
        discounts::DiscountTarget,
        pricing::PricingResult,
        products::ProductKey,
    };

    use super::*;

    fn item(keys: &mut SlotMap<ProductKey, ()>, minor: i64, quantity: u32) -> CartItem<'static> {
        CartItem::priced(
            keys.insert(()),
            quantity,
            PricingResult::undiscounted(Money::from_minor(minor, GBP)),
        )
    }

    fn now() -> Result<Timestamp, jiff::Error> {
        "2026-06-15T09:30:00Z".parse()
    }

    #[test]
    fn empty_cart_is_all_zeros() -> TestResult {
        let totals = cart_totals(&[], &[], &CartConfig::default(), now()?, GBP);

        assert_eq!(totals, CartTotals::zero(GBP));
        assert_eq!(totals.final_total, Money::from_minor(0, GBP));

        Ok(())
    }

    #[test]
    fn big_spender_threshold_is_inclusive() -> TestResult {
        let mut keys = SlotMap::with_key();
        let config = CartConfig::default();

        let at_threshold = [item(&mut keys, 25_000, 2)];
        let below = [item(&mut keys, 49_999, 1)];

        let applied = cart_totals(&at_threshold, &[], &config, now()?, GBP);
        let not_applied = cart_totals(&below, &[], &config, now()?, GBP);

        assert_eq!(applied.subtotal, Money::from_minor(50_000, GBP));
        assert_eq!(applied.final_total, Money::from_minor(42_500, GBP));
        assert_eq!(applied.total_savings, Money::from_minor(7_500, GBP));
        assert_eq!(
            applied.cart_discounts.first().map(|d| d.description.as_str()),
            Some("Big Spender Discount")
        );

        assert!(not_applied.cart_discounts.is_empty());
        assert_eq!(not_applied.final_total, Money::from_minor(49_999, GBP));
        assert_eq!(not_applied.total_savings, Money::from_minor(0, GBP));

        Ok(())
    }

    #[test]
    fn customer_cart_rules_compound_after_big_spender() -> TestResult {
        let mut keys = SlotMap::with_key();
        let mut customers = SlotMap::<CustomerKey, ()>::with_key();
        let target = DiscountTarget::Customer(customers.insert(()));
        let now = now()?;

        let rules = [
            DiscountRule::new("VIP", DiscountKind::CustomerCart, Decimal::from(10), target),
            DiscountRule::new("Big Basket", DiscountKind::OrderValue, Decimal::from(5), target)
                .with_minimum_order_amount(Decimal::from(1_000)),
            DiscountRule::new("Lapsed", DiscountKind::CustomerCart, Decimal::from(50), target)
                .valid_between(None, Some(now.checked_sub(SignedDuration::from_hours(1))?)),
        ];

        let totals = cart_totals(
            &[item(&mut keys, 60_000, 1)],
            &rules,
            &CartConfig::default(),
            now,
            GBP,
        );

        // 600 * 0.85 * 0.9
        assert_eq!(totals.final_total, Money::from_minor(45_900, GBP));
        assert_eq!(totals.cart_discounts.len(), 2);
        assert_eq!(totals.overall_discount_percentage(), Decimal::from(24));

        Ok(())
    }

    #[test]
    fn disabled_big_spender_never_applies() -> TestResult {
        let mut keys = SlotMap::with_key();
        let config = CartConfig {
            big_spender: None,
            ..CartConfig::default()
        };

        let totals = cart_totals(&[item(&mut keys, 100_000, 3)], &[], &config, now()?, GBP);

        assert!(totals.cart_discounts.is_empty());
        assert_eq!(totals.final_total, totals.subtotal);

        Ok(())
    }

    #[test]
    fn configured_threshold_and_percentage_are_used() -> TestResult {
        let mut keys = SlotMap::with_key();
        let config = CartConfig {
            big_spender: Some(BigSpender {
                name: "Spend & Save".to_string(),
                threshold: Decimal::from(100),
                percentage: Decimal::from(20),
            }),
            ..CartConfig::default()
        };

        let totals = cart_totals(&[item(&mut keys, 10_000, 1)], &[], &config, now()?, GBP);

        assert_eq!(totals.final_total, Money::from_minor(8_000, GBP));

        Ok(())
    }
}
