//! Discount Combination
//!
//! Greedy selection of a mutually stackable subset of candidates. Candidates are walked from the
//! largest percentage down; each one the stacking policy admits compounds onto the running price.
//! Nothing is rounded until the final price is known.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::{
    discounts::{CandidateDiscount, percent_off, retained_fraction, round_money},
    pricing::stacking::{SameKindExclusion, StackingPolicy},
};

/// How candidates with equal percentages are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Keep the order the sources produced them in.
    #[default]
    Stable,

    /// Higher `priority` first, then source order.
    Priority,
}

/// Outcome of pricing a single entity.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingResult<'a> {
    /// Price before discounts
    pub original_price: Money<'a, Currency>,

    /// Price after the applied discounts, rounded to two decimal places
    pub final_price: Money<'a, Currency>,

    /// Whole percentage points taken off, derived from the two prices
    pub total_discount_percentage: Decimal,

    /// Discounts applied, in application order
    pub applied_discounts: Vec<CandidateDiscount>,
}

impl<'a> PricingResult<'a> {
    /// A result that leaves `price` untouched.
    pub fn undiscounted(price: Money<'a, Currency>) -> Self {
        Self {
            original_price: price,
            final_price: price,
            total_discount_percentage: Decimal::ZERO,
            applied_discounts: Vec::new(),
        }
    }

    /// Amount taken off.
    pub fn savings(&self) -> Money<'a, Currency> {
        Money::from_decimal(
            *self.original_price.amount() - *self.final_price.amount(),
            self.original_price.currency(),
        )
    }

    /// Exact fraction taken off, before whole-point rounding.
    pub fn savings_percent(&self) -> Percentage {
        let original = *self.original_price.amount();

        if original <= Decimal::ZERO {
            return Percentage::from(Decimal::ZERO);
        }

        Percentage::from(*self.savings().amount() / original)
    }

    /// Whether any discount was applied.
    pub fn is_discounted(&self) -> bool {
        !self.applied_discounts.is_empty()
    }
}

/// Best combination under the default policy: same-kind exclusion, stable ties.
pub fn best_combination<'a>(
    candidates: &[CandidateDiscount],
    original_price: Money<'a, Currency>,
) -> PricingResult<'a> {
    best_combination_with(
        candidates,
        original_price,
        &SameKindExclusion,
        TieBreak::Stable,
    )
}

/// Best combination under an explicit stacking policy and tie-break.
///
/// Non-positive prices short-circuit to a zero price with nothing applied; an empty candidate
/// list returns the price untouched. The function has no side effects, so repeated calls with
/// the same inputs return the same result.
pub fn best_combination_with<'a>(
    candidates: &[CandidateDiscount],
    original_price: Money<'a, Currency>,
    policy: &dyn StackingPolicy,
    tie_break: TieBreak,
) -> PricingResult<'a> {
    let currency = original_price.currency();
    let original = *original_price.amount();

    if original <= Decimal::ZERO {
        return PricingResult {
            final_price: Money::from_decimal(Decimal::ZERO, currency),
            ..PricingResult::undiscounted(original_price)
        };
    }

    if candidates.is_empty() {
        return PricingResult::undiscounted(original_price);
    }

    let mut ordered: Vec<&CandidateDiscount> = candidates.iter().collect();

    match tie_break {
        TieBreak::Stable => ordered.sort_by(|a, b| b.percentage.cmp(&a.percentage)),
        TieBreak::Priority => ordered.sort_by(|a, b| {
            b.percentage
                .cmp(&a.percentage)
                .then_with(|| b.priority.cmp(&a.priority))
        }),
    }

    let mut applied: Vec<CandidateDiscount> = Vec::with_capacity(ordered.len());
    let mut running = original;

    for candidate in ordered {
        if policy.admits(candidate, &applied) {
            running *= retained_fraction(candidate.percentage);

            trace!(kind = %candidate.kind, percentage = %candidate.percentage, "applied discount");

            applied.push(candidate.clone());
        } else {
            trace!(kind = %candidate.kind, percentage = %candidate.percentage, "discount does not stack");
        }
    }

    let final_amount = round_money(running.max(Decimal::ZERO));
    let total_discount_percentage = percent_off(original, final_amount);

    debug!(
        %original,
        %final_amount,
        %total_discount_percentage,
        applied = applied.len(),
        considered = candidates.len(),
        "resolved discount combination"
    );

    PricingResult {
        original_price,
        final_price: Money::from_decimal(final_amount, currency),
        total_discount_percentage,
        applied_discounts: applied,
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;

    use crate::{
        discounts::{CandidateSource, DiscountKind},
        pricing::stacking::AllowListStacking,
    };

    use super::*;

    fn candidate(kind: DiscountKind, percentage: i64) -> CandidateDiscount {
        CandidateDiscount::new(
            kind.clone(),
            Decimal::from(percentage),
            format!("{kind} {percentage}%"),
            CandidateSource::OrderThreshold,
        )
    }

    fn pounds(amount: i64) -> Money<'static, Currency> {
        Money::from_decimal(Decimal::from(amount), GBP)
    }

    #[test]
    fn different_kinds_compound() {
        let result = best_combination(
            &[
                candidate(DiscountKind::Product, 20),
                candidate(DiscountKind::Category, 10),
            ],
            pounds(100),
        );

        assert_eq!(result.final_price, Money::from_minor(7200, GBP));
        assert_eq!(result.total_discount_percentage, Decimal::from(28));
        assert_eq!(result.applied_discounts.len(), 2);
    }

    #[test]
    fn same_kind_keeps_only_the_largest() {
        let result = best_combination(
            &[
                candidate(DiscountKind::Product, 20),
                candidate(DiscountKind::Product, 30),
            ],
            pounds(100),
        );

        assert_eq!(result.final_price, Money::from_minor(7000, GBP));
        assert_eq!(result.total_discount_percentage, Decimal::from(30));
        assert_eq!(
            result.applied_discounts,
            vec![candidate(DiscountKind::Product, 30)]
        );
    }

    #[test]
    fn empty_candidates_return_the_original_price() {
        let result = best_combination(&[], pounds(100));

        assert_eq!(result, PricingResult::undiscounted(pounds(100)));
        assert!(!result.is_discounted());
    }

    #[test]
    fn non_positive_prices_are_zeroed_without_discounts() {
        for price in [pounds(0), pounds(-5)] {
            let result = best_combination(&[candidate(DiscountKind::Product, 50)], price);

            assert_eq!(result.final_price, pounds(0));
            assert_eq!(result.total_discount_percentage, Decimal::ZERO);
            assert!(result.applied_discounts.is_empty());
        }
    }

    #[test]
    fn out_of_range_percentages_are_clamped() {
        let over = best_combination(&[candidate(DiscountKind::Limited, 150)], pounds(80));
        let under = best_combination(&[candidate(DiscountKind::Limited, -10)], pounds(80));

        assert_eq!(over.final_price, pounds(0));
        assert_eq!(over.total_discount_percentage, Decimal::ONE_HUNDRED);
        assert_eq!(under.final_price, pounds(80));
        assert_eq!(under.total_discount_percentage, Decimal::ZERO);
    }

    #[test]
    fn rounding_happens_once_at_the_end() {
        // 0.05 * 0.9 * 0.9 = 0.0405; rounding each step would give 0.05.
        let result = best_combination(
            &[
                candidate(DiscountKind::Product, 10),
                candidate(DiscountKind::Customer, 10),
            ],
            Money::from_minor(5, GBP),
        );

        assert_eq!(result.final_price, Money::from_minor(4, GBP));
        assert_eq!(result.total_discount_percentage, Decimal::from(20));
    }

    #[test]
    fn stable_ties_keep_source_order() {
        let mut first = candidate(DiscountKind::Product, 10);
        first.description = "first".to_string();

        let mut second = candidate(DiscountKind::Product, 10);
        second.description = "second".to_string();
        second.priority = 9;

        let stable = best_combination(&[first.clone(), second.clone()], pounds(100));
        let by_priority = best_combination_with(
            &[first, second],
            pounds(100),
            &SameKindExclusion,
            TieBreak::Priority,
        );

        assert_eq!(
            stable.applied_discounts.first().map(|c| c.description.as_str()),
            Some("first")
        );
        assert_eq!(
            by_priority
                .applied_discounts
                .first()
                .map(|c| c.description.as_str()),
            Some("second")
        );
    }

    #[test]
    fn repeated_calls_are_identical() {
        let candidates = [
            candidate(DiscountKind::Category, 15),
            candidate(DiscountKind::Product, 12),
            candidate(DiscountKind::Category, 5),
            candidate(DiscountKind::Customer, 7),
        ];

        let first = best_combination(&candidates, Money::from_minor(4599, GBP));
        let second = best_combination(&candidates, Money::from_minor(4599, GBP));

        assert_eq!(first, second);
    }

    #[test]
    fn policy_can_reject_otherwise_stackable_discounts() {
        let mut category = candidate(DiscountKind::Category, 15);
        category.stacking = Some(crate::discounts::StackingRules::allowing([
            DiscountKind::Product,
        ]));

        let candidates = [
            category,
            candidate(DiscountKind::Product, 10),
            candidate(DiscountKind::Customer, 5),
        ];

        let result =
            best_combination_with(&candidates, pounds(100), &AllowListStacking, TieBreak::Stable);

        // 100 * 0.85 * 0.9; the customer discount is not on the category allow-list.
        assert_eq!(result.final_price, Money::from_minor(7650, GBP));
        assert_eq!(result.applied_discounts.len(), 2);
    }

    #[test]
    fn savings_and_savings_percent() {
        let result = best_combination(&[candidate(DiscountKind::Product, 25)], pounds(200));

        assert_eq!(result.savings(), pounds(50));
        assert_eq!(result.savings_percent(), Percentage::from(Decimal::new(25, 2)));
    }
}
