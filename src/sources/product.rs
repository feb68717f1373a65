//! Product Discounts

use tracing::trace;

use crate::{
    discounts::{CandidateDiscount, DiscountKind, DiscountTarget},
    sources::{Candidates, DiscountSource, PricingContext},
};

/// Rules owned directly by the product being priced.
///
/// Every valid owned rule is yielded as a [`DiscountKind::Product`] candidate whatever its stored
/// tag, so product rules never stack with each other. Rules with a minimum quantity are skipped
/// until the line reaches it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductSource;

impl DiscountSource for ProductSource {
    fn kind(&self) -> DiscountKind {
        DiscountKind::Product
    }

    fn resolve(&self, context: &PricingContext<'_, '_>) -> Candidates {
        let owned = context
            .rules
            .rules_for(DiscountTarget::Product(context.product.key));

        let candidates: Candidates = owned
            .iter()
            .filter(|rule| rule.is_valid(context.now) && rule.admits_quantity(context.quantity))
            .map(|rule| CandidateDiscount::from_rule(rule, DiscountKind::Product, "Product"))
            .collect();

        trace!(
            product = ?context.product.key,
            owned = owned.len(),
            valid = candidates.len(),
            "resolved product discounts"
        );

        candidates
    }
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{
        categories::CategoryTree,
        discounts::DiscountRule,
        sources::{
            RuleSnapshot,
            test_support::{now, product},
        },
    };

    use super::*;

    #[test]
    fn yields_valid_owned_rules_as_product_candidates() -> TestResult {
        let product = product(&[]);
        let now = now()?;
        let target = DiscountTarget::Product(product.key);

        let rules = RuleSnapshot::from_rules([
            DiscountRule::new("Launch", DiscountKind::Limited, Decimal::from(20), target),
            DiscountRule::new("Paused", DiscountKind::Product, Decimal::from(30), target)
                .inactive(),
            DiscountRule::new("Expired", DiscountKind::Product, Decimal::from(40), target)
                .valid_between(None, Some(now.checked_sub(SignedDuration::from_hours(1))?)),
            DiscountRule::new("Used up", DiscountKind::Product, Decimal::from(50), target)
                .with_usage_limit(3)
                .with_usage_count(3),
        ]);

        let tree = CategoryTree::new();
        let context = PricingContext {
            product: &product,
            quantity: 1,
            customer: None,
            now,
            categories: &tree,
            rules: &rules,
        };

        let candidates = ProductSource.resolve(&context);

        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates.first().map(|c| (&c.kind, c.description.as_str())),
            Some((&DiscountKind::Product, "Product: Launch"))
        );

        Ok(())
    }

    #[test]
    fn quantity_gated_rules_wait_for_the_minimum() -> TestResult {
        let product = product(&[]);
        let tree = CategoryTree::new();
        let rules = RuleSnapshot::from_rules([DiscountRule::new(
            "Bulk",
            DiscountKind::Volume,
            Decimal::from(10),
            DiscountTarget::Product(product.key),
        )
        .with_minimum_quantity(5)]);

        let mut context = PricingContext {
            product: &product,
            quantity: 4,
            customer: None,
            now: now()?,
            categories: &tree,
            rules: &rules,
        };

        assert!(ProductSource.resolve(&context).is_empty());

        context.quantity = 5;

        assert_eq!(ProductSource.resolve(&context).len(), 1);

        Ok(())
    }
}
