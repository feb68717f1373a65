//! Customer Discounts

use crate::{
    discounts::{CandidateDiscount, DiscountKind, DiscountTarget},
    sources::{Candidates, DiscountSource, PricingContext},
};

/// Item-level rules owned by the customer being priced for.
///
/// Anonymous requests yield nothing. Cart-level rules are left to the cart totals.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerSource;

impl DiscountSource for CustomerSource {
    fn kind(&self) -> DiscountKind {
        DiscountKind::Customer
    }

    fn resolve(&self, context: &PricingContext<'_, '_>) -> Candidates {
        let Some(customer) = context.customer else {
            return Candidates::new();
        };

        context
            .rules
            .rules_for(DiscountTarget::Customer(customer))
            .iter()
            .filter(|rule| !rule.kind.is_cart_level() && rule.is_valid(context.now))
            .map(|rule| CandidateDiscount::from_rule(rule, DiscountKind::Customer, "Customer"))
            .collect()
    }
}
