//! Volume Tiers

use rust_decimal::Decimal;

use crate::{
    discounts::{CandidateDiscount, CandidateSource, DiscountKind},
    sources::{Candidates, DiscountSource, PricingContext},
};

/// A quantity break: lines of at least `min_quantity` units get `percentage` off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeTier {
    /// Quantity the tier starts at
    pub min_quantity: u32,

    /// Percentage points off
    pub percentage: Decimal,

    /// Customer-facing description
    pub description: String,
}

/// Configured quantity breaks. Yields the single deepest tier the line quantity reaches.
#[derive(Debug, Clone, Default)]
pub struct VolumeSource {
    tiers: Vec<VolumeTier>,
}

impl VolumeSource {
    /// Create a source over `tiers`, in any order.
    pub fn new(tiers: impl IntoIterator<Item = VolumeTier>) -> Self {
        let mut tiers: Vec<VolumeTier> = tiers.into_iter().collect();

        tiers.sort_by_key(|tier| tier.min_quantity);

        Self { tiers }
    }

    /// Configured tiers, smallest quantity first.
    pub fn tiers(&self) -> &[VolumeTier] {
        &self.tiers
    }
}

impl DiscountSource for VolumeSource {
    fn kind(&self) -> DiscountKind {
        DiscountKind::Volume
    }

    fn resolve(&self, context: &PricingContext<'_, '_>) -> Candidates {
        self.tiers
            .iter()
            .rev()
            .find(|tier| context.quantity >= tier.min_quantity)
            .map(|tier| {
                CandidateDiscount::new(
                    DiscountKind::Volume,
                    tier.percentage,
                    tier.description.clone(),
                    CandidateSource::VolumeTier {
                        min_quantity: tier.min_quantity,
                    },
                )
            })
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        categories::CategoryTree,
        sources::{
            RuleSnapshot,
            test_support::{now, product},
        },
    };

    use super::*;

    fn tier(min_quantity: u32, percentage: i64) -> VolumeTier {
        VolumeTier {
            min_quantity,
            percentage: Decimal::from(percentage),
            description: format!("Buy {min_quantity}+"),
        }
    }

    #[test]
    fn deepest_reached_tier_wins() -> TestResult {
        let source = VolumeSource::new([tier(10, 10), tier(5, 5)]);
        let product = product(&[]);
        let tree = CategoryTree::new();
        let rules = RuleSnapshot::default();

        let mut context = PricingContext {
            product: &product,
            quantity: 4,
            customer: None,
            now: now()?,
            categories: &tree,
            rules: &rules,
        };

        assert!(source.resolve(&context).is_empty());

        context.quantity = 7;

        assert_eq!(
            source.resolve(&context).first().map(|c| c.percentage),
            Some(Decimal::from(5))
        );

        context.quantity = 12;

        let candidates = source.resolve(&context);

        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates.first().map(|c| c.source.clone()),
            Some(CandidateSource::VolumeTier { min_quantity: 10 })
        );

        Ok(())
    }

    #[test]
    fn no_tiers_yield_nothing() -> TestResult {
        let product = product(&[]);
        let tree = CategoryTree::new();
        let rules = RuleSnapshot::default();

        let context = PricingContext {
            product: &product,
            quantity: 1_000,
            customer: None,
            now: now()?,
            categories: &tree,
            rules: &rules,
        };

        assert!(VolumeSource::default().resolve(&context).is_empty());

        Ok(())
    }
}
