//! Category Discounts
//!
//! Two kinds of category candidate exist. Rules owned by any of the product's categories and
//! tagged `category` are yielded as they are. On top of that, the best compounded
//! `discount_percentage` chain among the product's categories is yielded as a single hierarchy
//! candidate. All of them share the [`DiscountKind::Category`] kind, so at most one survives
//! combination.

use std::sync::Mutex;

use jiff::{SignedDuration, Timestamp};
use rust_decimal::Decimal;
use tracing::{trace, warn};

use crate::{
    categories::{
        CategoryKey, CategoryTree, TtlCache, effective_discount, highest_effective_discount,
    },
    discounts::{CandidateDiscount, CandidateSource, DiscountKind, DiscountTarget},
    sources::{Candidates, DiscountSource, PricingContext},
};

/// Category rules and the category hierarchy.
#[derive(Debug, Default)]
pub struct CategorySource {
    effective: Option<Mutex<TtlCache<CategoryKey, Decimal>>>,
}

impl CategorySource {
    /// A source that recomputes effective discounts on every request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A source that memoises effective discounts for `ttl`, or until the tree changes.
    #[must_use]
    pub fn cached(ttl: SignedDuration) -> Self {
        Self {
            effective: Some(Mutex::new(TtlCache::new(ttl))),
        }
    }

    fn hierarchy(
        &self,
        tree: &CategoryTree,
        categories: &[CategoryKey],
        now: Timestamp,
    ) -> Option<(CategoryKey, Decimal)> {
        let Some(cache) = &self.effective else {
            return highest_effective_discount(tree, categories);
        };

        let Ok(mut cache) = cache.lock() else {
            warn!("effective discount cache poisoned, computing uncached");

            return highest_effective_discount(tree, categories);
        };

        let revision = tree.revision();
        let mut best: Option<(CategoryKey, Decimal)> = None;

        for key in categories {
            let percentage = match cache.get(key, now, revision) {
                Some(percentage) => *percentage,
                None => {
                    let Ok(percentage) = effective_discount(tree, *key) else {
                        continue;
                    };

                    cache.insert(*key, percentage, now, revision);

                    percentage
                }
            };

            if best.is_none_or(|(_, best_percentage)| percentage > best_percentage) {
                best = Some((*key, percentage));
            }
        }

        best
    }
}

impl DiscountSource for CategorySource {
    fn kind(&self) -> DiscountKind {
        DiscountKind::Category
    }

    fn resolve(&self, context: &PricingContext<'_, '_>) -> Candidates {
        let categories = &context.product.categories;

        let mut candidates: Candidates = categories
            .iter()
            .flat_map(|key| context.rules.rules_for(DiscountTarget::Category(*key)))
            .filter(|rule| rule.kind == DiscountKind::Category && rule.is_valid(context.now))
            .map(|rule| CandidateDiscount::from_rule(rule, DiscountKind::Category, "Category"))
            .collect();

        if let Some((key, percentage)) = self.hierarchy(context.categories, categories, context.now)
            && percentage > Decimal::ZERO
        {
            let name = context
                .categories
                .get(key)
                .map_or("", |category| category.name.as_str());

            trace!(category = ?key, %percentage, "category hierarchy discount");

            candidates.push(CandidateDiscount::new(
                DiscountKind::Category,
                percentage,
                format!("Category: {name}"),
                CandidateSource::CategoryHierarchy(key),
            ));
        }

        candidates
    }
}
