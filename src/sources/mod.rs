//! Discount Sources
//!
//! Each source looks at one aspect of a pricing request (the product, its categories, the
//! customer, the quantity, the calendar) and yields the candidate discounts that are valid right
//! now. Sources never combine anything; that is left to the combination resolver.
//!
//! Rules are fetched once per request into a [`RuleSnapshot`] before any source runs, so sources
//! are plain functions of their context and cannot fail.

use std::fmt;

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::trace;

use crate::{
    categories::CategoryTree,
    customers::CustomerKey,
    discounts::{
        CandidateDiscount, DiscountKind, DiscountRepository, DiscountRule, DiscountTarget,
        RepositoryError,
    },
    products::Product,
};

pub mod category;
pub mod customer;
pub mod product;
pub mod seasonal;
pub mod volume;

pub use category::CategorySource;
pub use customer::CustomerSource;
pub use product::ProductSource;
pub use seasonal::{SeasonalCampaign, SeasonalSource};
pub use volume::{VolumeSource, VolumeTier};

/// Candidates yielded by a single source.
pub type Candidates = SmallVec<[CandidateDiscount; 4]>;

/// Rules relevant to one pricing request, keyed by owner.
#[derive(Debug, Clone, Default)]
pub struct RuleSnapshot {
    rules: FxHashMap<DiscountTarget, Vec<DiscountRule>>,
}

impl RuleSnapshot {
    /// Fetch every rule that could apply to `product` when sold to `customer`.
    ///
    /// # Errors
    ///
    /// Returns the repository's error if any lookup fails.
    pub fn fetch<R: DiscountRepository + ?Sized>(
        repository: &R,
        product: &Product<'_>,
        customer: Option<CustomerKey>,
    ) -> Result<Self, RepositoryError> {
        let mut snapshot = Self::default();

        let targets = std::iter::once(DiscountTarget::Product(product.key))
            .chain(product.categories.iter().copied().map(DiscountTarget::Category))
            .chain(customer.map(DiscountTarget::Customer));

        for target in targets {
            if snapshot.rules.contains_key(&target) {
                continue;
            }

            let rules = repository.rules_for(target)?;

            trace!(?target, rules = rules.len(), "fetched discount rules");

            snapshot.rules.insert(target, rules);
        }

        Ok(snapshot)
    }

    /// Build a snapshot from rules already in memory.
    pub fn from_rules(rules: impl IntoIterator<Item = DiscountRule>) -> Self {
        let mut snapshot = Self::default();

        for rule in rules {
            snapshot.rules.entry(rule.target).or_default().push(rule);
        }

        snapshot
    }

    /// Rules owned by `target`.
    pub fn rules_for(&self, target: DiscountTarget) -> &[DiscountRule] {
        self.rules
            .get(&target)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Everything a source may look at.
#[derive(Debug, Clone, Copy)]
pub struct PricingContext<'p, 'a> {
    /// Product being priced
    pub product: &'p Product<'a>,

    /// Line quantity
    pub quantity: u32,

    /// Customer the price is for, if known
    pub customer: Option<CustomerKey>,

    /// Evaluation instant for validity windows
    pub now: Timestamp,

    /// Category hierarchy
    pub categories: &'p CategoryTree,

    /// Rules fetched for this request
    pub rules: &'p RuleSnapshot,
}

/// A resolver of candidate discounts.
pub trait DiscountSource: fmt::Debug + Send + Sync {
    /// Kind of candidate this source yields.
    fn kind(&self) -> DiscountKind;

    /// Candidates valid for `context`.
    fn resolve(&self, context: &PricingContext<'_, '_>) -> Candidates;
}
