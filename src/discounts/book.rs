//! Discount Book
//!
//! In-memory rule pool: an arena of rules, an ownership lookup table keyed by
//! [`DiscountTarget`], and one atomic usage counter per rule.

use std::sync::atomic::{AtomicU32, Ordering};

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use slotmap::{SecondaryMap, SlotMap};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::discounts::{
    DiscountRepository, DiscountRule, DiscountTarget, RedemptionError, RepositoryError,
    UsageLedger, rule::DiscountKey,
};

/// Rule pool shared by concurrent pricing requests.
///
/// Reads hand out snapshots; the only mutation available through a shared reference is the usage
/// counter, which is updated with compare-and-swap.
#[derive(Debug, Default)]
pub struct DiscountBook {
    rules: SlotMap<DiscountKey, DiscountRule>,
    owners: FxHashMap<DiscountTarget, SmallVec<[DiscountKey; 4]>>,
    usage: SecondaryMap<DiscountKey, AtomicU32>,
}

impl DiscountBook {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a rule, returning its key.
    ///
    /// The rule's own `key` field is overwritten with the assigned key.
    pub fn insert(&mut self, rule: DiscountRule) -> DiscountKey {
        let target = rule.target;
        let usage_count = rule.usage_count;

        let key = self.rules.insert_with_key(|key| DiscountRule { key, ..rule });

        self.owners.entry(target).or_default().push(key);
        self.usage.insert(key, AtomicU32::new(usage_count));

        key
    }

    /// Snapshot of a single rule with its live usage count.
    pub fn get(&self, key: DiscountKey) -> Option<DiscountRule> {
        self.rules.get(key).map(|rule| self.snapshot(rule))
    }

    /// Delete a rule.
    pub fn remove(&mut self, key: DiscountKey) -> Option<DiscountRule> {
        let rule = self.rules.remove(key)?;

        if let Some(owned) = self.owners.get_mut(&rule.target) {
            owned.retain(|owned_key| *owned_key != key);
        }

        self.usage.remove(key);

        Some(rule)
    }

    /// Delete every rule owned by `target`, as when the target itself is deleted.
    pub fn remove_target(&mut self, target: DiscountTarget) -> usize {
        let Some(owned) = self.owners.remove(&target) else {
            return 0;
        };

        for key in &owned {
            self.rules.remove(*key);
            self.usage.remove(*key);
        }

        debug!(?target, removed = owned.len(), "removed discounts with their owner");

        owned.len()
    }

    /// Number of stored rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the book holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn snapshot(&self, rule: &DiscountRule) -> DiscountRule {
        let usage_count = self
            .usage
            .get(rule.key)
            .map_or(rule.usage_count, |count| count.load(Ordering::Acquire));

        DiscountRule {
            usage_count,
            ..rule.clone()
        }
    }
}

impl DiscountRepository for DiscountBook {
    fn rules_for(&self, target: DiscountTarget) -> Result<Vec<DiscountRule>, RepositoryError> {
        let rules = self
            .owners
            .get(&target)
            .map(|owned| {
                owned
                    .iter()
                    .filter_map(|key| self.rules.get(*key))
                    .map(|rule| self.snapshot(rule))
                    .collect()
            })
            .unwrap_or_default();

        Ok(rules)
    }
}

impl UsageLedger for DiscountBook {
    fn redeem(&self, discount: DiscountKey, now: Timestamp) -> Result<u32, RedemptionError> {
        let rule = self
            .rules
            .get(discount)
            .ok_or(RedemptionError::UnknownDiscount(discount))?;

        let counter = self
            .usage
            .get(discount)
            .ok_or(RedemptionError::UnknownDiscount(discount))?;

        if !rule.is_active || !rule.within_window(now) {
            warn!(?discount, "attempted to redeem a discount outside its validity");

            return Err(RedemptionError::NoLongerAvailable(discount));
        }

        let limit = rule.usage_limit;

        let previous = counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| match limit {
                Some(limit) if count >= limit => None,
                _ => count.checked_add(1),
            })
            .map_err(|count| {
                warn!(?discount, count, ?limit, "discount usage limit reached");

                RedemptionError::NoLongerAvailable(discount)
            })?;

        Ok(previous.saturating_add(1))
    }

    fn release(&self, discount: DiscountKey) {
        if let Some(counter) = self.usage.get(discount) {
            let released = counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            });

            if released.is_err() {
                warn!(?discount, "released a discount that had no recorded usage");
            }
        }
    }
}
