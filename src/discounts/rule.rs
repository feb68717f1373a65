//! Discount Rules

use jiff::Timestamp;
use rust_decimal::Decimal;
use slotmap::new_key_type;
use smallvec::SmallVec;

use crate::discounts::{DiscountKind, DiscountTarget};

new_key_type! {
    /// Discount Key
    pub struct DiscountKey;
}

/// Allow-list of discount kinds a rule may be combined with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackingRules {
    allowed_kinds: SmallVec<[DiscountKind; 4]>,
}

impl StackingRules {
    /// Allow stacking with exactly the given kinds.
    pub fn allowing(kinds: impl IntoIterator<Item = DiscountKind>) -> Self {
        Self {
            allowed_kinds: kinds.into_iter().collect(),
        }
    }

    /// Whether a discount of `kind` may coexist with the owner of these rules.
    pub fn permits(&self, kind: &DiscountKind) -> bool {
        self.allowed_kinds.contains(kind)
    }

    /// Kinds on the allow-list.
    pub fn allowed_kinds(&self) -> &[DiscountKind] {
        &self.allowed_kinds
    }
}

/// A discount rule snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountRule {
    /// Rule key, assigned by the [`DiscountBook`](crate::discounts::DiscountBook)
    pub key: DiscountKey,

    /// Rule name
    pub name: String,

    /// Customer-facing description
    pub description: Option<String>,

    /// Percentage points off, expected within `[0, 100]`
    pub percentage: Decimal,

    /// Type tag
    pub kind: DiscountKind,

    /// Owning entity
    pub target: DiscountTarget,

    /// Start of the validity window (inclusive)
    pub starts_at: Option<Timestamp>,

    /// End of the validity window (inclusive)
    pub ends_at: Option<Timestamp>,

    /// Manual on/off switch, independent of the window
    pub is_active: bool,

    /// Ordering hint
    pub priority: i32,

    /// Kinds this rule may stack with; `None` stacks with everything
    pub stacking_rules: Option<StackingRules>,

    /// Maximum number of redemptions
    pub usage_limit: Option<u32>,

    /// Redemptions so far
    pub usage_count: u32,

    /// Cart subtotal required before a cart-level rule applies
    pub minimum_order_amount: Option<Decimal>,

    /// Reserved: cap on the amount taken off. Not consulted by the engine.
    pub maximum_discount_amount: Option<Decimal>,

    /// Line quantity required before a volume rule applies
    pub minimum_quantity: Option<u32>,
}

impl DiscountRule {
    /// Create an active, unbounded rule with no usage cap.
    pub fn new(
        name: impl Into<String>,
        kind: DiscountKind,
        percentage: Decimal,
        target: DiscountTarget,
    ) -> Self {
        Self {
            key: DiscountKey::default(),
            name: name.into(),
            description: None,
            percentage,
            kind,
            target,
            starts_at: None,
            ends_at: None,
            is_active: true,
            priority: 0,
            stacking_rules: None,
            usage_limit: None,
            usage_count: 0,
            minimum_order_amount: None,
            maximum_discount_amount: None,
            minimum_quantity: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Bound the validity window.
    #[must_use]
    pub fn valid_between(mut self, starts_at: Option<Timestamp>, ends_at: Option<Timestamp>) -> Self {
        self.starts_at = starts_at;
        self.ends_at = ends_at;
        self
    }

    /// Set the priority hint.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Restrict what this rule stacks with.
    #[must_use]
    pub fn with_stacking_rules(mut self, rules: StackingRules) -> Self {
        self.stacking_rules = Some(rules);
        self
    }

    /// Cap the number of redemptions.
    #[must_use]
    pub fn with_usage_limit(mut self, limit: u32) -> Self {
        self.usage_limit = Some(limit);
        self
    }

    /// Record redemptions that already happened.
    #[must_use]
    pub fn with_usage_count(mut self, count: u32) -> Self {
        self.usage_count = count;
        self
    }

    /// Require a minimum cart subtotal.
    #[must_use]
    pub fn with_minimum_order_amount(mut self, amount: Decimal) -> Self {
        self.minimum_order_amount = Some(amount);
        self
    }

    /// Require a minimum line quantity.
    #[must_use]
    pub fn with_minimum_quantity(mut self, quantity: u32) -> Self {
        self.minimum_quantity = Some(quantity);
        self
    }

    /// Switch the rule off.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Whether `now` falls inside the validity window. Both bounds are inclusive.
    pub fn within_window(&self, now: Timestamp) -> bool {
        self.starts_at.is_none_or(|starts_at| starts_at <= now)
            && self.ends_at.is_none_or(|ends_at| ends_at >= now)
    }

    /// Whether the usage cap still allows a redemption.
    pub fn has_capacity(&self) -> bool {
        self.usage_limit
            .is_none_or(|limit| self.usage_count < limit)
    }

    /// Whether the rule may be applied at `now`.
    pub fn is_valid(&self, now: Timestamp) -> bool {
        self.is_active && self.within_window(now) && self.has_capacity()
    }

    /// Whether this rule's allow-list admits `other`.
    ///
    /// Rules without stacking rules stack with everything.
    pub fn can_stack_with(&self, other: &DiscountRule) -> bool {
        self.stacking_rules
            .as_ref()
            .is_none_or(|rules| rules.permits(&other.kind))
    }

    /// Whether the rule's own gating admits a cart subtotal.
    pub fn admits_subtotal(&self, subtotal: Decimal) -> bool {
        self.minimum_order_amount
            .is_none_or(|minimum| subtotal >= minimum)
    }

    /// Whether the rule's own gating admits a line quantity.
    pub fn admits_quantity(&self, quantity: u32) -> bool {
        self.minimum_quantity
            .is_none_or(|minimum| quantity >= minimum)
    }

    /// The description, or `"{label}: {name}"` when there is none.
    pub fn describe(&self, label: &str) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("{label}: {}", self.name))
    }
}
