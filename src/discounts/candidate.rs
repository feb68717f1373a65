//! Candidate Discounts

use rust_decimal::Decimal;

use crate::{
    categories::CategoryKey,
    discounts::{DiscountKind, DiscountRule, StackingRules, clamp_percent, rule::DiscountKey},
};

/// Where a candidate came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    /// A stored discount rule
    Rule(DiscountKey),

    /// The compounded `discount_percentage` chain of a category
    CategoryHierarchy(CategoryKey),

    /// A configured quantity tier
    VolumeTier {
        /// Quantity the tier starts at
        min_quantity: u32,
    },

    /// A configured time-window campaign
    Campaign(String),

    /// The configured order value threshold
    OrderThreshold,
}

/// A discount proven valid right now, flattened for combination.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateDiscount {
    /// Kind used for stacking decisions
    pub kind: DiscountKind,

    /// Percentage points off, as stored (clamped only when applied)
    pub percentage: Decimal,

    /// Customer-facing description
    pub description: String,

    /// Ordering hint carried over from the rule
    pub priority: i32,

    /// Allow-list carried over from the rule
    pub stacking: Option<StackingRules>,

    /// Provenance
    pub source: CandidateSource,
}

impl CandidateDiscount {
    /// Create a candidate that is not backed by a stored rule.
    pub fn new(
        kind: DiscountKind,
        percentage: Decimal,
        description: impl Into<String>,
        source: CandidateSource,
    ) -> Self {
        Self {
            kind,
            percentage,
            description: description.into(),
            priority: 0,
            stacking: None,
            source,
        }
    }

    /// Flatten a stored rule into a candidate of the given source kind.
    ///
    /// `label` prefixes the rule name when the rule has no description of its own.
    pub fn from_rule(rule: &DiscountRule, kind: DiscountKind, label: &str) -> Self {
        Self {
            kind,
            percentage: rule.percentage,
            description: rule.describe(label),
            priority: rule.priority,
            stacking: rule.stacking_rules.clone(),
            source: CandidateSource::Rule(rule.key),
        }
    }

    /// The backing rule, if any.
    pub fn rule(&self) -> Option<DiscountKey> {
        match self.source {
            CandidateSource::Rule(key) => Some(key),
            _ => None,
        }
    }

    /// Percentage clamped into `[0, 100]`.
    pub fn effective_percentage(&self) -> Decimal {
        clamp_percent(self.percentage)
    }
}
