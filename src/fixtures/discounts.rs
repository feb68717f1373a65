//! Discount Fixtures

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    discounts::{DiscountKind, DiscountRule, DiscountTarget, StackingRules},
    fixtures::FixtureError,
    utils::{parse_amount, parse_percentage},
};

/// Wrapper for discounts in YAML
#[derive(Debug, Deserialize)]
pub struct DiscountsFixture {
    /// Map of discount key -> discount fixture
    pub discounts: FxHashMap<String, DiscountFixture>,
}

/// Owner of a discount, named by fixture key
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFixture {
    /// Product key
    Product(String),

    /// Category key
    Category(String),

    /// Customer key
    Customer(String),
}

/// Discount fixture from YAML
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscountFixture {
    /// Rule name
    pub name: String,

    /// Display text
    #[serde(default)]
    pub description: Option<String>,

    /// Discount type tag (e.g., "product", "seasonal")
    #[serde(rename = "type")]
    pub kind: String,

    /// Percentage (e.g., "15%")
    pub percentage: String,

    /// Owning entity
    #[serde(with = "serde_norway::with::singleton_map")]
    pub target: TargetFixture,

    /// Start of the validity window
    #[serde(default)]
    pub starts_at: Option<Timestamp>,

    /// End of the validity window
    #[serde(default)]
    pub ends_at: Option<Timestamp>,

    /// Active flag
    #[serde(default = "active_by_default")]
    pub active: bool,

    /// Priority hint
    #[serde(default)]
    pub priority: i32,

    /// Maximum redemptions
    #[serde(default)]
    pub usage_limit: Option<u32>,

    /// Redemptions so far
    #[serde(default)]
    pub usage_count: u32,

    /// Minimum cart subtotal (e.g., "100.00")
    #[serde(default)]
    pub minimum_order_amount: Option<String>,

    /// Stored but not enforced
    #[serde(default)]
    pub maximum_discount_amount: Option<String>,

    /// Minimum line quantity
    #[serde(default)]
    pub minimum_quantity: Option<u32>,

    /// Kinds this rule may stack with; absent means any
    #[serde(default)]
    pub stacks_with: Option<Vec<String>>,
}

fn active_by_default() -> bool {
    true
}

impl DiscountFixture {
    /// Convert to a [`DiscountRule`] owned by `target`
    ///
    /// # Errors
    ///
    /// Returns an error if the percentage or an amount is invalid.
    pub fn try_into_rule(self, target: DiscountTarget) -> Result<DiscountRule, FixtureError> {
        let mut rule = DiscountRule::new(
            self.name,
            DiscountKind::from(self.kind.as_str()),
            parse_percentage(&self.percentage)?,
            target,
        )
        .valid_between(self.starts_at, self.ends_at)
        .with_priority(self.priority)
        .with_usage_count(self.usage_count);

        rule.description = self.description;
        rule.is_active = self.active;
        rule.usage_limit = self.usage_limit;
        rule.minimum_quantity = self.minimum_quantity;
        rule.minimum_order_amount = self
            .minimum_order_amount
            .as_deref()
            .map(parse_amount)
            .transpose()?;
        rule.maximum_discount_amount = self
            .maximum_discount_amount
            .as_deref()
            .map(parse_amount)
            .transpose()?;
        rule.stacking_rules = self.stacks_with.map(|kinds| {
            StackingRules::allowing(kinds.iter().map(|kind| DiscountKind::from(kind.as_str())))
        });

        Ok(rule)
    }
}
