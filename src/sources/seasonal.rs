//! Seasonal Campaigns

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::{
    discounts::{CandidateDiscount, CandidateSource, DiscountKind},
    sources::{Candidates, DiscountSource, PricingContext},
};

/// A store-wide percentage off for a window of time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonalCampaign {
    /// Campaign name
    pub name: String,

    /// Percentage points off
    pub percentage: Decimal,

    /// Start of the campaign (inclusive); open if unset
    pub starts_at: Option<Timestamp>,

    /// End of the campaign (inclusive); open if unset
    pub ends_at: Option<Timestamp>,
}

impl SeasonalCampaign {
    /// Whether the campaign runs at `now`.
    pub fn is_running(&self, now: Timestamp) -> bool {
        self.starts_at.is_none_or(|starts_at| starts_at <= now)
            && self.ends_at.is_none_or(|ends_at| ends_at >= now)
    }
}

/// Configured campaigns. Every running campaign is yielded; combination keeps the best.
#[derive(Debug, Clone, Default)]
pub struct SeasonalSource {
    campaigns: Vec<SeasonalCampaign>,
}

impl SeasonalSource {
    /// Create a source over `campaigns`.
    pub fn new(campaigns: impl IntoIterator<Item = SeasonalCampaign>) -> Self {
        Self {
            campaigns: campaigns.into_iter().collect(),
        }
    }
}

impl DiscountSource for SeasonalSource {
    fn kind(&self) -> DiscountKind {
        DiscountKind::Seasonal
    }

    fn resolve(&self, context: &PricingContext<'_, '_>) -> Candidates {
        self.campaigns
            .iter()
            .filter(|campaign| campaign.is_running(context.now))
            .map(|campaign| {
                CandidateDiscount::new(
                    DiscountKind::Seasonal,
                    campaign.percentage,
                    format!("Seasonal: {}", campaign.name),
                    CandidateSource::Campaign(campaign.name.clone()),
                )
            })
            .collect()
    }
}
