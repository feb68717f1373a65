//! Engine Configuration
//!
//! Loaded from YAML. Every section is optional; anything left out falls back to the defaults in
//! [`EngineConfig::default`].
//!
//! ```yaml
//! currency: GBP
//! combination:
//!   tie_break: stable        # or: priority
//!   stacking: same_kind      # or: allow_list
//! cart:
//!   abandoned_after: 24h
//!   big_spender:
//!     threshold: "500.00"
//!     percentage: 15%
//! navigation:
//!   ttl: 1h
//! ```

use std::{fs, path::Path};

use jiff::{SignedDuration, Timestamp};
use rust_decimal::Decimal;
use rusty_money::iso::{Currency, GBP};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    pricing::{StackingMode, TieBreak},
    sources::{SeasonalCampaign, VolumeTier},
    utils::{ValueError, parse_amount, parse_currency, parse_percentage},
};

/// Configuration Errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the configuration file
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid value
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Durations must be positive
    #[error("{field} must be a positive duration, got {value}")]
    NonPositiveDuration {
        /// Offending setting
        field: &'static str,
        /// Value supplied
        value: SignedDuration,
    },
}

/// How candidate discounts are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CombinationConfig {
    /// Order among equal percentages
    pub tie_break: TieBreak,

    /// Stacking policy
    pub stacking: StackingMode,
}

/// The built-in cart-level order value discount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigSpender {
    /// Name shown on receipts
    pub name: String,

    /// Subtotal at which the discount starts to apply (inclusive)
    pub threshold: Decimal,

    /// Percentage points off the subtotal
    pub percentage: Decimal,
}

impl Default for BigSpender {
    fn default() -> Self {
        Self {
            name: "Big Spender Discount".to_string(),
            threshold: Decimal::from(500),
            percentage: Decimal::from(15),
        }
    }
}

/// Cart-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartConfig {
    /// Order value discount; `None` disables it
    pub big_spender: Option<BigSpender>,

    /// Idle time after which an open cart counts as abandoned
    pub abandoned_after: SignedDuration,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            big_spender: Some(BigSpender::default()),
            abandoned_after: SignedDuration::from_hours(24),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Currency prices and thresholds are expressed in
    pub currency: &'static Currency,

    /// Combination settings
    pub combination: CombinationConfig,

    /// Cart settings
    pub cart: CartConfig,

    /// Lifetime of cached navigation menus and effective category discounts
    pub navigation_ttl: SignedDuration,

    /// Quantity breaks
    pub volume_tiers: Vec<VolumeTier>,

    /// Time-window campaigns
    pub seasonal_campaigns: Vec<SeasonalCampaign>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            currency: GBP,
            combination: CombinationConfig::default(),
            cart: CartConfig::default(),
            navigation_ttl: SignedDuration::from_hours(1),
            volume_tiers: Vec::new(),
            seasonal_campaigns: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds invalid values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_yaml(&contents)?;

        debug!(path = %path.display(), "loaded engine configuration");

        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed or holds invalid values.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawEngineConfig = serde_norway::from_str(contents)?;

        raw.try_into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEngineConfig {
    currency: Option<String>,

    #[serde(default)]
    combination: RawCombination,

    #[serde(default)]
    cart: RawCart,

    #[serde(default)]
    navigation: RawNavigation,

    #[serde(default)]
    volume_tiers: Vec<RawVolumeTier>,

    #[serde(default)]
    seasonal_campaigns: Vec<RawCampaign>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCombination {
    #[serde(default)]
    tie_break: TieBreak,

    #[serde(default)]
    stacking: StackingMode,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCart {
    abandoned_after: Option<SignedDuration>,
    big_spender: Option<RawBigSpender>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBigSpender {
    #[serde(default = "enabled")]
    enabled: bool,
    name: Option<String>,
    threshold: Option<String>,
    percentage: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNavigation {
    ttl: Option<SignedDuration>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVolumeTier {
    min_quantity: u32,
    percentage: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCampaign {
    name: String,
    percentage: String,
    starts_at: Option<Timestamp>,
    ends_at: Option<Timestamp>,
}

fn enabled() -> bool {
    true
}

fn positive(field: &'static str, value: SignedDuration) -> Result<SignedDuration, ConfigError> {
    if value.is_positive() {
        Ok(value)
    } else {
        Err(ConfigError::NonPositiveDuration { field, value })
    }
}

impl RawBigSpender {
    fn into_big_spender(self) -> Result<Option<BigSpender>, ConfigError> {
        if !self.enabled {
            return Ok(None);
        }

        let defaults = BigSpender::default();

        Ok(Some(BigSpender {
            name: self.name.unwrap_or(defaults.name),
            threshold: self
                .threshold
                .as_deref()
                .map(parse_amount)
                .transpose()?
                .unwrap_or(defaults.threshold),
            percentage: self
                .percentage
                .as_deref()
                .map(parse_percentage)
                .transpose()?
                .unwrap_or(defaults.percentage),
        }))
    }
}

impl TryFrom<RawVolumeTier> for VolumeTier {
    type Error = ConfigError;

    fn try_from(raw: RawVolumeTier) -> Result<Self, Self::Error> {
        let percentage = parse_percentage(&raw.percentage)?;

        Ok(VolumeTier {
            min_quantity: raw.min_quantity,
            percentage,
            description: raw
                .description
                .unwrap_or_else(|| format!("Volume: {}+ units", raw.min_quantity)),
        })
    }
}

impl TryFrom<RawCampaign> for SeasonalCampaign {
    type Error = ConfigError;

    fn try_from(raw: RawCampaign) -> Result<Self, Self::Error> {
        Ok(SeasonalCampaign {
            percentage: parse_percentage(&raw.percentage)?,
            name: raw.name,
            starts_at: raw.starts_at,
            ends_at: raw.ends_at,
        })
    }
}

impl TryFrom<RawEngineConfig> for EngineConfig {
    type Error = ConfigError;

    fn try_from(raw: RawEngineConfig) -> Result<Self, Self::Error> {
        let defaults = EngineConfig::default();

        let currency = match raw.currency.as_deref() {
            Some(code) => parse_currency(code)?,
            None => defaults.currency,
        };

        let big_spender = match raw.cart.big_spender {
            Some(big_spender) => big_spender.into_big_spender()?,
            None => defaults.cart.big_spender,
        };

        let abandoned_after = match raw.cart.abandoned_after {
            Some(duration) => positive("cart.abandoned_after", duration)?,
            None => defaults.cart.abandoned_after,
        };

        let navigation_ttl = match raw.navigation.ttl {
            Some(duration) => positive("navigation.ttl", duration)?,
            None => defaults.navigation_ttl,
        };

        Ok(EngineConfig {
            currency,
            combination: CombinationConfig {
                tie_break: raw.combination.tie_break,
                stacking: raw.combination.stacking,
            },
            cart: CartConfig {
                big_spender,
                abandoned_after,
            },
            navigation_ttl,
            volume_tiers: raw
                .volume_tiers
                .into_iter()
                .map(VolumeTier::try_from)
                .collect::<Result<_, _>>()?,
            seasonal_campaigns: raw
                .seasonal_campaigns
                .into_iter()
                .map(SeasonalCampaign::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rusty_money::iso::EUR;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn empty_document_yields_defaults() -> TestResult {
        let config = EngineConfig::from_yaml("{}")?;

        assert_eq!(config, EngineConfig::default());
        assert_eq!(
            config.cart.big_spender.map(|b| (b.threshold, b.percentage)),
            Some((Decimal::from(500), Decimal::from(15)))
        );

        Ok(())
    }

    #[test]
    fn sections_override_defaults() -> TestResult {
        let config = EngineConfig::from_yaml(
            r#"
currency: EUR
combination:
  tie_break: priority
  stacking: allow_list
cart:
  abandoned_after: 2h
  big_spender:
    threshold: "250.00"
    percentage: 10%
navigation:
  ttl: 5m
volume_tiers:
  - min_quantity: 10
    percentage: 5%
seasonal_campaigns:
  - name: Winter Sale
    percentage: "20"
    starts_at: "2026-12-01T00:00:00Z"
    ends_at: "2026-12-31T23:59:59Z"
"#,
        )?;

        assert_eq!(config.currency, EUR);
        assert_eq!(config.combination.tie_break, TieBreak::Priority);
        assert_eq!(config.combination.stacking, StackingMode::AllowList);
        assert_eq!(config.cart.abandoned_after, SignedDuration::from_hours(2));
        assert_eq!(config.navigation_ttl, SignedDuration::from_mins(5));

        let big_spender = config.cart.big_spender.ok_or("big spender disabled")?;

        assert_eq!(big_spender.threshold, Decimal::from(250));
        assert_eq!(big_spender.percentage, Decimal::from(10));
        assert_eq!(big_spender.name, "Big Spender Discount");

        assert_eq!(
            config.volume_tiers,
            vec![VolumeTier {
                min_quantity: 10,
                percentage: Decimal::from(5),
                description: "Volume: 10+ units".to_string(),
            }]
        );

        assert_eq!(config.seasonal_campaigns.len(), 1);

        Ok(())
    }

    #[test]
    fn big_spender_can_be_disabled() -> TestResult {
        let config = EngineConfig::from_yaml("cart:\n  big_spender:\n    enabled: false\n")?;

        assert_eq!(config.cart.big_spender, None);

        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            EngineConfig::from_yaml("currency: XYZ"),
            Err(ConfigError::Value(ValueError::UnknownCurrency(_)))
        ));

        assert!(matches!(
            EngineConfig::from_yaml("cart:\n  big_spender:\n    percentage: 150%\n"),
            Err(ConfigError::Value(ValueError::InvalidPercentage(_)))
        ));

        assert!(matches!(
            EngineConfig::from_yaml("navigation:\n  ttl: 0s\n"),
            Err(ConfigError::NonPositiveDuration { .. })
        ));

        assert!(matches!(
            EngineConfig::from_yaml("unknown: true"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn load_reads_from_disk() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;

        writeln!(file, "currency: USD")?;

        let config = EngineConfig::load(file.path())?;

        assert_eq!(config.currency.iso_alpha_code, "USD");

        Ok(())
    }
}
