//! Pricing
//!
//! The [`PricingEngine`] ties the pieces together: it fetches the rules that could apply to a
//! request, runs every [`DiscountSource`] over them, and hands the candidates to the combination
//! resolver. Cart totals reuse the frozen per-item results and only add cart-level discounts.

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    cart::{CartItem, ItemPricer, totals::CartTotals, totals::cart_totals},
    categories::CategoryTree,
    clock::{Clock, SystemClock},
    config::EngineConfig,
    customers::CustomerKey,
    discounts::{
        CandidateDiscount, DiscountRepository, DiscountRule, DiscountTarget, RepositoryError,
    },
    products::Product,
    sources::{
        CategorySource, CustomerSource, DiscountSource, PricingContext, ProductSource,
        RuleSnapshot, SeasonalSource, VolumeSource,
    },
};

pub mod combination;
pub mod stacking;

pub use combination::{PricingResult, TieBreak, best_combination, best_combination_with};
pub use stacking::{AllowListStacking, SameKindExclusion, StackingMode, StackingPolicy};

/// Errors that can occur while pricing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// The rule store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Cart currency differs from the currency the engine's thresholds are set in.
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),
}

/// Prices products and carts against a rule repository.
#[derive(Debug)]
pub struct PricingEngine<'c, R, C = SystemClock> {
    repository: R,
    categories: &'c CategoryTree,
    config: &'c EngineConfig,
    clock: C,
    sources: Vec<Box<dyn DiscountSource + 'c>>,
}

impl<'c, R: DiscountRepository> PricingEngine<'c, R> {
    /// Create an engine reading the system clock.
    pub fn new(repository: R, categories: &'c CategoryTree, config: &'c EngineConfig) -> Self {
        Self::with_clock(repository, categories, config, SystemClock)
    }
}

impl<'c, R: DiscountRepository, C: Clock> PricingEngine<'c, R, C> {
    /// Create an engine with an explicit clock and the default sources.
    pub fn with_clock(
        repository: R,
        categories: &'c CategoryTree,
        config: &'c EngineConfig,
        clock: C,
    ) -> Self {
        let sources: Vec<Box<dyn DiscountSource + 'c>> = vec![
            Box::new(ProductSource),
            Box::new(CategorySource::cached(config.navigation_ttl)),
            Box::new(CustomerSource),
            Box::new(VolumeSource::new(config.volume_tiers.iter().cloned())),
            Box::new(SeasonalSource::new(
                config.seasonal_campaigns.iter().cloned(),
            )),
        ];

        Self {
            repository,
            categories,
            config,
            clock,
            sources,
        }
    }

    /// Register an additional source.
    #[must_use]
    pub fn with_source(mut self, source: impl DiscountSource + 'c) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Registered sources, in resolution order.
    pub fn sources(&self) -> &[Box<dyn DiscountSource + 'c>] {
        &self.sources
    }

    /// The rule repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        self.config
    }

    /// Current instant, according to the engine's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Every candidate valid for `product` right now, before combination.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Repository`] if the rules cannot be fetched.
    pub fn candidates(
        &self,
        product: &Product<'_>,
        quantity: u32,
        customer: Option<CustomerKey>,
    ) -> Result<Vec<CandidateDiscount>, PricingError> {
        let rules = RuleSnapshot::fetch(&self.repository, product, customer)?;

        let context = PricingContext {
            product,
            quantity,
            customer,
            now: self.clock.now(),
            categories: self.categories,
            rules: &rules,
        };

        let mut candidates = Vec::new();

        for source in &self.sources {
            let found = source.resolve(&context);

            trace!(source = %source.kind(), found = found.len(), "resolved discount source");

            candidates.extend(found);
        }

        Ok(candidates)
    }

    /// Price `quantity` units of `product` for `customer`.
    ///
    /// The result is per unit. Usage counters are never touched.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Repository`] if the rules cannot be fetched.
    pub fn price_entity<'a>(
        &self,
        product: &Product<'a>,
        quantity: u32,
        customer: Option<CustomerKey>,
    ) -> Result<PricingResult<'a>, PricingError> {
        if *product.price.amount() <= Decimal::ZERO {
            return Ok(best_combination(&[], product.price));
        }

        let candidates = self.candidates(product, quantity, customer)?;

        let result = best_combination_with(
            &candidates,
            product.price,
            self.config.combination.stacking.policy(),
            self.config.combination.tie_break,
        );

        debug!(
            product = ?product.key,
            quantity,
            ?customer,
            candidates = candidates.len(),
            final_price = %result.final_price,
            "priced product"
        );

        Ok(result)
    }

    /// Totals for `items`, adding the cart-level discounts available to `customer`.
    ///
    /// Item prices are taken from each item's frozen snapshot, not recomputed. Order thresholds
    /// are only meaningful in the configured currency, so other currencies are refused.
    ///
    /// # Errors
    ///
    /// - [`PricingError::CurrencyMismatch`]: `currency` is not the configured currency.
    /// - [`PricingError::Repository`]: the customer's rules cannot be fetched.
    pub fn price_cart<'a>(
        &self,
        items: &[CartItem<'a>],
        customer: Option<CustomerKey>,
        currency: &'a Currency,
    ) -> Result<CartTotals<'a>, PricingError> {
        if currency != self.config.currency {
            return Err(PricingError::CurrencyMismatch(
                self.config.currency.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            ));
        }

        let cart_rules: Vec<DiscountRule> = match customer {
            Some(customer) => self
                .repository
                .rules_for(DiscountTarget::Customer(customer))?
                .into_iter()
                .filter(|rule| rule.kind.is_cart_level())
                .collect(),
            None => Vec::new(),
        };

        Ok(cart_totals(
            items,
            &cart_rules,
            &self.config.cart,
            self.clock.now(),
            currency,
        ))
    }
}

impl<'a, R: DiscountRepository, C: Clock> ItemPricer<'a> for PricingEngine<'_, R, C> {
    fn price_item(
        &self,
        product: &Product<'a>,
        quantity: u32,
        customer: Option<CustomerKey>,
    ) -> Result<PricingResult<'a>, PricingError> {
        self.price_entity(product, quantity, customer)
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }
}
