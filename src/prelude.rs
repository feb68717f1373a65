//! Pricewise prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{
        Cart, CartError, CartItem, CartOwner, CartStatus, CartTotals, CheckoutError, ItemPricer,
        Order, cart_totals, checkout,
    },
    categories::{
        Category, CategoryError, CategoryKey, CategoryTree, NavigationCache, effective_discount,
        highest_effective_discount,
    },
    clock::{Clock, FixedClock, SystemClock},
    config::{BigSpender, CartConfig, CombinationConfig, ConfigError, EngineConfig},
    customers::{Customer, CustomerKey},
    discounts::{
        CandidateDiscount, CandidateSource, DiscountBook, DiscountKey, DiscountKind,
        DiscountRepository, DiscountRule, DiscountTarget, Redemption, RedemptionError,
        RepositoryError, StackingRules, UsageLedger,
    },
    fixtures::{Fixture, FixtureError},
    pricing::{
        PricingEngine, PricingError, PricingResult, StackingMode, StackingPolicy, TieBreak,
        best_combination,
    },
    products::{Product, ProductKey},
    receipt::{Receipt, ReceiptError},
    sources::{
        CategorySource, CustomerSource, DiscountSource, PricingContext, ProductSource,
        SeasonalCampaign, SeasonalSource, VolumeSource, VolumeTier,
    },
};
