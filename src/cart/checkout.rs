//! Checkout
//!
//! Checkout prices the cart one last time, consumes one use of every rule-backed discount it
//! applied, and freezes the total. A rule applied to several lines is still one use per order. Redemptions are all-or-nothing: if any rule cannot be redeemed
//! (typically because a concurrent checkout took its last use) every redemption made so far is
//! released and the cart stays open, so the caller can reprice and try again.

use jiff::Timestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    cart::{Cart, CartError, CartItem, CartTotals},
    clock::Clock,
    customers::CustomerKey,
    discounts::{
        CandidateDiscount, DiscountKey, DiscountRepository, Redemption, RedemptionError,
        UsageLedger, clamp_percent, round_money,
    },
    pricing::{PricingEngine, PricingError},
    products::ProductKey,
};

/// Errors that can occur during checkout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// The cart cannot be checked out.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Totals could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// An applied discount could not be redeemed; nothing was redeemed and the cart is unchanged.
    #[error("Discount {discount:?} is no longer available")]
    DiscountUnavailable {
        /// The rule that failed
        discount: DiscountKey,

        /// Why it failed
        #[source]
        source: RedemptionError,
    },
}

/// A completed order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order<'a> {
    /// Cart the order was placed from
    pub cart: Uuid,

    /// Customer who placed it, if signed in
    pub customer: Option<CustomerKey>,

    /// Totals charged
    pub totals: CartTotals<'a>,

    /// Redemptions recorded for the applied rules
    pub redemptions: Vec<Redemption>,

    /// When the order completed
    pub completed_at: Timestamp,
}

#[derive(Debug)]
struct PlannedRedemption {
    discount: DiscountKey,
    candidate: CandidateDiscount,
    amount_saved: Decimal,
    product: Option<ProductKey>,
}

/// Check out `cart`, redeeming every rule-backed discount it applies once.
///
/// Each line a rule applied to gets its own [`Redemption`] record; they share one use.
///
/// # Errors
///
/// - [`CheckoutError::Cart`]: the cart is completed or empty.
/// - [`CheckoutError::Pricing`]: the cart-level rules could not be read.
/// - [`CheckoutError::DiscountUnavailable`]: a rule could not be redeemed. Earlier redemptions
///   from this checkout have been released.
pub fn checkout<'a, R, C, L>(
    engine: &PricingEngine<'_, R, C>,
    ledger: &L,
    cart: &mut Cart<'a>,
) -> Result<Order<'a>, CheckoutError>
where
    R: DiscountRepository,
    C: Clock,
    L: UsageLedger + ?Sized,
{
    if cart.completion().is_some() {
        return Err(CartError::Completed(cart.id()).into());
    }

    if cart.is_empty() {
        return Err(CartError::Empty(cart.id()).into());
    }

    let customer = cart.customer();
    let totals = engine.price_cart(cart.items(), customer, cart.currency())?;
    let now = engine.now();

    let plan = plan_redemptions(cart.items(), &totals);
    let mut redemptions: Vec<Redemption> = Vec::with_capacity(plan.len());
    let mut redeemed: FxHashMap<DiscountKey, u32> = FxHashMap::default();

    for planned in plan {
        let usage_count = match redeemed.get(&planned.discount).copied() {
            Some(usage_count) => usage_count,
            None => match ledger.redeem(planned.discount, now) {
                Ok(usage_count) => {
                    redeemed.insert(planned.discount, usage_count);

                    usage_count
                }
                Err(source) => {
                    for discount in redeemed.keys() {
                        ledger.release(*discount);
                    }

                    warn!(
                        cart = %cart.id(),
                        discount = ?planned.discount,
                        released = redeemed.len(),
                        %source,
                        "checkout rolled back"
                    );

                    return Err(CheckoutError::DiscountUnavailable {
                        discount: planned.discount,
                        source,
                    });
                }
            },
        };

        redemptions.push(Redemption {
            discount: planned.discount,
            kind: planned.candidate.kind,
            percentage_applied: clamp_percent(planned.candidate.percentage),
            amount_saved: planned.amount_saved,
            product: planned.product,
            customer,
            usage_count,
            redeemed_at: now,
        });
    }

    cart.complete(totals.final_total, now)?;

    info!(
        cart = %cart.id(),
        ?customer,
        total = %totals.final_total,
        redemptions = redemptions.len(),
        "order completed"
    );

    Ok(Order {
        cart: cart.id(),
        customer,
        totals,
        redemptions,
        completed_at: now,
    })
}

/// One entry per rule-backed discount application, with the amount it took off.
///
/// Each discount saves its percentage of whatever the discounts before it left.
fn plan_redemptions(items: &[CartItem<'_>], totals: &CartTotals<'_>) -> Vec<PlannedRedemption> {
    let mut plan = Vec::new();

    for item in items {
        let mut running = *item.unit_price.amount() * Decimal::from(item.quantity);

        for candidate in &item.applied_discounts {
            let saved = running * clamp_percent(candidate.percentage) / Decimal::ONE_HUNDRED;

            running -= saved;

            if let Some(discount) = candidate.rule() {
                plan.push(PlannedRedemption {
                    discount,
                    candidate: candidate.clone(),
                    amount_saved: round_money(saved),
                    product: Some(item.product),
                });
            }
        }
    }

    let mut running = *totals.subtotal.amount();

    for candidate in &totals.cart_discounts {
        let saved = running * clamp_percent(candidate.percentage) / Decimal::ONE_HUNDRED;

        running -= saved;

        if let Some(discount) = candidate.rule() {
            plan.push(PlannedRedemption {
                discount,
                candidate: candidate.clone(),
                amount_saved: round_money(saved),
                product: None,
            });
        }
    }

    plan
}
