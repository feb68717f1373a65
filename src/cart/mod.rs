//! Carts
//!
//! A cart belongs to a customer or to a guest. Every line carries a frozen pricing snapshot that
//! is replaced, together with the quantity, each time the line is written. If repricing fails the
//! line is left exactly as it was.

use jiff::{SignedDuration, Timestamp};
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use slotmap::SlotMap;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    customers::CustomerKey,
    discounts::CandidateDiscount,
    pricing::{PricingError, PricingResult},
    products::{Product, ProductKey},
};

pub mod checkout;
pub mod totals;

pub use checkout::{CheckoutError, Order, checkout};
pub use totals::{CartTotals, cart_totals};

/// Errors that can occur while changing a cart.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// Quantities start at one.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// The product is not in the cart.
    #[error("Product {0:?} is not in the cart")]
    ItemNotFound(ProductKey),

    /// The product is not in the catalogue.
    #[error("Product {0:?} not found")]
    ProductNotFound(ProductKey),

    /// Completed carts are read-only.
    #[error("Cart {0} is already completed")]
    Completed(Uuid),

    /// Nothing to check out.
    #[error("Cart {0} is empty")]
    Empty(Uuid),

    /// Only guest carts can be merged into another cart.
    #[error("Cart {0} is not a guest cart")]
    NotGuestCart(Uuid),

    /// Product priced in a different currency to the cart.
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Quantity arithmetic overflowed.
    #[error("Quantity overflow for product {0:?}")]
    QuantityOverflow(ProductKey),

    /// Repricing failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Prices individual cart lines.
pub trait ItemPricer<'a> {
    /// Price one unit of `product`, bought `quantity` at a time, for `customer`.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] when the discount rules cannot be read.
    fn price_item(
        &self,
        product: &Product<'a>,
        quantity: u32,
        customer: Option<CustomerKey>,
    ) -> Result<PricingResult<'a>, PricingError>;

    /// Current instant.
    fn now(&self) -> Timestamp;
}

/// Who a cart belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOwner {
    /// A signed-in customer
    Customer(CustomerKey),

    /// An anonymous session
    Guest(Uuid),
}

impl CartOwner {
    /// A fresh guest identity.
    pub fn guest() -> Self {
        CartOwner::Guest(Uuid::new_v4())
    }

    /// The customer, for customer-owned carts.
    pub fn customer(self) -> Option<CustomerKey> {
        match self {
            CartOwner::Customer(customer) => Some(customer),
            CartOwner::Guest(_) => None,
        }
    }
}

/// Lifecycle state of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartStatus {
    /// Open for changes
    Active,

    /// Checked out; terminal
    Completed,

    /// Open but idle for longer than the abandonment window
    Abandoned,
}

/// A cart line with its frozen pricing snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem<'a> {
    /// Product on this line
    pub product: ProductKey,

    /// Units, at least one
    pub quantity: u32,

    /// List price per unit when the line was last priced
    pub unit_price: Money<'a, Currency>,

    /// Discounted price per unit
    pub discounted_price: Money<'a, Currency>,

    /// Whole percentage points off the unit price
    pub total_discount_percentage: Decimal,

    /// Discounts behind `discounted_price`
    pub applied_discounts: Vec<CandidateDiscount>,
}

impl<'a> CartItem<'a> {
    /// A line priced by `result`.
    pub fn priced(product: ProductKey, quantity: u32, result: PricingResult<'a>) -> Self {
        Self {
            product,
            quantity,
            unit_price: result.original_price,
            discounted_price: result.final_price,
            total_discount_percentage: result.total_discount_percentage,
            applied_discounts: result.applied_discounts,
        }
    }

    pub(crate) fn original_amount(&self) -> Decimal {
        *self.unit_price.amount() * Decimal::from(self.quantity)
    }

    pub(crate) fn subtotal_amount(&self) -> Decimal {
        *self.discounted_price.amount() * Decimal::from(self.quantity)
    }

    /// Discounted price times quantity.
    pub fn subtotal(&self) -> Money<'a, Currency> {
        Money::from_decimal(self.subtotal_amount(), self.discounted_price.currency())
    }

    /// Amount saved on this line.
    pub fn savings(&self) -> Money<'a, Currency> {
        Money::from_decimal(
            self.original_amount() - self.subtotal_amount(),
            self.unit_price.currency(),
        )
    }

    fn reprice(&mut self, quantity: u32, result: PricingResult<'a>) {
        *self = Self::priced(self.product, quantity, result);
    }
}

/// A completed cart's frozen outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion<'a> {
    /// When checkout finished
    pub completed_at: Timestamp,

    /// Amount charged
    pub total: Money<'a, Currency>,
}

/// A shopping cart.
#[derive(Debug, Clone)]
pub struct Cart<'a> {
    id: Uuid,
    owner: CartOwner,
    currency: &'a Currency,
    items: Vec<CartItem<'a>>,
    created_at: Timestamp,
    updated_at: Timestamp,
    completion: Option<Completion<'a>>,
}

impl<'a> Cart<'a> {
    /// Create an empty cart.
    pub fn new(owner: CartOwner, currency: &'a Currency, now: Timestamp) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            currency,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
            completion: None,
        }
    }

    /// Cart id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Owner.
    pub fn owner(&self) -> CartOwner {
        self.owner
    }

    /// Customer, for customer-owned carts.
    pub fn customer(&self) -> Option<CustomerKey> {
        self.owner.customer()
    }

    /// Currency every line is priced in.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }

    /// Lines, in the order they were first added.
    pub fn items(&self) -> &[CartItem<'a>] {
        &self.items
    }

    /// The line for `product`.
    pub fn item(&self, product: ProductKey) -> Option<&CartItem<'a>> {
        self.items.iter().find(|item| item.product == product)
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Creation time.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Last write.
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Outcome of checkout, once completed.
    pub fn completion(&self) -> Option<&Completion<'a>> {
        self.completion.as_ref()
    }

    /// Lifecycle state at `now`.
    pub fn status(&self, now: Timestamp, abandoned_after: SignedDuration) -> CartStatus {
        if self.completion.is_some() {
            CartStatus::Completed
        } else if now.duration_since(self.updated_at) > abandoned_after {
            CartStatus::Abandoned
        } else {
            CartStatus::Active
        }
    }

    /// Put `quantity` units of `product` in the cart, replacing any existing quantity.
    ///
    /// # Errors
    ///
    /// Fails on completed carts, zero quantities, foreign currencies, or when pricing fails.
    pub fn add_item<P: ItemPricer<'a> + ?Sized>(
        &mut self,
        pricer: &P,
        product: &Product<'a>,
        quantity: u32,
    ) -> Result<&CartItem<'a>, CartError> {
        self.ensure_active()?;
        self.ensure_currency(product)?;

        if quantity == 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let result = pricer.price_item(product, quantity, self.customer())?;
        let index = match self.position(product.key) {
            Some(index) => {
                if let Some(item) = self.items.get_mut(index) {
                    item.reprice(quantity, result);
                }

                index
            }
            None => {
                self.items
                    .push(CartItem::priced(product.key, quantity, result));

                self.items.len() - 1
            }
        };

        self.updated_at = pricer.now();

        debug!(cart = %self.id, product = ?product.key, quantity, "set cart line");

        self.items
            .get(index)
            .ok_or(CartError::ItemNotFound(product.key))
    }

    /// Change the quantity of a line already in the cart.
    ///
    /// # Errors
    ///
    /// Fails when the line does not exist, on zero quantities, on completed carts, or when pricing
    /// fails. The line is untouched on failure.
    pub fn update_quantity<P: ItemPricer<'a> + ?Sized>(
        &mut self,
        pricer: &P,
        product: &Product<'a>,
        quantity: u32,
    ) -> Result<&CartItem<'a>, CartError> {
        self.ensure_active()?;

        if self.position(product.key).is_none() {
            return Err(CartError::ItemNotFound(product.key));
        }

        self.add_item(pricer, product, quantity)
    }

    /// Take a line out of the cart.
    ///
    /// # Errors
    ///
    /// Fails on completed carts and when the line does not exist.
    pub fn remove_item(
        &mut self,
        product: ProductKey,
        now: Timestamp,
    ) -> Result<CartItem<'a>, CartError> {
        self.ensure_active()?;

        let index = self
            .position(product)
            .ok_or(CartError::ItemNotFound(product))?;

        let removed = self.items.remove(index);

        self.updated_at = now;

        Ok(removed)
    }

    /// Fold a guest cart into this one, typically on sign-in.
    ///
    /// Quantities of lines present in both carts are summed. Every merged line is repriced for
    /// this cart's owner. Nothing changes unless every merged line prices successfully. Returns
    /// the number of lines merged.
    ///
    /// # Errors
    ///
    /// Fails when `guest` is not a guest cart, either cart is completed, a merged product is
    /// missing from `products`, or pricing fails.
    pub fn merge_guest<P: ItemPricer<'a> + ?Sized>(
        &mut self,
        pricer: &P,
        guest: Cart<'a>,
        products: &SlotMap<ProductKey, Product<'a>>,
    ) -> Result<usize, CartError> {
        self.ensure_active()?;
        guest.ensure_active()?;

        if !matches!(guest.owner, CartOwner::Guest(_)) {
            return Err(CartError::NotGuestCart(guest.id));
        }

        let customer = self.customer();
        let guest_id = guest.id;
        let mut staged = Vec::with_capacity(guest.items.len());

        for guest_item in guest.items {
            let product = products
                .get(guest_item.product)
                .ok_or(CartError::ProductNotFound(guest_item.product))?;

            self.ensure_currency(product)?;

            let quantity = match self.item(guest_item.product) {
                Some(existing) => existing
                    .quantity
                    .checked_add(guest_item.quantity)
                    .ok_or(CartError::QuantityOverflow(guest_item.product))?,
                None => guest_item.quantity,
            };

            let result = pricer.price_item(product, quantity, customer)?;

            staged.push(CartItem::priced(guest_item.product, quantity, result));
        }

        let merged = staged.len();

        for item in staged {
            match self.position(item.product) {
                Some(index) => {
                    if let Some(existing) = self.items.get_mut(index) {
                        *existing = item;
                    }
                }
                None => self.items.push(item),
            }
        }

        self.updated_at = pricer.now();

        info!(cart = %self.id, guest = %guest_id, merged, "merged guest cart");

        Ok(merged)
    }

    pub(crate) fn complete(
        &mut self,
        total: Money<'a, Currency>,
        now: Timestamp,
    ) -> Result<(), CartError> {
        self.ensure_active()?;

        self.completion = Some(Completion {
            completed_at: now,
            total,
        });
        self.updated_at = now;

        Ok(())
    }

    fn position(&self, product: ProductKey) -> Option<usize> {
        self.items.iter().position(|item| item.product == product)
    }

    fn ensure_active(&self) -> Result<(), CartError> {
        if self.completion.is_some() {
            return Err(CartError::Completed(self.id));
        }

        Ok(())
    }

    fn ensure_currency(&self, product: &Product<'a>) -> Result<(), CartError> {
        let found = product.price.currency();

        if found != self.currency {
            return Err(CartError::CurrencyMismatch(
                self.currency.iso_alpha_code.to_string(),
                found.iso_alpha_code.to_string(),
            ));
        }

        Ok(())
    }
}
