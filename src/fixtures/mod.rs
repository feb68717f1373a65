//! Fixtures
//!
//! YAML fixture sets for tests and demos. A set named `storefront` is spread over
//! `<base>/categories/storefront.yml`, `<base>/customers/storefront.yml`,
//! `<base>/products/storefront.yml`, `<base>/discounts/storefront.yml` and
//! `<base>/carts/storefront.yml`. Entities refer to each other by their fixture keys.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use slotmap::SlotMap;
use thiserror::Error;

use crate::{
    cart::{Cart, CartError, CartOwner, ItemPricer},
    categories::{Category, CategoryError, CategoryKey, CategoryTree},
    customers::{Customer, CustomerKey},
    discounts::{DiscountBook, DiscountKey, DiscountTarget},
    fixtures::{
        carts::CartFixture,
        categories::CategoriesFixture,
        customers::CustomersFixture,
        discounts::{DiscountsFixture, TargetFixture},
        products::ProductsFixture,
    },
    products::{Product, ProductKey},
    utils::{ValueError, parse_price},
};

pub mod carts;
pub mod categories;
pub mod customers;
pub mod discounts;
pub mod products;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price, amount or percentage
    #[error(transparent)]
    Value(#[from] ValueError),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Category not found
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// Customer not found
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Discount not found
    #[error("Discount not found: {0}")]
    DiscountNotFound(String),

    /// Currency mismatch between products
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No products loaded yet
    #[error("No products loaded yet; currency unknown")]
    NoCurrency,

    /// No cart loaded
    #[error("No cart loaded")]
    NoCart,

    /// Category tree rejected a fixture
    #[error(transparent)]
    Category(#[from] CategoryError),

    /// Cart rejected a fixture line
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Stores with generated keys
    product_meta: SlotMap<ProductKey, Product<'a>>,
    customer_meta: SlotMap<CustomerKey, Customer>,
    categories: CategoryTree,
    discounts: DiscountBook,

    /// String key -> `SlotMap` key mappings for lookups
    product_keys: FxHashMap<String, ProductKey>,
    customer_keys: FxHashMap<String, CustomerKey>,
    category_keys: FxHashMap<String, CategoryKey>,
    discount_keys: FxHashMap<String, DiscountKey>,

    /// Cart lines, in fixture order
    cart: Option<(Option<CustomerKey>, Vec<(ProductKey, u32)>)>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl<'a> Fixture<'a> {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            product_meta: SlotMap::with_key(),
            customer_meta: SlotMap::with_key(),
            categories: CategoryTree::new(),
            discounts: DiscountBook::new(),
            product_keys: FxHashMap::default(),
            customer_keys: FxHashMap::default(),
            category_keys: FxHashMap::default(),
            discount_keys: FxHashMap::default(),
            cart: None,
            currency: None,
        }
    }

    fn read<T: serde::de::DeserializeOwned>(&self, kind: &str, name: &str) -> Result<T, FixtureError> {
        let file_path = self.base_path.join(kind).join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        Ok(serde_norway::from_str(&contents)?)
    }

    /// Load categories from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if a percentage is invalid, or if a
    /// parent is not defined before its children.
    pub fn load_categories(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: CategoriesFixture = self.read("categories", name)?;

        for category_fixture in &fixture.categories {
            let parent = category_fixture
                .parent
                .as_deref()
                .map(|parent| self.category_key(parent))
                .transpose()?;

            let category = Category::try_from(category_fixture)?;
            let key = self.categories.insert(category, parent)?;

            self.category_keys.insert(category_fixture.key.clone(), key);
        }

        Ok(self)
    }

    /// Load customers from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_customers(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: CustomersFixture = self.read("customers", name)?;

        for (key, customer_fixture) in fixture.customers {
            let customer_key = self.customer_meta.insert(customer_fixture.into());

            self.customer_keys.insert(key, customer_key);
        }

        Ok(self)
    }

    /// Load products from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if there are currency mismatches,
    /// or if a product names an unknown category.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: ProductsFixture = self.read("products", name)?;

        for (key, product_fixture) in fixture.products {
            let price = parse_price(&product_fixture.price)?;
            let currency = price.currency();

            // Validate currency consistency
            if let Some(existing_currency) = self.currency {
                if existing_currency != currency {
                    return Err(FixtureError::CurrencyMismatch(
                        existing_currency.iso_alpha_code.to_string(),
                        currency.iso_alpha_code.to_string(),
                    ));
                }
            } else {
                self.currency = Some(currency);
            }

            let categories = product_fixture
                .categories
                .iter()
                .map(|category| self.category_key(category))
                .collect::<Result<Vec<_>, _>>()?;

            let product_key = self.product_meta.insert_with_key(|product_key| {
                Product::new(product_key, product_fixture.name, price).in_categories(categories)
            });

            self.product_keys.insert(key, product_key);
        }

        Ok(self)
    }

    /// Load discounts from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if a value is invalid, or if a
    /// discount's target has not been loaded.
    pub fn load_discounts(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: DiscountsFixture = self.read("discounts", name)?;

        for (key, discount_fixture) in fixture.discounts {
            let target = match &discount_fixture.target {
                TargetFixture::Product(product) => {
                    DiscountTarget::Product(self.product_key(product)?)
                }
                TargetFixture::Category(category) => {
                    DiscountTarget::Category(self.category_key(category)?)
                }
                TargetFixture::Customer(customer) => {
                    DiscountTarget::Customer(self.customer_key(customer)?)
                }
            };

            let discount_key = self
                .discounts
                .insert(discount_fixture.try_into_rule(target)?);

            self.discount_keys.insert(key, discount_key);
        }

        Ok(self)
    }

    /// Load a cart from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if it names an unknown product
    /// or customer.
    pub fn load_cart(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: CartFixture = self.read("carts", name)?;

        let customer = fixture
            .customer
            .as_deref()
            .map(|customer| self.customer_key(customer))
            .transpose()?;

        let lines = fixture
            .items
            .iter()
            .map(|line| Ok((self.product_key(&line.product)?, line.quantity)))
            .collect::<Result<Vec<_>, FixtureError>>()?;

        self.cart = Some((customer, lines));

        Ok(self)
    }

    /// Load a complete fixture set (every kind with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture
            .load_categories(name)?
            .load_customers(name)?
            .load_products(name)?
            .load_discounts(name)?
            .load_cart(name)?;

        Ok(fixture)
    }

    /// Build the loaded cart, pricing every line with `pricer`
    ///
    /// `customer` overrides the cart fixture's owner; pass `None` to keep it.
    ///
    /// # Errors
    ///
    /// Returns an error if no cart or currency is loaded, or if a line cannot be priced.
    pub fn cart<P: ItemPricer<'a> + ?Sized>(
        &self,
        pricer: &P,
        customer: Option<CustomerKey>,
    ) -> Result<Cart<'a>, FixtureError> {
        let currency = self.currency()?;
        let (owner, lines) = self.cart.as_ref().ok_or(FixtureError::NoCart)?;

        let owner = match customer.or(*owner) {
            Some(customer) => CartOwner::Customer(customer),
            None => CartOwner::guest(),
        };

        let mut cart = Cart::new(owner, currency, pricer.now());

        for (product_key, quantity) in lines {
            let product = self
                .product_meta
                .get(*product_key)
                .ok_or_else(|| FixtureError::ProductNotFound(format!("{product_key:?}")))?;

            cart.add_item(pricer, product, *quantity)?;
        }

        Ok(cart)
    }

    /// Get a product by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, key: &str) -> Result<&Product<'a>, FixtureError> {
        self.product_meta
            .get(self.product_key(key)?)
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get a product key by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product_key(&self, key: &str) -> Result<ProductKey, FixtureError> {
        self.product_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get a category key by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the category is not found.
    pub fn category_key(&self, key: &str) -> Result<CategoryKey, FixtureError> {
        self.category_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::CategoryNotFound(key.to_string()))
    }

    /// Get a customer key by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the customer is not found.
    pub fn customer_key(&self, key: &str) -> Result<CustomerKey, FixtureError> {
        self.customer_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::CustomerNotFound(key.to_string()))
    }

    /// Get a customer by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the customer is not found.
    pub fn customer(&self, key: &str) -> Result<&Customer, FixtureError> {
        self.customer_meta
            .get(self.customer_key(key)?)
            .ok_or_else(|| FixtureError::CustomerNotFound(key.to_string()))
    }

    /// Get a discount key by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the discount is not found.
    pub fn discount_key(&self, key: &str) -> Result<DiscountKey, FixtureError> {
        self.discount_keys
            .get(key)
            .copied()
            .ok_or_else(|| FixtureError::DiscountNotFound(key.to_string()))
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no products have been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }

    /// Get the category tree
    pub fn categories(&self) -> &CategoryTree {
        &self.categories
    }

    /// Get the category tree for editing
    pub fn categories_mut(&mut self) -> &mut CategoryTree {
        &mut self.categories
    }

    /// Get the discount book
    pub fn discounts(&self) -> &DiscountBook {
        &self.discounts
    }

    /// Get the product metadata `SlotMap`
    pub fn product_meta_map(&self) -> &SlotMap<ProductKey, Product<'a>> {
        &self.product_meta
    }

    /// Get the customer metadata `SlotMap`
    pub fn customer_meta_map(&self) -> &SlotMap<CustomerKey, Customer> {
        &self.customer_meta
    }
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::new()
    }
}
