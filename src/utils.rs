//! Utils

use clap::Parser;
use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, USD},
};
use thiserror::Error;

/// Arguments for the storefront example
#[derive(Debug, Parser)]
pub struct ExampleStorefrontArgs {
    /// Fixture set to load products, categories, customers and discounts from
    #[clap(short, long, default_value = "storefront")]
    pub fixture: String,

    /// Customer to price for; guests when omitted
    #[clap(short, long)]
    pub customer: Option<String>,

    /// Engine configuration file
    #[clap(long, default_value = "./fixtures/config.yml")]
    pub config: String,

    /// Complete the order after pricing, redeeming the applied discounts
    #[clap(long)]
    pub checkout: bool,
}

/// Value parsing errors shared by configuration and fixtures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid amount format
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid percentage format
    #[error("Invalid percentage: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Parse an ISO currency code.
///
/// # Errors
///
/// Returns [`ValueError::UnknownCurrency`] for anything but `GBP`, `USD` and `EUR`.
pub fn parse_currency(code: &str) -> Result<&'static Currency, ValueError> {
    match code.trim() {
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        other => Err(ValueError::UnknownCurrency(other.to_string())),
    }
}

/// Parse a plain decimal amount such as `"500.00"`.
///
/// # Errors
///
/// Returns [`ValueError::InvalidAmount`] if the string is not a decimal number.
pub fn parse_amount(s: &str) -> Result<Decimal, ValueError> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|_err| ValueError::InvalidAmount(s.to_string()))
}

/// Parse a price string (e.g. `"2.99 GBP"`).
///
/// # Errors
///
/// Returns an error if the string is not `AMOUNT CURRENCY` or the currency is unknown.
pub fn parse_price(s: &str) -> Result<Money<'static, Currency>, ValueError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ValueError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| ValueError::InvalidPrice(s.to_string()))?;

    Ok(Money::from_decimal(amount, parse_currency(code)?))
}

/// Parse a percentage into percent points.
///
/// Accepts `"15%"` and `"15"` alike; both mean fifteen percent. The result must lie within
/// `[0, 100]`.
///
/// # Errors
///
/// Returns [`ValueError::InvalidPercentage`] if the string is not a number or is out of range.
pub fn parse_percentage(s: &str) -> Result<Decimal, ValueError> {
    let trimmed = s.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();

    let percentage = number
        .parse::<Decimal>()
        .map_err(|_err| ValueError::InvalidPercentage(s.to_string()))?;

    if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
        return Err(ValueError::InvalidPercentage(s.to_string()));
    }

    Ok(percentage)
}
