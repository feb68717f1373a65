//! Receipt

use std::{fmt::Write, io};

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, MoneyError, iso::Currency};
use slotmap::SlotMap;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::{CartItem, CartTotals, Order},
    discounts::CandidateDiscount,
    products::{Product, ProductKey},
};

/// Errors that can occur when building a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Error finding a product in the product catalog.
    #[error("Missing product")]
    MissingProduct(ProductKey),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Printable summary of a priced cart.
#[derive(Debug, Clone)]
pub struct Receipt<'a> {
    items: Vec<CartItem<'a>>,
    totals: CartTotals<'a>,
}

impl<'a> Receipt<'a> {
    /// Create a receipt for `items` priced at `totals`.
    #[must_use]
    pub fn new(items: &[CartItem<'a>], totals: CartTotals<'a>) -> Self {
        Self {
            items: items.to_vec(),
            totals,
        }
    }

    /// Receipt for a completed order.
    #[must_use]
    pub fn from_order(items: &[CartItem<'a>], order: &Order<'a>) -> Self {
        Self::new(items, order.totals.clone())
    }

    /// Total cost before any discount
    #[must_use]
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.totals.original_subtotal
    }

    /// Total amount payable
    #[must_use]
    pub fn total(&self) -> Money<'a, Currency> {
        self.totals.final_total
    }

    /// Calculate everything saved, item and cart discounts together.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the subtraction operation fails.
    pub fn savings(&self) -> Result<Money<'a, Currency>, MoneyError> {
        self.subtotal().sub(self.total())
    }

    /// Savings as a fraction of the undiscounted subtotal.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the subtraction operation fails.
    pub fn savings_percent(&self) -> Result<Percentage, MoneyError> {
        let savings = self.savings()?;
        let subtotal = *self.subtotal().amount();

        if subtotal.is_zero() {
            return Ok(Percentage::from(Decimal::ZERO));
        }

        Ok(Percentage::from(*savings.amount() / subtotal))
    }

    /// Prints the receipt.
    ///
    /// # Errors
    ///
    /// Returns an error if a product is missing from `product_meta` or the receipt cannot be
    /// written.
    pub fn write_to(
        &self,
        mut out: impl io::Write,
        product_meta: &SlotMap<ProductKey, Product<'_>>,
    ) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record([
            "",
            "Item",
            "Qty",
            "Unit Price",
            "Discounted",
            "Savings",
            "Discounts",
        ]);

        for (idx, item) in self.items.iter().enumerate() {
            let product = product_meta
                .get(item.product)
                .ok_or(ReceiptError::MissingProduct(item.product))?;

            builder.push_record(item_row(idx, &product.name, item));
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(2..6), Alignment::right());

        let table_str = colorize_borders(&table.to_string());

        writeln!(out, "\n{table_str}").map_err(|_err| ReceiptError::IO)?;

        self.write_summary(&mut out)
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let savings = self.savings()?;
        let savings_percent_points = percent_points_from_fractional_percentage(self.savings_percent()?);

        let mut lines: Vec<(String, String)> = vec![
            (" Subtotal:".to_string(), format!("{}  ", self.subtotal())),
            (
                " Item prices:".to_string(),
                format!("{}  ", self.totals.subtotal),
            ),
        ];

        for discount in &self.totals.cart_discounts {
            lines.push((
                format!(" {}:", discount.description),
                format!("-{}%  ", discount.effective_percentage().normalize()),
            ));
        }

        lines.push((
            " \x1b[1mTotal:\x1b[0m".to_string(),
            format!("\x1b[1m{}  \x1b[0m", self.total()),
        ));

        lines.push((
            " Savings:".to_string(),
            format!("({savings_percent_points:.2}%) {savings}  "),
        ));

        let label_width = lines
            .iter()
            .map(|(label, _)| visible_width(label))
            .max()
            .unwrap_or_default();

        let value_width = lines
            .iter()
            .map(|(_, value)| visible_width(value))
            .max()
            .unwrap_or_default();

        for (label, value) in &lines {
            write_summary_line(out, label, value, label_width, value_width)?;
        }

        writeln!(out).map_err(|_err| ReceiptError::IO)
    }
}

fn item_row(idx: usize, name: &str, item: &CartItem<'_>) -> [String; 7] {
    let unchanged = item.discounted_price == item.unit_price;

    let (discounted, savings) = if unchanged {
        (String::new(), String::new())
    } else {
        (
            format!("{}", item.discounted_price),
            format!("({}%) -{}", item.total_discount_percentage, item.savings()),
        )
    };

    [
        format!("#{:<3}", idx + 1),
        name.to_string(),
        item.quantity.to_string(),
        format!("{}", item.unit_price),
        discounted,
        savings,
        discount_names(&item.applied_discounts),
    ]
}

fn discount_names(discounts: &[CandidateDiscount]) -> String {
    discounts
        .iter()
        .map(|discount| discount.description.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Converts a fractional percentage to percent points for display.
fn percent_points_from_fractional_percentage(percentage: Percentage) -> Decimal {
    // `Percentage` is a fraction (e.g. 0.25), so multiply by 100 to print percent points.
    ((percentage * Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Wraps runs of UTF-8 box-drawing characters in ANSI dark-grey escape codes.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Writes a summary line with a right-aligned label and a fixed-width value column.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| ReceiptError::IO)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use crate::{
        discounts::{CandidateSource, DiscountKind},
        pricing::best_combination,
    };

    use super::*;

    fn totals(subtotal: i64, total: i64) -> CartTotals<'static> {
        CartTotals {
            original_subtotal: Money::from_minor(subtotal, GBP),
            subtotal: Money::from_minor(subtotal, GBP),
            cart_discounts: Vec::new(),
            total_savings: Money::from_minor(subtotal - total, GBP),
            final_total: Money::from_minor(total, GBP),
        }
    }

    #[test]
    fn savings_is_subtotal_minus_total() -> TestResult {
        let receipt = Receipt::new(&[], totals(400, 300));

        assert_eq!(receipt.savings()?, Money::from_minor(100, GBP));
        assert_eq!(
            percent_points_from_fractional_percentage(receipt.savings_percent()?),
            Decimal::from(25)
        );

        Ok(())
    }

    #[test]
    fn savings_percent_is_zero_for_empty_carts() -> TestResult {
        let receipt = Receipt::new(&[], CartTotals::zero(GBP));

        assert_eq!(receipt.savings_percent()?, Percentage::from(Decimal::ZERO));

        Ok(())
    }

    #[test]
    fn savings_errors_on_currency_mismatch() {
        let receipt = Receipt::new(
            &[],
            CartTotals {
                final_total: Money::from_minor(250, USD),
                ..totals(300, 250)
            },
        );

        assert_eq!(
            receipt.savings(),
            Err(MoneyError::CurrencyMismatch {
                expected: GBP.iso_alpha_code,
                actual: USD.iso_alpha_code,
            })
        );
    }

    #[test]
    fn write_to_lists_items_and_cart_discounts() -> TestResult {
        let mut products = SlotMap::with_key();
        let kettle = products.insert_with_key(|key| {
            Product::new(key, "Kettle", Money::from_minor(10_000, GBP))
        });

        let result = best_combination(
            &[CandidateDiscount::new(
                DiscountKind::Product,
                Decimal::from(20),
                "Product: Launch",
                CandidateSource::OrderThreshold,
            )],
            Money::from_minor(10_000, GBP),
        );

        let item = CartItem::priced(kettle, 1, result);
        let receipt = Receipt::new(std::slice::from_ref(&item), totals(10_000, 8_000));
        let mut out = Vec::new();

        receipt.write_to(&mut out, &products)?;

        let printed = String::from_utf8(out)?;

        assert!(printed.contains("Kettle"));
        assert!(printed.contains("Product: Launch"));
        assert!(printed.contains("Total:"));

        Ok(())
    }

    #[test]
    fn write_to_fails_for_unknown_products() {
        let products: SlotMap<ProductKey, Product<'_>> = SlotMap::with_key();
        let result = best_combination(&[], Money::from_minor(500, GBP));
        let item = CartItem::priced(ProductKey::default(), 1, result);
        let receipt = Receipt::new(&[item], totals(500, 500));

        assert!(matches!(
            receipt.write_to(Vec::new(), &products),
            Err(ReceiptError::MissingProduct(_))
        ));
    }
}
