//! Combination scenarios run through the public pricing API.

use rust_decimal::Decimal;
use rusty_money::{Money, iso::GBP};

use pricewise::{
    discounts::{CandidateDiscount, CandidateSource, DiscountKind},
    pricing::{StackingMode, TieBreak, best_combination, best_combination_with},
};

fn candidate(kind: DiscountKind, percentage: i64, description: &str) -> CandidateDiscount {
    CandidateDiscount::new(
        kind,
        Decimal::from(percentage),
        description,
        CandidateSource::OrderThreshold,
    )
}

#[test]
fn product_and_category_discounts_compound() {
    let result = best_combination(
        &[
            candidate(DiscountKind::Product, 20, "Product: Launch"),
            candidate(DiscountKind::Category, 10, "Category: Kitchen"),
        ],
        Money::from_minor(10_000, GBP),
    );

    assert_eq!(result.final_price, Money::from_minor(7_200, GBP));
    assert_eq!(result.total_discount_percentage, Decimal::from(28));
    assert_eq!(result.savings(), Money::from_minor(2_800, GBP));
}

#[test]
fn only_the_deepest_discount_of_a_kind_applies() {
    let result = best_combination(
        &[
            candidate(DiscountKind::Product, 20, "Product: Launch"),
            candidate(DiscountKind::Product, 30, "Product: Clearance"),
        ],
        Money::from_minor(10_000, GBP),
    );

    assert_eq!(result.final_price, Money::from_minor(7_000, GBP));
    assert_eq!(result.total_discount_percentage, Decimal::from(30));
    assert_eq!(
        result
            .applied_discounts
            .iter()
            .map(|discount| discount.description.as_str())
            .collect::<Vec<_>>(),
        ["Product: Clearance"]
    );
}

#[test]
fn ten_and_five_percent_compound_to_fifteen_points() {
    let result = best_combination(
        &[
            candidate(DiscountKind::Product, 10, "Product: Ten"),
            candidate(DiscountKind::Customer, 5, "Customer: Five"),
        ],
        Money::from_minor(10_000, GBP),
    );

    // 14.5% off, reported in whole points
    assert_eq!(result.final_price, Money::from_minor(8_550, GBP));
    assert_eq!(result.total_discount_percentage, Decimal::from(15));
}

#[test]
fn empty_candidates_leave_the_price_alone() {
    let price = Money::from_minor(1_299, GBP);
    let result = best_combination(&[], price);

    assert_eq!(result.final_price, price);
    assert_eq!(result.original_price, price);
    assert_eq!(result.total_discount_percentage, Decimal::ZERO);
    assert!(result.applied_discounts.is_empty());
    assert!(!result.is_discounted());
}

#[test]
fn non_positive_prices_resolve_to_zero() {
    let discounts = [candidate(DiscountKind::Product, 20, "Product: Launch")];

    for minor in [0, -500] {
        let result = best_combination(&discounts, Money::from_minor(minor, GBP));

        assert_eq!(result.final_price, Money::from_minor(0, GBP));
    }
}

#[test]
fn combining_is_idempotent() {
    let discounts = [
        candidate(DiscountKind::Seasonal, 10, "Seasonal: Summer Sale"),
        candidate(DiscountKind::Product, 25, "Product: Launch"),
        candidate(DiscountKind::Category, 10, "Category: Audio"),
        candidate(DiscountKind::Category, 15, "Category: Headphones"),
    ];
    let price = Money::from_minor(19_999, GBP);

    assert_eq!(
        best_combination(&discounts, price),
        best_combination(&discounts, price)
    );
}

#[test]
fn results_never_hold_two_discounts_of_a_kind_or_raise_the_price() {
    let kinds = [
        DiscountKind::Product,
        DiscountKind::Category,
        DiscountKind::Customer,
        DiscountKind::Volume,
        DiscountKind::Seasonal,
    ];
    let price = Money::from_minor(4_999, GBP);

    for seed in 0..50_i64 {
        let discounts: Vec<_> = (0..8_i64)
            .map(|n| {
                let kind = kinds
                    .get(usize::try_from((seed + n * 3) % 5).unwrap_or_default())
                    .cloned()
                    .unwrap_or(DiscountKind::Product);

                candidate(kind, (seed * 7 + n * 13) % 120 - 10, "Generated")
            })
            .collect();

        let result = best_combination(&discounts, price);

        for (index, discount) in result.applied_discounts.iter().enumerate() {
            assert!(
                result
                    .applied_discounts
                    .iter()
                    .skip(index + 1)
                    .all(|other| other.kind != discount.kind),
                "two discounts of kind {} applied",
                discount.kind
            );
        }

        assert!(
            *result.final_price.amount() <= *price.amount(),
            "price went up"
        );
        assert!(
            *result.final_price.amount() >= Decimal::ZERO,
            "price went negative"
        );
    }
}

#[test]
fn priority_breaks_ties_when_enabled() {
    let mut launch = candidate(DiscountKind::Product, 20, "Product: Launch");
    let mut member = candidate(DiscountKind::Product, 20, "Product: Member");

    launch.priority = 1;
    member.priority = 5;

    let discounts = [launch, member];
    let price = Money::from_minor(10_000, GBP);

    let stable = best_combination_with(
        &discounts,
        price,
        StackingMode::SameKind.policy(),
        TieBreak::Stable,
    );
    let prioritised = best_combination_with(
        &discounts,
        price,
        StackingMode::SameKind.policy(),
        TieBreak::Priority,
    );

    assert_eq!(
        stable.applied_discounts.first().map(|d| d.description.as_str()),
        Some("Product: Launch")
    );
    assert_eq!(
        prioritised
            .applied_discounts
            .first()
            .map(|d| d.description.as_str()),
        Some("Product: Member")
    );
    assert_eq!(stable.final_price, prioritised.final_price);
}

#[test]
fn savings_percent_is_a_fraction_of_the_original_price() {
    let result = best_combination(
        &[candidate(DiscountKind::Product, 25, "Product: Quarter")],
        Money::from_minor(8_000, GBP),
    );

    assert_eq!(
        result.savings_percent() * Decimal::ONE_HUNDRED,
        Decimal::from(25)
    );
}
