//! Effective Category Discounts

use rust_decimal::Decimal;

use crate::{
    categories::{CategoryError, CategoryKey, CategoryTree},
    discounts::{compound, round_percent},
};

/// Compounded discount of a category and all of its ancestors, in whole percentage points.
///
/// Each node takes its own percentage off whatever the nodes before it left, so a 10% parent
/// above a 5% child yields 14.5%, reported as 15.
///
/// # Errors
///
/// Returns [`CategoryError::NotFound`] if the category is not in the tree.
pub fn effective_discount(tree: &CategoryTree, key: CategoryKey) -> Result<Decimal, CategoryError> {
    let chain = tree.ancestors_and_self(key)?;

    let retained = compound(
        chain
            .iter()
            .filter_map(|node| tree.get(*node))
            .map(|category| category.discount_percentage),
    );

    Ok(round_percent((Decimal::ONE - retained) * Decimal::ONE_HUNDRED))
}

/// The best single category chain among `categories`.
///
/// Categories missing from the tree are skipped. Ties keep the first category listed. Returns
/// `None` when no listed category is in the tree.
pub fn highest_effective_discount(
    tree: &CategoryTree,
    categories: &[CategoryKey],
) -> Option<(CategoryKey, Decimal)> {
    categories
        .iter()
        .filter_map(|key| {
            effective_discount(tree, *key)
                .ok()
                .map(|percentage| (*key, percentage))
        })
        .fold(None, |best, (key, percentage)| match best {
            Some((_, best_percentage)) if best_percentage >= percentage => best,
            _ => Some((key, percentage)),
        })
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::categories::Category;

    use super::*;

    #[test]
    fn parent_and_child_compound_rather_than_add() -> TestResult {
        let mut tree = CategoryTree::new();

        let parent = tree.insert(
            Category::new("Electronics", "electronics").with_discount(Decimal::from(10)),
            None,
        )?;

        let child = tree.insert(
            Category::new("Audio", "audio").with_discount(Decimal::from(5)),
            Some(parent),
        )?;

        assert_eq!(effective_discount(&tree, child)?, Decimal::from(15));
        assert_eq!(effective_discount(&tree, parent)?, Decimal::from(10));

        Ok(())
    }

    #[test]
    fn compounding_differs_from_addition_for_larger_discounts() -> TestResult {
        let mut tree = CategoryTree::new();

        let parent = tree.insert(
            Category::new("Clearance", "clearance").with_discount(Decimal::from(50)),
            None,
        )?;

        let child = tree.insert(
            Category::new("Last Chance", "last-chance").with_discount(Decimal::from(50)),
            Some(parent),
        )?;

        assert_eq!(effective_discount(&tree, child)?, Decimal::from(75));

        Ok(())
    }

    #[test]
    fn order_of_the_chain_does_not_matter() -> TestResult {
        let mut tree = CategoryTree::new();

        let a = tree.insert(Category::new("A", "a").with_discount(Decimal::from(20)), None)?;
        let b = tree.insert(Category::new("B", "b").with_discount(Decimal::from(5)), Some(a))?;

        let c = tree.insert(Category::new("C", "c").with_discount(Decimal::from(5)), None)?;
        let d = tree.insert(Category::new("D", "d").with_discount(Decimal::from(20)), Some(c))?;

        assert_eq!(effective_discount(&tree, b)?, effective_discount(&tree, d)?);

        Ok(())
    }

    #[test]
    fn undiscounted_chain_is_zero() -> TestResult {
        let mut tree = CategoryTree::new();
        let key = tree.insert(Category::new("Garden", "garden"), None)?;

        assert_eq!(effective_discount(&tree, key)?, Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn highest_picks_the_best_chain_not_the_sum() -> TestResult {
        let mut tree = CategoryTree::new();

        let sale = tree.insert(
            Category::new("Sale", "sale").with_discount(Decimal::from(20)),
            None,
        )?;

        let audio = tree.insert(
            Category::new("Audio", "audio").with_discount(Decimal::from(5)),
            None,
        )?;

        let best = highest_effective_discount(&tree, &[audio, sale, CategoryKey::default()]);

        assert_eq!(best, Some((sale, Decimal::from(20))));
        assert_eq!(highest_effective_discount(&tree, &[]), None);

        Ok(())
    }
}
