//! Category Fixtures

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{categories::Category, fixtures::FixtureError, utils::parse_percentage};

/// Wrapper for categories in YAML
///
/// Categories are listed parents first so a child can name a parent defined above it.
#[derive(Debug, Deserialize)]
pub struct CategoriesFixture {
    /// Ordered category fixtures
    pub categories: Vec<CategoryFixture>,
}

/// Category fixture from YAML
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryFixture {
    /// Fixture key
    pub key: String,

    /// Display name
    pub name: String,

    /// URL slug, defaults to the key
    #[serde(default)]
    pub slug: Option<String>,

    /// Key of the parent category
    #[serde(default)]
    pub parent: Option<String>,

    /// Own discount (e.g., "10%")
    #[serde(default)]
    pub discount: Option<String>,

    /// Position among siblings
    #[serde(default)]
    pub position: u32,
}

impl TryFrom<&CategoryFixture> for Category {
    type Error = FixtureError;

    fn try_from(fixture: &CategoryFixture) -> Result<Self, Self::Error> {
        let discount = match &fixture.discount {
            Some(discount) => parse_percentage(discount)?,
            None => Decimal::ZERO,
        };

        Ok(Category::new(
            fixture.name.clone(),
            fixture.slug.clone().unwrap_or_else(|| fixture.key.clone()),
        )
        .with_discount(discount)
        .at_position(fixture.position))
    }
}
