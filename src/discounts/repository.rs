//! Discount Repository

use thiserror::Error;

use crate::discounts::{DiscountRule, DiscountTarget};

/// Errors raised by the storage layer while fetching rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// The backing store could not be reached or answered with an error.
    #[error("discount store unavailable: {0}")]
    Unavailable(String),
}

/// Read path onto the rules each entity owns.
///
/// Implementations return every owned rule and must not filter by validity; validity is decided
/// by the engine against its own clock.
pub trait DiscountRepository {
    /// Rules owned by `target`, in storage order.
    ///
    /// # Errors
    ///
    /// Returns a [`RepositoryError`] when the store cannot be read.
    fn rules_for(&self, target: DiscountTarget) -> Result<Vec<DiscountRule>, RepositoryError>;
}

impl<R: DiscountRepository + ?Sized> DiscountRepository for &R {
    fn rules_for(&self, target: DiscountTarget) -> Result<Vec<DiscountRule>, RepositoryError> {
        (**self).rules_for(target)
    }
}
