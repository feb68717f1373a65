//! Customers

use slotmap::new_key_type;

new_key_type! {
    /// Customer Key
    pub struct CustomerKey;
}

/// Customer snapshot.
///
/// The acting customer is optional everywhere in the engine; guests price without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    /// Customer name
    pub name: String,

    /// Contact email
    pub email: String,
}
