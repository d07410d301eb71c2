//! Order summary captured when checkout begins.

use serde::Serialize;

use crate::cart::{CartStore, LineItem};
use crate::error::CommerceError;
use crate::money::Money;

/// The cart as it stood when the user proceeded to checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub lines: Vec<LineItem>,
    pub total: Money,
    /// Cart revision the summary was taken at.
    pub revision: u64,
}

impl OrderSummary {
    /// Capture the current cart. An empty cart cannot be checked out.
    pub fn capture(cart: &CartStore) -> Result<Self, CommerceError> {
        if cart.is_empty() {
            return Err(CommerceError::EmptyCart);
        }
        Ok(Self {
            lines: cart.items().to_vec(),
            total: cart.total(),
            revision: cart.revision(),
        })
    }

    /// `(name, price)` display rows. The total is rendered separately.
    pub fn rows(&self) -> Vec<(String, String)> {
        self.lines
            .iter()
            .map(|item| (item.name().to_string(), item.price().display()))
            .collect()
    }
}
