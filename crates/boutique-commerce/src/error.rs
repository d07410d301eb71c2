//! Commerce error types.

use thiserror::Error;

/// Errors that can occur in cart and checkout operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommerceError {
    /// A price string could not be turned into a non-negative amount.
    #[error("Invalid price {input:?}: {reason}")]
    InvalidPrice { input: String, reason: &'static str },

    /// A buy control is missing one of its product attributes.
    #[error("Missing product attribute: {0}")]
    MissingAttribute(&'static str),

    /// Product name is empty.
    #[error("Invalid product name: {0:?}")]
    InvalidProductName(String),

    /// Index does not address an item in the cart.
    #[error("No cart item at index {index} (cart has {len} items)")]
    ItemNotFound { index: usize, len: usize },

    /// A remove control was rendered from an older cart revision.
    #[error("Cart changed since it was rendered (revision {expected}, now {actual})")]
    StaleView { expected: u64, actual: u64 },

    /// Checkout requires at least one item.
    #[error("Cannot check out with an empty cart")]
    EmptyCart,

    /// Invalid checkout state transition.
    #[error("Invalid checkout transition from {from} to {to}")]
    InvalidCheckoutTransition {
        from: &'static str,
        to: &'static str,
    },

    /// A tokenization request is already in flight.
    #[error("A payment is already being processed")]
    PaymentInProgress,

    /// The card input is still being set up.
    #[error("Payment form is not ready yet")]
    GatewayNotReady,

    /// The payment gateway failed to load; a reload is required.
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in money calculation")]
    Overflow,
}
