//! Cart and checkout hand-off logic for Jazzy's Boutique.
//!
//! This crate holds the state behind the storefront's shopping cart:
//!
//! - **Money**: single-currency, cents-based amounts
//! - **Cart**: the [`CartStore`] with its published [`CartSnapshot`]s
//! - **View**: pure projections of the cart ([`CartView`], [`CartBadge`])
//! - **Checkout**: the [`CheckoutCoordinator`] state machine and the
//!   payment gateway seam it drives
//! - **Notifications**: transient messages with their own dismissal timers
//!
//! Nothing here performs I/O or sleeps. Operations that need the outside
//! world return [`Effect`]s for the application root to carry out.
//!
//! # Example
//!
//! ```rust
//! use boutique_commerce::prelude::*;
//!
//! let mut cart = CartStore::new();
//! cart.add(LineItem::parse("Silk Scarf", "45.00").unwrap()).unwrap();
//! cart.add(LineItem::parse("Tote Bag", "30.00").unwrap()).unwrap();
//!
//! let view = CartView::render(&cart);
//! assert_eq!(view.total, "$75.00");
//! assert_eq!(cart.count(), 2);
//! ```

pub mod error;
pub mod money;

pub mod cart;
pub mod checkout;
pub mod effect;
pub mod notify;
pub mod view;

pub use error::CommerceError;
pub use money::Money;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::money::Money;

    // Cart
    pub use crate::cart::{CartStore, CartSnapshot, LineItem};

    // View
    pub use crate::view::{CartBadge, CartRow, CartView, RemoveHandle};

    // Checkout
    pub use crate::checkout::{
        AttemptId, CardInput, CheckoutCoordinator, CheckoutPhase, CheckoutView, GatewayCredentials,
        GatewayError, GatewayLoader, OrderSummary, PayControl, PaymentGateway, StatusKind,
        StatusMessage, TokenStatus, TokenizeResult,
    };

    // Effects and notifications
    pub use crate::effect::{Effect, Timer};
    pub use crate::notify::{Notification, NotificationId, NotificationStage, Notifications};
}
