//! Pure projections of the cart for a UI binding layer.
//!
//! Nothing here touches a real document. A binding layer (or a terminal
//! harness) renders these view-models however it likes and feeds user
//! actions back as [`RemoveHandle`]s.

use serde::Serialize;
use tokio::sync::watch;

use crate::cart::{CartSnapshot, CartStore, LineItem};
use crate::error::CommerceError;

/// Text shown in place of rows when the cart has no items.
pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty";

/// Identifies the item a remove control was rendered for.
///
/// Carries the cart revision it was rendered at so a stale control cannot
/// remove whatever item has since moved into its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemoveHandle {
    pub index: usize,
    pub revision: u64,
}

impl RemoveHandle {
    /// Activate the control against the current cart.
    pub fn activate(self, cart: &mut CartStore) -> Result<LineItem, CommerceError> {
        cart.remove_at_revision(self.index, self.revision)
    }
}

/// One rendered cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartRow {
    pub name: String,
    /// Price formatted to two decimals with currency symbol.
    pub price: String,
    pub remove: RemoveHandle,
}

/// Rendered cart overlay contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub rows: Vec<CartRow>,
    /// Total formatted to two decimals with currency symbol.
    pub total: String,
    /// Whether the checkout control should be enabled.
    pub checkout_enabled: bool,
    pub revision: u64,
}

impl CartView {
    /// Project the current cart.
    pub fn render(cart: &CartStore) -> Self {
        let revision = cart.revision();
        let rows = cart
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| CartRow {
                name: item.name().to_string(),
                price: item.price().display(),
                remove: RemoveHandle { index, revision },
            })
            .collect();

        Self {
            rows,
            total: cart.total().display(),
            checkout_enabled: !cart.is_empty(),
            revision,
        }
    }

    /// Check if this is the empty-cart state.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Message to show instead of rows, if any.
    pub fn empty_message(&self) -> Option<&'static str> {
        self.is_empty().then_some(EMPTY_CART_MESSAGE)
    }
}

/// Item count indicator shown on the cart button.
#[derive(Debug, Clone)]
pub struct CartBadge {
    changes: watch::Receiver<CartSnapshot>,
}

impl CartBadge {
    /// Attach a badge to a cart.
    pub fn new(cart: &CartStore) -> Self {
        Self {
            changes: cart.subscribe(),
        }
    }

    /// Item count as of the latest mutation.
    pub fn count(&self) -> usize {
        self.changes.borrow().count
    }

    /// Badge text.
    pub fn label(&self) -> String {
        self.count().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn sample_cart() -> CartStore {
        let mut cart = CartStore::new();
        cart.add(LineItem::parse("Silk Scarf", "45.00").unwrap()).unwrap();
        cart.add(LineItem::parse("Tote Bag", "30").unwrap()).unwrap();
        cart
    }

    #[test]
    fn test_render_empty_cart() {
        let view = CartView::render(&CartStore::new());
        assert!(view.is_empty());
        assert_eq!(view.empty_message(), Some(EMPTY_CART_MESSAGE));
        assert_eq!(view.total, "$0.00");
        assert!(!view.checkout_enabled);
    }

    #[test]
    fn test_render_rows() {
        let cart = sample_cart();
        let view = CartView::render(&cart);

        assert_eq!(view.empty_message(), None);
        assert_eq!(view.total, "$75.00");
        assert!(view.checkout_enabled);
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].name, "Silk Scarf");
        assert_eq!(view.rows[0].price, "$45.00");
        assert_eq!(view.rows[1].price, "$30.00");
        assert_eq!(view.rows[1].remove.index, 1);
        assert_eq!(view.rows[1].remove.revision, cart.revision());
    }

    #[test]
    fn test_remove_handle_removes_rendered_item() {
        let mut cart = sample_cart();
        let view = CartView::render(&cart);

        let removed = view.rows[0].remove.activate(&mut cart).unwrap();
        assert_eq!(removed.name(), "Silk Scarf");
        assert_eq!(cart.total(), Money::new(3000));
    }

    #[test]
    fn test_remove_handle_rejects_stale_render() {
        let mut cart = sample_cart();
        let view = CartView::render(&cart);

        view.rows[0].remove.activate(&mut cart).unwrap();
        // Second row's handle still points at index 1, which no longer exists
        // and would be the wrong item even if it did.
        assert!(matches!(
            view.rows[1].remove.activate(&mut cart),
            Err(CommerceError::StaleView { .. })
        ));
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn test_badge_follows_cart() {
        let mut cart = CartStore::new();
        let badge = CartBadge::new(&cart);
        assert_eq!(badge.label(), "0");

        cart.add(LineItem::parse("Silk Scarf", "45.00").unwrap()).unwrap();
        assert_eq!(badge.count(), 1);

        cart.clear();
        assert_eq!(badge.label(), "0");
    }
}
