//! Cart store.

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::cart::LineItem;
use crate::error::CommerceError;
use crate::money::Money;

/// Summary published to observers after every cart mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    /// Incremented on every mutation.
    pub revision: u64,
    /// Number of line items.
    pub count: usize,
    /// Sum of all item prices.
    pub total: Money,
}

/// The ordered list of line items for the current session.
///
/// Insertion order is display order. The store keeps a running total that
/// always equals the sum of the prices of the items it holds. Every
/// mutation bumps the revision and publishes a [`CartSnapshot`] to
/// subscribers (the cart view and the badge), so observers never hold a
/// reference into the store itself.
#[derive(Debug)]
pub struct CartStore {
    items: Vec<LineItem>,
    total: Money,
    revision: u64,
    changes: watch::Sender<CartSnapshot>,
}

impl CartStore {
    /// Create an empty cart.
    pub fn new() -> Self {
        let (changes, _) = watch::channel(CartSnapshot {
            revision: 0,
            count: 0,
            total: Money::ZERO,
        });
        Self {
            items: Vec::new(),
            total: Money::ZERO,
            revision: 0,
            changes,
        }
    }

    /// Append an item to the end of the cart.
    ///
    /// Returns the index of the new item. Fails only if the running total
    /// would overflow.
    pub fn add(&mut self, item: LineItem) -> Result<usize, CommerceError> {
        self.total = self
            .total
            .try_add(&item.price())
            .ok_or(CommerceError::Overflow)?;
        self.items.push(item);
        self.publish();
        Ok(self.items.len() - 1)
    }

    /// Remove the item at `index`.
    ///
    /// An out-of-range index leaves the cart untouched and returns
    /// [`CommerceError::ItemNotFound`].
    pub fn remove_at(&mut self, index: usize) -> Result<LineItem, CommerceError> {
        if index >= self.items.len() {
            return Err(CommerceError::ItemNotFound {
                index,
                len: self.items.len(),
            });
        }

        let item = self.items.remove(index);
        self.total = self
            .total
            .try_subtract(&item.price())
            .unwrap_or(Money::ZERO);
        self.publish();
        Ok(item)
    }

    /// Remove the item at `index`, but only if the cart is still at
    /// `revision`.
    ///
    /// Used by remove controls that were rendered from an earlier state: if
    /// anything changed since, the index may point at a different item.
    pub fn remove_at_revision(
        &mut self,
        index: usize,
        revision: u64,
    ) -> Result<LineItem, CommerceError> {
        if revision != self.revision {
            return Err(CommerceError::StaleView {
                expected: revision,
                actual: self.revision,
            });
        }
        self.remove_at(index)
    }

    /// Remove one entry equal to each of `lines`, earliest first.
    ///
    /// Lines that are no longer in the cart are skipped. Returns how many
    /// entries were removed.
    pub fn remove_lines(&mut self, lines: &[LineItem]) -> usize {
        let mut removed = 0;
        for line in lines {
            let Some(index) = self.items.iter().position(|item| item == line) else {
                continue;
            };
            let item = self.items.remove(index);
            self.total = self
                .total
                .try_subtract(&item.price())
                .unwrap_or(Money::ZERO);
            removed += 1;
        }
        if removed > 0 {
            self.publish();
        }
        removed
    }

    /// Remove every item. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        self.total = Money::ZERO;
        self.publish();
        removed
    }

    /// Sum of item prices; zero for an empty cart.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Number of line items.
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in display order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Get an item by index.
    pub fn get(&self, index: usize) -> Option<&LineItem> {
        self.items.get(index)
    }

    /// Current revision.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Current summary.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            revision: self.revision,
            count: self.items.len(),
            total: self.total,
        }
    }

    /// Subscribe to cart changes.
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.changes.subscribe()
    }

    fn publish(&mut self) {
        self.revision += 1;
        let snapshot = self.snapshot();
        debug!(
            revision = snapshot.revision,
            count = snapshot.count,
            total_cents = snapshot.total.amount_cents(),
            "cart changed"
        );
        self.changes.send_replace(snapshot);
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}
