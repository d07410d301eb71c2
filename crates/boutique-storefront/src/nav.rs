//! Mobile navigation menu.

use serde::Serialize;
use tracing::debug;

/// Collapsible navigation menu shown on narrow screens.
///
/// While open, page scrolling is locked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MobileMenu {
    open: bool,
}

impl MobileMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the menu. Returns the new state.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        debug!(open = self.open, "mobile menu toggled");
        self.open
    }

    /// Close the menu. Returns whether it was open.
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Check if page scrolling should be locked.
    pub fn scroll_locked(&self) -> bool {
        self.open
    }
}
