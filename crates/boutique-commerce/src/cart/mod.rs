//! Shopping cart module.
//!
//! Contains the line item type and the cart store that owns them.

mod item;
mod store;

pub use item::{LineItem, ATTR_PRICE, ATTR_PRODUCT};
pub use store::{CartSnapshot, CartStore};
