//! Application root for the Jazzy's Boutique storefront.
//!
//! This crate provides:
//! - `Storefront` - Owns the cart, checkout coordinator, notifications and
//!   mobile menu, and runs their effects on a single event loop
//! - `StorefrontConfig` - Gateway credentials and timing, loaded from TOML or JSON
//! - `SandboxGateway` / `SandboxLoader` - A scriptable payment gateway
//! - `MobileMenu` - Navigation menu state
//! - `OrderReceipt` - What the stubbed order-confirmation step records

mod config;
mod error;
mod nav;
mod receipt;
mod runtime;
mod sandbox;

pub use config::*;
pub use error::*;
pub use nav::*;
pub use receipt::*;
pub use runtime::*;
pub use sandbox::*;

// Re-export the domain crate for convenience
pub use boutique_commerce as commerce;
