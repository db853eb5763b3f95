//! Domain layer: the only state the gateway holds itself.
//!
//! - `cart` - storefront cart line items and derived totals
//! - `webhook` - verified provider events and their types

pub mod cart;
pub mod webhook;
