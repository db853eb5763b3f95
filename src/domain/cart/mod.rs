//! Storefront cart: line items with derived subtotal, shipping and total.

#[allow(clippy::module_inception)]
mod cart;
mod errors;
mod line_item;

pub use cart::{to_minor_units, Cart, CART_STORAGE_KEY};
pub use errors::CartError;
pub use line_item::{LineItem, ProductId};
