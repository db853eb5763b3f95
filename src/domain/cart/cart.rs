//! Shopping cart aggregate.
//!
//! The cart is an ordered list of line items. Subtotal, shipping and total are
//! derived on read and never stored. The serialized form is the JSON array the
//! storefront keeps in browser storage under the `cart` key.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::{CartError, LineItem, ProductId};

/// Browser storage key the storefront persists the cart under.
pub const CART_STORAGE_KEY: &str = "cart";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    items: Vec<LineItem>,
    shipping_rate: Decimal,
}

impl Cart {
    /// Creates an empty cart charging `shipping_rate` once it holds anything.
    pub fn new(shipping_rate: Decimal) -> Self {
        Self {
            items: Vec::new(),
            shipping_rate,
        }
    }

    pub fn from_items(items: Vec<LineItem>, shipping_rate: Decimal) -> Self {
        Self {
            items,
            shipping_rate,
        }
    }

    /// Restores a cart from its storage representation.
    pub fn from_storage_json(json: &str, shipping_rate: Decimal) -> Result<Self, CartError> {
        let items: Vec<LineItem> = serde_json::from_str(json)?;
        Ok(Self::from_items(items, shipping_rate))
    }

    pub fn to_storage_json(&self) -> Result<String, CartError> {
        Ok(serde_json::to_string(&self.items)?)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds one unit of a product, merging with an existing line.
    pub fn add_item(&mut self, product_id: ProductId, name: impl Into<String>, unit_price: Decimal) {
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(1),
            None => self.items.push(LineItem::new(product_id, name, unit_price)),
        }
    }

    pub fn remove_item(&mut self, product_id: ProductId) {
        self.items.retain(|i| i.product_id != product_id);
    }

    /// Sets the quantity of a line. Zero removes it; unknown products are ignored.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove_item(product_id);
            return;
        }
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = quantity;
        }
    }

    /// Sum of line totals. Fails instead of overflowing on huge prices.
    pub fn subtotal(&self) -> Result<Decimal, CartError> {
        self.items.iter().try_fold(Decimal::ZERO, |sum, item| {
            let line = item.line_total()?;
            sum.checked_add(line)
                .ok_or_else(|| CartError::AmountOutOfRange(format!("{} + {}", sum, line)))
        })
    }

    pub fn shipping(&self) -> Decimal {
        if self.is_empty() {
            Decimal::ZERO
        } else {
            self.shipping_rate
        }
    }

    pub fn total(&self) -> Result<Decimal, CartError> {
        let subtotal = self.subtotal()?;
        subtotal
            .checked_add(self.shipping())
            .ok_or_else(|| CartError::AmountOutOfRange(format!("{} + {}", subtotal, self.shipping())))
    }

    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Empties the cart after a successful checkout.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Rejects carts containing negative prices.
    pub fn validate(&self) -> Result<(), CartError> {
        match self.items.iter().find(|i| i.unit_price.is_sign_negative()) {
            Some(item) => Err(CartError::NegativePrice(item.product_id)),
            None => Ok(()),
        }
    }

    /// Total in minor units (cents), ready to charge.
    pub fn total_minor_units(&self) -> Result<i64, CartError> {
        self.validate()?;
        to_minor_units(self.total()?)
    }
}

/// Converts a major-unit amount to minor units, rounding half away from zero.
pub fn to_minor_units(amount: Decimal) -> Result<i64, CartError> {
    amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| CartError::AmountOutOfRange(amount.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn shipping() -> Decimal {
        Decimal::new(1000, 2)
    }

    fn ring() -> (ProductId, &'static str, Decimal) {
        (ProductId::new(1), "Diamond Ring", Decimal::new(29999, 2))
    }

    #[test]
    fn empty_cart_has_no_shipping() {
        let cart = Cart::new(shipping());
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal().unwrap(), Decimal::ZERO);
        assert_eq!(cart.shipping(), Decimal::ZERO);
        assert_eq!(cart.total().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn adding_same_product_increments_quantity() {
        let mut cart = Cart::new(shipping());
        let (id, name, price) = ring();
        cart.add_item(id, name, price);
        cart.add_item(id, name, price);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.subtotal().unwrap(), Decimal::new(59998, 2));
        assert_eq!(cart.total().unwrap(), Decimal::new(60998, 2));
    }

    #[test]
    fn items_keep_insertion_order() {
        let mut cart = Cart::new(shipping());
        cart.add_item(ProductId::new(7), "Bracelet", Decimal::new(5000, 2));
        cart.add_item(ProductId::new(3), "Necklace", Decimal::new(12000, 2));

        let ids: Vec<u32> = cart.items().iter().map(|i| i.product_id.value()).collect();
        assert_eq!(ids, vec![7, 3]);
    }

    #[test]
    fn update_quantity_to_zero_removes_line() {
        let mut cart = Cart::new(shipping());
        let (id, name, price) = ring();
        cart.add_item(id, name, price);

        cart.update_quantity(id, 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn update_quantity_on_unknown_product_is_noop() {
        let mut cart = Cart::new(shipping());
        let (id, name, price) = ring();
        cart.add_item(id, name, price);

        cart.update_quantity(ProductId::new(99), 5);
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn remove_and_clear() {
        let mut cart = Cart::new(shipping());
        let (id, name, price) = ring();
        cart.add_item(id, name, price);
        cart.add_item(ProductId::new(2), "Chain", Decimal::new(8900, 2));

        cart.remove_item(id);
        assert_eq!(cart.items().len(), 1);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn minor_units_round_half_away_from_zero() {
        assert_eq!(to_minor_units(Decimal::new(19999, 3)).unwrap(), 2000);
        assert_eq!(to_minor_units(Decimal::new(10005, 3)).unwrap(), 1001);
        assert_eq!(to_minor_units(Decimal::new(29999, 2)).unwrap(), 29999);
    }

    #[test]
    fn total_minor_units_rejects_negative_prices() {
        let cart = Cart::from_items(
            vec![LineItem::new(ProductId::new(1), "Refund", Decimal::new(-100, 2))],
            shipping(),
        );
        assert!(matches!(
            cart.total_minor_units(),
            Err(CartError::NegativePrice(id)) if id == ProductId::new(1)
        ));
    }

    #[test]
    fn oversized_amounts_are_out_of_range() {
        let huge = "1000000000000000000000000000".parse::<Decimal>().unwrap();
        let single = Cart::from_items(vec![LineItem::new(ProductId::new(1), "x", huge)], shipping());
        assert!(matches!(single.total_minor_units(), Err(CartError::AmountOutOfRange(_))));

        let doubled = Cart::from_items(
            vec![LineItem::new(ProductId::new(1), "x", Decimal::from_scientific("7e28").unwrap())
                .with_quantity(2)],
            shipping(),
        );
        assert!(matches!(doubled.subtotal(), Err(CartError::AmountOutOfRange(_))));
        assert!(matches!(doubled.total_minor_units(), Err(CartError::AmountOutOfRange(_))));

        let summed = Cart::from_items(
            vec![
                LineItem::new(ProductId::new(1), "x", Decimal::MAX),
                LineItem::new(ProductId::new(2), "y", Decimal::MAX),
            ],
            shipping(),
        );
        assert!(matches!(summed.subtotal(), Err(CartError::AmountOutOfRange(_))));
    }

    #[test]
    fn quantities_never_wrap() {
        let mut cart = Cart::from_items(
            vec![
                LineItem::new(ProductId::new(1), "Ring", Decimal::ONE).with_quantity(u32::MAX),
                LineItem::new(ProductId::new(2), "Chain", Decimal::ONE).with_quantity(u32::MAX),
            ],
            shipping(),
        );
        assert_eq!(cart.item_count(), 2 * u64::from(u32::MAX));

        cart.add_item(ProductId::new(1), "Ring", Decimal::ONE);
        assert_eq!(cart.items()[0].quantity, u32::MAX);
    }

    #[test]
    fn storage_json_restores_the_same_items() {
        let mut cart = Cart::new(shipping());
        cart.add_item(ProductId::new(5), "Sapphire Pendant", Decimal::new(45000, 2));
        cart.update_quantity(ProductId::new(5), 2);

        let json = cart.to_storage_json().unwrap();
        let restored = Cart::from_storage_json(&json, shipping()).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn invalid_storage_is_an_error() {
        assert!(matches!(
            Cart::from_storage_json("not json", shipping()),
            Err(CartError::InvalidStorage(_))
        ));
    }

    fn line_items() -> impl Strategy<Value = Vec<LineItem>> {
        prop::collection::vec((0u32..1000, 0i64..1_000_000, 1u32..50), 0..20).prop_map(|raw| {
            raw.into_iter()
                .map(|(id, cents, qty)| {
                    LineItem::new(ProductId::new(id), "item", Decimal::new(cents, 2))
                        .with_quantity(qty)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn subtotal_is_sum_of_price_times_quantity(items in line_items()) {
            let expected_cents: i64 = items
                .iter()
                .map(|i| to_minor_units(i.unit_price).unwrap() * i64::from(i.quantity))
                .sum();

            let cart = Cart::from_items(items, shipping());
            prop_assert_eq!(to_minor_units(cart.subtotal().unwrap()).unwrap(), expected_cents);
        }

        #[test]
        fn total_is_subtotal_plus_shipping_when_not_empty(items in line_items()) {
            let cart = Cart::from_items(items, shipping());
            let subtotal = cart.subtotal().unwrap();
            let expected = if cart.is_empty() { subtotal } else { subtotal + shipping() };
            prop_assert_eq!(cart.total().unwrap(), expected);
        }
    }
}
