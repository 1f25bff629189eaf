//! Cart line items, mutation intents, and the cart reducer.
//!
//! A [`Cart`] never changes on its own: every change goes through
//! [`Cart::apply`] with a [`CartAction`]. Whoever owns the cart (the store in
//! the storefront crate) decides when to apply an intent; this module decides
//! what the intent means.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A single cart line item.
///
/// Field names follow the order API's JSON shape (`productId`,
/// `productPrice`, ...). Prices travel as JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_category: String,
    /// Image URL for the product thumbnail.
    pub product_image: String,
    /// Unit price.
    #[serde(with = "rust_decimal::serde::float")]
    pub product_price: Decimal,
    pub product_quantity: u32,
}

impl CartItem {
    /// Unit price multiplied by quantity, or `None` if it is not representable.
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.product_price
            .checked_mul(Decimal::from(self.product_quantity))
    }

    /// Unit price multiplied by quantity, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.checked_line_total().unwrap_or(Decimal::MAX)
    }
}

/// A mutation intent for a cart.
///
/// Intents carry no policy of their own; see [`Cart::apply`] for how each
/// one is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add a line, merging with an existing line for the same product.
    AddProduct(CartItem),
    /// Raise a line's quantity by one.
    IncreaseQuantity { item_id: ProductId },
    /// Lower a line's quantity by one, deleting it at zero.
    DecreaseQuantity { item_id: ProductId },
    /// Delete a line.
    RemoveProduct { item_id: ProductId },
}

impl CartAction {
    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddProduct(_) => "add_product",
            Self::IncreaseQuantity { .. } => "increase_quantity",
            Self::DecreaseQuantity { .. } => "decrease_quantity",
            Self::RemoveProduct { .. } => "remove_product",
        }
    }

    /// The product this intent targets.
    #[must_use]
    pub const fn item_id(&self) -> &ProductId {
        match self {
            Self::AddProduct(item) => &item.product_id,
            Self::IncreaseQuantity { item_id }
            | Self::DecreaseQuantity { item_id }
            | Self::RemoveProduct { item_id } => item_id,
        }
    }
}

/// An ordered list of cart line items, at most one per product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Consume the cart, returning its line items.
    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn get(&self, item_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == item_id)
    }

    /// Sum of unit price times quantity over every line. Zero when empty.
    ///
    /// [`Cart::apply`] refuses changes whose total would not be
    /// representable, so this only saturates at [`Decimal::MAX`] for carts
    /// built some other way (deserialized, for instance).
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.checked_total_amount().unwrap_or(Decimal::MAX)
    }

    /// Sum of unit price times quantity, or `None` on overflow.
    #[must_use]
    pub fn checked_total_amount(&self) -> Option<Decimal> {
        self.items.iter().try_fold(Decimal::ZERO, |total, item| {
            total.checked_add(item.checked_line_total()?)
        })
    }

    /// Sum of quantities over every line.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |acc, item| acc.saturating_add(item.product_quantity))
    }

    /// Apply a mutation intent.
    ///
    /// Returns `true` if the cart changed. Intents for products not in the
    /// cart are no-ops, as are additions that would push the cart total past
    /// what a [`Decimal`] can hold.
    pub fn apply(&mut self, action: &CartAction) -> bool {
        match action {
            CartAction::AddProduct(item) => {
                if item.product_quantity == 0 {
                    return false;
                }
                if let Some(current) = self.quantity_of(&item.product_id) {
                    return self.set_quantity(
                        &item.product_id,
                        current.saturating_add(item.product_quantity),
                    );
                }
                self.items.push(item.clone());
                if self.checked_total_amount().is_none() {
                    self.items.pop();
                    return false;
                }
                true
            }
            CartAction::IncreaseQuantity { item_id } => self
                .quantity_of(item_id)
                .is_some_and(|current| self.set_quantity(item_id, current.saturating_add(1))),
            CartAction::DecreaseQuantity { item_id } => {
                let Some(line) = self.line_mut(item_id) else {
                    return false;
                };
                line.product_quantity = line.product_quantity.saturating_sub(1);
                if line.product_quantity == 0 {
                    self.items.retain(|item| &item.product_id != item_id);
                }
                true
            }
            CartAction::RemoveProduct { item_id } => {
                let before = self.items.len();
                self.items.retain(|item| &item.product_id != item_id);
                self.items.len() != before
            }
        }
    }

    fn quantity_of(&self, item_id: &ProductId) -> Option<u32> {
        self.get(item_id).map(|item| item.product_quantity)
    }

    /// Raise a line to `quantity`, rolling back if the total overflows.
    fn set_quantity(&mut self, item_id: &ProductId, quantity: u32) -> bool {
        let Some(line) = self.line_mut(item_id) else {
            return false;
        };
        let before = line.product_quantity;
        if before == quantity {
            return false;
        }
        line.product_quantity = quantity;

        if self.checked_total_amount().is_none() {
            if let Some(line) = self.line_mut(item_id) {
                line.product_quantity = before;
            }
            return false;
        }
        true
    }

    fn line_mut(&mut self, item_id: &ProductId) -> Option<&mut CartItem> {
        self.items
            .iter_mut()
            .find(|item| &item.product_id == item_id)
    }
}

impl FromIterator<CartItem> for Cart {
    /// Build a cart by adding each item in turn, merging duplicates.
    fn from_iter<I: IntoIterator<Item = CartItem>>(iter: I) -> Self {
        let mut cart = Self::new();
        for item in iter {
            cart.apply(&CartAction::AddProduct(item));
        }
        cart
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn item(id: &str, price: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            product_name: format!("Product {id}"),
            product_category: "Tea".to_string(),
            product_image: format!("https://cdn.example.com/{id}.jpg"),
            product_price: Decimal::from(price),
            product_quantity: quantity,
        }
    }

    fn id(value: &str) -> ProductId {
        ProductId::new(value)
    }

    #[test]
    fn test_total_amount_example() {
        let cart: Cart = [item("a", 100, 2), item("b", 50, 3)].into_iter().collect();
        assert_eq!(cart.total_amount(), Decimal::from(350));
        assert_eq!(format!("{:.2}", cart.total_amount()), "350.00");
    }

    #[test]
    fn test_total_amount_empty_is_zero() {
        assert_eq!(Cart::new().total_amount(), Decimal::ZERO);
        assert_eq!(Cart::new().total_quantity(), 0);
    }

    #[test]
    fn test_total_amount_matches_line_sum() {
        let cart: Cart = (1..=10)
            .map(|n| CartItem {
                product_price: Decimal::new(n * 125, 2),
                ..item(&n.to_string(), 0, u32::try_from(n).unwrap())
            })
            .collect();

        let expected: Decimal = cart
            .items()
            .iter()
            .map(|line| line.product_price * Decimal::from(line.product_quantity))
            .sum();
        assert_eq!(cart.total_amount(), expected);
        assert_eq!(cart.total_quantity(), 55);
    }

    #[test]
    fn test_add_merges_duplicates() {
        let mut cart = Cart::new();
        assert!(cart.apply(&CartAction::AddProduct(item("a", 10, 1))));
        assert!(cart.apply(&CartAction::AddProduct(item("a", 10, 2))));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.get(&id("a")).unwrap().product_quantity, 3);
    }

    #[test]
    fn test_add_zero_quantity_is_ignored() {
        let mut cart = Cart::new();
        assert!(!cart.apply(&CartAction::AddProduct(item("a", 10, 0))));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_increase_quantity() {
        let mut cart: Cart = [item("a", 10, 1)].into_iter().collect();
        assert!(cart.apply(&CartAction::IncreaseQuantity { item_id: id("a") }));
        assert_eq!(cart.get(&id("a")).unwrap().product_quantity, 2);
    }

    #[test]
    fn test_decrease_deletes_at_zero() {
        let mut cart: Cart = [item("a", 10, 2), item("b", 5, 1)].into_iter().collect();

        assert!(cart.apply(&CartAction::DecreaseQuantity { item_id: id("a") }));
        assert_eq!(cart.get(&id("a")).unwrap().product_quantity, 1);

        assert!(cart.apply(&CartAction::DecreaseQuantity { item_id: id("a") }));
        assert!(cart.get(&id("a")).is_none());
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].product_id, id("b"));
    }

    #[test]
    fn test_remove_product_keeps_order() {
        let mut cart: Cart = [item("a", 1, 1), item("b", 1, 1), item("c", 1, 1)]
            .into_iter()
            .collect();

        assert!(cart.apply(&CartAction::RemoveProduct { item_id: id("b") }));
        let ids: Vec<&str> = cart.items().iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn test_unknown_item_is_noop() {
        let mut cart: Cart = [item("a", 10, 1)].into_iter().collect();
        let before = cart.clone();

        assert!(!cart.apply(&CartAction::IncreaseQuantity { item_id: id("x") }));
        assert!(!cart.apply(&CartAction::DecreaseQuantity { item_id: id("x") }));
        assert!(!cart.apply(&CartAction::RemoveProduct { item_id: id("x") }));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_add_refuses_unrepresentable_line_total() {
        let mut cart = Cart::new();
        let huge = CartItem {
            product_price: Decimal::MAX,
            ..item("a", 0, 2)
        };

        assert!(!cart.apply(&CartAction::AddProduct(huge)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_refuses_unrepresentable_cart_total() {
        let third = Decimal::from_i128_with_scale(30_000_000_000_000_000_000_000_000_000, 0);
        let mut cart: Cart = [CartItem {
            product_price: third,
            ..item("a", 0, 1)
        }]
        .into_iter()
        .collect();
        let before = cart.clone();

        let other = CartItem {
            product_price: third,
            ..item("b", 0, 2)
        };
        assert!(!cart.apply(&CartAction::AddProduct(other)));
        assert_eq!(cart, before);
        assert_eq!(cart.total_amount(), third);
    }

    #[test]
    fn test_increase_refuses_overflow_and_keeps_quantity() {
        let third = Decimal::from_i128_with_scale(30_000_000_000_000_000_000_000_000_000, 0);
        let mut cart: Cart = [CartItem {
            product_price: third,
            ..item("a", 0, 1)
        }]
        .into_iter()
        .collect();

        assert!(cart.apply(&CartAction::IncreaseQuantity { item_id: id("a") }));
        assert!(!cart.apply(&CartAction::IncreaseQuantity { item_id: id("a") }));
        assert!(!cart.apply(&CartAction::AddProduct(CartItem {
            product_price: third,
            ..item("a", 0, 1)
        })));
        assert_eq!(cart.get(&id("a")).unwrap().product_quantity, 2);
        assert!(cart.checked_total_amount().is_some());
    }

    #[test]
    fn test_totals_saturate_instead_of_panicking() {
        let cart: Cart = serde_json::from_value(serde_json::json!([
            {
                "productId": "a",
                "productName": "A",
                "productCategory": "",
                "productImage": "",
                "productPrice": 5e28,
                "productQuantity": 2
            }
        ]))
        .unwrap();

        assert_eq!(cart.items()[0].checked_line_total(), None);
        assert_eq!(cart.items()[0].line_total(), Decimal::MAX);
        assert_eq!(cart.checked_total_amount(), None);
        assert_eq!(cart.total_amount(), Decimal::MAX);
    }

    #[test]
    fn test_cart_item_json_shape() {
        let json = serde_json::to_value(item("p1", 100, 2)).unwrap();
        assert_eq!(json["productId"], "p1");
        assert_eq!(json["productName"], "Product p1");
        assert_eq!(json["productCategory"], "Tea");
        assert_eq!(json["productImage"], "https://cdn.example.com/p1.jpg");
        assert_eq!(json["productPrice"], 100.0);
        assert_eq!(json["productQuantity"], 2);
    }

    #[test]
    fn test_cart_item_parses_numeric_price() {
        let parsed: CartItem = serde_json::from_str(
            r#"{"productId":"p9","productName":"Mug","productCategory":"Kitchen",
                "productImage":"/mug.png","productPrice":12.5,"productQuantity":4}"#,
        )
        .unwrap();
        assert_eq!(parsed.product_price, Decimal::new(125, 1));
        assert_eq!(parsed.line_total(), Decimal::from(50));
    }

    #[test]
    fn test_action_item_id_and_name() {
        let action = CartAction::DecreaseQuantity { item_id: id("z") };
        assert_eq!(action.item_id(), &id("z"));
        assert_eq!(action.name(), "decrease_quantity");
    }
}
