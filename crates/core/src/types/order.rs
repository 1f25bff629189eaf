//! Order payload and receipt types for the order API.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::{Cart, CartItem};
use super::id::OrderId;

/// Body of an order-creation request.
///
/// ```json
/// { "cart": [ { "productId": "...", ... } ], "totalAmount": 350.0, "shippingAddress": "..." }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    /// Snapshot of the cart lines at submission time.
    pub cart: Vec<CartItem>,
    /// Total computed by the cart page, sent as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    /// Free-text shipping address, sent as typed.
    pub shipping_address: String,
}

impl OrderDetails {
    /// Build an order from a cart snapshot and the total computed for it.
    #[must_use]
    pub fn new(cart: Cart, total_amount: Decimal, shipping_address: impl Into<String>) -> Self {
        Self {
            cart: cart.into_items(),
            total_amount,
            shipping_address: shipping_address.into(),
        }
    }
}

/// Whatever the order API returns on success.
///
/// Every field is optional: the cart page only needs to know the call
/// succeeded, so unknown or missing fields never fail a placed order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    #[serde(default, alias = "_id", alias = "orderId")]
    pub id: Option<OrderId>,
    #[serde(default)]
    pub message: Option<String>,
}
