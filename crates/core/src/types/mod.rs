//! Core types for the storefront.
//!
//! This module provides type-safe wrappers for cart and order concepts.

pub mod cart;
pub mod id;
pub mod order;
pub mod price;

pub use cart::{Cart, CartAction, CartItem};
pub use id::*;
pub use order::{OrderDetails, OrderReceipt};
pub use price::{CurrencyCode, Price, UnknownCurrencyCode};
