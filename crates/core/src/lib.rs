//! Storefront Core - Cart and order domain types.
//!
//! This crate provides the types shared by the storefront binary and its
//! integration tests:
//! - cart line items and the cart reducer
//! - mutation intents (`CartAction`)
//! - the order payload sent to the order API
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. The store that owns a cart lives in the storefront
//! crate; this crate only knows how a cart reacts to an intent.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, cart and order types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
