//! Collaborators of the cart page.
//!
//! # Services
//!
//! - `orders` - Order API client (`OrderApi` trait, reqwest-backed `OrderClient`)
//! - `notify` - Success/failure notifications shown to the visitor

pub mod notify;
pub mod orders;

pub use notify::{Notifier, Toast, ToastLevel, Toasts};
pub use orders::{OrderApi, OrderApiError, OrderClient};
