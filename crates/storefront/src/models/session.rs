//! Session-related types.
//!
//! The session only carries a pointer to the visitor's cart and any
//! notifications waiting for the next page render. Cart contents live in
//! the cart store, never in the session.

/// Session keys for cart page data.
pub mod keys {
    /// Key for the visitor's `CartId`.
    pub const CART_ID: &str = "cart_id";

    /// Key for toasts flashed across a redirect.
    pub const TOASTS: &str = "toasts";
}
