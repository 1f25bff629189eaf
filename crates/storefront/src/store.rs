//! Shared cart state.
//!
//! Each visitor's cart lives in a [`CartStore`]: the single owner of the
//! cart, mutated only by dispatching [`CartAction`]s. Readers take snapshots
//! or subscribe to a `watch` channel that wakes them when the cart changes.
//!
//! [`CartStores`] is the application-wide registry mapping a session's
//! [`CartId`] to its store. Carts are kept in memory only and dropped after a
//! configurable idle period.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use storefront_core::{Cart, CartAction, CartId};
use tokio::sync::watch;
use tracing::debug;

/// Subscribe/dispatch access to a cart.
pub trait Store: Send + Sync {
    /// Current cart contents.
    fn snapshot(&self) -> Cart;

    /// Receiver that observes every change to the cart.
    fn subscribe(&self) -> watch::Receiver<Cart>;

    /// Ask the store to apply a mutation intent.
    fn dispatch(&self, action: CartAction);
}

/// In-memory cart store backed by a `watch` channel.
#[derive(Debug)]
pub struct CartStore {
    sender: watch::Sender<Cart>,
}

impl CartStore {
    /// Create a store holding an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cart(Cart::new())
    }

    /// Create a store holding the given cart.
    #[must_use]
    pub fn with_cart(cart: Cart) -> Self {
        let (sender, _receiver) = watch::channel(cart);
        Self { sender }
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for CartStore {
    fn snapshot(&self) -> Cart {
        self.sender.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Cart> {
        self.sender.subscribe()
    }

    fn dispatch(&self, action: CartAction) {
        // Subscribers are only woken when the reducer reports a change.
        let changed = self.sender.send_if_modified(|cart| cart.apply(&action));
        debug!(
            action = action.name(),
            item_id = %action.item_id(),
            changed,
            "Cart action dispatched"
        );
    }
}

/// Registry of per-visitor cart stores.
#[derive(Clone)]
pub struct CartStores {
    cache: Cache<CartId, Arc<CartStore>>,
}

impl CartStores {
    /// Maximum number of carts held at once.
    const MAX_CARTS: u64 = 100_000;

    /// Create a registry whose carts expire after `idle_timeout` without access.
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(Self::MAX_CARTS)
            .time_to_idle(idle_timeout)
            .build();

        Self { cache }
    }

    /// Get the store for a cart, creating an empty one if none exists.
    pub async fn get_or_create(&self, id: CartId) -> Arc<CartStore> {
        self.cache
            .get_with(id, async move {
                debug!(cart_id = %id, "Creating cart store");
                Arc::new(CartStore::new())
            })
            .await
    }

    /// Get the store for a cart if it is still live.
    pub async fn get(&self, id: CartId) -> Option<Arc<CartStore>> {
        self.cache.get(&id).await
    }
}
