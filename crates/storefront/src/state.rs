//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::services::{OrderApi, OrderApiError, OrderClient};
use crate::store::CartStores;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the cart registry, the order API, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    carts: CartStores,
    orders: Arc<dyn OrderApi>,
}

impl AppState {
    /// Create application state talking to the configured order API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client for the order API cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, OrderApiError> {
        let orders = OrderClient::new(&config.order_api)?;
        Ok(Self::with_order_api(config, Arc::new(orders)))
    }

    /// Create application state with a specific order API implementation.
    #[must_use]
    pub fn with_order_api(config: StorefrontConfig, orders: Arc<dyn OrderApi>) -> Self {
        let carts = CartStores::new(config.cart_idle_timeout);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                carts,
                orders,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the per-visitor cart registry.
    #[must_use]
    pub fn carts(&self) -> &CartStores {
        &self.inner.carts
    }

    /// Get a reference to the order API.
    #[must_use]
    pub fn orders(&self) -> &dyn OrderApi {
        self.inner.orders.as_ref()
    }
}
