//! Integration tests for the storefront cart page.
//!
//! Each test boots the real storefront router on an ephemeral port and
//! points it at a stub order API, so requests travel the full stack:
//! sessions, HTMX fragments, and the `reqwest` order client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storefront-integration-tests
//! ```

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use reqwest::Client;
use serde_json::Value;
use storefront::config::{OrderApiConfig, StorefrontConfig};
use storefront::state::AppState;
use storefront_core::CurrencyCode;
use url::Url;

/// Bind an ephemeral local port and serve `router` on it.
async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });

    addr
}

// =============================================================================
// Order API Stub
// =============================================================================

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    reply: Value,
    received: Arc<Mutex<Vec<Value>>>,
}

/// A local order API that records every order it receives.
pub struct OrderApiStub {
    endpoint: Url,
    received: Arc<Mutex<Vec<Value>>>,
}

impl OrderApiStub {
    /// Start a stub that answers every order with `status` and `reply`.
    pub async fn spawn(status: StatusCode, reply: Value) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            status,
            reply,
            received: Arc::clone(&received),
        };

        let router = Router::new()
            .route("/orders", post(record_order))
            .with_state(state);
        let addr = serve(router).await;

        Self {
            endpoint: Url::parse(&format!("http://{addr}/orders")).expect("stub url"),
            received,
        }
    }

    /// Start a stub that accepts every order.
    pub async fn accepting() -> Self {
        Self::spawn(StatusCode::CREATED, serde_json::json!({ "_id": "ord-1" })).await
    }

    /// Start a stub that rejects every order.
    pub async fn rejecting() -> Self {
        Self::spawn(
            StatusCode::INTERNAL_SERVER_ERROR,
            serde_json::json!({ "message": "database unavailable" }),
        )
        .await
    }

    /// The endpoint orders are posted to.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Order payloads received so far.
    #[must_use]
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().expect("stub lock").clone()
    }
}

async fn record_order(
    State(state): State<StubState>,
    Json(order): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.received.lock().expect("stub lock").push(order);
    (state.status, Json(state.reply))
}

// =============================================================================
// Storefront Under Test
// =============================================================================

/// Configuration for a storefront talking to `order_api`.
#[must_use]
pub fn test_config(order_api: Url) -> StorefrontConfig {
    StorefrontConfig {
        host: Ipv4Addr::LOCALHOST.into(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        order_api: OrderApiConfig { endpoint: order_api },
        cart_idle_timeout: Duration::from_secs(120 * 60),
        currency: CurrencyCode::default(),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A running storefront plus a cookie-aware client acting as one visitor.
pub struct TestStorefront {
    base_url: String,
    client: Client,
}

impl TestStorefront {
    /// Boot the storefront against the given order API.
    pub async fn spawn(order_api: &OrderApiStub) -> Self {
        Self::spawn_with(test_config(order_api.endpoint().clone())).await
    }

    /// Boot the storefront with a specific configuration.
    pub async fn spawn_with(config: StorefrontConfig) -> Self {
        let state = AppState::new(config).expect("build app state");
        let addr = serve(storefront::app(state)).await;

        Self {
            base_url: format!("http://{addr}"),
            client: Self::visitor(),
        }
    }

    /// A fresh client with its own cookie jar.
    #[must_use]
    pub fn visitor() -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("build client")
    }

    /// The default visitor.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Add a product through a plain form post.
    pub async fn add(&self, id: &str, name: &str, price: &str, quantity: u32) {
        let quantity = quantity.to_string();
        let response = self
            .client
            .post(self.url("/cart/add"))
            .form(&[
                ("product_id", id),
                ("product_name", name),
                ("product_category", "Apparel"),
                ("product_image", "/images/product.jpg"),
                ("product_price", price),
                ("quantity", quantity.as_str()),
            ])
            .send()
            .await
            .expect("add to cart");
        assert!(response.status().is_success(), "add failed: {}", response.status());
    }

    /// POST `form` to `path` as an HTMX request and return the fragment.
    pub async fn htmx_post(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .expect("htmx request")
    }

    /// GET `path` and return the body text.
    pub async fn get_text(&self, path: &str) -> String {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("get request")
            .text()
            .await
            .expect("response body")
    }
}
