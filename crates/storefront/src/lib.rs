//! Storefront cart page library.
//!
//! This crate provides the cart page as a library, allowing it to be
//! tested end to end and embedded in other routers.
//!
//! # Modules
//!
//! - [`store`] - Per-visitor cart stores (subscribe/dispatch)
//! - [`cart`] - The cart view: totals, intents, order submission
//! - [`services`] - Order API client and notifications
//! - [`routes`] - HTTP handlers and templates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use axum::{Router, extract::Request};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the storefront router with its middleware stack.
///
/// Sentry layers are left to the binary so tests run without them.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    routes::routes()
        .layer(session_layer)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::config::{OrderApiConfig, StorefrontConfig};

    fn test_app() -> Router {
        let config = StorefrontConfig {
            host: std::net::Ipv4Addr::LOCALHOST.into(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            order_api: OrderApiConfig {
                endpoint: "http://127.0.0.1:9/orders".parse().unwrap(),
            },
            cart_idle_timeout: Duration::from_secs(60),
            currency: storefront_core::CurrencyCode::default(),
            sentry_dsn: None,
            sentry_environment: None,
        };
        app(AppState::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_health_echoes_request_id() {
        let response = test_app()
            .oneshot(
                Request::get("/health")
                    .header(middleware::request_id::REQUEST_ID_HEADER, "edge-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[middleware::request_id::REQUEST_ID_HEADER],
            "edge-42"
        );
    }

    #[tokio::test]
    async fn test_new_visitor_sees_empty_cart() {
        let response = test_app()
            .oneshot(Request::get("/cart").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let page = String::from_utf8(body.to_vec()).unwrap();
        assert!(page.contains("Your cart is empty."));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = test_app()
            .oneshot(Request::get("/checkout").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
