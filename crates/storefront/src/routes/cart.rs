//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Without HTMX every form still works: the handler redirects back to
//! `/cart` and any toasts ride along in the session.
//!
//! The session holds only a `CartId`; the cart itself lives in the
//! application-wide cart registry.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use storefront_core::{CartAction, CartId, CartItem, CurrencyCode, Price, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use crate::cart::CartView;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session_keys;
use crate::services::Toasts;
use crate::state::AppState;
use crate::store::{CartStore, Store};

/// HTMX event fired after any cart change.
const CART_UPDATED_EVENT: &str = "cart-updated";

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: String,
    pub name: String,
    pub category: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartSummary {
    pub items: Vec<CartLineView>,
    pub total_quantity: u32,
    pub total: String,
}

impl CartSummary {
    /// Summarize the view's observed cart with prices in `currency`.
    pub fn new<S: Store + ?Sized>(view: &CartView<S>, currency: CurrencyCode) -> Self {
        let items = view
            .cart()
            .items()
            .iter()
            .map(|item| CartLineView {
                id: item.product_id.to_string(),
                name: item.product_name.clone(),
                category: item.product_category.clone(),
                image: item.product_image.clone(),
                quantity: item.product_quantity,
                price: Price::new(item.product_price, currency).display(),
                line_price: Price::new(item.line_total(), currency).display(),
            })
            .collect();

        Self {
            items,
            total_quantity: view.total_quantity(),
            total: Price::new(view.total_amount(), currency).display(),
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub product_name: String,
    #[serde(default)]
    pub product_category: String,
    #[serde(default)]
    pub product_image: String,
    pub product_price: Decimal,
    pub quantity: Option<u32>,
}

impl AddToCartForm {
    fn into_item(self) -> Result<CartItem> {
        if self.product_id.trim().is_empty() {
            return Err(AppError::BadRequest("product_id is required".to_string()));
        }
        if self.product_price.is_sign_negative() {
            return Err(AppError::BadRequest(
                "product_price must not be negative".to_string(),
            ));
        }

        let item = CartItem {
            product_id: ProductId::new(self.product_id),
            product_name: self.product_name,
            product_category: self.product_category,
            product_image: self.product_image,
            product_price: self.product_price,
            product_quantity: self.quantity.unwrap_or(1),
        };
        if item.checked_line_total().is_none() {
            return Err(AppError::BadRequest(
                "product_price times quantity is too large".to_string(),
            ));
        }

        Ok(item)
    }
}

/// Form naming a single cart line.
#[derive(Debug, Deserialize)]
pub struct ItemForm {
    pub item_id: String,
}

/// Place-order form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub shipping_address: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartSummary,
    pub toasts: Toasts,
    pub oob: bool,
}

/// Cart lines and totals fragment (for HTMX).
///
/// Totals are swapped out-of-band so the shipping address input keeps
/// whatever the visitor has typed.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_contents.html")]
pub struct CartContentsTemplate {
    pub cart: CartSummary,
    pub oob: bool,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Toast list fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/toasts.html")]
pub struct ToastsTemplate {
    pub toasts: Toasts,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart ID from the session, creating one if needed.
async fn ensure_cart_id(session: &Session) -> Result<CartId> {
    if let Some(cart_id) = session.get::<CartId>(session_keys::CART_ID).await? {
        return Ok(cart_id);
    }

    let cart_id = CartId::generate();
    session.insert(session_keys::CART_ID, cart_id).await?;
    tracing::debug!(%cart_id, "Assigned cart to session");
    Ok(cart_id)
}

/// Get the visitor's cart store, creating the cart if needed.
async fn cart_store(state: &AppState, session: &Session) -> Result<Arc<CartStore>> {
    let cart_id = ensure_cart_id(session).await?;
    Ok(state.carts().get_or_create(cart_id).await)
}

/// Get the visitor's cart store for reading.
///
/// Visitors without a cart (or whose cart expired) get a detached empty
/// store, so reading never creates a session.
async fn existing_store(state: &AppState, session: &Session) -> Result<Arc<CartStore>> {
    let Some(cart_id) = session.get::<CartId>(session_keys::CART_ID).await? else {
        return Ok(Arc::new(CartStore::new()));
    };

    Ok(state
        .carts()
        .get(cart_id)
        .await
        .unwrap_or_else(|| Arc::new(CartStore::new())))
}

/// Whether the request was issued by HTMX.
fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .is_some_and(|value| value.as_bytes() == b"true")
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<CartShowTemplate> {
    let view = CartView::new(existing_store(&state, &session).await?);
    let toasts = session
        .remove::<Toasts>(session_keys::TOASTS)
        .await?
        .unwrap_or_default();

    Ok(CartShowTemplate {
        cart: CartSummary::new(&view, state.config().currency),
        toasts,
        oob: false,
    })
}

/// Add item to cart (HTMX).
///
/// Returns the updated count badge with an HTMX trigger so other cart
/// widgets refresh.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let item = form.into_item()?;
    let store = cart_store(&state, &session).await?;

    add_breadcrumb(
        "cart",
        "add_product",
        Some(&[("item_id", item.product_id.as_str())]),
    );
    store.dispatch(CartAction::AddProduct(item));

    if !is_htmx(&headers) {
        return Ok(Redirect::to("/cart").into_response());
    }

    let count = store.snapshot().total_quantity();
    Ok((
        AppendHeaders([("HX-Trigger", CART_UPDATED_EVENT)]),
        CartCountTemplate { count },
    )
        .into_response())
}

/// Increase a line's quantity (HTMX).
#[instrument(skip(state, session, headers))]
pub async fn increase(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ItemForm>,
) -> Result<Response> {
    apply_intent(&state, &session, &headers, form, "increase_quantity", CartView::increase).await
}

/// Decrease a line's quantity (HTMX).
#[instrument(skip(state, session, headers))]
pub async fn decrease(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ItemForm>,
) -> Result<Response> {
    apply_intent(&state, &session, &headers, form, "decrease_quantity", CartView::decrease).await
}

/// Remove a line (HTMX).
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ItemForm>,
) -> Result<Response> {
    apply_intent(&state, &session, &headers, form, "remove_product", CartView::remove).await
}

/// Forward one intent through the cart view and render the result.
async fn apply_intent(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    form: ItemForm,
    name: &str,
    intent: fn(&mut CartView, ProductId),
) -> Result<Response> {
    let mut view = CartView::new(cart_store(state, session).await?);

    add_breadcrumb("cart", name, Some(&[("item_id", form.item_id.as_str())]));
    intent(&mut view, ProductId::new(form.item_id));

    if !is_htmx(headers) {
        return Ok(Redirect::to("/cart").into_response());
    }

    Ok((
        AppendHeaders([("HX-Trigger", CART_UPDATED_EVENT)]),
        CartContentsTemplate {
            cart: CartSummary::new(&view, state.config().currency),
            oob: true,
        },
    )
        .into_response())
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<CartCountTemplate> {
    let store = existing_store(&state, &session).await?;
    Ok(CartCountTemplate {
        count: store.snapshot().total_quantity(),
    })
}

/// Submit the order.
///
/// The outcome is reported only through toasts: rendered directly for
/// HTMX, flashed through the session otherwise.
#[instrument(skip(state, session, headers, form), fields(outcome = tracing::field::Empty))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let mut view = CartView::new(existing_store(&state, &session).await?);
    view.set_shipping_address(form.shipping_address);

    let mut toasts = Toasts::default();
    let outcome = view.submit(state.orders(), &mut toasts).await;
    tracing::Span::current().record("outcome", outcome.name());
    add_breadcrumb("cart", "submit_order", Some(&[("outcome", outcome.name())]));

    if is_htmx(&headers) {
        return Ok(ToastsTemplate { toasts }.into_response());
    }

    session.insert(session_keys::TOASTS, &toasts).await?;
    Ok(Redirect::to("/cart").into_response())
}
