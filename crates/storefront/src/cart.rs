//! The cart page.
//!
//! [`CartView`] is bound to a [`Store`] it does not own. It reads snapshots,
//! forwards quantity changes to the store as intents, keeps the total in
//! step with the snapshot it last observed, and submits the order.
//!
//! ```text
//! idle ──submit──▶ submitting ──▶ success | failure ──▶ idle
//! ```
//!
//! There is no in-flight guard: two submits in a row send two orders.

use std::sync::Arc;

use rust_decimal::Decimal;
use storefront_core::{Cart, CartAction, OrderDetails, OrderReceipt, ProductId};
use tokio::sync::watch;
use tracing::{error, info};

use crate::services::{Notifier, OrderApi};
use crate::store::{CartStore, Store};

/// Message shown when an order is accepted.
pub const ORDER_PLACED_MESSAGE: &str = "Order placed successfully!";

/// Message shown when an order is rejected for any reason.
pub const ORDER_FAILED_MESSAGE: &str = "Order placement failed!";

/// Result of a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    Placed(OrderReceipt),
    Failed,
}

impl OrderOutcome {
    #[must_use]
    pub const fn is_placed(&self) -> bool {
        matches!(self, Self::Placed(_))
    }

    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Placed(_) => "placed",
            Self::Failed => "failed",
        }
    }
}

/// Cart page state bound to an external store.
pub struct CartView<S: Store + ?Sized = CartStore> {
    store: Arc<S>,
    updates: watch::Receiver<Cart>,
    cart: Cart,
    total_amount: Decimal,
    shipping_address: String,
}

impl<S: Store + ?Sized> CartView<S> {
    /// Bind a view to a store, taking the current snapshot.
    pub fn new(store: Arc<S>) -> Self {
        let mut updates = store.subscribe();
        let cart = updates.borrow_and_update().clone();
        let total_amount = cart.total_amount();

        Self {
            store,
            updates,
            cart,
            total_amount,
            shipping_address: String::new(),
        }
    }

    /// The snapshot the view last observed.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Read the store's current snapshot without touching the view.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        self.store.snapshot()
    }

    /// Total of the observed snapshot.
    #[must_use]
    pub const fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    /// Quantity summed across the observed snapshot.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.cart.total_quantity()
    }

    #[must_use]
    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }

    /// Replace the shipping address. Any text is accepted.
    pub fn set_shipping_address(&mut self, address: impl Into<String>) {
        self.shipping_address = address.into();
    }

    /// Ask the store to lower a line's quantity.
    pub fn decrease(&mut self, item_id: ProductId) {
        self.dispatch(CartAction::DecreaseQuantity { item_id });
    }

    /// Ask the store to raise a line's quantity.
    pub fn increase(&mut self, item_id: ProductId) {
        self.dispatch(CartAction::IncreaseQuantity { item_id });
    }

    /// Ask the store to delete a line.
    pub fn remove(&mut self, item_id: ProductId) {
        self.dispatch(CartAction::RemoveProduct { item_id });
    }

    /// Pick up the latest snapshot if the store changed since the last look.
    ///
    /// Returns `true` if a new snapshot was observed.
    pub fn sync(&mut self) -> bool {
        // A closed channel means the store is gone; keep the last snapshot.
        if !self.updates.has_changed().unwrap_or(false) {
            return false;
        }
        self.observe();
        true
    }

    /// Wait for the store to change, then observe the new snapshot.
    ///
    /// Returns `false` once the store has been dropped.
    pub async fn changed(&mut self) -> bool {
        if self.updates.changed().await.is_err() {
            return false;
        }
        self.observe();
        true
    }

    /// Submit the observed cart, its total, and the shipping address.
    ///
    /// Exactly one notification is sent either way. Cart state is left as is.
    pub async fn submit(&self, api: &dyn OrderApi, notifier: &mut dyn Notifier) -> OrderOutcome {
        let order = OrderDetails::new(
            self.cart.clone(),
            self.total_amount,
            self.shipping_address.clone(),
        );

        match api.create_order(&order).await {
            Ok(receipt) => {
                info!(
                    order_id = ?receipt.id,
                    total = %order.total_amount,
                    lines = order.cart.len(),
                    "Order placed"
                );
                notifier.success(ORDER_PLACED_MESSAGE);
                OrderOutcome::Placed(receipt)
            }
            Err(e) => {
                error!(error = %e, "Order placement failed");
                notifier.error(ORDER_FAILED_MESSAGE);
                OrderOutcome::Failed
            }
        }
    }

    fn dispatch(&mut self, action: CartAction) {
        self.store.dispatch(action);
        self.sync();
    }

    fn observe(&mut self) {
        self.cart = self.updates.borrow_and_update().clone();
        self.total_amount = self.cart.total_amount();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use storefront_core::CartItem;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    use super::*;
    use crate::services::{OrderApiError, ToastLevel, Toasts};

    /// Store that records intents without applying them.
    struct RecordingStore {
        sender: watch::Sender<Cart>,
        dispatched: Mutex<Vec<CartAction>>,
    }

    impl RecordingStore {
        fn new(cart: Cart) -> Self {
            Self {
                sender: watch::channel(cart).0,
                dispatched: Mutex::new(Vec::new()),
            }
        }

        fn dispatched(&self) -> Vec<CartAction> {
            self.dispatched.lock().unwrap().clone()
        }
    }

    impl Store for RecordingStore {
        fn snapshot(&self) -> Cart {
            self.sender.borrow().clone()
        }

        fn subscribe(&self) -> watch::Receiver<Cart> {
            self.sender.subscribe()
        }

        fn dispatch(&self, action: CartAction) {
            self.dispatched.lock().unwrap().push(action);
        }
    }

    /// Layer counting ERROR-level events.
    #[derive(Clone, Default)]
    struct ErrorEvents(Arc<AtomicUsize>);

    impl ErrorEvents {
        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }

        /// Install as the thread's default subscriber until the guard drops.
        fn capture(&self) -> tracing::subscriber::DefaultGuard {
            tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for ErrorEvents {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    /// Order API that counts calls and returns a fixed result.
    struct StubOrderApi {
        fail: bool,
        calls: AtomicUsize,
        last: Mutex<Option<OrderDetails>>,
    }

    impl StubOrderApi {
        fn accepting() -> Self {
            Self {
                fail: false,
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            }
        }

        fn rejecting() -> Self {
            Self {
                fail: true,
                ..Self::accepting()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last(&self) -> OrderDetails {
            self.last.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl OrderApi for StubOrderApi {
        async fn create_order(
            &self,
            order: &OrderDetails,
        ) -> Result<OrderReceipt, OrderApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(order.clone());
            if self.fail {
                Err(OrderApiError::Api {
                    status: 500,
                    message: "boom".to_string(),
                })
            } else {
                Ok(OrderReceipt::default())
            }
        }
    }

    fn item(id: &str, price: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            product_name: format!("Item {id}"),
            product_category: "Handicraft".to_string(),
            product_image: format!("/img/{id}.jpg"),
            product_price: Decimal::from(price),
            product_quantity: quantity,
        }
    }

    fn sample_cart() -> Cart {
        [item("a", 100, 2), item("b", 50, 3)].into_iter().collect()
    }

    #[test]
    fn test_total_computed_on_bind() {
        let view = CartView::new(Arc::new(CartStore::with_cart(sample_cart())));
        assert_eq!(view.total_amount(), Decimal::from(350));
        assert_eq!(view.total_quantity(), 5);
    }

    #[test]
    fn test_empty_cart_total_is_zero() {
        let view = CartView::new(Arc::new(CartStore::new()));
        assert_eq!(view.total_amount(), Decimal::ZERO);
        assert!(view.cart().is_empty());
    }

    #[test]
    fn test_intents_dispatch_matching_actions() {
        let store = Arc::new(RecordingStore::new(sample_cart()));
        let mut view = CartView::new(Arc::clone(&store));
        view.set_shipping_address("Patan Durbar Square");

        view.increase(ProductId::new("a"));
        view.decrease(ProductId::new("b"));
        view.remove(ProductId::new("a"));

        assert_eq!(
            store.dispatched(),
            [
                CartAction::IncreaseQuantity {
                    item_id: ProductId::new("a")
                },
                CartAction::DecreaseQuantity {
                    item_id: ProductId::new("b")
                },
                CartAction::RemoveProduct {
                    item_id: ProductId::new("a")
                },
            ]
        );

        // Nothing local moved: the store decides what an intent means.
        assert_eq!(view.cart(), &sample_cart());
        assert_eq!(view.total_amount(), Decimal::from(350));
        assert_eq!(view.shipping_address(), "Patan Durbar Square");
    }

    #[test]
    fn test_total_follows_store_changes() {
        let store = Arc::new(CartStore::with_cart(sample_cart()));
        let mut view = CartView::new(Arc::clone(&store));

        view.increase(ProductId::new("a"));
        assert_eq!(view.total_amount(), Decimal::from(450));

        view.remove(ProductId::new("b"));
        assert_eq!(view.total_amount(), Decimal::from(300));

        view.decrease(ProductId::new("a"));
        view.decrease(ProductId::new("a"));
        view.decrease(ProductId::new("a"));
        assert_eq!(view.total_amount(), Decimal::ZERO);
        assert!(view.cart().is_empty());
    }

    #[test]
    fn test_sync_picks_up_changes_made_elsewhere() {
        let store = Arc::new(CartStore::new());
        let mut view = CartView::new(Arc::clone(&store));
        assert!(!view.sync());

        store.dispatch(CartAction::AddProduct(item("c", 20, 5)));
        assert_eq!(view.total_amount(), Decimal::ZERO);
        assert_eq!(view.snapshot().total_amount(), Decimal::from(100));

        assert!(view.sync());
        assert_eq!(view.total_amount(), Decimal::from(100));
    }

    #[tokio::test]
    async fn test_changed_waits_for_next_snapshot() {
        let store = Arc::new(CartStore::new());
        let mut view = CartView::new(Arc::clone(&store));

        let writer = Arc::clone(&store);
        tokio::spawn(async move {
            writer.dispatch(CartAction::AddProduct(item("d", 7, 2)));
        });

        assert!(view.changed().await);
        assert_eq!(view.total_amount(), Decimal::from(14));
    }

    #[tokio::test]
    async fn test_submit_success_notifies_once() {
        let store = Arc::new(CartStore::with_cart(sample_cart()));
        let mut view = CartView::new(Arc::clone(&store));
        view.set_shipping_address("Bhaktapur");

        let errors = ErrorEvents::default();
        let _guard = errors.capture();

        let api = StubOrderApi::accepting();
        let mut toasts = Toasts::default();
        let outcome = view.submit(&api, &mut toasts).await;

        assert!(outcome.is_placed());
        assert_eq!(errors.count(), 0);
        assert_eq!(api.calls(), 1);
        assert_eq!(toasts.len(), 1);
        let toast = toasts.iter().next().unwrap();
        assert_eq!(toast.level, ToastLevel::Success);
        assert_eq!(toast.message, ORDER_PLACED_MESSAGE);

        let sent = api.last();
        assert_eq!(sent.cart, sample_cart().into_items());
        assert_eq!(sent.total_amount, Decimal::from(350));
        assert_eq!(sent.shipping_address, "Bhaktapur");

        // No rollback and no clearing.
        assert_eq!(store.snapshot(), sample_cart());
    }

    #[tokio::test]
    async fn test_submit_failure_notifies_once() {
        let store = Arc::new(CartStore::with_cart(sample_cart()));
        let view = CartView::new(Arc::clone(&store));

        let errors = ErrorEvents::default();
        let _guard = errors.capture();

        let api = StubOrderApi::rejecting();
        let mut toasts = Toasts::default();
        let outcome = view.submit(&api, &mut toasts).await;

        assert_eq!(outcome, OrderOutcome::Failed);
        assert_eq!(errors.count(), 1);
        assert_eq!(api.calls(), 1);
        assert_eq!(toasts.len(), 1);
        let toast = toasts.iter().next().unwrap();
        assert_eq!(toast.level, ToastLevel::Error);
        assert_eq!(toast.message, ORDER_FAILED_MESSAGE);
        assert_eq!(store.snapshot(), sample_cart());
    }

    #[test]
    fn test_outcome_names() {
        assert_eq!(OrderOutcome::Placed(OrderReceipt::default()).name(), "placed");
        assert_eq!(OrderOutcome::Failed.name(), "failed");
    }

    #[tokio::test]
    async fn test_submit_with_empty_address_still_sends() {
        let view = CartView::new(Arc::new(CartStore::new()));
        let api = StubOrderApi::accepting();
        let mut toasts = Toasts::default();

        view.submit(&api, &mut toasts).await;

        let sent = api.last();
        assert_eq!(api.calls(), 1);
        assert!(sent.shipping_address.is_empty());
        assert!(sent.cart.is_empty());
        assert_eq!(sent.total_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_repeated_submits_each_send() {
        let view = CartView::new(Arc::new(CartStore::with_cart(sample_cart())));
        let api = StubOrderApi::accepting();
        let mut toasts = Toasts::default();

        view.submit(&api, &mut toasts).await;
        view.submit(&api, &mut toasts).await;

        assert_eq!(api.calls(), 2);
        assert_eq!(toasts.len(), 2);
    }
}
