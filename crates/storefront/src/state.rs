//! Shared handle to the cart store.
//!
//! The UI and every checkout orchestrator built over a handle mutate the same
//! [`CartStore`]. The handle wraps it in `Arc<Mutex<_>>` and is cheaply cloneable.
//! The state lock is only held for synchronous sections, never across an `.await`.
//!
//! Checkout bookkeeping lives here too, next to the state it protects:
//! - a gate that admits one checkout at a time, whichever orchestrator runs it
//! - the counter that numbers checkouts, so IDs are unique per store
//! - the current checkout, so a deferred transition from an older one is ignored
//! - the pending deferred task, aborted when the next checkout begins

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pupusas_core::{Cart, CartError, CartItem, CartStore, Catalog, Customer, ProductId, UiStatus};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;

use crate::error::{AppError, add_breadcrumb};

/// Identity of one checkout attempt on one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CheckoutId(u64);

impl std::fmt::Display for CheckoutId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Deferred status change applied after a finished checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTransition {
    /// Empty the cart and return to idle (after a successful payment).
    ClearCart,
    /// Return to idle, keeping the cart (after a declined payment).
    ResetStatus,
}

/// Cheaply cloneable handle to the shared cart store.
#[derive(Clone, Default)]
pub struct StoreHandle {
    inner: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<StoreState>,
    /// Held for the whole of a checkout, across its service calls.
    checkout_gate: tokio::sync::Mutex<()>,
}

#[derive(Default)]
struct StoreState {
    store: CartStore,
    last_checkout: u64,
    active_checkout: Option<CheckoutId>,
    pending: Option<JoinHandle<()>>,
}

/// A checkout admitted by [`StoreHandle::begin_checkout`].
///
/// Holds the store's checkout gate until dropped.
pub(crate) struct CheckoutTicket<'a> {
    pub(crate) id: CheckoutId,
    /// The cart as it stood when the checkout began.
    pub(crate) cart: Cart,
    _gate: tokio::sync::MutexGuard<'a, ()>,
}

impl StoreHandle {
    /// Create a handle around an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle around an existing store.
    #[must_use]
    pub fn from_store(store: CartStore) -> Self {
        Self {
            inner: Arc::new(Shared {
                state: Mutex::new(StoreState {
                    store,
                    ..StoreState::default()
                }),
                checkout_gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // Store mutations cannot panic halfway, so a poisoned lock still holds
        // consistent state.
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a closure against the store under the lock.
    pub fn with<R>(&self, f: impl FnOnce(&CartStore) -> R) -> R {
        f(&self.lock().store)
    }

    /// Copy of the current store.
    #[must_use]
    pub fn snapshot(&self) -> CartStore {
        self.lock().store.clone()
    }

    // =========================================================================
    // Cart actions
    // =========================================================================

    /// Add an item to the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::QuantityOverflow`] if the merged quantity overflows.
    pub fn add_to_cart(&self, item: CartItem) -> Result<(), CartError> {
        let id = item.id.clone();
        let quantity = item.quantity.to_string();
        self.lock().store.add_to_cart(item)?;
        add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[("product_id", id.as_str()), ("quantity", quantity.as_str())]),
        );
        Ok(())
    }

    /// Increase a line's quantity by one.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if no line has this ID.
    pub fn increment_quantity(&self, id: &ProductId) -> Result<(), CartError> {
        self.lock().store.increment_quantity(id)
    }

    /// Decrease a line's quantity by one, never below zero.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if no line has this ID.
    pub fn decrement_quantity(&self, id: &ProductId) -> Result<(), CartError> {
        self.lock().store.decrement_quantity(id)
    }

    /// Empty the cart and reset the status to idle.
    pub fn clear_cart(&self) {
        self.lock().store.clear_cart();
        add_breadcrumb("cart", "Cart emptied", None);
    }

    pub fn set_customer(&self, customer: Customer) {
        self.lock().store.set_customer(customer);
    }

    pub fn set_products(&self, catalog: Catalog) {
        self.lock().store.set_products(catalog);
    }

    pub fn update_cart_ui(&self, status: UiStatus) {
        self.lock().store.update_cart_ui(status);
    }

    // =========================================================================
    // Derived reads
    // =========================================================================

    #[must_use]
    pub fn cart_count(&self) -> u64 {
        self.lock().store.cart_count()
    }

    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        self.lock().store.cart_total()
    }

    #[must_use]
    pub fn status(&self) -> UiStatus {
        self.lock().store.status()
    }

    #[must_use]
    pub fn customer(&self) -> Option<Customer> {
        self.lock().store.customer().cloned()
    }

    #[must_use]
    pub fn cart(&self) -> Cart {
        self.lock().store.cart().clone()
    }

    #[must_use]
    pub fn featured_products(&self) -> Option<serde_json::Value> {
        self.lock().store.featured_products().cloned()
    }

    // =========================================================================
    // Checkout bookkeeping
    // =========================================================================

    /// Admit a new checkout: number it, make it current, set the status to
    /// loading, and abort the deferred transition left by the previous one.
    ///
    /// # Errors
    ///
    /// - [`AppError::CheckoutInProgress`] if a checkout on this store is running
    /// - [`AppError::EmptyCart`] if there is nothing to charge; nothing changes
    pub(crate) fn begin_checkout(&self) -> Result<CheckoutTicket<'_>, AppError> {
        let Ok(gate) = self.inner.checkout_gate.try_lock() else {
            return Err(AppError::CheckoutInProgress);
        };

        let mut state = self.lock();
        if state.store.cart().is_empty() {
            return Err(AppError::EmptyCart);
        }

        state.last_checkout += 1;
        let id = CheckoutId(state.last_checkout);
        state.active_checkout = Some(id);
        state.store.update_cart_ui(UiStatus::Loading);
        if let Some(previous) = state.pending.take() {
            previous.abort();
        }

        Ok(CheckoutTicket {
            id,
            cart: state.store.cart().clone(),
            _gate: gate,
        })
    }

    /// Remember the task that will apply a deferred transition, aborting any
    /// task it replaces.
    pub(crate) fn set_pending(&self, handle: JoinHandle<()>) {
        let previous = self.lock().pending.replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Set the status only if `id` is still the current checkout.
    pub(crate) fn update_for(&self, id: CheckoutId, status: UiStatus) -> bool {
        let mut state = self.lock();
        if state.active_checkout != Some(id) {
            return false;
        }
        state.store.update_cart_ui(status);
        true
    }

    /// Record the customer of a created order, and set the final status if `id`
    /// is still current.
    ///
    /// The order exists either way, so the customer is always recorded.
    pub(crate) fn complete_for(&self, id: CheckoutId, customer: Customer) -> bool {
        let mut state = self.lock();
        state.store.set_customer(customer);
        if state.active_checkout != Some(id) {
            return false;
        }
        state.store.update_cart_ui(UiStatus::Success);
        true
    }

    /// Apply a deferred transition if `id` is still the current checkout.
    pub(crate) fn apply_deferred(&self, id: CheckoutId, transition: DeferredTransition) -> bool {
        let mut state = self.lock();
        if state.active_checkout != Some(id) {
            return false;
        }
        match transition {
            DeferredTransition::ClearCart => state.store.clear_cart(),
            DeferredTransition::ResetStatus => state.store.update_cart_ui(UiStatus::Idle),
        }
        state.active_checkout = None;
        true
    }

    /// The checkout whose transitions are still allowed to land, if any.
    #[must_use]
    pub fn active_checkout(&self) -> Option<CheckoutId> {
        self.lock().active_checkout
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("StoreHandle")
            .field("store", &state.store)
            .field("active_checkout", &state.active_checkout)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str, qty: u32) -> CartItem {
        CartItem::new(id, "Revuelta", Decimal::new(5, 0), qty)
    }

    fn begin(handle: &StoreHandle) -> CheckoutId {
        handle.begin_checkout().unwrap().id
    }

    #[test]
    fn test_clones_share_state() {
        let a = StoreHandle::new();
        let b = a.clone();
        a.add_to_cart(item("1", 2)).unwrap();
        assert_eq!(b.cart_count(), 2);
    }

    #[test]
    fn test_begin_checkout_sets_loading_and_snapshots() {
        let handle = StoreHandle::new();
        handle.add_to_cart(item("1", 2)).unwrap();

        let ticket = handle.begin_checkout().unwrap();
        handle.add_to_cart(item("2", 1)).unwrap();

        assert_eq!(handle.status(), UiStatus::Loading);
        assert_eq!(ticket.cart.len(), 1);
        assert_eq!(handle.active_checkout(), Some(ticket.id));
    }

    #[test]
    fn test_begin_checkout_refuses_empty_cart() {
        let handle = StoreHandle::new();
        let err = handle.begin_checkout().err().unwrap();

        assert!(matches!(err, AppError::EmptyCart));
        assert_eq!(handle.status(), UiStatus::Idle);
        assert_eq!(handle.active_checkout(), None);
    }

    #[test]
    fn test_one_checkout_at_a_time_across_clones() {
        let handle = StoreHandle::new();
        handle.add_to_cart(item("1", 1)).unwrap();
        let other = handle.clone();

        let ticket = handle.begin_checkout().unwrap();
        let err = other.begin_checkout().err().unwrap();
        assert!(matches!(err, AppError::CheckoutInProgress));
        assert_eq!(other.active_checkout(), Some(ticket.id));

        drop(ticket);
        assert!(other.begin_checkout().is_ok());
    }

    #[test]
    fn test_checkout_ids_are_unique_per_store() {
        let handle = StoreHandle::new();
        handle.add_to_cart(item("1", 1)).unwrap();
        let other = handle.clone();

        let first = begin(&handle);
        let second = begin(&other);

        assert_ne!(first, second);
    }

    #[test]
    fn test_stale_deferred_transition_is_ignored() {
        let handle = StoreHandle::new();
        handle.add_to_cart(item("1", 2)).unwrap();
        let first = begin(&handle);
        begin(&handle);

        assert!(!handle.apply_deferred(first, DeferredTransition::ClearCart));
        assert_eq!(handle.cart_count(), 2);
        assert_eq!(handle.status(), UiStatus::Loading);
    }

    #[test]
    fn test_deferred_clear_empties_cart() {
        let handle = StoreHandle::new();
        handle.add_to_cart(item("1", 2)).unwrap();
        let id = begin(&handle);
        handle.update_for(id, UiStatus::Success);

        assert!(handle.apply_deferred(id, DeferredTransition::ClearCart));
        assert_eq!(handle.cart_count(), 0);
        assert_eq!(handle.status(), UiStatus::Idle);
        assert_eq!(handle.active_checkout(), None);
    }

    #[test]
    fn test_deferred_reset_keeps_cart() {
        let handle = StoreHandle::new();
        handle.add_to_cart(item("1", 2)).unwrap();
        let id = begin(&handle);
        handle.update_for(id, UiStatus::Failure);

        assert!(handle.apply_deferred(id, DeferredTransition::ResetStatus));
        assert_eq!(handle.cart_count(), 2);
        assert_eq!(handle.status(), UiStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_begin_checkout_aborts_pending_task() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::time::Duration;

        let handle = StoreHandle::new();
        handle.add_to_cart(item("1", 2)).unwrap();
        begin(&handle);

        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        handle.set_pending(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            flag.store(true, Ordering::SeqCst);
        }));
        begin(&handle);
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(!fired.load(Ordering::SeqCst));
    }
}
