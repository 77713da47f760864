//! Client-side cart state, mirrored from the server after every call.
//!
//! The store never computes totals itself: every successful mutation
//! replaces the local snapshot with the cart the server sent back. Calls
//! are serialized, so an earlier response can never land after (and
//! overwrite) a later one.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use storefront_core::{Cart, CartItem};

use crate::api::CartApi;
use crate::error::{Error, Result};
use crate::session::SessionContext;

/// What a cart view renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartSnapshot {
    /// Items in server order
    pub items: Vec<CartItem>,
    pub total_items: u32,
    pub total_price: f64,
    /// A call is queued or in flight; controls should be disabled.
    pub busy: bool,
    /// The cart view should be shown.
    pub is_open: bool,
    /// Message of the last failed call, cleared by the next success.
    pub last_error: Option<String>,
}

impl CartSnapshot {
    pub fn item(&self, cart_item_id: u64) -> Option<&CartItem> {
        self.items.iter().find(|i| i.cart_item_id == cart_item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn replace_with(&mut self, cart: Cart) {
        self.items = cart.items;
        self.total_items = cart.total_items;
        self.total_price = cart.total_price;
        self.last_error = None;
    }

    fn reset_contents(&mut self) {
        self.items.clear();
        self.total_items = 0;
        self.total_price = 0.0;
    }
}

/// Shopping cart store
pub struct CartStore {
    api: Arc<dyn CartApi>,
    session: SessionContext,
    state: watch::Sender<CartSnapshot>,
    in_flight: AtomicUsize,
    queue: Mutex<()>,
}

/// Keeps `busy` set while alive.
struct BusyGuard<'a> {
    store: &'a CartStore,
}

impl<'a> BusyGuard<'a> {
    fn acquire(store: &'a CartStore) -> Self {
        store.state.send_modify(|s| {
            store.in_flight.fetch_add(1, Ordering::SeqCst);
            s.busy = true;
        });
        Self { store }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let store = self.store;
        store.state.send_modify(|s| {
            let remaining = store.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
            s.busy = remaining > 0;
        });
    }
}

impl CartStore {
    pub fn new(api: Arc<dyn CartApi>, session: SessionContext) -> Self {
        Self {
            api,
            session,
            state: watch::Sender::new(CartSnapshot::default()),
            in_flight: AtomicUsize::new(0),
            queue: Mutex::new(()),
        }
    }

    /// Current state
    pub fn snapshot(&self) -> CartSnapshot {
        self.state.borrow().clone()
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.state.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.state.borrow().busy
    }

    pub fn open(&self) {
        self.state.send_modify(|s| s.is_open = true);
    }

    pub fn close(&self) {
        self.state.send_modify(|s| s.is_open = false);
    }

    /// Fetch the caller's cart.
    ///
    /// Without a session token this empties the cart locally and never
    /// touches the network. An authorization failure is treated the same
    /// way and is not an error.
    pub async fn load(&self) -> Result<()> {
        if self.session.access_token().await.is_none() {
            debug!("No session token, skipping cart load");
            self.state.send_modify(CartSnapshot::reset_contents);
            return Ok(());
        }

        let _busy = BusyGuard::acquire(self);
        let _turn = self.queue.lock().await;

        match self.api.fetch_cart().await {
            Ok(cart) => {
                debug!("Cart loaded: {} item(s)", cart.total_items);
                self.state.send_modify(|s| s.replace_with(cart));
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                info!("Not authenticated, clearing cart");
                self.state.send_modify(CartSnapshot::reset_contents);
                Ok(())
            }
            Err(e) => Err(self.report("loading cart", e)),
        }
    }

    /// Add a product and reveal the cart.
    pub async fn add_item(&self, product_id: u64, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(self.report(
                "adding to cart",
                Error::InvalidInput("quantity must be at least 1".into()),
            ));
        }

        let _busy = BusyGuard::acquire(self);
        let _turn = self.queue.lock().await;

        let cart = self
            .api
            .add_item(product_id, quantity)
            .await
            .map_err(|e| self.report("adding to cart", e))?;
        self.state.send_modify(|s| {
            s.replace_with(cart);
            s.is_open = true;
        });
        info!("Product {} added to cart (x{})", product_id, quantity);
        Ok(())
    }

    /// Set a line's quantity.
    ///
    /// The value is forwarded as given; bounding it to the stock ceiling is
    /// up to the caller (see [`CartItem::clamp_quantity`]). Zero removes the
    /// line.
    pub async fn update_quantity(&self, cart_item_id: u64, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return self.remove_item(cart_item_id).await;
        }

        let _busy = BusyGuard::acquire(self);
        let _turn = self.queue.lock().await;

        let cart = self
            .api
            .update_item(cart_item_id, quantity)
            .await
            .map_err(|e| self.report("updating cart", e))?;
        self.state.send_modify(|s| s.replace_with(cart));
        info!("Cart item {} set to {}", cart_item_id, quantity);
        Ok(())
    }

    /// One more unit, unless the line is already at its stock ceiling.
    pub async fn increment(&self, cart_item_id: u64) -> Result<()> {
        let item = self.known_item(cart_item_id)?;
        if !item.can_increment() {
            debug!("Cart item {} already at stock ceiling", cart_item_id);
            return Ok(());
        }
        self.update_quantity(cart_item_id, item.clamp_quantity(item.quantity + 1))
            .await
    }

    /// One less unit, never below one.
    pub async fn decrement(&self, cart_item_id: u64) -> Result<()> {
        let item = self.known_item(cart_item_id)?;
        if !item.can_decrement() {
            return Ok(());
        }
        self.update_quantity(cart_item_id, item.clamp_quantity(item.quantity - 1))
            .await
    }

    pub async fn remove_item(&self, cart_item_id: u64) -> Result<()> {
        let _busy = BusyGuard::acquire(self);
        let _turn = self.queue.lock().await;

        let cart = self
            .api
            .remove_item(cart_item_id)
            .await
            .map_err(|e| self.report("removing from cart", e))?;
        self.state.send_modify(|s| s.replace_with(cart));
        info!("Cart item {} removed", cart_item_id);
        Ok(())
    }

    /// Empty the cart. The server returns no body, so local state is reset
    /// explicitly.
    pub async fn clear(&self) -> Result<()> {
        let _busy = BusyGuard::acquire(self);
        let _turn = self.queue.lock().await;

        self.api
            .clear()
            .await
            .map_err(|e| self.report("clearing cart", e))?;
        self.state.send_modify(|s| {
            s.reset_contents();
            s.last_error = None;
        });
        info!("Cart cleared");
        Ok(())
    }

    fn known_item(&self, cart_item_id: u64) -> Result<CartItem> {
        self.state
            .borrow()
            .item(cart_item_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("cart item {}", cart_item_id)))
    }

    /// Log a failure and expose its message to the view.
    fn report(&self, action: &str, error: Error) -> Error {
        warn!("Error {}: {}", action, error);
        let message = error.user_message();
        self.state.send_modify(|s| s.last_error = Some(message));
        error
    }
}
