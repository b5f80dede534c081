//! # Cart Store
//!
//! Owns the active cart, the list of fetched carts and the product cache
//! used to price cart lines.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Cart Mutations                                 │
//! │                                                                         │
//! │  add_item ─┐                                                            │
//! │  set_qty ──┤   mutation lock    lines from the        PUT /carts/{id}   │
//! │  remove ───┼──► (one at a  ───► latest adopted  ───►  full line list    │
//! │  clear ────┘     time)          cart                  │                 │
//! │                                                       ▼                 │
//! │                                         server cart replaces local      │
//! │                                                                         │
//! │  ensure_cart runs under the same lock, so one store creates at most     │
//! │  one cart even when called concurrently.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pricing
//! Line prices come from the [`ProductCache`]. Lines whose product is not
//! cached price at zero until [`CartStore::hydrate_cart_products`] runs.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use shopfront_core::cart::{add_line, remove_line, set_line_quantity, CartSummary, CartView};
use shopfront_core::{
    Cart, CartId, CartLine, CartPayload, Product, ProductCache, ProductId, RawProduct, UserId,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{track, ActionStatus, StoreState};
use crate::api::Api;
use crate::error::ClientResult;
use crate::handler::ErrorHandler;

// =============================================================================
// State
// =============================================================================

/// Independent loading/error slots of the cart store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CartCategory {
    /// Fetching cart lists.
    List,
    /// Fetching a single cart.
    Detail,
    /// Creating or saving the active cart.
    Mutate,
}

/// Loading flags and errors of every category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartStatuses {
    pub list: ActionStatus,
    pub detail: ActionStatus,
    pub mutate: ActionStatus,
}

#[derive(Debug, Default)]
struct CartState {
    active_cart_id: Option<CartId>,
    cart: Option<Cart>,
    carts: Vec<Cart>,
    status: CartStatuses,
}

impl CartState {
    fn adopt(&mut self, cart: &Cart) {
        self.active_cart_id = Some(cart.id);
        self.cart = Some(cart.clone());
    }
}

impl StoreState for CartState {
    type Category = CartCategory;

    fn status_mut(&mut self, category: CartCategory) -> &mut ActionStatus {
        match category {
            CartCategory::List => &mut self.status.list,
            CartCategory::Detail => &mut self.status.detail,
            CartCategory::Mutate => &mut self.status.mutate,
        }
    }
}

// =============================================================================
// Cart Store
// =============================================================================

/// Cart view-model shared across tasks (`Arc<CartStore>`).
pub struct CartStore {
    api: Arc<dyn Api>,
    handler: Arc<dyn ErrorHandler>,
    state: RwLock<CartState>,
    cache: RwLock<ProductCache>,
    /// Serialises ensure/add/set/remove/clear.
    mutation: Mutex<()>,
    /// Serialises cache hydration.
    hydration: Mutex<()>,
}

impl CartStore {
    pub fn new(api: Arc<dyn Api>, handler: Arc<dyn ErrorHandler>) -> Self {
        Self::with_cache(api, handler, ProductCache::new())
    }

    /// Creates a store around an existing product cache.
    pub fn with_cache(
        api: Arc<dyn Api>,
        handler: Arc<dyn ErrorHandler>,
        cache: ProductCache,
    ) -> Self {
        CartStore {
            api,
            handler,
            state: RwLock::new(CartState::default()),
            cache: RwLock::new(cache),
            mutation: Mutex::new(()),
            hydration: Mutex::new(()),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn cart(&self) -> Option<Cart> {
        self.state.read().cart.clone()
    }

    pub fn carts(&self) -> Vec<Cart> {
        self.state.read().carts.clone()
    }

    pub fn active_cart_id(&self) -> Option<CartId> {
        self.state.read().active_cart_id
    }

    pub fn loading(&self, category: CartCategory) -> bool {
        self.state.read().status.slot(category).loading
    }

    pub fn error(&self, category: CartCategory) -> Option<String> {
        self.state.read().status.slot(category).error.clone()
    }

    /// Snapshot of every category's status.
    pub fn errors(&self) -> CartStatuses {
        self.state.read().status.clone()
    }

    /// Runs `f` over the derived view of the active cart.
    pub fn view<R>(&self, f: impl FnOnce(CartView<'_>) -> R) -> R {
        let state = self.state.read();
        let cache = self.cache.read();
        f(CartView::new(state.cart.as_ref(), &cache))
    }

    pub fn summary(&self) -> CartSummary {
        self.view(|view| view.summary())
    }

    /// Snapshot of the product cache.
    pub fn product_cache(&self) -> ProductCache {
        self.cache.read().clone()
    }

    pub fn cached_product(&self, id: ProductId) -> Option<Product> {
        self.cache.read().get(id).cloned()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// `GET /carts`; replaces the cart list.
    pub async fn get_carts(&self) -> Vec<Cart> {
        debug!("Fetching carts");
        track(
            &self.state,
            CartCategory::List,
            self.handler.as_ref(),
            "Failed to fetch carts",
            self.api.get_json::<Vec<Cart>>("/carts"),
            |state, carts| state.carts = carts.clone(),
        )
        .await
        .unwrap_or_default()
    }

    /// `GET /carts/{id}`; adopts the cart as active.
    pub async fn get_cart(&self, id: CartId) -> Option<Cart> {
        debug!(cart_id = id, "Fetching cart");
        let path = format!("/carts/{}", id);
        let cart = track(
            &self.state,
            CartCategory::Detail,
            self.handler.as_ref(),
            "Failed to fetch cart",
            self.api.get_json::<Cart>(&path),
            CartState::adopt,
        )
        .await?;

        info!(cart_id = cart.id, lines = cart.products.len(), "Cart loaded");
        Some(cart)
    }

    /// `GET /carts/user/{user_id}`; replaces the cart list.
    pub async fn get_user_carts(&self, user_id: UserId) -> Vec<Cart> {
        debug!(user_id, "Fetching user carts");
        let path = format!("/carts/user/{}", user_id);
        track(
            &self.state,
            CartCategory::List,
            self.handler.as_ref(),
            "Failed to fetch user carts",
            self.api.get_json::<Vec<Cart>>(&path),
            |state, carts| state.carts = carts.clone(),
        )
        .await
        .unwrap_or_default()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Returns the active cart, creating an empty one for `user_id` first
    /// when there is none.
    pub async fn ensure_cart(&self, user_id: UserId) -> Option<Cart> {
        let _guard = self.mutation.lock().await;
        self.ensure_cart_locked(user_id).await
    }

    async fn ensure_cart_locked(&self, user_id: UserId) -> Option<Cart> {
        {
            let state = self.state.read();
            if state.active_cart_id.is_some() {
                if let Some(cart) = &state.cart {
                    return Some(cart.clone());
                }
            }
        }

        debug!(user_id, "Creating cart");
        let payload = CartPayload::now(user_id, Vec::new());
        let cart = track(
            &self.state,
            CartCategory::Mutate,
            self.handler.as_ref(),
            "Failed to create cart",
            self.api.post_json::<Cart, _>("/carts", &payload),
            CartState::adopt,
        )
        .await?;

        info!(cart_id = cart.id, user_id, "Cart created");
        Some(cart)
    }

    /// Adds `quantity` (clamped to at least one) of a product, creating the
    /// cart if needed, and saves.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Option<Cart> {
        let _guard = self.mutation.lock().await;
        let cart = self.ensure_cart_locked(user_id).await?;

        debug!(cart_id = cart.id, product_id, quantity, "Adding item");
        let lines = add_line(&cart.products, product_id, quantity);
        self.save_cart(lines).await
    }

    /// Overwrites one line's quantity (clamped to at least one) and saves.
    ///
    /// Returns `None` without a request when no cart is loaded.
    pub async fn set_quantity(&self, product_id: ProductId, quantity: i64) -> Option<Cart> {
        let _guard = self.mutation.lock().await;
        let lines = set_line_quantity(&self.current_lines()?, product_id, quantity);

        debug!(product_id, quantity, "Setting quantity");
        self.save_cart(lines).await
    }

    /// Drops the product's line and saves. `false` when no cart is loaded
    /// or the save failed.
    pub async fn remove_item(&self, product_id: ProductId) -> bool {
        let _guard = self.mutation.lock().await;
        let Some(lines) = self.current_lines() else {
            return false;
        };

        debug!(product_id, "Removing item");
        self.save_cart(remove_line(&lines, product_id)).await.is_some()
    }

    /// Saves an empty line list. `false` when no cart is loaded or the save
    /// failed.
    pub async fn clear_cart(&self) -> bool {
        let _guard = self.mutation.lock().await;
        if self.current_lines().is_none() {
            return false;
        }

        debug!("Clearing cart");
        self.save_cart(Vec::new()).await.is_some()
    }

    fn current_lines(&self) -> Option<Vec<CartLine>> {
        self.state.read().cart.as_ref().map(|c| c.products.clone())
    }

    /// Single write path: `PUT /carts/{id}` with the full line list, then
    /// adopts the server's cart. Callers hold the mutation lock.
    async fn save_cart(&self, lines: Vec<CartLine>) -> Option<Cart> {
        let (cart_id, user_id) = {
            let state = self.state.read();
            let cart = state.cart.as_ref()?;
            (cart.id, cart.user_id)
        };

        let payload = CartPayload::now(user_id, lines);
        let path = format!("/carts/{}", cart_id);
        let saved = track(
            &self.state,
            CartCategory::Mutate,
            self.handler.as_ref(),
            "Failed to save cart",
            self.api.put_json::<Cart, _>(&path, &payload),
            CartState::adopt,
        )
        .await?;

        info!(cart_id = saved.id, lines = saved.products.len(), "Cart saved");
        Some(saved)
    }

    // =========================================================================
    // Product Cache
    // =========================================================================

    /// Fetches `/products/{id}` for every product in the active cart that is
    /// not cached yet, one at a time in line order.
    ///
    /// Returns how many products were fetched. The first failure stops the
    /// pass and is returned; products fetched before it stay cached.
    pub async fn hydrate_cart_products(&self) -> ClientResult<usize> {
        let _guard = self.hydration.lock().await;

        let ids = {
            let state = self.state.read();
            match &state.cart {
                Some(cart) => cart.product_ids(),
                None => return Ok(0),
            }
        };
        let missing = self.cache.read().missing(&ids);
        debug!(referenced = ids.len(), missing = missing.len(), "Hydrating cart products");

        let mut fetched = 0;
        for id in missing {
            let raw: RawProduct = self.api.get_json(&format!("/products/{}", id)).await?;
            self.cache.write().insert(Product::from(raw));
            fetched += 1;
        }

        Ok(fetched)
    }
}

impl CartStatuses {
    fn slot(&self, category: CartCategory) -> &ActionStatus {
        match category {
            CartCategory::List => &self.list,
            CartCategory::Detail => &self.detail,
            CartCategory::Mutate => &self.mutate,
        }
    }
}
