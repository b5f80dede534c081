//! # Test Kit
//!
//! In-memory stand-ins for the backend and the UI seams.
//!
//! ## Components
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            Test Kit                                     │
//! │                                                                         │
//! │  FakeBackend (impl Api)                                                 │
//! │  ├── /carts, /carts/{id}, /carts/user/{id}      GET POST PUT            │
//! │  ├── /products, /products/{id}                  GET POST PUT DELETE     │
//! │  ├── /users, /users/{id}                        GET POST PUT DELETE     │
//! │  ├── /api/web/auth/login-using-hwg[-confirmation]   POST                │
//! │  ├── /api/web/users/profile                         GET                 │
//! │  ├── request log          requests(), count(method, path)               │
//! │  ├── failure injection    fail_on(method, path, status)                 │
//! │  └── optional latency     with_latency(duration)                        │
//! │                                                                         │
//! │  RecordingErrorHandler    every error passed to handle()                │
//! │  RecordingFeedback        every snackbar, dialog and navigation         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use shopfront_core::{
    Cart, CartPayload, Product, ProductId, ProductInput, ProductPatch, User, UserAuth, UserId,
    UserInput, UserPatch,
};

use crate::api::{Api, Method};
use crate::error::{ClientError, ClientResult};
use crate::feedback::{Dialog, DialogChoice, Feedback, Navigation, Snackbar};
use crate::handler::ErrorHandler;

// =============================================================================
// Fake Backend
// =============================================================================

/// One request seen by the [`FakeBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// A phone number the fake auth endpoints know about.
#[derive(Debug, Clone)]
struct PhoneAccount {
    code: String,
    auth: UserAuth,
}

#[derive(Debug, Default)]
struct BackendState {
    carts: BTreeMap<i64, Cart>,
    products: BTreeMap<ProductId, Product>,
    users: BTreeMap<UserId, User>,
    phones: HashMap<String, PhoneAccount>,
    profile: Option<User>,
    requests: Vec<RecordedRequest>,
    failures: HashMap<(Method, String), u16>,
    /// Whether `POST /users` answers with the new id.
    echo_user_id: bool,
}

impl BackendState {
    fn next_id<V>(map: &BTreeMap<i64, V>) -> i64 {
        map.keys().next_back().copied().unwrap_or(0) + 1
    }
}

/// In-memory [`Api`] serving the Shopfront endpoints.
#[derive(Debug)]
pub struct FakeBackend {
    state: Mutex<BackendState>,
    latency: Option<Duration>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        FakeBackend {
            state: Mutex::new(BackendState {
                echo_user_id: true,
                ..BackendState::default()
            }),
            latency: None,
        }
    }

    /// Delays every response, letting concurrent callers interleave.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_cart(self, cart: Cart) -> Self {
        self.state.lock().carts.insert(cart.id, cart);
        self
    }

    pub fn with_product(self, product: Product) -> Self {
        self.state.lock().products.insert(product.id, product);
        self
    }

    pub fn with_user(self, user: User) -> Self {
        self.state.lock().users.insert(user.id, user);
        self
    }

    /// Registers a phone number that accepts `code` and logs in as `auth`.
    pub fn with_phone(self, phone: &str, code: &str, auth: UserAuth) -> Self {
        self.state.lock().phones.insert(
            phone.to_string(),
            PhoneAccount {
                code: code.to_string(),
                auth,
            },
        );
        self
    }

    /// User returned by `GET /api/web/users/profile`.
    pub fn with_profile(self, user: User) -> Self {
        self.state.lock().profile = Some(user);
        self
    }

    /// Makes `POST /users` answer `{}` instead of `{ "id": n }`.
    pub fn without_user_ids(self) -> Self {
        self.state.lock().echo_user_id = false;
        self
    }

    /// Answers `method path` with `status` until cleared.
    pub fn fail_on(&self, method: Method, path: &str, status: u16) {
        self.state
            .lock()
            .failures
            .insert((method, path.to_string()), status);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Number of requests seen for `method path`.
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn cart(&self, id: i64) -> Option<Cart> {
        self.state.lock().carts.get(&id).cloned()
    }

    pub fn cart_count(&self) -> usize {
        self.state.lock().carts.len()
    }

    fn route(&self, method: Method, path: &str, body: Option<Value>) -> ClientResult<Value> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let mut state = self.state.lock();

        match (method, segments.as_slice()) {
            // --- carts -------------------------------------------------------
            (Method::Get, ["carts"]) => to_json(&state.carts.values().collect::<Vec<_>>()),
            (Method::Get, ["carts", "user", user_id]) => {
                let user_id = parse_id(user_id)?;
                let carts: Vec<&Cart> = state
                    .carts
                    .values()
                    .filter(|c| c.user_id == user_id)
                    .collect();
                to_json(&carts)
            }
            (Method::Get, ["carts", id]) => {
                let id = parse_id(id)?;
                match state.carts.get(&id) {
                    Some(cart) => to_json(cart),
                    None => Err(reject(404, "cart not found")),
                }
            }
            (Method::Post, ["carts"]) => {
                let payload: CartPayload = from_body(body)?;
                let id = BackendState::next_id(&state.carts);
                let cart = Cart {
                    id,
                    user_id: payload.user_id,
                    date: payload.date,
                    products: payload.products,
                };
                state.carts.insert(id, cart.clone());
                to_json(&cart)
            }
            (Method::Put, ["carts", id]) => {
                let id = parse_id(id)?;
                let payload: CartPayload = from_body(body)?;
                let cart = Cart {
                    id,
                    user_id: payload.user_id,
                    date: payload.date,
                    products: payload.products,
                };
                state.carts.insert(id, cart.clone());
                to_json(&cart)
            }

            // --- products ----------------------------------------------------
            (Method::Get, ["products"]) => {
                to_json(&state.products.values().collect::<Vec<_>>())
            }
            (Method::Get, ["products", id]) => {
                let id = parse_id(id)?;
                match state.products.get(&id) {
                    Some(product) => to_json(product),
                    None => Err(reject(404, "product not found")),
                }
            }
            (Method::Post, ["products"]) => {
                let input: ProductInput = from_body(body)?;
                let id = BackendState::next_id(&state.products);
                let product = Product {
                    id,
                    title: input.title,
                    price: input.price,
                    description: input.description,
                    category: input.category,
                    image: input.image,
                };
                state.products.insert(id, product.clone());
                to_json(&product)
            }
            (Method::Put, ["products", id]) => {
                let id = parse_id(id)?;
                let patch: ProductPatch = from_body(body)?;
                let product = state
                    .products
                    .get_mut(&id)
                    .ok_or_else(|| reject(404, "product not found"))?;
                if let Some(title) = patch.title {
                    product.title = title;
                }
                if let Some(price) = patch.price {
                    product.price = price;
                }
                if let Some(description) = patch.description {
                    product.description = description;
                }
                if let Some(image) = patch.image {
                    product.image = image;
                }
                if let Some(category) = patch.category {
                    product.category = category;
                }
                to_json(&*product)
            }
            (Method::Delete, ["products", id]) => {
                let id = parse_id(id)?;
                match state.products.remove(&id) {
                    Some(product) => to_json(&product),
                    None => Err(reject(404, "product not found")),
                }
            }

            // --- users -------------------------------------------------------
            (Method::Get, ["users"]) => to_json(&state.users.values().collect::<Vec<_>>()),
            (Method::Get, ["users", id]) => {
                let id = parse_id(id)?;
                match state.users.get(&id) {
                    Some(user) => to_json(user),
                    None => Err(reject(404, "user not found")),
                }
            }
            (Method::Post, ["users"]) => {
                let input: UserInput = from_body(body)?;
                let id = BackendState::next_id(&state.users);
                state.users.insert(
                    id,
                    User {
                        id,
                        username: input.username,
                        email: input.email,
                        password: input.password,
                    },
                );
                if state.echo_user_id {
                    Ok(json!({ "id": id }))
                } else {
                    Ok(json!({}))
                }
            }
            (Method::Put, ["users", id]) => {
                let id = parse_id(id)?;
                let patch: UserPatch = from_body(body)?;
                let user = state
                    .users
                    .get_mut(&id)
                    .ok_or_else(|| reject(404, "user not found"))?;
                if let Some(username) = patch.username {
                    user.username = username;
                }
                if let Some(email) = patch.email {
                    user.email = email;
                }
                if let Some(password) = patch.password {
                    user.password = password;
                }
                to_json(&*user)
            }
            (Method::Delete, ["users", id]) => {
                let id = parse_id(id)?;
                match state.users.remove(&id) {
                    Some(user) => to_json(&user),
                    None => Err(reject(404, "user not found")),
                }
            }

            // --- auth --------------------------------------------------------
            (Method::Post, ["api", "web", "auth", "login-using-hwg"]) => {
                let body = body.unwrap_or(Value::Null);
                let phone = body["phone_number"].as_str().unwrap_or_default();
                if state.phones.contains_key(phone) {
                    Ok(json!({ "message": "OTP sent" }))
                } else {
                    Err(reject(400, "User not found"))
                }
            }
            (Method::Post, ["api", "web", "auth", "login-using-hwg-confirmation"]) => {
                let body = body.unwrap_or(Value::Null);
                let phone = body["phone_number"].as_str().unwrap_or_default();
                let code = body["confirmation_code"].as_str().unwrap_or_default();
                match state.phones.get(phone) {
                    Some(account) if account.code == code => {
                        let auth = account.auth.clone();
                        state.profile = auth.user.clone().or(state.profile.take());
                        Ok(json!({ "data": auth }))
                    }
                    _ => Err(reject(422, "Invalid confirmation code")),
                }
            }
            (Method::Get, ["api", "web", "users", "profile"]) => match &state.profile {
                Some(user) => Ok(json!({ "data": user })),
                None => Err(reject(401, "Unauthenticated")),
            },

            _ => Err(reject(404, "route not found")),
        }
    }
}

#[async_trait]
impl Api for FakeBackend {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> ClientResult<Value> {
        let injected = {
            let mut state = self.state.lock();
            state.requests.push(RecordedRequest {
                method,
                path: path.to_string(),
                body: body.clone(),
            });
            state.failures.get(&(method, path.to_string())).copied()
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(status) = injected {
            return Err(reject(status, "injected failure"));
        }

        self.route(method, path, body)
    }
}

fn reject(status: u16, message: &str) -> ClientError {
    ClientError::Status {
        status,
        message: Some(message.to_string()),
    }
}

fn parse_id(raw: &str) -> ClientResult<i64> {
    raw.parse().map_err(|_| reject(400, "invalid id"))
}

fn from_body<T: DeserializeOwned>(body: Option<Value>) -> ClientResult<T> {
    let body = body.ok_or_else(|| reject(400, "missing body"))?;
    serde_json::from_value(body).map_err(|e| reject(400, &e.to_string()))
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> ClientResult<Value> {
    serde_json::to_value(value).map_err(|e| ClientError::Serialization(e.to_string()))
}

// =============================================================================
// Recording Doubles
// =============================================================================

/// Error handler that remembers what it was given.
#[derive(Debug, Default)]
pub struct RecordingErrorHandler {
    seen: Mutex<Vec<(Option<u16>, String)>>,
}

impl RecordingErrorHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn statuses(&self) -> Vec<Option<u16>> {
        self.seen.lock().iter().map(|(status, _)| *status).collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.seen.lock().iter().map(|(_, msg)| msg.clone()).collect()
    }
}

impl ErrorHandler for RecordingErrorHandler {
    fn handle(&self, err: &ClientError) {
        self.seen.lock().push((err.status(), err.to_string()));
    }
}

/// What a [`RecordingFeedback`] was asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackEvent {
    ShowLoading,
    HideLoading,
    Snackbar(Snackbar),
    Dialog(Dialog),
    Navigate(Navigation),
}

/// Feedback double with a scripted dialog answer.
#[derive(Debug)]
pub struct RecordingFeedback {
    events: Mutex<Vec<FeedbackEvent>>,
    dialog_choice: DialogChoice,
}

impl Default for RecordingFeedback {
    fn default() -> Self {
        RecordingFeedback {
            events: Mutex::new(Vec::new()),
            dialog_choice: DialogChoice::Back,
        }
    }
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every dialog resolves to `choice`.
    pub fn answering(choice: DialogChoice) -> Self {
        RecordingFeedback {
            dialog_choice: choice,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<FeedbackEvent> {
        self.events.lock().clone()
    }

    pub fn navigations(&self) -> Vec<Navigation> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                FeedbackEvent::Navigate(nav) => Some(nav.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Feedback for RecordingFeedback {
    fn show_loading(&self) {
        self.events.lock().push(FeedbackEvent::ShowLoading);
    }

    fn hide_loading(&self) {
        self.events.lock().push(FeedbackEvent::HideLoading);
    }

    fn snackbar(&self, snackbar: Snackbar) {
        self.events.lock().push(FeedbackEvent::Snackbar(snackbar));
    }

    async fn dialog(&self, dialog: Dialog) -> DialogChoice {
        self.events.lock().push(FeedbackEvent::Dialog(dialog));
        self.dialog_choice
    }

    fn navigate(&self, navigation: Navigation) {
        self.events.lock().push(FeedbackEvent::Navigate(navigation));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopfront_core::{CartLine, Money};

    #[tokio::test]
    async fn test_cart_routes() {
        let backend = FakeBackend::new().with_cart(Cart::new(1, 7, vec![CartLine::new(3, 2)]));
        let api: &dyn Api = &backend;

        let cart: Cart = api.get_json("/carts/1").await.unwrap();
        assert_eq!(cart.products.len(), 1);

        let created: Cart = api
            .post_json("/carts", &CartPayload::now(7, vec![]))
            .await
            .unwrap();
        assert_eq!(created.id, 2);

        let mine: Vec<Cart> = api.get_json("/carts/user/7").await.unwrap();
        assert_eq!(mine.len(), 2);

        let err = api.get("/carts/99").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failure_injection_and_log() {
        let backend = FakeBackend::new().with_product(Product::priced(3, Money::from_cents(500)));
        backend.fail_on(Method::Get, "/products/3", 503);

        let err = backend.get("/products/3").await.unwrap_err();
        assert_eq!(err.status(), Some(503));

        backend.clear_failures();
        assert!(backend.get("/products/3").await.is_ok());
        assert_eq!(backend.count(Method::Get, "/products/3"), 2);
    }
}
