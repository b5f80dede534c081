//! # shopfront-client: REST Client and Stores for Shopfront
//!
//! This crate talks to the storefront backend and keeps the client-side
//! state (active cart, catalogue, users, login session) in shareable
//! view-model stores.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Client Architecture                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                           Stores                                 │  │
//! │  │                                                                  │  │
//! │  │  CartStore     active cart, cart list, ProductCache              │  │
//! │  │  ProductStore  catalogue CRUD                                    │  │
//! │  │  UserStore     user CRUD with local fallback                     │  │
//! │  │  AuthStore     phone login, OTP, persisted session               │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  Api           │  │  ErrorHandler  │  │  Feedback              │    │
//! │  │                │  │                │  │  SessionStore          │    │
//! │  │ HttpApi over   │  │ shared sink,   │  │                        │    │
//! │  │ reqwest with   │  │ logs through   │  │ snackbars, dialogs,    │    │
//! │  │ timeout        │  │ tracing        │  │ navigation, user_data  │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  ClientConfig: TOML file + SHOPFRONT_* environment overrides           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shopfront_client::{CartStore, ClientConfig, HttpApi, TracingErrorHandler};
//!
//! let config = ClientConfig::load_or_default(None);
//! let api = Arc::new(HttpApi::from_config(&config)?);
//! let carts = CartStore::new(api, Arc::new(TracingErrorHandler));
//!
//! carts.get_cart(1).await;
//! carts.add_item(7, 3, 1).await;
//! carts.hydrate_cart_products().await?;
//! println!("Subtotal: {}", carts.summary().subtotal);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod config;
pub mod error;
pub mod feedback;
pub mod handler;
pub mod session;
pub mod store;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{Api, HttpApi, Method};
pub use config::{ApiSettings, AppSettings, ClientConfig, Environment, SessionSettings};
pub use error::{ClientError, ClientResult};
pub use feedback::{
    Dialog, DialogChoice, Feedback, Navigation, Snackbar, SnackbarKind, TracingFeedback,
};
pub use handler::{ErrorHandler, TracingErrorHandler};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use store::auth::{AuthForm, AuthStore, LoginOutcome, LogoutOptions};
pub use store::cart::{CartCategory, CartStatuses, CartStore};
pub use store::product::ProductStore;
pub use store::user::UserStore;
pub use store::ActionStatus;
