//! # shopfront-core: Pure Logic for the Shopfront Client
//!
//! This crate holds everything the Shopfront stores compute without touching
//! the network: payload types, raw-payload mappers, money math and the cart
//! aggregation that turns a cart plus a product cache into totals.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopfront Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Front end (CLI, UI shell)                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        shopfront-client: CartStore, ProductStore, ...           │   │
//! │  │        (HTTP, loading flags, error slots, session)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shopfront-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│  │   │
//! │  │   │   Cart    │  │   Money   │  │ CartView  │  │  qty/phone│  │   │
//! │  │   │  Product  │  │  decimal  │  │ProductCache│ │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Wire and domain types (Cart, Product, User, ...)
//! - [`money`] - Integer-cent money with decimal wire format
//! - [`cart`] - Line editing, product cache and derived cart view
//! - [`validation`] - Quantity clamp and phone number checks
//! - [`nav`] - Role-based navigation menu
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use shopfront_core::cart::{CartView, ProductCache};
//! use shopfront_core::{Cart, CartLine, Money, Product};
//!
//! let cart = Cart::new(1, 7, vec![CartLine::new(3, 2)]);
//! let mut cache = ProductCache::new();
//! cache.insert(Product::priced(3, Money::from_cents(5000)));
//!
//! let view = CartView::new(Some(&cart), &cache);
//! assert_eq!(view.count(), 2);
//! assert_eq!(view.subtotal().cents(), 10000);
//! ```

pub mod cart;
pub mod error;
pub mod money;
pub mod nav;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartSummary, CartView, DetailedLine, ProductCache};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use nav::{nav_menu, NavItem, Role};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Smallest quantity a cart line may hold.
///
/// Every write path clamps to this value, so a line never carries zero or a
/// negative quantity.
pub const MIN_LINE_QUANTITY: i64 = 1;

/// Largest quantity a cart line may hold after a local edit.
///
/// Increments past this value stop at the cap. Quantities read from the
/// backend are left as sent; totals over them saturate instead.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Shortest phone number accepted by the phone login flow.
pub const MIN_PHONE_LENGTH: usize = 7;
