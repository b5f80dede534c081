//! # Domain Types
//!
//! Wire and domain types shared by every Shopfront store.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Cart       │   │    Product      │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  user_id        │   │  title          │   │  username       │       │
//! │  │  date           │   │  price (Money)  │   │  email          │       │
//! │  │  products[]     │   │  category/image │   │  password       │       │
//! │  └────────┬────────┘   └────────▲────────┘   └────────▲────────┘       │
//! │           │                     │ From<RawProduct>    │                 │
//! │  ┌────────▼────────┐   ┌────────┴────────┐   ┌────────┴────────┐       │
//! │  │    CartLine     │   │   RawProduct    │   │    UserAuth     │       │
//! │  │  product_id     │   │  (backend JSON) │   │  token + user   │       │
//! │  │  quantity ≥ 1   │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! The backend speaks camelCase JSON (`userId`, `productId`). Every type here
//! renames its fields accordingly; unknown fields (such as `__v`) are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{self, Money};
use crate::validation::clamp_quantity;

/// Backend identifier of a cart.
pub type CartId = i64;

/// Backend identifier of a product.
pub type ProductId = i64;

/// Backend identifier of a user.
pub type UserId = i64;

// =============================================================================
// Cart
// =============================================================================

/// One product line inside a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl CartLine {
    /// Creates a line, clamping the quantity into the allowed line range.
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        CartLine {
            product_id,
            quantity: clamp_quantity(quantity),
        }
    }
}

/// A cart as the backend stores it.
///
/// ## Ownership
/// The cart store owns exactly one active cart and replaces it wholesale
/// with whatever the server returns after each write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub products: Vec<CartLine>,
}

impl Cart {
    /// Creates a cart stamped with the current time.
    pub fn new(id: CartId, user_id: UserId, products: Vec<CartLine>) -> Self {
        Cart {
            id,
            user_id,
            date: Utc::now(),
            products,
        }
    }

    /// Returns the line for `product_id`, if present.
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.products.iter().find(|l| l.product_id == product_id)
    }

    /// Distinct product ids in first-encounter order.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = Vec::with_capacity(self.products.len());
        for line in &self.products {
            if !ids.contains(&line.product_id) {
                ids.push(line.product_id);
            }
        }
        ids
    }
}

/// Body of `POST /carts` and `PUT /carts/{id}`.
///
/// Always carries the full line list: the backend has no patch endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    pub user_id: UserId,
    pub date: DateTime<Utc>,
    pub products: Vec<CartLine>,
}

impl CartPayload {
    /// Builds a payload stamped with the current time.
    pub fn now(user_id: UserId, products: Vec<CartLine>) -> Self {
        CartPayload {
            user_id,
            date: Utc::now(),
            products,
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// Product exactly as the backend returns it.
///
/// Some backends misspell `image` as `iamge`; both keys are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProduct {
    pub id: ProductId,
    #[serde(default)]
    pub title: String,
    #[serde(with = "money::decimal")]
    pub price: Money,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, alias = "iamge")]
    pub image: String,
}

/// Product detail held by the stores and the cart's product cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "money::decimal")]
    pub price: Money,
    pub description: String,
    pub category: String,
    pub image: String,
}

impl Product {
    /// Minimal product with only an id and a price.
    pub fn priced(id: ProductId, price: Money) -> Self {
        Product {
            id,
            title: String::new(),
            price,
            description: String::new(),
            category: String::new(),
            image: String::new(),
        }
    }
}

impl From<RawProduct> for Product {
    fn from(raw: RawProduct) -> Self {
        Product {
            id: raw.id,
            title: raw.title,
            price: raw.price,
            description: raw.description,
            category: raw.category,
            image: raw.image,
        }
    }
}

/// Body of `POST /products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInput {
    pub title: String,
    #[serde(with = "money::decimal")]
    pub price: Money,
    pub description: String,
    pub image: String,
    pub category: String,
}

/// Body of `PUT /products/{id}`; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "money::decimal::option"
    )]
    pub price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

// =============================================================================
// User
// =============================================================================

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Body of `POST /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of `PUT /users/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Response of `POST /users`: the backend only echoes the new id, if that.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatedId {
    #[serde(default)]
    pub id: Option<i64>,
}

/// Persisted login session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAuth {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// `{ "data": ... }` wrapper used by the `/api/web` endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_wire_format() {
        let json = r#"{
            "id": 1,
            "userId": 7,
            "date": "2020-03-02T00:00:00.000Z",
            "products": [{"productId": 3, "quantity": 2}],
            "__v": 0
        }"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.id, 1);
        assert_eq!(cart.user_id, 7);
        assert_eq!(cart.products, vec![CartLine { product_id: 3, quantity: 2 }]);

        let back = serde_json::to_value(&cart).unwrap();
        assert_eq!(back["userId"], 7);
        assert_eq!(back["products"][0]["productId"], 3);
    }

    #[test]
    fn test_cart_line_new_clamps() {
        assert_eq!(CartLine::new(1, 0).quantity, 1);
        assert_eq!(CartLine::new(1, -4).quantity, 1);
        assert_eq!(CartLine::new(1, 5).quantity, 5);
    }

    #[test]
    fn test_product_ids_distinct_in_order() {
        let cart = Cart::new(
            1,
            7,
            vec![CartLine::new(5, 1), CartLine::new(2, 1), CartLine::new(5, 3)],
        );
        assert_eq!(cart.product_ids(), vec![5, 2]);
    }

    #[test]
    fn test_raw_product_maps_fields() {
        let raw: RawProduct = serde_json::from_str(
            r#"{"id": 3, "title": "Backpack", "price": "109.95",
                "description": "Fits 15 inch", "category": "bags", "iamge": "bag.png"}"#,
        )
        .unwrap();
        let product = Product::from(raw);
        assert_eq!(product.title, "Backpack");
        assert_eq!(product.price.cents(), 10995);
        assert_eq!(product.image, "bag.png");
    }

    #[test]
    fn test_product_patch_skips_absent_fields() {
        let patch = ProductPatch {
            price: Some(Money::from_cents(999)),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "price": 9.99 }));
    }

    #[test]
    fn test_envelope_user_auth() {
        let env: Envelope<UserAuth> = serde_json::from_str(
            r#"{"data": {"token": "abc", "user": {"id": 1, "username": "kim", "email": "k@x.io", "password": "p"}}}"#,
        )
        .unwrap();
        assert_eq!(env.data.token.as_deref(), Some("abc"));
        assert_eq!(env.data.user.map(|u| u.username), Some("kim".to_string()));
    }
}
