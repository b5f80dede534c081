//! # Cart Aggregation
//!
//! Pure cart logic: line editing, the product detail cache and the derived
//! view (count, subtotal, detailed lines) the cart store exposes.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Cart Aggregation                                   │
//! │                                                                         │
//! │   Cart.products                ProductCache                             │
//! │   ┌──────────────────┐         ┌──────────────────────┐                 │
//! │   │ {3, qty 2}       │──join──►│ 3 → Product(50.00)   │                 │
//! │   │ {9, qty 1}       │──join──►│ (9 not cached)       │                 │
//! │   └──────────────────┘         └──────────────────────┘                 │
//! │            │                                                            │
//! │            ▼                                                            │
//! │   CartView                                                              │
//! │   ├── count          = 2 + 1           = 3                              │
//! │   ├── subtotal       = 50.00×2 + 0     = 100.00                         │
//! │   └── lines_detailed = [(3, Some), (9, None)]                           │
//! │                                                                         │
//! │   Uncached lines contribute 0 to the subtotal until the cart store      │
//! │   hydrates the cache.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use serde::Serialize;

use crate::money::Money;
use crate::types::{Cart, CartLine, Product, ProductId};
use crate::validation::clamp_quantity;

// =============================================================================
// Line Editing
// =============================================================================

/// Adds `quantity` of a product to a line list.
///
/// ## Behavior
/// - Product already present: its quantity grows by `quantity`, stopping at
///   [`MAX_LINE_QUANTITY`](crate::MAX_LINE_QUANTITY)
/// - Product not present: a new line is prepended
///
/// `quantity` is clamped into the allowed line range first.
pub fn add_line(lines: &[CartLine], product_id: ProductId, quantity: i64) -> Vec<CartLine> {
    let quantity = clamp_quantity(quantity);
    let mut lines = lines.to_vec();

    if let Some(line) = lines.iter_mut().find(|l| l.product_id == product_id) {
        line.quantity = clamp_quantity(line.quantity.saturating_add(quantity));
    } else {
        lines.insert(0, CartLine { product_id, quantity });
    }

    lines
}

/// Overwrites the quantity of one line (clamped into the allowed line range).
///
/// Lines for other products are untouched; an unknown product id yields the
/// list unchanged.
pub fn set_line_quantity(lines: &[CartLine], product_id: ProductId, quantity: i64) -> Vec<CartLine> {
    let quantity = clamp_quantity(quantity);
    lines
        .iter()
        .map(|l| {
            if l.product_id == product_id {
                CartLine { quantity, ..*l }
            } else {
                *l
            }
        })
        .collect()
}

/// Removes every line for `product_id`.
pub fn remove_line(lines: &[CartLine], product_id: ProductId) -> Vec<CartLine> {
    lines
        .iter()
        .filter(|l| l.product_id != product_id)
        .copied()
        .collect()
}

// =============================================================================
// Product Cache
// =============================================================================

/// Product details keyed by id, owned by the cart store.
///
/// ## Eviction Policy
/// None. Entries live until [`ProductCache::clear`] is called or the cache is
/// dropped; nothing expires within a session.
#[derive(Debug, Clone, Default)]
pub struct ProductCache {
    entries: HashMap<ProductId, Product>,
}

impl ProductCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: ProductId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Inserts or replaces the product under its own id.
    pub fn insert(&mut self, product: Product) {
        self.entries.insert(product.id, product);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Ids from `ids` that are not cached yet, order preserved.
    pub fn missing(&self, ids: &[ProductId]) -> Vec<ProductId> {
        ids.iter().copied().filter(|id| !self.contains(*id)).collect()
    }
}

impl FromIterator<Product> for ProductCache {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        ProductCache {
            entries: iter.into_iter().map(|p| (p.id, p)).collect(),
        }
    }
}

// =============================================================================
// Cart View
// =============================================================================

/// A cart line joined with its cached product, if any.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedLine<'a> {
    pub product_id: ProductId,
    pub quantity: i64,
    pub product: Option<&'a Product>,
}

impl DetailedLine<'_> {
    /// Price × quantity, or zero while the product is not cached.
    pub fn line_total(&self) -> Money {
        self.product
            .map(|p| p.price.multiply_quantity(self.quantity))
            .unwrap_or_default()
    }
}

/// Derived, never stored, view over a cart and the product cache.
#[derive(Debug, Clone, Copy)]
pub struct CartView<'a> {
    cart: Option<&'a Cart>,
    cache: &'a ProductCache,
}

impl<'a> CartView<'a> {
    pub fn new(cart: Option<&'a Cart>, cache: &'a ProductCache) -> Self {
        CartView { cart, cache }
    }

    fn lines(&self) -> &'a [CartLine] {
        self.cart.map(|c| c.products.as_slice()).unwrap_or_default()
    }

    /// Sum of all line quantities, saturating at `i64::MAX`.
    pub fn count(&self) -> i64 {
        self.lines()
            .iter()
            .fold(0i64, |total, l| total.saturating_add(l.quantity))
    }

    /// True when there is no cart or its quantities sum to zero.
    pub fn is_empty(&self) -> bool {
        self.cart.is_none() || self.count() == 0
    }

    pub fn lines_detailed(&self) -> Vec<DetailedLine<'a>> {
        self.lines()
            .iter()
            .map(|l| DetailedLine {
                product_id: l.product_id,
                quantity: l.quantity,
                product: self.cache.get(l.product_id),
            })
            .collect()
    }

    /// Σ price × quantity over lines whose product is cached.
    pub fn subtotal(&self) -> Money {
        self.lines()
            .iter()
            .filter_map(|l| {
                self.cache
                    .get(l.product_id)
                    .map(|p| p.price.multiply_quantity(l.quantity))
            })
            .sum()
    }

    /// Lines whose product detail is not cached yet.
    pub fn uncached_count(&self) -> usize {
        self.lines()
            .iter()
            .filter(|l| !self.cache.contains(l.product_id))
            .count()
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary {
            cart_id: self.cart.map(|c| c.id),
            line_count: self.lines().len(),
            count: self.count(),
            subtotal: self.subtotal(),
            uncached_lines: self.uncached_count(),
        }
    }
}

/// Owned snapshot of a [`CartView`] for display and logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub cart_id: Option<i64>,
    pub line_count: usize,
    pub count: i64,
    #[serde(with = "crate::money::decimal")]
    pub subtotal: Money,
    pub uncached_lines: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_with(lines: Vec<CartLine>) -> Cart {
        Cart::new(1, 7, lines)
    }

    fn cache_with(prices: &[(ProductId, i64)]) -> ProductCache {
        prices
            .iter()
            .map(|(id, cents)| Product::priced(*id, Money::from_cents(*cents)))
            .collect()
    }

    #[test]
    fn test_add_line_increments_existing() {
        let lines = vec![CartLine::new(3, 2)];
        let lines = add_line(&lines, 3, 1);
        assert_eq!(lines, vec![CartLine { product_id: 3, quantity: 3 }]);
    }

    #[test]
    fn test_add_line_prepends_new() {
        let lines = vec![CartLine::new(3, 2)];
        let lines = add_line(&lines, 8, 4);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], CartLine { product_id: 8, quantity: 4 });
        assert_eq!(lines[1].product_id, 3);
    }

    #[test]
    fn test_add_line_clamps_quantity() {
        let lines = add_line(&[], 8, 0);
        assert_eq!(lines[0].quantity, 1);
    }

    #[test]
    fn test_add_line_stops_at_max_quantity() {
        let lines = vec![CartLine {
            product_id: 3,
            quantity: i64::MAX - 1,
        }];
        let lines = add_line(&lines, 3, 5);
        assert_eq!(lines[0].quantity, crate::MAX_LINE_QUANTITY);

        let lines = add_line(&[CartLine::new(3, 999_999)], 3, 5);
        assert_eq!(lines[0].quantity, crate::MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_set_line_quantity_never_below_one() {
        let lines = vec![CartLine::new(3, 2), CartLine::new(4, 5)];
        for requested in [-3, 0, 1] {
            let updated = set_line_quantity(&lines, 3, requested);
            assert!(updated.iter().all(|l| l.quantity >= 1));
            assert_eq!(updated[0].quantity, 1);
            assert_eq!(updated[1].quantity, 5);
        }
    }

    #[test]
    fn test_remove_line_missing_is_noop() {
        let lines = vec![CartLine::new(3, 2)];
        assert_eq!(remove_line(&lines, 99), lines);
        assert!(remove_line(&lines, 3).is_empty());
    }

    #[test]
    fn test_view_totals() {
        let cart = cart_with(vec![CartLine::new(3, 2)]);
        let cache = cache_with(&[(3, 5000)]);
        let view = CartView::new(Some(&cart), &cache);

        assert_eq!(view.count(), 2);
        assert_eq!(view.subtotal(), Money::from_cents(10000));
        assert!(!view.is_empty());
    }

    #[test]
    fn test_view_after_add_line() {
        let mut cart = cart_with(vec![CartLine::new(3, 2)]);
        cart.products = add_line(&cart.products, 3, 1);
        let cache = cache_with(&[(3, 5000)]);
        let view = CartView::new(Some(&cart), &cache);

        assert_eq!(view.count(), 3);
        assert_eq!(view.subtotal(), Money::from_cents(15000));
    }

    #[test]
    fn test_view_totals_saturate_on_huge_server_quantities() {
        let cart = cart_with(vec![
            CartLine {
                product_id: 3,
                quantity: 10_i64.pow(16),
            },
            CartLine {
                product_id: 4,
                quantity: i64::MAX,
            },
        ]);
        let cache = cache_with(&[(3, 5000), (4, 1)]);
        let view = CartView::new(Some(&cart), &cache);

        assert_eq!(view.count(), i64::MAX);
        assert_eq!(view.subtotal(), Money::from_cents(i64::MAX));
        assert_eq!(view.lines_detailed()[0].line_total(), Money::from_cents(i64::MAX));
        assert_eq!(view.summary().subtotal, Money::from_cents(i64::MAX));
    }

    #[test]
    fn test_uncached_lines_contribute_zero() {
        let cart = cart_with(vec![CartLine::new(3, 2), CartLine::new(9, 4)]);
        let mut cache = cache_with(&[(3, 5000)]);

        let view = CartView::new(Some(&cart), &cache);
        assert_eq!(view.subtotal(), Money::from_cents(10000));
        assert_eq!(view.uncached_count(), 1);
        let detailed = view.lines_detailed();
        assert!(detailed[0].product.is_some());
        assert!(detailed[1].product.is_none());
        assert_eq!(detailed[1].line_total(), Money::zero());

        cache.insert(Product::priced(9, Money::from_cents(250)));
        let view = CartView::new(Some(&cart), &cache);
        assert_eq!(view.subtotal(), Money::from_cents(11000));
        assert_eq!(view.uncached_count(), 0);
    }

    #[test]
    fn test_empty_views() {
        let cache = ProductCache::new();
        let none = CartView::new(None, &cache);
        assert!(none.is_empty());
        assert_eq!(none.count(), 0);
        assert_eq!(none.subtotal(), Money::zero());
        assert!(none.lines_detailed().is_empty());

        let cart = cart_with(vec![]);
        assert!(CartView::new(Some(&cart), &cache).is_empty());
    }

    #[test]
    fn test_summary() {
        let cart = cart_with(vec![CartLine::new(3, 2), CartLine::new(9, 1)]);
        let cache = cache_with(&[(3, 5000)]);
        let summary = CartView::new(Some(&cart), &cache).summary();
        assert_eq!(
            summary,
            CartSummary {
                cart_id: Some(1),
                line_count: 2,
                count: 3,
                subtotal: Money::from_cents(10000),
                uncached_lines: 1,
            }
        );
    }

    #[test]
    fn test_cache_missing_preserves_order() {
        let cache = cache_with(&[(2, 100)]);
        assert_eq!(cache.missing(&[5, 2, 1]), vec![5, 1]);
    }
}
