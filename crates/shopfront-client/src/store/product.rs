//! # Product Store
//!
//! Product catalogue view-model: the fetched list plus the product being
//! viewed or edited. Every action shares one loading flag and error slot.

use std::sync::Arc;

use parking_lot::RwLock;
use shopfront_core::{Product, ProductId, ProductInput, ProductPatch, RawProduct};
use tracing::{debug, info};

use super::{track, ActionStatus, StoreState};
use crate::api::Api;
use crate::error::ClientError;
use crate::handler::ErrorHandler;

#[derive(Debug, Default)]
struct ProductState {
    products: Vec<Product>,
    product: Option<Product>,
    status: ActionStatus,
}

impl StoreState for ProductState {
    type Category = ();

    fn status_mut(&mut self, _: ()) -> &mut ActionStatus {
        &mut self.status
    }
}

impl ProductState {
    fn replace(&mut self, updated: &Product) {
        if let Some(slot) = self.products.iter_mut().find(|p| p.id == updated.id) {
            *slot = updated.clone();
        }
        if self.product.as_ref().map(|p| p.id) == Some(updated.id) {
            self.product = Some(updated.clone());
        }
    }

    fn forget(&mut self, id: ProductId) {
        self.products.retain(|p| p.id != id);
        if self.product.as_ref().map(|p| p.id) == Some(id) {
            self.product = None;
        }
    }
}

/// Product catalogue store.
pub struct ProductStore {
    api: Arc<dyn Api>,
    handler: Arc<dyn ErrorHandler>,
    state: RwLock<ProductState>,
}

impl ProductStore {
    pub fn new(api: Arc<dyn Api>, handler: Arc<dyn ErrorHandler>) -> Self {
        ProductStore {
            api,
            handler,
            state: RwLock::new(ProductState::default()),
        }
    }

    pub fn products(&self) -> Vec<Product> {
        self.state.read().products.clone()
    }

    pub fn product(&self) -> Option<Product> {
        self.state.read().product.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.read().status.loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().status.error.clone()
    }

    /// `GET /products`; replaces the list.
    pub async fn get_products(&self) -> Vec<Product> {
        debug!("Fetching products");
        let request = async {
            let raw: Vec<RawProduct> = self.api.get_json("/products").await?;
            Ok::<_, ClientError>(raw.into_iter().map(Product::from).collect::<Vec<_>>())
        };

        track(
            &self.state,
            (),
            self.handler.as_ref(),
            "Failed to fetch products",
            request,
            |state, products| state.products = products.clone(),
        )
        .await
        .unwrap_or_default()
    }

    /// `GET /products/{id}`; sets the current product.
    pub async fn get_product(&self, id: ProductId) -> Option<Product> {
        debug!(product_id = id, "Fetching product");
        let path = format!("/products/{}", id);
        let request = async {
            let raw: RawProduct = self.api.get_json(&path).await?;
            Ok::<_, ClientError>(Product::from(raw))
        };

        track(
            &self.state,
            (),
            self.handler.as_ref(),
            "Failed to fetch product",
            request,
            |state, product| state.product = Some(product.clone()),
        )
        .await
    }

    /// `POST /products`; the created product goes to the front of the list.
    pub async fn create_product(&self, input: &ProductInput) -> Option<Product> {
        debug!(title = %input.title, "Creating product");
        let request = async {
            let raw: RawProduct = self.api.post_json("/products", input).await?;
            Ok::<_, ClientError>(Product::from(raw))
        };

        let created = track(
            &self.state,
            (),
            self.handler.as_ref(),
            "Failed to create product",
            request,
            |state, product| {
                state.products.insert(0, product.clone());
                state.product = Some(product.clone());
            },
        )
        .await?;

        info!(product_id = created.id, "Product created");
        Some(created)
    }

    /// `PUT /products/{id}`; replaces the matching entries in place.
    pub async fn update_product(&self, id: ProductId, patch: &ProductPatch) -> Option<Product> {
        debug!(product_id = id, "Updating product");
        let path = format!("/products/{}", id);
        let request = async {
            let raw: RawProduct = self.api.put_json(&path, patch).await?;
            Ok::<_, ClientError>(Product::from(raw))
        };

        track(
            &self.state,
            (),
            self.handler.as_ref(),
            "Failed to update product",
            request,
            ProductState::replace,
        )
        .await
    }

    /// `DELETE /products/{id}`; drops it locally once the backend agrees.
    pub async fn delete_product(&self, id: ProductId) -> bool {
        debug!(product_id = id, "Deleting product");
        let path = format!("/products/{}", id);

        let deleted = track(
            &self.state,
            (),
            self.handler.as_ref(),
            "Failed to delete product",
            self.api.delete(&path),
            |state, _| state.forget(id),
        )
        .await
        .is_some();

        if deleted {
            info!(product_id = id, "Product deleted");
        }
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Method;
    use crate::testkit::{FakeBackend, RecordingErrorHandler};
    use shopfront_core::Money;

    fn catalogue() -> FakeBackend {
        FakeBackend::new()
            .with_product(Product {
                title: "Backpack".into(),
                ..Product::priced(1, Money::from_cents(10995))
            })
            .with_product(Product {
                title: "T-Shirt".into(),
                ..Product::priced(2, Money::from_cents(2230))
            })
    }

    fn setup(backend: FakeBackend) -> (Arc<FakeBackend>, Arc<RecordingErrorHandler>, ProductStore) {
        let backend = Arc::new(backend);
        let handler = Arc::new(RecordingErrorHandler::new());
        let store = ProductStore::new(backend.clone(), handler.clone());
        (backend, handler, store)
    }

    fn input(title: &str) -> ProductInput {
        ProductInput {
            title: title.into(),
            price: Money::from_cents(1350),
            description: "New arrival".into(),
            image: "mug.png".into(),
            category: "home".into(),
        }
    }

    #[tokio::test]
    async fn test_get_products_and_product() {
        let (_, _, store) = setup(catalogue());

        let products = store.get_products().await;
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].price, Money::from_cents(10995));

        let product = store.get_product(2).await.unwrap();
        assert_eq!(product.title, "T-Shirt");
        assert_eq!(store.product(), Some(product));
        assert!(!store.loading());
    }

    #[tokio::test]
    async fn test_create_prepends() {
        let (_, _, store) = setup(catalogue());
        store.get_products().await;

        let created = store.create_product(&input("Mug")).await.unwrap();
        assert_eq!(created.id, 3);
        let products = store.products();
        assert_eq!(products[0].title, "Mug");
        assert_eq!(products.len(), 3);
        assert_eq!(store.product().map(|p| p.id), Some(3));
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let (_, _, store) = setup(catalogue());
        store.get_products().await;
        store.get_product(2).await;

        let patch = ProductPatch {
            title: Some("Slim T-Shirt".into()),
            ..ProductPatch::default()
        };
        let updated = store.update_product(2, &patch).await.unwrap();
        assert_eq!(updated.price, Money::from_cents(2230));

        let products = store.products();
        assert_eq!(products[1].title, "Slim T-Shirt");
        assert_eq!(store.product().map(|p| p.title), Some("Slim T-Shirt".to_string()));
    }

    #[tokio::test]
    async fn test_delete_filters_and_clears_detail() {
        let (backend, _, store) = setup(catalogue());
        store.get_products().await;
        store.get_product(1).await;

        assert!(store.delete_product(1).await);
        assert_eq!(store.products().len(), 1);
        assert!(store.product().is_none());
        assert_eq!(backend.count(Method::Delete, "/products/1"), 1);
    }

    #[tokio::test]
    async fn test_failures_set_error_and_forward() {
        let (backend, handler, store) = setup(catalogue());
        store.get_products().await;
        backend.fail_on(Method::Delete, "/products/1", 500);

        assert!(!store.delete_product(1).await);
        assert_eq!(store.products().len(), 2);
        assert_eq!(store.error().as_deref(), Some("injected failure"));

        assert!(store.get_product(99).await.is_none());
        assert_eq!(store.error().as_deref(), Some("product not found"));
        assert_eq!(handler.statuses(), vec![Some(500), Some(404)]);
    }
}
