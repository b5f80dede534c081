//! End-to-end checks of `HttpApi` against a local axum server.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use shopfront_client::{
    Api, CartCategory, CartStore, ClientError, ErrorHandler, HttpApi, ProductStore,
};
use shopfront_core::{CartLine, Money};

#[derive(Default)]
struct Recorder {
    statuses: Mutex<Vec<Option<u16>>>,
}

impl ErrorHandler for Recorder {
    fn handle(&self, err: &ClientError) {
        self.statuses.lock().push(err.status());
    }
}

type Carts = Arc<Mutex<Vec<Value>>>;

async fn get_cart(
    Path(id): Path<i64>,
    State(carts): State<Carts>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    carts
        .lock()
        .iter()
        .find(|c| c["id"] == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": format!("cart {} not found", id) })),
            )
        })
}

async fn put_cart(
    Path(id): Path<i64>,
    State(carts): State<Carts>,
    Json(mut body): Json<Value>,
) -> Json<Value> {
    body["id"] = json!(id);
    let mut carts = carts.lock();
    carts.retain(|c| c["id"] != id);
    carts.push(body.clone());
    Json(body)
}

async fn get_product(Path(id): Path<i64>) -> Json<Value> {
    Json(json!({
        "id": id,
        "title": "Backpack",
        "price": "50.00",
        "description": "Fits 15 inch laptops",
        "category": "bags",
        "iamge": "bag.png"
    }))
}

async fn delete_product() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!({}))
}

async fn spawn_server() -> String {
    let carts: Carts = Arc::new(Mutex::new(vec![json!({
        "id": 1,
        "userId": 7,
        "date": "2020-03-02T00:00:00.000Z",
        "products": [{ "productId": 3, "quantity": 2 }],
        "__v": 0
    })]));

    let app = Router::new()
        .route("/api/carts/{id}", get(get_cart).put(put_cart))
        .route("/api/products/{id}", get(get_product).delete(delete_product))
        .route("/api/slow", get(slow))
        .with_state(carts);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api", addr)
}

#[tokio::test]
async fn test_cart_round_trip_over_http() {
    let base = spawn_server().await;
    let api = Arc::new(HttpApi::new(&base, 5, "shopfront-test").unwrap());
    let recorder = Arc::new(Recorder::default());
    let store = CartStore::new(api, recorder.clone());

    let cart = store.get_cart(1).await.unwrap();
    assert_eq!(cart.products, vec![CartLine::new(3, 2)]);

    assert_eq!(store.hydrate_cart_products().await.unwrap(), 1);
    assert_eq!(store.summary().subtotal, Money::from_cents(10000));
    assert_eq!(store.cached_product(3).map(|p| p.image), Some("bag.png".to_string()));

    let cart = store.add_item(7, 3, 1).await.unwrap();
    assert_eq!(cart.products, vec![CartLine::new(3, 3)]);
    assert_eq!(store.summary().subtotal, Money::from_cents(15000));

    assert!(store.clear_cart().await);
    let cart = store.get_cart(1).await.unwrap();
    assert!(cart.products.is_empty());
    assert!(recorder.statuses.lock().is_empty());
}

#[tokio::test]
async fn test_not_found_message_reaches_error_slot() {
    let base = spawn_server().await;
    let api = Arc::new(HttpApi::new(&base, 5, "shopfront-test").unwrap());
    let recorder = Arc::new(Recorder::default());
    let store = CartStore::new(api, recorder.clone());

    assert!(store.get_cart(404).await.is_none());
    assert_eq!(
        store.error(CartCategory::Detail).as_deref(),
        Some("cart 404 not found")
    );
    assert_eq!(*recorder.statuses.lock(), vec![Some(404)]);
}

#[tokio::test]
async fn test_empty_body_decodes_as_null() {
    let base = spawn_server().await;
    let api = Arc::new(HttpApi::new(&base, 5, "shopfront-test").unwrap());

    assert_eq!(api.delete("/products/3").await.unwrap(), Value::Null);

    let store = ProductStore::new(api, Arc::new(Recorder::default()));
    assert!(store.delete_product(3).await);
}

#[tokio::test]
async fn test_timeout_surfaces_as_error() {
    let base = spawn_server().await;
    let api = HttpApi::new(&base, 1, "shopfront-test").unwrap();

    let err = api.get("/slow").await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout(1)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_connection_refused_is_transport() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpApi::new(&format!("http://{}", addr), 2, "shopfront-test").unwrap();
    let err = api.get("/carts").await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}
