//! In-process stand-in for the catalog API, served by axum on an ephemeral port.

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde_json::json;
use storefront::{
    dto::{
        auth::Credentials,
        cart::CheckoutRequest,
        products::{CreateProductRequest, UpdateProductRequest},
    },
    models::Product,
};

#[derive(Debug, Default)]
pub struct Backend {
    pub products: Vec<Product>,
    pub orders: Vec<CheckoutRequest>,
    pub authorizations: Vec<Option<String>>,
    pub next_user_id: i64,
}

pub type Shared = Arc<Mutex<Backend>>;

pub struct FakeApi {
    pub base_url: String,
    pub backend: Shared,
}

pub fn product(id: i64, name: &str, price: &str, in_stock: bool) -> Product {
    Product {
        id,
        name: Some(name.to_string()),
        price: price.parse().expect("decimal literal"),
        in_stock,
    }
}

/// Starts the fake API seeded with the three default catalog entries.
pub async fn spawn() -> FakeApi {
    let backend = Arc::new(Mutex::new(Backend {
        products: vec![
            product(1, "Laptop", "999.99", true),
            product(2, "Smartphone", "499.99", false),
            product(3, "Tablet", "299.99", true),
        ],
        ..Backend::default()
    }));

    let app = Router::new()
        .route("/", get(welcome))
        .route("/products/", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/checkout", post(checkout))
        .route("/login", post(login))
        .route("/register", post(register))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake api server");
    });

    FakeApi {
        base_url: format!("http://{addr}"),
        backend,
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn record_auth(backend: &Shared, headers: &HeaderMap) {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    backend.lock().unwrap().authorizations.push(value);
}

async fn welcome() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to FastAPI Products Project" }))
}

async fn list_products(State(backend): State<Shared>, headers: HeaderMap) -> Json<Vec<Product>> {
    record_auth(&backend, &headers);
    Json(backend.lock().unwrap().products.clone())
}

async fn get_product(State(backend): State<Shared>, Path(id): Path<i64>) -> Response {
    match backend.lock().unwrap().products.iter().find(|p| p.id == id) {
        Some(p) => Json(p.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Product not found"),
    }
}

async fn create_product(
    State(backend): State<Shared>,
    Json(payload): Json<CreateProductRequest>,
) -> Response {
    let mut backend = backend.lock().unwrap();
    if backend.products.iter().any(|p| p.id == payload.id) {
        return detail(StatusCode::BAD_REQUEST, "Product already exists");
    }
    let created = Product::from(payload);
    backend.products.push(created.clone());
    Json(created).into_response()
}

async fn update_product(
    State(backend): State<Shared>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProductRequest>,
) -> Response {
    let mut backend = backend.lock().unwrap();
    let Some(existing) = backend.products.iter_mut().find(|p| p.id == id) else {
        return detail(StatusCode::NOT_FOUND, "Product not found");
    };
    // the path id wins, like the real API
    existing.name = Some(payload.name);
    existing.price = payload.price;
    existing.in_stock = payload.in_stock;
    Json(existing.clone()).into_response()
}

async fn delete_product(State(backend): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut backend = backend.lock().unwrap();
    let before = backend.products.len();
    backend.products.retain(|p| p.id != id);
    let message = if backend.products.len() == before {
        "Product not found."
    } else {
        "Product deleted successfully."
    };
    Json(json!({ "message": message })).into_response()
}

async fn checkout(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Json(payload): Json<CheckoutRequest>,
) -> Response {
    record_auth(&backend, &headers);
    let mut backend = backend.lock().unwrap();
    if payload.items.is_empty() {
        return detail(StatusCode::BAD_REQUEST, "Cart is empty");
    }
    let mut total = Decimal::ZERO;
    for item in &payload.items {
        let Some(product) = backend.products.iter().find(|p| p.id == item.product_id) else {
            return detail(StatusCode::BAD_REQUEST, "Unknown product");
        };
        total += product.price * Decimal::from(item.quantity);
    }
    backend.orders.push(payload);
    let order_id = backend.orders.len() as i64;
    Json(json!({ "order_id": order_id, "total": total.to_f64() })).into_response()
}

async fn login(Json(payload): Json<Credentials>) -> Response {
    if payload.password != "secret" {
        return detail(StatusCode::UNAUTHORIZED, "Invalid username or password");
    }
    Json(json!({
        "message": "Login successful",
        "token": format!("Bearer tok-{}", payload.username),
    }))
    .into_response()
}

async fn register(State(backend): State<Shared>, Json(payload): Json<Credentials>) -> Response {
    let mut backend = backend.lock().unwrap();
    backend.next_user_id += 1;
    Json(json!({ "id": backend.next_user_id, "username": payload.username })).into_response()
}
