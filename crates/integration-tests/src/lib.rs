//! Integration tests for Minimoda.
//!
//! Each test starts a fake catalog backend and the real storefront or
//! admin router on ephemeral ports, then drives them over HTTP with a
//! cookie-keeping client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p minimoda-integration-tests
//! ```
//!
//! # Fake backend
//!
//! [`FakeBackend`] answers the five catalog GraphQL operations from an
//! in-memory product list and the two media host calls (upload, destroy).
//! Tests can make an operation fail, delay listing responses, and read
//! back every request it received.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_panics_doc,
    clippy::indexing_slicing
)]

use std::collections::{HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use minimoda_admin::config::{AdminConfig, CloudinaryConfig};
use minimoda_admin::media::SignatureAlgorithm;
use minimoda_storefront::config::StorefrontConfig;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;

/// Token the fake backend accepts for mutations.
pub const ADMIN_TOKEN: &str = "test-admin-token";

/// A request the fake backend received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub operation: String,
    pub variables: Value,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct BackendState {
    products: Vec<Value>,
    next_id: u64,
    requests: Vec<Recorded>,
    failing: HashSet<String>,
    listing_delays: VecDeque<Duration>,
    uploads: Vec<String>,
    destroyed: Vec<String>,
}

/// In-memory stand-in for the catalog GraphQL API and the media host.
#[derive(Clone)]
pub struct FakeBackend {
    state: Arc<Mutex<BackendState>>,
    addr: SocketAddr,
}

impl FakeBackend {
    /// Start the fake on an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(BackendState::default()));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend address");

        let app = Router::new()
            .route("/graphql", post(graphql))
            .route("/v1_1/{cloud}/image/upload", post(media_upload))
            .route("/v1_1/{cloud}/image/destroy", post(media_destroy))
            .with_state(Arc::clone(&state));

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend server");
        });

        Self { state, addr }
    }

    #[must_use]
    pub fn graphql_url(&self) -> Url {
        Url::parse(&format!("http://{}/graphql", self.addr)).expect("graphql url")
    }

    #[must_use]
    pub fn media_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("media url")
    }

    /// Add a product in backend form and return its ID.
    pub fn insert(&self, node: Value) -> String {
        let id = node["id"].as_str().unwrap_or_default().to_string();
        self.state.lock().unwrap().products.push(node);
        id
    }

    /// Current backend copy of a product.
    #[must_use]
    pub fn product(&self, id: &str) -> Option<Value> {
        self.state
            .lock()
            .unwrap()
            .products
            .iter()
            .find(|p| p["id"] == id)
            .cloned()
    }

    /// Make every call of an operation answer with a GraphQL error.
    pub fn fail(&self, operation: &str) {
        self.state.lock().unwrap().failing.insert(operation.to_string());
    }

    /// Delay the next listing response.
    pub fn delay_next_listing(&self, delay: Duration) {
        self.state.lock().unwrap().listing_delays.push_back(delay);
    }

    /// Every request received for an operation, oldest first.
    #[must_use]
    pub fn requests(&self, operation: &str) -> Vec<Recorded> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.operation == operation)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn uploads(&self) -> Vec<String> {
        self.state.lock().unwrap().uploads.clone()
    }

    #[must_use]
    pub fn destroyed(&self) -> Vec<String> {
        self.state.lock().unwrap().destroyed.clone()
    }
}

/// A product in backend form. Variants are `(talla, stock, price)`.
#[must_use]
pub fn product_node(
    id: &str,
    name: &str,
    genre: &str,
    status: &str,
    variants: &[(&str, i64, f64)],
) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": format!("{name} de algodón"),
        "genre": genre,
        "status": status,
        "imageUrl": format!("https://res.cloudinary.test/{id}.jpg"),
        "imagePublicId": format!("minimoda/products/{id}"),
        "createdAt": "2026-09-01T12:00:00Z",
        "variants": variants
            .iter()
            .map(|(talla, stock, price)| json!({"talla": talla, "stock": stock, "price": price}))
            .collect::<Vec<_>>(),
    })
}

// =============================================================================
// Fake GraphQL
// =============================================================================

type Shared = Arc<Mutex<BackendState>>;

async fn graphql(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let operation = body["operationName"].as_str().unwrap_or_default().to_string();
    let variables = body["variables"].clone();
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let delay = {
        let mut state = state.lock().unwrap();
        state.requests.push(Recorded {
            operation: operation.clone(),
            variables: variables.clone(),
            authorization: authorization.clone(),
        });
        if operation == "GetProducts" {
            state.listing_delays.pop_front()
        } else {
            None
        }
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let is_mutation = matches!(
        operation.as_str(),
        "CreateProduct" | "UpdateProduct" | "UpdateProductStatus"
    );
    if is_mutation && authorization.as_deref() != Some(&format!("Bearer {ADMIN_TOKEN}")) {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let mut state = state.lock().unwrap();
    if state.failing.contains(&operation) {
        return Json(json!({"data": null, "errors": [{"message": "backend unavailable"}]}))
            .into_response();
    }

    let data = match operation.as_str() {
        "GetProducts" => json!({"products": list(&state.products, &variables)}),
        "GetProduct" => json!({"product": find(&state.products, &variables["id"])}),
        "CreateProduct" => {
            state.next_id += 1;
            let mut node = variables["input"].clone();
            node["id"] = json!(format!("new-{}", state.next_id));
            state.products.push(node.clone());
            json!({"createProduct": node})
        }
        "UpdateProduct" => {
            let updated = state
                .products
                .iter_mut()
                .find(|p| p["id"] == variables["id"])
                .map(|p| {
                    let id = p["id"].clone();
                    *p = variables["input"].clone();
                    p["id"] = id;
                    p.clone()
                });
            json!({"updateProduct": updated})
        }
        "UpdateProductStatus" => {
            let updated = state
                .products
                .iter_mut()
                .find(|p| p["id"] == variables["id"])
                .map(|p| {
                    p["status"] = variables["status"].clone();
                    p.clone()
                });
            json!({"updateProductStatus": updated})
        }
        other => {
            return Json(json!({"errors": [{"message": format!("unknown operation {other}")}]}))
                .into_response();
        }
    };

    Json(json!({"data": data})).into_response()
}

fn find(products: &[Value], id: &Value) -> Value {
    products.iter().find(|p| p["id"] == *id).cloned().unwrap_or(Value::Null)
}

fn list(products: &[Value], variables: &Value) -> Value {
    let filter = &variables["filter"];
    let page = variables["page"].as_u64().unwrap_or(1).max(1);
    let limit = variables["limit"].as_u64().unwrap_or(12).max(1);

    let matching: Vec<&Value> = products.iter().filter(|p| matches_filter(p, filter)).collect();
    let skip = usize::try_from((page - 1) * limit).unwrap_or(usize::MAX);
    let items: Vec<Value> = matching
        .iter()
        .skip(skip)
        .take(usize::try_from(limit).unwrap_or(usize::MAX))
        .map(|p| (*p).clone())
        .collect();

    json!({"items": items, "total": matching.len(), "page": page, "limit": limit})
}

fn matches_filter(product: &Value, filter: &Value) -> bool {
    if filter.is_null() {
        return true;
    }
    let variants = product["variants"].as_array().cloned().unwrap_or_default();

    if let Some(search) = filter["search"].as_str() {
        let name = product["name"].as_str().unwrap_or_default().to_lowercase();
        if !name.contains(&search.to_lowercase()) {
            return false;
        }
    }
    for key in ["genre", "status"] {
        if let Some(wanted) = filter[key].as_str()
            && product[key] != wanted
        {
            return false;
        }
    }
    if let Some(talla) = filter["talla"].as_str()
        && !variants.iter().any(|v| v["talla"] == talla)
    {
        return false;
    }
    let prices: Vec<f64> = variants.iter().filter_map(|v| v["price"].as_f64()).collect();
    if let Some(min) = filter["minPrice"].as_f64()
        && !prices.iter().any(|p| *p >= min)
    {
        return false;
    }
    if let Some(max) = filter["maxPrice"].as_f64()
        && !prices.iter().any(|p| *p <= max)
    {
        return false;
    }
    true
}

// =============================================================================
// Fake media host
// =============================================================================

async fn media_upload(State(state): State<Shared>, Path(cloud): Path<String>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    let public_id = format!("minimoda/products/upload-{}", state.uploads.len() + 1);
    state.uploads.push(public_id.clone());
    Json(json!({
        "secure_url": format!("https://res.cloudinary.test/{cloud}/{public_id}.jpg"),
        "public_id": public_id,
    }))
}

async fn media_destroy(State(state): State<Shared>, body: String) -> Json<Value> {
    let public_id = body
        .split('&')
        .find_map(|pair| pair.strip_prefix("public_id="))
        .map(|id| id.replace("%2F", "/"))
        .unwrap_or_default();
    state.lock().unwrap().destroyed.push(public_id);
    Json(json!({"result": "ok"}))
}

// =============================================================================
// Servers under test
// =============================================================================

/// Serve a router on an ephemeral port and return its base URL.
async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind app");
    let addr = listener.local_addr().expect("app address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("app server");
    });
    format!("http://{addr}")
}

/// Start the storefront against the fake backend.
pub async fn start_storefront(backend: &FakeBackend) -> String {
    let config = StorefrontConfig::for_endpoint(backend.graphql_url());
    let state = minimoda_storefront::state::AppState::new(config);
    serve(minimoda_storefront::app(state)).await
}

/// Admin configuration pointing at the fake backend for both services.
#[must_use]
pub fn admin_config(backend: &FakeBackend) -> AdminConfig {
    AdminConfig {
        host: [127, 0, 0, 1].into(),
        port: 3001,
        base_url: "http://localhost:3001".to_string(),
        api_url: backend.graphql_url(),
        cloudinary: CloudinaryConfig {
            cloud_name: "minimoda-test".to_string(),
            api_key: "123456789012345".to_string(),
            api_secret: SecretString::from("test-secret"),
            upload_folder: "minimoda/products".to_string(),
            signature_algorithm: SignatureAlgorithm::Sha1,
            api_base: backend.media_url(),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Start the admin API against the fake backend.
pub async fn start_admin(backend: &FakeBackend) -> String {
    let state = minimoda_admin::state::AppState::new(admin_config(backend));
    serve(minimoda_admin::app(state)).await
}

/// HTTP client that keeps session cookies between requests.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}
