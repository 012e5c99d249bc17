//! Admin API against a fake catalog backend and media host.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use minimoda_integration_tests::{ADMIN_TOKEN, FakeBackend, client, product_node, start_admin};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

/// Smallest valid PNG header, enough for the content type check.
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

async fn seeded() -> (FakeBackend, String) {
    let backend = FakeBackend::start().await;
    backend.insert(product_node("p1", "Enterito rayado", "GIRL", "AVAILABLE", &[("M3", 3, 19.9)]));
    backend.insert(product_node("p2", "Body liso", "BOY", "DELETED", &[("RN", 5, 9.9)]));
    backend.insert(product_node("p3", "Polera", "UNISEX", "DELETED", &[("T4", 0, 12.0)]));

    let base = start_admin(&backend).await;
    (backend, base)
}

fn bearer() -> String {
    format!("Bearer {ADMIN_TOKEN}")
}

async fn send(req: reqwest::RequestBuilder) -> (StatusCode, Value) {
    let resp = req.send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap_or(Value::Null))
}

fn row<'a>(snapshot: &'a Value, id: &str) -> Option<&'a Value> {
    snapshot["products"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == id)
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_product_routes_require_token() {
    let (backend, base) = seeded().await;
    let client = client();

    let (status, body) = send(client.get(format!("{base}/api/products"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(client.delete(format!("{base}/api/products/p1"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(client.post(format!("{base}/api/uploads/signature"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(backend.requests("UpdateProductStatus").is_empty());
}

#[tokio::test]
async fn test_session_token_login_and_logout() {
    let (backend, base) = seeded().await;
    let admin = client();

    let (status, _) = send(admin.get(format!("{base}/auth/me"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        send(admin.post(format!("{base}/auth/token")).json(&json!({"token": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(admin.post(format!("{base}/auth/token")).json(&json!({
        "token": ADMIN_TOKEN,
        "user": {"id": 7, "email": "tienda@minimoda.test"}
    })))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], true);

    let (status, body) = send(admin.get(format!("{base}/auth/me"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "tienda@minimoda.test");

    // The session token is forwarded to the backend
    let (status, _) = send(admin.delete(format!("{base}/api/products/p1"))).await;
    assert_eq!(status, StatusCode::OK);
    let sent = backend.requests("UpdateProductStatus");
    assert_eq!(sent[0].authorization.as_deref(), Some(bearer().as_str()));

    let (status, body) = send(admin.delete(format!("{base}/auth/token"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], false);
    let (status, _) = send(admin.get(format!("{base}/api/products"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_backend_rejecting_token_is_unauthorized() {
    let (_backend, base) = seeded().await;
    let (status, body) = send(
        client()
            .delete(format!("{base}/api/products/p1"))
            .header("Authorization", "Bearer expired"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("admin token"));
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_admin_listing_includes_deleted() {
    let (_backend, base) = seeded().await;
    let client = client();

    let (status, body) = send(
        client
            .get(format!("{base}/api/products"))
            .header("Authorization", bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);

    let (status, body) = send(
        client
            .get(format!("{base}/api/products?status=deleted"))
            .header("Authorization", bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert!(body["products"].as_array().unwrap().iter().all(|p| p["status"] == "deleted"));

    let (status, body) = send(
        client
            .get(format!("{base}/api/products/p2"))
            .header("Authorization", bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "deleted");
}

// ============================================================================
// Create and update
// ============================================================================

#[tokio::test]
async fn test_create_rejects_invalid_products_before_backend() {
    let (backend, base) = seeded().await;
    let client = client();
    let url = format!("{base}/api/products");

    let invalid = [
        json!({"name": "Body", "genre": "boy", "variants": []}),
        json!({"name": "", "genre": "boy", "variants": [{"size": "3M", "stock": 1, "price": 10}]}),
        json!({"name": "Body", "genre": "adult", "variants": [{"size": "3M", "stock": 1, "price": 10}]}),
        json!({"name": "Body", "genre": "boy", "variants": [{"size": "3M", "stock": -1, "price": 10}]}),
        json!({"name": "Body", "genre": "boy", "variants": [{"size": "7M", "stock": 1, "price": 10}]}),
        json!({"name": "Body", "genre": "boy", "variants": [{"size": "3M", "stock": 1, "price": "gratis"}]}),
        json!({"name": "Body", "genre": "boy", "variants": [
            {"size": "3M", "stock": 1, "price": 10},
            {"talla": "M3", "stock": 2, "price": 10}
        ]}),
    ];
    for body in invalid {
        let (status, error) =
            send(client.post(&url).header("Authorization", bearer()).json(&body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(error["error"].is_string());
    }

    assert!(backend.requests("CreateProduct").is_empty());
    assert!(backend.uploads().is_empty());
}

#[tokio::test]
async fn test_create_derives_status_and_sends_backend_sizes() {
    let (backend, base) = seeded().await;
    let client = client();
    let url = format!("{base}/api/products");

    let (status, body) = send(client.post(&url).header("Authorization", bearer()).json(&json!({
        "name": "Pilucho",
        "description": "Algodón pima",
        "genre": "unisex",
        "variants": [
            {"size": "6M", "stock": 0, "price": "14.90"},
            {"talla": "RN", "stock": 0, "price": 12}
        ]
    })))
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "sold_out");
    assert_eq!(body["genre"], "unisex");

    let sent = backend.requests("CreateProduct");
    let input = &sent[0].variables["input"];
    assert_eq!(input["status"], "SOLD_OUT");
    assert_eq!(input["genre"], "UNISEX");
    let tallas: Vec<&str> = input["variants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["talla"].as_str().unwrap())
        .collect();
    assert_eq!(tallas, vec!["RN", "M6"]);

    let (status, body) = send(client.post(&url).header("Authorization", bearer()).json(&json!({
        "name": "Enterito",
        "genre": "girl",
        "variants": [{"size": "3M", "stock": 2, "price": 20}]
    })))
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "available");
}

#[tokio::test]
async fn test_multipart_create_uploads_image() {
    let (backend, base) = seeded().await;
    let image = Part::bytes(PNG_BYTES.to_vec())
        .file_name("pilucho.png")
        .mime_str("image/png")
        .unwrap();
    let form = Form::new()
        .text("name", "Pilucho")
        .text("genre", "boy")
        .text("variants", r#"[{"size": "9M", "stock": 4, "price": 15}]"#)
        .part("image", image);

    let (status, body) = send(
        client()
            .post(format!("{base}/api/products"))
            .header("Authorization", bearer())
            .multipart(form),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(backend.uploads().len(), 1);
    assert_eq!(body["image"]["public_id"], backend.uploads()[0]);

    let sent = backend.requests("CreateProduct");
    assert_eq!(sent[0].variables["input"]["imagePublicId"], backend.uploads()[0]);
}

#[tokio::test]
async fn test_failed_create_discards_upload() {
    let (backend, base) = seeded().await;
    backend.fail("CreateProduct");

    let image = Part::bytes(PNG_BYTES.to_vec())
        .file_name("body.png")
        .mime_str("image/png")
        .unwrap();
    let form = Form::new()
        .text("name", "Body")
        .text("genre", "girl")
        .text("variants", r#"[{"size": "3M", "stock": 1, "price": 10}]"#)
        .part("image", image);

    let (status, _) = send(
        client()
            .post(format!("{base}/api/products"))
            .header("Authorization", bearer())
            .multipart(form),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(backend.destroyed(), backend.uploads());
}

#[tokio::test]
async fn test_upload_rejects_non_images() {
    let (backend, base) = seeded().await;
    let file = Part::bytes(b"%PDF-1.7".to_vec())
        .file_name("catalogo.pdf")
        .mime_str("application/pdf")
        .unwrap();

    let (status, _) = send(
        client()
            .post(format!("{base}/api/uploads"))
            .header("Authorization", bearer())
            .multipart(Form::new().part("file", file)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(backend.uploads().is_empty());
}

#[tokio::test]
async fn test_update_keeps_deleted_status_and_replaces_image() {
    let (backend, base) = seeded().await;
    let image = Part::bytes(PNG_BYTES.to_vec())
        .file_name("nuevo.png")
        .mime_str("image/png")
        .unwrap();
    let form = Form::new()
        .text("name", "Body liso manga larga")
        .text("genre", "boy")
        .text("variants", r#"[{"size": "RN", "stock": 8, "price": 11}]"#)
        .part("image", image);

    let (status, body) = send(
        client()
            .put(format!("{base}/api/products/p2"))
            .header("Authorization", bearer())
            .multipart(form),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "deleted");
    assert_eq!(body["name"], "Body liso manga larga");
    assert_eq!(backend.product("p2").unwrap()["status"], "DELETED");
    assert_eq!(backend.destroyed(), vec!["minimoda/products/p2".to_string()]);
}

#[tokio::test]
async fn test_update_without_image_keeps_current_one() {
    let (backend, base) = seeded().await;
    let (status, body) = send(
        client()
            .put(format!("{base}/api/products/p1"))
            .header("Authorization", bearer())
            .json(&json!({
                "name": "Enterito rayado",
                "genre": "girl",
                "variants": [{"size": "3M", "stock": 0, "price": 19.9}]
            })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "sold_out");
    assert_eq!(body["image"]["public_id"], "minimoda/products/p1");
    assert!(backend.destroyed().is_empty());
}

// ============================================================================
// List view: soft delete, restore, rollback
// ============================================================================

async fn refresh(client: &reqwest::Client, base: &str, query: &str) -> (StatusCode, Value) {
    send(
        client
            .post(format!("{base}/api/products/view/refresh{query}"))
            .header("Authorization", bearer()),
    )
    .await
}

async fn view(client: &reqwest::Client, base: &str) -> Value {
    send(client.get(format!("{base}/api/products/view")).header("Authorization", bearer()))
        .await
        .1
}

#[tokio::test]
async fn test_soft_delete_marks_row_in_unfiltered_view() {
    let (backend, base) = seeded().await;
    let client = client();

    let (status, snapshot) = refresh(&client, &base, "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["loaded"], true);
    assert_eq!(snapshot["products"].as_array().unwrap().len(), 3);

    let (status, body) = send(
        client
            .delete(format!("{base}/api/products/p1"))
            .header("Authorization", bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "deleted");
    assert_eq!(backend.product("p1").unwrap()["status"], "DELETED");

    let snapshot = view(&client, &base).await;
    assert_eq!(row(&snapshot, "p1").unwrap()["status"], "deleted");
    assert!(snapshot["pending"].is_null());
}

#[tokio::test]
async fn test_soft_delete_removes_row_from_available_view() {
    let (_backend, base) = seeded().await;
    let client = client();

    let (_, snapshot) = refresh(&client, &base, "?status=available").await;
    assert!(row(&snapshot, "p1").is_some());

    let (status, _) = send(
        client
            .delete(format!("{base}/api/products/p1"))
            .header("Authorization", bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let snapshot = view(&client, &base).await;
    assert!(row(&snapshot, "p1").is_none());
}

#[tokio::test]
async fn test_failed_soft_delete_rolls_back_view() {
    let (backend, base) = seeded().await;
    let client = client();
    refresh(&client, &base, "?status=available").await;
    backend.fail("UpdateProductStatus");

    let (status, body) = send(
        client
            .delete(format!("{base}/api/products/p1"))
            .header("Authorization", bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Catalog service error");

    let snapshot = view(&client, &base).await;
    assert_eq!(row(&snapshot, "p1").unwrap()["status"], "available");
    assert!(snapshot["pending"].is_null());
    assert_eq!(backend.product("p1").unwrap()["status"], "AVAILABLE");
}

#[tokio::test]
async fn test_restore_derives_status_from_stock() {
    let (backend, base) = seeded().await;
    let client = client();
    refresh(&client, &base, "?status=deleted").await;

    let (status, body) = send(
        client
            .post(format!("{base}/api/products/p2/restore"))
            .header("Authorization", bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "available");

    let (status, body) = send(
        client
            .post(format!("{base}/api/products/p3/restore"))
            .header("Authorization", bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "sold_out");
    assert_eq!(backend.product("p3").unwrap()["status"], "SOLD_OUT");

    // Restored rows leave the deleted-only view
    let snapshot = view(&client, &base).await;
    assert!(snapshot["products"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_restore_outside_view_reads_stock_first() {
    let (backend, base) = seeded().await;
    let (status, body) = send(
        client()
            .post(format!("{base}/api/products/p3/restore"))
            .header("Authorization", bearer()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "sold_out");
    assert_eq!(backend.requests("GetProduct").len(), 1);
}

#[tokio::test]
async fn test_newer_refresh_supersedes_older() {
    let (backend, base) = seeded().await;
    let client = client();
    backend.delay_next_listing(Duration::from_millis(800));

    let slow = {
        let client = client.clone();
        let base = base.clone();
        tokio::spawn(async move { refresh(&client, &base, "?status=deleted").await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;
    let (status, snapshot) = refresh(&client, &base, "?status=available").await;
    assert_eq!(status, StatusCode::OK);

    let (slow_status, body) = slow.await.unwrap();
    assert_eq!(slow_status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    assert_eq!(snapshot["filter"], json!({"status": "available"}));
    let snapshot = view(&client, &base).await;
    assert_eq!(snapshot["filter"], json!({"status": "available"}));
    assert_eq!(snapshot["total"], 1);
}
