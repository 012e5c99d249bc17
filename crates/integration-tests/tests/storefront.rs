//! Storefront API against a fake catalog backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use minimoda_integration_tests::{FakeBackend, client, product_node, start_storefront};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn seeded() -> (FakeBackend, String) {
    let backend = FakeBackend::start().await;
    backend.insert(product_node(
        "p1",
        "Enterito rayado",
        "GIRL",
        "AVAILABLE",
        &[("M3", 3, 19.9), ("M6", 0, 21.5)],
    ));
    backend.insert(product_node("p2", "Body liso", "BOY", "AVAILABLE", &[("RN", 5, 9.9)]));
    backend.insert(product_node("p3", "Vestido fiesta", "GIRL", "DELETED", &[("T2", 4, 35.0)]));
    backend.insert(product_node("p4", "Polera", "UNISEX", "SOLD_OUT", &[("T4", 0, 12.0)]));

    let base = start_storefront(&backend).await;
    (backend, base)
}

async fn get_json(client: &reqwest::Client, url: &str) -> (StatusCode, Value) {
    let resp = client.get(url).send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap_or(Value::Null))
}

async fn post_json(client: &reqwest::Client, url: &str, body: &Value) -> (StatusCode, Value) {
    let resp = client.post(url).json(body).send().await.unwrap();
    let status = resp.status();
    (status, resp.json().await.unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_health() {
    let (_backend, base) = seeded().await;
    let resp = client().get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_listing_hides_deleted_products() {
    let (_backend, base) = seeded().await;
    let (status, body) = get_json(&client(), &format!("{base}/api/products")).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["p1", "p2", "p4"]);
    assert_eq!(body["total"], 4);
    assert_eq!(body["products"][0]["sizes_in_stock"], json!(["3M"]));
}

#[tokio::test]
async fn test_listing_omits_blank_filters_from_backend_query() {
    let (backend, base) = seeded().await;
    let client = client();

    let (status, _) = get_json(&client, &format!("{base}/api/products")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_json(
        &client,
        &format!("{base}/api/products?search=&min_price=&max_price=0&genre=girl&size="),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["filter"], json!({"genre": "girl"}));

    let requests = backend.requests("GetProducts");
    assert_eq!(requests.len(), 2);
    assert!(requests[0].variables.get("filter").is_none());
    assert_eq!(requests[1].variables["filter"], json!({"genre": "GIRL"}));
}

#[tokio::test]
async fn test_listing_sends_size_in_backend_form() {
    let (backend, base) = seeded().await;
    let (status, body) = get_json(&client(), &format!("{base}/api/products?size=3M")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["products"][0]["id"], "p1");
    let requests = backend.requests("GetProducts");
    assert_eq!(requests[0].variables["filter"], json!({"talla": "M3"}));
}

#[tokio::test]
async fn test_changing_filter_resets_page() {
    let (backend, base) = seeded().await;
    let client = client();

    get_json(&client, &format!("{base}/api/products?genre=girl")).await;
    let (_, body) = get_json(&client, &format!("{base}/api/products?genre=girl&page=2")).await;
    assert_eq!(body["page"], 2);

    let (_, body) = get_json(&client, &format!("{base}/api/products?genre=boy&page=2")).await;
    assert_eq!(body["page"], 1);

    let pages: Vec<i64> = backend
        .requests("GetProducts")
        .iter()
        .map(|r| r.variables["page"].as_i64().unwrap())
        .collect();
    assert_eq!(pages, vec![1, 2, 1]);
}

#[tokio::test]
async fn test_filterless_listing_is_cached_and_filtered_is_not() {
    let (backend, base) = seeded().await;

    for _ in 0..2 {
        let (status, _) = get_json(&client(), &format!("{base}/api/products?page=1")).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(backend.requests("GetProducts").len(), 1);

    for _ in 0..2 {
        let (status, _) = get_json(&client(), &format!("{base}/api/products?genre=boy")).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(backend.requests("GetProducts").len(), 3);
}

#[tokio::test]
async fn test_listing_rejects_deleted_status_and_bad_values() {
    let (_backend, base) = seeded().await;
    let client = client();

    let (status, body) = get_json(&client, &format!("{base}/api/products?status=deleted")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = get_json(&client, &format!("{base}/api/products?size=7M")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(&client, &format!("{base}/api/products?genre=adult")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get_json(&client, &format!("{base}/api/products?page=abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

// ============================================================================
// Detail
// ============================================================================

#[tokio::test]
async fn test_detail_and_deleted_detail() {
    let (_backend, base) = seeded().await;
    let client = client();

    let (status, body) = get_json(&client, &format!("{base}/api/products/p1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Enterito rayado");
    assert_eq!(body["genre"], "girl");
    assert_eq!(body["variants"][0]["size"], "3M");
    assert_eq!(body["total_stock"], 3);

    let (status, _) = get_json(&client, &format!("{base}/api/products/p3")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get_json(&client, &format!("{base}/api/products/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_detail_is_cached() {
    let (backend, base) = seeded().await;
    let client = client();

    for _ in 0..2 {
        let (status, body) = get_json(&client, &format!("{base}/api/products/p1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "p1");
    }
    assert_eq!(backend.requests("GetProduct").len(), 1);
}

#[tokio::test]
async fn test_backend_failure_is_server_error() {
    let (backend, base) = seeded().await;
    backend.fail("GetProduct");

    let (status, body) = get_json(&client(), &format!("{base}/api/products/p1")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Catalog service error");
}

#[tokio::test]
async fn test_size_chart() {
    let (_backend, base) = seeded().await;
    let (status, body) = get_json(&client(), &format!("{base}/api/sizes")).await;

    assert_eq!(status, StatusCode::OK);
    let sizes = body.as_array().unwrap();
    assert_eq!(sizes.first().unwrap(), "RN");
    assert!(sizes.contains(&json!("3M")));
    assert!(sizes.contains(&json!("12T")));
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_cart_persists_in_session_and_clamps_merge() {
    let (_backend, base) = seeded().await;
    let shopper = client();
    let url = format!("{base}/api/cart/items");

    let (status, body) =
        post_json(&shopper, &url, &json!({"product_id": "p1", "size": "3M"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item_count"], 1);

    // Merging 3 more onto 1 clamps to the 3 in stock
    let (status, body) = post_json(
        &shopper,
        &url,
        &json!({"product_id": "p1", "size": "M3", "quantity": 3}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["quantity"], 3);

    let (_, body) = get_json(&shopper, &format!("{base}/api/cart")).await;
    assert_eq!(body["item_count"], 3);
    assert_eq!(body["items"][0]["size"], "3M");
    assert_eq!(body["items"][0]["name"], "Enterito rayado");

    // Another shopper has their own cart
    let (_, body) = get_json(&client(), &format!("{base}/api/cart")).await;
    assert_eq!(body["item_count"], 0);
}

#[tokio::test]
async fn test_cart_add_rejections() {
    let (_backend, base) = seeded().await;
    let shopper = client();
    let url = format!("{base}/api/cart/items");

    let cases = [
        json!({"product_id": "p3", "size": "2T"}),
        json!({"product_id": "p1", "size": "12M"}),
        json!({"product_id": "p1", "size": "3M", "quantity": 4}),
        json!({"product_id": "p1", "size": "6M"}),
        json!({"product_id": "p1", "size": "3M", "quantity": 0}),
        json!({"product_id": "p1", "size": "5M"}),
    ];
    for case in cases {
        let (status, body) = post_json(&shopper, &url, &case).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{case}");
        assert!(body["error"].is_string());
    }

    let (status, _) = post_json(&shopper, &url, &json!({"product_id": "nope", "size": "3M"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = get_json(&shopper, &format!("{base}/api/cart")).await;
    assert_eq!(body["item_count"], 0);
}

#[tokio::test]
async fn test_cart_update_remove_and_clear() {
    let (_backend, base) = seeded().await;
    let shopper = client();
    let url = format!("{base}/api/cart/items");

    post_json(&shopper, &url, &json!({"product_id": "p1", "size": "3M"})).await;
    post_json(&shopper, &url, &json!({"product_id": "p2", "size": "RN", "quantity": 2})).await;

    let resp = shopper
        .patch(&url)
        .json(&json!({"product_id": "p2", "size": "RN", "quantity": 4}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["item_count"], 5);

    let resp = shopper
        .patch(&url)
        .json(&json!({"product_id": "p2", "size": "RN", "quantity": 6}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = shopper
        .delete(&url)
        .json(&json!({"product_id": "p1", "size": "3M"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["item_count"], 4);

    let resp = shopper
        .delete(&url)
        .json(&json!({"product_id": "p1", "size": "3M"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = shopper
        .patch(&url)
        .json(&json!({"product_id": "p3", "size": "2T", "quantity": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = shopper.delete(format!("{base}/api/cart")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["item_count"], 0);
}

// ============================================================================
// Favorites
// ============================================================================

#[tokio::test]
async fn test_favorite_toggle_round_trip() {
    let (backend, base) = seeded().await;
    let shopper = client();
    let url = format!("{base}/api/favorites/toggle");

    let (status, body) =
        post_json(&shopper, &url, &json!({"product_id": "p2", "size": "RN"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["favorite"], true);
    assert_eq!(body["favorites"]["items"][0]["product_id"], "p2");

    // Removing never asks the catalog
    backend.fail("GetProduct");
    let (status, body) = post_json(&shopper, &url, &json!({"product_id": "p2"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["favorite"], false);
    assert_eq!(body["favorites"]["items"], json!([]));
}

#[tokio::test]
async fn test_favorites_add_and_remove() {
    let (_backend, base) = seeded().await;
    let shopper = client();

    let (status, _) = post_json(
        &shopper,
        &format!("{base}/api/favorites"),
        &json!({"product_id": "p3"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = post_json(
        &shopper,
        &format!("{base}/api/favorites"),
        &json!({"product_id": "p1"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let resp = shopper
        .delete(format!("{base}/api/favorites/p1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (_, body) = get_json(&shopper, &format!("{base}/api/favorites")).await;
    assert_eq!(body["items"], json!([]));
}
