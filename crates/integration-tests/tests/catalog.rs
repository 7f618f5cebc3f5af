//! Product listing, lookup, search and admin product creation.

use reqwest::StatusCode;
use serde_json::{Value, json};

use cartwheel_integration_tests::{ADMIN_SECRET, TestServer};

fn names(body: &Value) -> Vec<String> {
    body["success"]
        .as_array()
        .expect("product list")
        .iter()
        .map(|p| p["name"].as_str().unwrap_or_default().to_owned())
        .collect()
}

#[tokio::test]
async fn test_addproduct_checks_secret_before_fields() {
    let server = TestServer::spawn().await;
    let client = server.client();
    server.register(&client, "ops@example.com").await;

    let product = [
        ("name", "Widget"),
        ("price", "9.99"),
        ("sku", "W-1"),
        ("image", "http://x/1.png"),
    ];

    let (status, body) = server
        .post(&client, "/api/products/addproduct", &product)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "User not authenticated" }));

    let mut wrong = product.to_vec();
    wrong.push(("secretKey", "not-the-key"));
    let (status, _) = server.post(&client, "/api/products/addproduct", &wrong).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = server
        .post(
            &client,
            "/api/products/addproduct",
            &[("secretKey", ADMIN_SECRET), ("name", "Widget")],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing data" }));

    let (status, _) = server
        .post(
            &client,
            "/api/products/addproduct",
            &[
                ("secretKey", ADMIN_SECRET),
                ("name", "Widget"),
                ("price", "-3"),
                ("sku", "W-1"),
                ("image", "http://x/1.png"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Above what the catalog column can hold
    let (status, _) = server
        .post(
            &client,
            "/api/products/addproduct",
            &[
                ("secretKey", ADMIN_SECRET),
                ("name", "Widget"),
                ("price", "10000000000"),
                ("sku", "W-1"),
                ("image", "http://x/1.png"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut valid = product.to_vec();
    valid.push(("secretKey", ADMIN_SECRET));
    let (status, body) = server.post(&client, "/api/products/addproduct", &valid).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    // Written to both the store and the index
    let (_, body) = server.get(&client, "/api/products").await;
    assert_eq!(names(&body), ["Widget"]);
    let (_, body) = server.get(&client, "/api/products/search/widg").await;
    assert_eq!(names(&body), ["Widget"]);
}

#[tokio::test]
async fn test_addproduct_requires_session() {
    let server = TestServer::spawn().await;
    let (status, _) = server
        .post(
            &server.client(),
            "/api/products/addproduct",
            &[
                ("secretKey", ADMIN_SECRET),
                ("name", "Widget"),
                ("price", "9.99"),
                ("sku", "W-1"),
                ("image", "http://x/1.png"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(server.state.catalog().list().await.expect("list").is_empty());
}

#[tokio::test]
async fn test_product_lookup() {
    let server = TestServer::spawn().await;
    let widget = server.seed_product("Widget", "9.99").await;
    let client = server.client();
    server.register(&client, "amy@example.com").await;

    let (status, body) = server
        .get(&client, &format!("/api/products/id/{}", widget.id))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"]["id"], widget.id.as_str());
    assert_eq!(body["success"]["name"], "Widget");
    assert_eq!(body["success"]["sku"], "SKU-1");

    let (status, body) = server.get(&client, "/api/products/id/missing").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "error": "Product not found" }));
}

#[tokio::test]
async fn test_search_substring_recency_and_miss() {
    let server = TestServer::spawn().await;
    server.seed_product("Blue Widget", "3").await;
    server.seed_product("Gadget", "4").await;
    server.seed_product("Red Widget", "5").await;
    let client = server.client();
    server.register(&client, "amy@example.com").await;

    let (status, body) = server.get(&client, "/api/products/search/WIDGET").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), ["Red Widget", "Blue Widget"]);

    let (status, body) = server.get(&client, "/api/products/search/sprocket").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": [] }));
}

#[tokio::test]
async fn test_sorted_listing() {
    let server = TestServer::spawn().await;
    server.seed_product("B", "3").await;
    server.seed_product("A", "2").await;
    server.seed_product("C", "1").await;
    let client = server.client();
    server.register(&client, "amy@example.com").await;

    let (_, body) = server.get(&client, "/api/products/sort/price").await;
    assert_eq!(names(&body), ["C", "A", "B"]);
    let (_, body) = server.get(&client, "/api/products/sort/name").await;
    assert_eq!(names(&body), ["A", "B", "C"]);

    let (status, _) = server.get(&client, "/api/products/sort/colour").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
