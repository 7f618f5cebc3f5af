//! Cart transitions, checkout and order history over HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};

use cartwheel_core::{Email, Order, OrderId, StoredOrder};
use cartwheel_integration_tests::TestServer;
use cartwheel_storefront::db::{OrderStore, StoreError};

const SHIPPING: [(&str, &str); 3] = [
    ("name", "Bob"),
    ("address", "1 Main St"),
    ("phone", "555-1234"),
];

fn total(value: &Value) -> f64 {
    value.as_f64().expect("numeric total")
}

#[tokio::test]
async fn test_widget_checkout_scenario() {
    let server = TestServer::spawn().await;
    let widget = server.seed_product("Widget", "9.99").await;
    let client = server.client();
    server.register(&client, "bob@example.com").await;

    let (status, body) = server
        .post(
            &client,
            "/api/products/add",
            &[("name", widget.id.as_str()), ("quantity", "2")],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let snapshot = &body["success"];
    assert_eq!(snapshot["email"], "bob@example.com");
    assert_eq!(snapshot["all_total_quantity"], 2);
    assert!((total(&snapshot["all_total_price"]) - 19.98).abs() < 1e-9);
    assert_eq!(snapshot["items"][0][0], widget.id.as_str());
    assert_eq!(snapshot["items"][0][1]["quantity"], 2);
    assert_eq!(snapshot["items"][0][1]["name"], "Widget");
    assert!((total(&snapshot["items"][0][1]["total_price"]) - 19.98).abs() < 1e-9);

    let (status, body) = server
        .post(&client, "/api/products/checkout", &SHIPPING)
        .await;
    assert_eq!(status, StatusCode::OK);
    let order_id = body["success"].as_str().expect("order id").to_owned();
    assert!(!order_id.is_empty());

    let (_, body) = server.get(&client, "/api/products/cart").await;
    assert_eq!(body["success"]["items"], json!([]));
    assert_eq!(body["success"]["all_total_quantity"], 0);
    assert!(total(&body["success"]["all_total_price"]).abs() < 1e-9);

    let (status, body) = server.get(&client, "/api/vieworder").await;
    assert_eq!(status, StatusCode::OK);
    let orders = body["success"].as_array().expect("order list");
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order["id"], order_id.as_str());
    assert_eq!(order["name"], "Bob");
    assert_eq!(order["address"], "1 Main St");
    assert_eq!(order["phone"], "555-1234");
    assert_eq!(order["total_quantity"], 2);
    assert!((total(&order["total_price"]) - 19.98).abs() < 1e-9);
    assert_eq!(order["items"][0][0], widget.id.as_str());
    assert_eq!(order["items"][0][1]["quantity"], 2);
}

#[tokio::test]
async fn test_repeated_adds_merge_and_delete_collapses() {
    let server = TestServer::spawn().await;
    let widget = server.seed_product("Widget", "9.99").await;
    let gadget = server.seed_product("Gadget", "5").await;
    let client = server.client();
    server.register(&client, "amy@example.com").await;

    for (id, qty) in [(&widget.id, "1"), (&gadget.id, "3"), (&widget.id, "2")] {
        server
            .post(
                &client,
                "/api/products/add",
                &[("name", id.as_str()), ("quantity", qty)],
            )
            .await;
    }

    let (_, body) = server.get(&client, "/api/products/cart").await;
    let snapshot = &body["success"];
    let items = snapshot["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0][0], widget.id.as_str());
    assert_eq!(items[0][1]["quantity"], 3);
    assert_eq!(snapshot["all_total_quantity"], 6);
    assert!((total(&snapshot["all_total_price"]) - 44.97).abs() < 1e-9);

    // Unknown ids are a no-op
    let (status, body) = server.get(&client, "/api/products/delete/nope").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"]["all_total_quantity"], 6);

    server
        .get(&client, &format!("/api/products/delete/{}", widget.id))
        .await;
    let (_, body) = server
        .get(&client, &format!("/api/products/delete/{}", gadget.id))
        .await;
    assert_eq!(body["success"]["items"], json!([]));
    assert_eq!(body["success"]["all_total_quantity"], 0);

    let (status, body) = server
        .post(&client, "/api/products/checkout", &SHIPPING)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "No items in cart" }));
}

#[tokio::test]
async fn test_cart_and_order_list_lines_in_insertion_order() {
    let server = TestServer::spawn().await;
    let mut ids = Vec::new();
    for (name, price) in [("Kettle", "20"), ("Apron", "8"), ("Mug", "4.50")] {
        ids.push(server.seed_product(name, price).await.id.into_inner());
    }
    let client = server.client();
    server.register(&client, "amy@example.com").await;

    for id in &ids {
        server
            .post(
                &client,
                "/api/products/add",
                &[("name", id.as_str()), ("quantity", "1")],
            )
            .await;
    }

    let listed = |items: &Value| -> Vec<String> {
        items
            .as_array()
            .expect("items")
            .iter()
            .map(|pair| pair[0].as_str().unwrap_or_default().to_owned())
            .collect()
    };

    let (_, body) = server.get(&client, "/api/products/cart").await;
    assert_eq!(listed(&body["success"]["items"]), ids);

    server
        .post(&client, "/api/products/checkout", &SHIPPING)
        .await;
    let (_, body) = server.get(&client, "/api/vieworder").await;
    assert_eq!(listed(&body["success"][0]["items"]), ids);
}

#[tokio::test]
async fn test_unknown_product_leaves_cart_unchanged() {
    let server = TestServer::spawn().await;
    let widget = server.seed_product("Widget", "9.99").await;
    let client = server.client();
    server.register(&client, "amy@example.com").await;
    server
        .post(
            &client,
            "/api/products/add",
            &[("name", widget.id.as_str()), ("quantity", "1")],
        )
        .await;

    let (status, body) = server
        .post(
            &client,
            "/api/products/add",
            &[("name", "missing"), ("quantity", "4")],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"]["all_total_quantity"], 1);
    assert_eq!(body["success"]["items"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_add_validates_form() {
    let server = TestServer::spawn().await;
    let widget = server.seed_product("Widget", "9.99").await;
    let client = server.client();
    server.register(&client, "amy@example.com").await;

    let (status, body) = server
        .post(&client, "/api/products/add", &[("name", widget.id.as_str())])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing data" }));

    for qty in ["0", "-1", "two", "10001"] {
        let (status, _) = server
            .post(
                &client,
                "/api/products/add",
                &[("name", widget.id.as_str()), ("quantity", qty)],
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "quantity {qty}");
    }
}

#[tokio::test]
async fn test_empty_keeps_identity() {
    let server = TestServer::spawn().await;
    let widget = server.seed_product("Widget", "9.99").await;
    let client = server.client();
    server.register(&client, "amy@example.com").await;
    server
        .post(
            &client,
            "/api/products/add",
            &[("name", widget.id.as_str()), ("quantity", "1")],
        )
        .await;

    let (status, body) = server.get(&client, "/api/products/empty").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": "Successfully emptied cart" }));

    let (status, body) = server.get(&client, "/api/products/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"]["email"], "amy@example.com");
    assert_eq!(body["success"]["items"], json!([]));
}

#[tokio::test]
async fn test_checkout_requires_shipping_details() {
    let server = TestServer::spawn().await;
    let widget = server.seed_product("Widget", "9.99").await;
    let client = server.client();
    server.register(&client, "amy@example.com").await;
    server
        .post(
            &client,
            "/api/products/add",
            &[("name", widget.id.as_str()), ("quantity", "1")],
        )
        .await;

    let (status, _) = server
        .post(
            &client,
            "/api/products/checkout",
            &[("name", "Amy"), ("address", "  ")],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = server.get(&client, "/api/products/cart").await;
    assert_eq!(body["success"]["all_total_quantity"], 1);
}

struct UnavailableOrders;

#[async_trait]
impl OrderStore for UnavailableOrders {
    async fn create(&self, _order: &Order) -> Result<OrderId, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn list_for_email(&self, _email: &Email) -> Result<Vec<StoredOrder>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}

#[tokio::test]
async fn test_failed_checkout_keeps_cart() {
    let server = TestServer::builder()
        .orders(Arc::new(UnavailableOrders))
        .spawn()
        .await;
    let widget = server.seed_product("Widget", "9.99").await;
    let client = server.client();
    server.register(&client, "amy@example.com").await;
    server
        .post(
            &client,
            "/api/products/add",
            &[("name", widget.id.as_str()), ("quantity", "2")],
        )
        .await;

    let (status, body) = server
        .post(&client, "/api/products/checkout", &SHIPPING)
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({ "error": "External service error" }));

    let (_, body) = server.get(&client, "/api/products/cart").await;
    assert_eq!(body["success"]["all_total_quantity"], 2);
}

#[tokio::test]
async fn test_orders_are_private() {
    let server = TestServer::spawn().await;
    let widget = server.seed_product("Widget", "9.99").await;

    let amy = server.client();
    server.register(&amy, "amy@example.com").await;
    server
        .post(
            &amy,
            "/api/products/add",
            &[("name", widget.id.as_str()), ("quantity", "1")],
        )
        .await;
    server.post(&amy, "/api/products/checkout", &SHIPPING).await;

    let bob = server.client();
    server.register(&bob, "bob@example.com").await;
    let (status, body) = server.get(&bob, "/api/vieworder").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": [] }));

    let (_, body) = server.get(&amy, "/api/vieworder").await;
    assert_eq!(body["success"].as_array().map(Vec::len), Some(1));
}
