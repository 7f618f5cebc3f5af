//! End-to-end test harness for the Cartwheel storefront.
//!
//! Each [`TestServer`] runs the real router on an ephemeral port with
//! in-memory stores and sessions, so tests need no database and never share
//! state (rate limiter buckets included).
//!
//! ```rust,ignore
//! let server = TestServer::spawn().await;
//! let client = server.client();
//! server.register(&client, "amy@example.com").await;
//! let (status, body) = server.get(&client, "/api/products/cart").await;
//! ```

#![allow(clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use secrecy::SecretString;
use serde_json::Value;
use tokio::task::JoinHandle;
use tower_sessions::MemoryStore;

use cartwheel_core::{NewProduct, Product};
use cartwheel_storefront::db::{MemoryCatalogStore, MemoryOrderStore, OrderStore};
use cartwheel_storefront::middleware::session_layer;
use cartwheel_storefront::search::SearchIndex;
use cartwheel_storefront::services::{CatalogSync, MemoryAuthenticator};
use cartwheel_storefront::state::AppState;

/// Admin key configured on every test server.
pub const ADMIN_SECRET: &str = "t3st-Adm1n-k3y!Qx";

/// Password used by [`TestServer::register`].
pub const PASSWORD: &str = "hunter2hunter2";

/// A storefront listening on `127.0.0.1` with in-memory backends.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Server with a live (empty) search collection.
    pub async fn spawn() -> Self {
        Self::builder().spawn().await
    }

    #[must_use]
    pub fn builder() -> TestServerBuilder {
        TestServerBuilder::default()
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A client with its own cookie jar, i.e. its own session.
    #[must_use]
    pub fn client(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Create a product through the catalog service (store and index).
    pub async fn seed_product(&self, name: &str, price: &str) -> Product {
        let product = NewProduct::parse(name, price, "SKU-1", "http://x/1.png")
            .expect("valid test product");
        self.state
            .catalog()
            .create_product(product)
            .await
            .expect("Failed to seed product")
    }

    /// Register `email` with [`PASSWORD`]; the client is signed in afterwards.
    pub async fn register(&self, client: &Client, email: &str) {
        let resp = client
            .post(self.url("/api/register"))
            .form(&[("email", email), ("pass", PASSWORD)])
            .send()
            .await
            .expect("Failed to register");
        assert_eq!(resp.status(), StatusCode::OK);
    }

    pub async fn get(&self, client: &Client, path: &str) -> (StatusCode, Value) {
        let resp = client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed");
        read(resp).await
    }

    pub async fn post(
        &self,
        client: &Client,
        path: &str,
        form: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let resp = client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST failed");
        read(resp).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read(resp: reqwest::Response) -> (StatusCode, Value) {
    let status = resp.status();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}

/// Configures the backends of a [`TestServer`].
pub struct TestServerBuilder {
    orders: Arc<dyn OrderStore>,
    with_collection: bool,
}

impl Default for TestServerBuilder {
    fn default() -> Self {
        Self {
            orders: Arc::new(MemoryOrderStore::new()),
            with_collection: true,
        }
    }
}

impl TestServerBuilder {
    #[must_use]
    pub fn orders(mut self, orders: Arc<dyn OrderStore>) -> Self {
        self.orders = orders;
        self
    }

    /// Start without a search collection, as after a failed startup rebuild.
    #[must_use]
    pub const fn without_collection(mut self) -> Self {
        self.with_collection = false;
        self
    }

    pub async fn spawn(self) -> TestServer {
        let index = SearchIndex::new();
        if self.with_collection {
            index
                .create_collection()
                .expect("Failed to create collection");
        }

        let state = AppState::new(
            CatalogSync::new(Arc::new(MemoryCatalogStore::new()), index),
            self.orders,
            Arc::new(MemoryAuthenticator::new()),
            SecretString::from(ADMIN_SECRET),
        );
        let app = cartwheel_storefront::app(
            state.clone(),
            session_layer(MemoryStore::default(), false),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("No local address");

        let handle = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server error");
        });

        TestServer {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }
}
