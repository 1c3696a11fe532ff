//! Integration tests for Shopify Lite.
//!
//! Both binaries are driven in-process over a shared [`MemoryStore`], the
//! same way they share the hosted database in production.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopify-lite-integration-tests
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use shopify_lite_core::{Price, Product, ProductInput};
use shopify_lite_store::{DocumentStore, MemoryStore, Repositories};
use tower::ServiceExt;

/// App id shared by every store in these tests.
pub const APP_ID: &str = "test";

/// Response bodies above this size fail the test.
const BODY_LIMIT: usize = 1024 * 1024;

/// A shared in-memory store with typed repositories over it.
pub struct TestStore {
    pub store: MemoryStore,
    pub repos: Repositories,
}

impl TestStore {
    #[must_use]
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let repos = Repositories::new(Arc::new(store.clone()), APP_ID);
        Self { store, repos }
    }

    /// Create a product with a fixed description and image.
    ///
    /// # Panics
    ///
    /// Panics if `price` is not a valid price or the write fails.
    pub async fn product(&self, name: &str, price: &str, stock: u32) -> Product {
        let input = ProductInput {
            name: name.to_string(),
            description: format!("{name} description"),
            price: Price::parse(price).expect("valid test price"),
            stock,
            image_url: format!("https://example.com/{}.jpg", name.to_lowercase()),
        };
        self.repos
            .products
            .create(&input)
            .await
            .expect("seed product")
    }

    fn shared(&self) -> Arc<dyn DocumentStore> {
        Arc::new(self.store.clone())
    }

    /// Storefront router over this store.
    ///
    /// # Panics
    ///
    /// Panics if the initial snapshot cannot be read.
    pub async fn storefront(&self) -> TestClient {
        let config = shopify_lite_storefront::config::StorefrontConfig::for_memory_store(APP_ID);
        let state = shopify_lite_storefront::state::AppState::new(config, self.shared())
            .await
            .expect("storefront state");
        TestClient::new(shopify_lite_storefront::app(state))
    }

    /// Admin router over this store.
    ///
    /// # Panics
    ///
    /// Panics if the initial snapshots cannot be read.
    pub async fn admin(&self) -> TestClient {
        let config = shopify_lite_admin::config::AdminConfig::for_memory_store(APP_ID);
        let state = shopify_lite_admin::state::AppState::new(config, self.shared())
            .await
            .expect("admin state");
        TestClient::new(shopify_lite_admin::app(state))
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Value of a response header as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Drives a router like a browser: keeps cookies between requests.
pub struct TestClient {
    router: Router,
    cookies: BTreeMap<String, String>,
}

impl TestClient {
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self {
            router,
            cookies: BTreeMap::new(),
        }
    }

    /// `GET path`.
    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None, false).await
    }

    /// `GET path` until `ready` accepts the response, for up to two seconds.
    ///
    /// Snapshot feeds pick up writes on a background task, so a page rendered
    /// right after a write may not show it yet.
    ///
    /// # Panics
    ///
    /// Panics if no response is accepted in time.
    pub async fn get_until(
        &mut self,
        path: &str,
        ready: impl Fn(&TestResponse) -> bool,
    ) -> TestResponse {
        for _ in 0..200 {
            let response = self.get(path).await;
            if ready(&response) {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("GET {path} never reached the expected state");
    }

    /// `POST path` with a url-encoded form body.
    pub async fn post(&mut self, path: &str, form: &[(&str, &str)]) -> TestResponse {
        self.send(Method::POST, path, Some(form), false).await
    }

    /// `POST path` as htmx sends it.
    pub async fn htmx_post(&mut self, path: &str, form: &[(&str, &str)]) -> TestResponse {
        self.send(Method::POST, path, Some(form), true).await
    }

    async fn send(
        &mut self,
        method: Method,
        path: &str,
        form: Option<&[(&str, &str)]>,
        htmx: bool,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);

        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, cookie);
        }
        if htmx {
            builder = builder.header("HX-Request", "true");
        }

        let body = match form {
            Some(fields) => {
                builder = builder.header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                );
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(fields)
                    .finish();
                Body::from(encoded)
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("valid request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router");

        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let Ok(set_cookie) = set_cookie.to_str() else {
                continue;
            };
            let pair = set_cookie.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                if value.is_empty() {
                    self.cookies.remove(name.trim());
                } else {
                    self.cookies
                        .insert(name.trim().to_string(), value.trim().to_string());
                }
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), BODY_LIMIT)
            .await
            .expect("readable body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}
