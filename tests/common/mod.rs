#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use bookworm_app::Services;
use bookworm_authz::TokenService;
use bookworm_db::{InMemoryBookStore, InMemoryUserStore};
use bookworm_kernel::settings::Settings;
use bookworm_media::{InMemoryMediaHost, MediaError, MediaHost};
use chrono::TimeDelta;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const SECRET: &[u8] = b"integration-secret";

/// Full router over in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub services: Services,
    pub media: Arc<InMemoryMediaHost>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Delays every upload before handing it to the wrapped host.
pub struct SlowMediaHost {
    inner: Arc<InMemoryMediaHost>,
    delay: Duration,
}

#[async_trait]
impl MediaHost for SlowMediaHost {
    async fn upload(&self, payload: &str) -> Result<String, MediaError> {
        tokio::time::sleep(self.delay).await;
        self.inner.upload(payload).await
    }

    fn hosts(&self, url: &str) -> bool {
        self.inner.hosts(url)
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        self.inner.delete(url).await
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(Settings::default(), |media| media as Arc<dyn MediaHost>)
    }

    /// Uploads take `delay`; requests time out after `timeout_ms`.
    pub fn with_slow_uploads(delay: Duration, timeout_ms: u64) -> Self {
        let mut settings = Settings::default();
        settings.server.request_timeout_ms = timeout_ms;
        Self::build(settings, move |inner| {
            Arc::new(SlowMediaHost { inner, delay }) as Arc<dyn MediaHost>
        })
    }

    fn build(
        settings: Settings,
        media_host: impl FnOnce(Arc<InMemoryMediaHost>) -> Arc<dyn MediaHost>,
    ) -> Self {
        let media = Arc::new(InMemoryMediaHost::new());
        let services = Services {
            users: Arc::new(InMemoryUserStore::with_hash_cost(4)),
            books: Arc::new(InMemoryBookStore::new()),
            media: media_host(media.clone()),
            tokens: Arc::new(TokenService::new(SECRET, TimeDelta::days(15))),
        };
        let registry = bookworm_app::registry(&services);
        let router = bookworm_http::build_router(&registry, &settings);

        Self {
            router,
            services,
            media,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse { status, body }
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Register an account and return its session token.
    pub async fn register(&self, username: &str) -> String {
        let response = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "email": format!("{username}@example.com"),
                    "username": username,
                    "password": "secret1",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["token"].as_str().unwrap().to_string()
    }

    /// Create a book as `token`'s owner and return its id.
    pub async fn create_book(&self, token: &str, title: &str) -> String {
        let response = self
            .post(
                "/api/books",
                Some(token),
                json!({
                    "title": title,
                    "caption": format!("{title} caption"),
                    "image": "data:image/png;base64,iVBORw0KGgo=",
                    "rating": 4,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["_id"].as_str().unwrap().to_string()
    }
}
