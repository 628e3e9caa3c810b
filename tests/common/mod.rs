#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use cookie::Cookie;
use gigboard::config::{Config, SessionStoreKind};
use gigboard::services::{MemoryOutbox, Notification};
use gigboard::state::SharedState;
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub router: Router,
    pub shared: Arc<SharedState>,
    pub outbox: MemoryOutbox,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    let db_file = std::env::temp_dir().join(format!("gigboard-test-{}.db", uuid::Uuid::new_v4()));
    config.general.database_path = format!("sqlite:{}", db_file.display());
    config.server.secret_key = "integration-test-secret-key-of-sufficient-length".to_string();
    config.server.secure_cookies = false;
    config.server.session_store = SessionStoreKind::Memory;
    config.server.base_url = "http://localhost:5000".to_string();
    config.security.argon2_memory_cost_kib = 256;
    config.security.argon2_time_cost = 1;
    config.security.argon2_parallelism = 1;
    config.observability.metrics_enabled = false;
    config
}

pub async fn spawn_app() -> TestApp {
    let outbox = MemoryOutbox::new();
    let shared = Arc::new(
        SharedState::with_sink(test_config(), Arc::new(outbox.clone()))
            .await
            .expect("Failed to create shared state"),
    );
    let state = gigboard::api::create_app_state(shared.clone(), None);
    let router = gigboard::api::router(state)
        .await
        .expect("Failed to build router");

    TestApp {
        router,
        shared,
        outbox,
    }
}

impl TestApp {
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookies: BTreeMap::new(),
        }
    }

    /// Waits for the background mail task to deliver to `recipient`.
    pub async fn wait_for_mail(&self, recipient: &str, count: usize) -> Notification {
        for _ in 0..100 {
            let sent: Vec<Notification> = self
                .outbox
                .messages()
                .await
                .into_iter()
                .filter(|n| n.recipient == recipient)
                .collect();
            if sent.len() >= count {
                return sent[count - 1].clone();
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("No mail #{count} delivered to {recipient}");
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Router client that keeps cookies between requests like a browser.
pub struct TestClient {
    router: Router,
    pub cookies: BTreeMap<String, String>,
}

impl TestClient {
    pub async fn request(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        match body {
            Some(json) => {
                self.raw(method, uri, Some("application/json"), json.to_string())
                    .await
            }
            None => self.raw(method, uri, None, String::new()).await,
        }
    }

    /// Sends `body` as is, with an optional content type.
    pub async fn raw(
        &mut self,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: String,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if !self.cookies.is_empty() {
            let header_value = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, header_value);
        }

        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body)).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let cookie = Cookie::parse(value.to_str().unwrap().to_string()).unwrap();
            let removed = cookie.value().is_empty()
                || cookie.max_age() == Some(time::Duration::ZERO);
            if removed {
                self.cookies.remove(cookie.name());
            } else {
                self.cookies
                    .insert(cookie.name().to_string(), cookie.value().to_string());
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Keeps only the remember-me cookies, as after a browser restart.
    pub fn drop_session_cookie(&mut self) {
        self.cookies
            .retain(|name, _| name == "user_id" || name == "remember_token");
    }

    pub async fn flashes(&mut self) -> Vec<String> {
        let response = self.get("/api/flashes").await;
        response.body["data"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|f| f["message"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn register(&mut self, username: &str, email: &str, role: &str) -> TestResponse {
        self.post(
            "/api/auth/register",
            serde_json::json!({
                "username": username,
                "email": email,
                "password": PASSWORD,
                "password_confirm": PASSWORD,
                "location": "Ljubljana",
                "description": "Plays weddings and jazz clubs",
                "role": role,
            }),
        )
        .await
    }

    pub async fn login(&mut self, email: &str, password: &str, remember_me: bool) -> TestResponse {
        self.post(
            "/api/auth/login",
            serde_json::json!({
                "email": email,
                "password": password,
                "remember_me": remember_me,
            }),
        )
        .await
    }
}

/// Path and query of a mailed link, ready to send through the router.
pub fn link_path(notification: &Notification, param: &str) -> String {
    let link = notification.param(param).expect("link missing from mail");
    let url = url::Url::parse(link).expect("mailed link is not a URL");
    url.path().to_string()
}

/// Registers and activates an account, returning a logged-in client.
pub async fn activated_client(app: &TestApp, username: &str, email: &str, role: &str) -> TestClient {
    let mut client = app.client();
    let response = client.register(username, email, role).await;
    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

    let mail = app.wait_for_mail(email, 1).await;
    let path = link_path(&mail, "activation_link");
    let response = client.get(&path).await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

    client.flashes().await;
    client
}
