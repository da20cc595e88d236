//! End-to-end tests through the HTTP router

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use item_market::auth::{Identity, TokenService};
use item_market::config::{AuthConfig, Config, ServerConfig, UploadConfig};
use item_market::storage::{Database, Uploads};
use item_market::{api, AppState};

const SECRET: &str = "integration-secret-0123456789";

struct TestApp {
    _temp: TempDir,
    router: Router,
    state: Arc<AppState>,
}

fn setup() -> TestApp {
    let temp = TempDir::new().unwrap();
    let config = Config {
        auth: AuthConfig {
            secret: SECRET.to_string(),
            token_ttl_seconds: 86400,
        },
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: temp.path().display().to_string(),
        },
        uploads: UploadConfig {
            root: temp.path().join("uploads"),
            ..Default::default()
        },
    };

    let db = Database::open(temp.path()).unwrap();
    let uploads = Uploads::open(&config.uploads).unwrap();
    let tokens = TokenService::from_config(&config.auth);
    let state = Arc::new(AppState {
        config,
        db,
        tokens,
        uploads,
    });

    TestApp {
        _temp: temp,
        router: api::create_router(Arc::clone(&state)),
        state,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn register(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/register",
                None,
                Some(json!({
                    "name": name,
                    "phone": "89161234567",
                    "email": email,
                    "password": "secret123",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn create_item(&self, token: &str, title: &str, price: Value) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/item",
                Some(token),
                Some(json!({ "title": title, "price": price })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"].clone()
    }

    async fn upload(&self, token: &str, item_id: u64, bytes: &[u8]) -> (StatusCode, Value) {
        let boundary = "XBOUNDARYX";
        let mut payload = Vec::new();
        payload.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"chair.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        payload.extend_from_slice(bytes);
        payload.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/item/{item_id}/image"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(payload))
            .unwrap();
        self.send(request).await
    }
}

#[tokio::test]
async fn test_account_lifecycle() {
    let app = setup();
    let token = app.register("Alice", "alice@example.com").await;

    let (status, me) = app.call(Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["status"], "success");
    assert_eq!(me["data"]["id"], 1);
    assert_eq!(me["data"]["email"], "alice@example.com");
    assert!(me["data"].get("password_hash").is_none());

    let (status, _) = app
        .call(
            Method::PUT,
            "/api/me",
            Some(&token),
            Some(json!({
                "name": "Alicia",
                "current_password": "secret123",
                "new_password": "rotated",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["errors"][0]["field"], "password");

    let (status, body) = app
        .call(
            Method::POST,
            "/api/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "rotated" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());

    let (status, body) = app.call(Method::GET, "/api/user/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Alicia");

    let (status, body) = app
        .call(Method::GET, "/api/user?email=alice@example.com", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 1);

    let (status, _) = app.call(Method::GET, "/api/user/7", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_registration_errors() {
    let app = setup();

    let (status, body) = app
        .call(
            Method::POST,
            "/api/register",
            None,
            Some(json!({ "name": "R2D2", "phone": "555", "email": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "fail");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert_eq!(fields, ["name", "phone", "email", "password"]);

    app.register("Alice", "alice@example.com").await;
    let (status, body) = app
        .call(
            Method::POST,
            "/api/register",
            None,
            Some(json!({
                "name": "Eve",
                "phone": "89161234567",
                "email": "alice@example.com",
                "password": "x",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "email");
    assert!(app.state.db.find_user(Some("Eve"), None).unwrap().is_none());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "body");
}

#[tokio::test]
async fn test_token_rejections() {
    let app = setup();
    app.register("Alice", "alice@example.com").await;
    let user = app.state.db.get_user_by_id(1).unwrap().unwrap();
    let identity = Identity {
        user_id: user.id,
        user_ref: user.internal_id.clone(),
    };

    let expired = TokenService::new(SECRET.as_bytes(), Duration::seconds(-60))
        .issue(&identity)
        .unwrap();
    let (status, _) = app.call(Method::GET, "/api/me", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = TokenService::new(b"some-other-secret-entirely", Duration::hours(1))
        .issue(&identity)
        .unwrap();
    let (status, _) = app.call(Method::GET, "/api/me", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.call(Method::GET, "/api/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "fail");
}

#[tokio::test]
async fn test_item_ownership_and_listing() {
    let app = setup();
    let alice = app.register("Alice", "alice@example.com").await;
    let bob = app.register("Bob", "bob@example.com").await;

    let chair = app.create_item(&alice, "Chair1", json!(19.99)).await;
    assert_eq!(chair["id"], 1);
    assert_eq!(chair["image"], "");
    assert_eq!(chair["user_id"], 1);
    assert_eq!(chair["user"]["email"], "alice@example.com");
    app.create_item(&alice, "Lamp", json!("5")).await;
    app.create_item(&bob, "Table", json!(50)).await;

    let (status, _) = app
        .call(Method::PUT, "/api/item/1", Some(&bob), Some(json!({ "price": 1 })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call(Method::DELETE, "/api/item/1", Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call(Method::DELETE, "/api/item/99", Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .call(Method::PUT, "/api/item/1", Some(&alice), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"][0].get("field").is_none());

    let (status, body) = app
        .call(Method::PUT, "/api/item/1", Some(&alice), Some(json!({ "price": 25.5 })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["price"], 25.5);
    assert_eq!(body["data"]["title"], "Chair1");

    let (_, body) = app
        .call(
            Method::GET,
            "/api/item?order_by=price&order_type=asc",
            Some(&bob),
            None,
        )
        .await;
    let prices: Vec<f64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["price"].as_f64().unwrap())
        .collect();
    assert_eq!(prices, [5.0, 25.5, 50.0]);

    let (_, body) = app.call(Method::GET, "/api/item", Some(&bob), None).await;
    let ids: Vec<u64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, [3, 2, 1]);

    let (_, body) = app
        .call(Method::GET, "/api/item?user_id=2", Some(&alice), None)
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["title"], "Table");

    let (status, body) = app.call(Method::GET, "/api/item/2", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["user"]["name"], "Alice");

    let (status, _) = app.call(Method::DELETE, "/api/item/1", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);

    // A missing id reads the same through the path and the query string
    for uri in ["/api/item/1", "/api/item?id=1"] {
        let (status, body) = app.call(Method::GET, uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["data"], json!([]), "{uri}");
    }

    let (status, body) = app
        .call(Method::GET, "/api/item?id=&title=Lamp", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_item_create_validation() {
    let app = setup();
    let token = app.register("Alice", "alice@example.com").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/item",
            Some(&token),
            Some(json!({ "title": "", "price": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"][0]["field"], "title");
    assert_eq!(body["errors"][1]["field"], "price");
}

#[tokio::test]
async fn test_item_image_lifecycle() {
    let app = setup();
    let alice = app.register("Alice", "alice@example.com").await;
    let bob = app.register("Bob", "bob@example.com").await;
    app.create_item(&alice, "Chair1", json!(19.99)).await;

    let (status, _) = app.upload(&bob, 1, b"not-yours").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let leftovers = std::fs::read_dir(app.state.uploads.root()).unwrap().count();
    assert_eq!(leftovers, 0);

    let (status, body) = app.upload(&alice, 1, b"\x89PNG").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let image_ref = body["data"]["image"].as_str().unwrap().to_string();
    assert!(image_ref.starts_with("/uploads/"));
    assert!(image_ref.ends_with(".png"));
    assert!(app.state.uploads.exists(&image_ref));

    let (status, _) = app
        .call(Method::DELETE, "/api/item/1/image", Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(Method::DELETE, "/api/item/1/image", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["image"], "");
    assert!(!app.state.uploads.exists(&image_ref));

    let (status, _) = app
        .call(Method::DELETE, "/api/item/1/image", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_image_upload_requires_multipart() {
    let app = setup();
    let alice = app.register("Alice", "alice@example.com").await;
    app.create_item(&alice, "Chair1", json!(19.99)).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/item/1/image",
            Some(&alice),
            Some(json!({ "file": "not-a-file" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "fail");
    assert_eq!(body["errors"][0]["field"], "file");
    assert_eq!(app.state.db.get_item(1).unwrap().unwrap().image, "");
}
