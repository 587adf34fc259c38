use std::net::SocketAddr;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use stockroom::config::{Config, RecoveryDelivery, RegistrationMode};

pub const ADMIN_EMAIL: &str = "admin@test.com";
pub const ADMIN_PASSWORD: &str = "password123";

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

async fn into_parts(resp: reqwest::Response) -> (Value, StatusCode) {
    let status = resp.status();
    let body: Value = resp.json().await.unwrap_or(json!(null));
    (body, status)
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Register an account, optionally as an authenticated admin.
    pub async fn register(&self, token: Option<&str>, body: &Value) -> (Value, StatusCode) {
        let mut req = self.client.post(self.url("/api/v1/auth/register")).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        into_parts(req.send().await.expect("register request failed")).await
    }

    /// Login and return the token response body + status.
    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed");
        into_parts(resp).await
    }

    /// Register the first (admin) account and return its access token.
    pub async fn bootstrap(&self) -> String {
        let (body, status) = self
            .register(
                None,
                &json!({
                    "email": ADMIN_EMAIL,
                    "password": ADMIN_PASSWORD,
                    "name": "Admin",
                    "role": "Admin",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "bootstrap register failed: {body}");
        self.token_for(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn token_for(&self, email: &str, password: &str) -> String {
        let (body, status) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Create a user with the given role as admin; returns (user id, token).
    pub async fn create_user(&self, admin_token: &str, email: &str, role: &str) -> (i64, String) {
        let (body, status) = self
            .register(
                Some(admin_token),
                &json!({
                    "email": email,
                    "password": "secret123",
                    "name": role,
                    "role": role,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create user failed: {body}");
        let id = body["id"].as_i64().unwrap();
        (id, self.token_for(email, "secret123").await)
    }

    /// Create a product, return the product JSON.
    pub async fn create_product(&self, token: &str, sku: &str, quantity: i64) -> Value {
        let (body, status) = self
            .post_auth(
                "/api/v1/products",
                token,
                &json!({
                    "name": format!("Product {sku}"),
                    "sku": sku,
                    "price": 10.5,
                    "quantity": quantity,
                    "classification": "Tools",
                    "branch_id": 1,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create product failed: {body}");
        body
    }

    /// Upload a file to the import endpoint as multipart field `file`.
    pub async fn import_file(&self, token: &str, filename: &str, data: &[u8]) -> (Value, StatusCode) {
        let form = Form::new().part(
            "file",
            Part::bytes(data.to_vec()).file_name(filename.to_string()),
        );
        let resp = self
            .client
            .post(self.url("/api/v1/reports/import"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("import request failed");
        into_parts(resp).await
    }

    /// Authenticated GET returning the raw text body.
    pub async fn get_text(&self, path: &str, token: &str) -> (String, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        (resp.text().await.unwrap_or_default(), status)
    }

    /// Make an authenticated GET request.
    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        into_parts(resp).await
    }

    /// Make an authenticated POST request with JSON body.
    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        into_parts(resp).await
    }

    /// Make an unauthenticated POST request with JSON body.
    pub async fn post_json(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        into_parts(resp).await
    }

    /// Make an authenticated PUT request with JSON body.
    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        into_parts(resp).await
    }

    /// Make an authenticated DELETE request.
    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        into_parts(resp).await
    }
}

fn database_url_for(base_url: &str, db_name: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.to_string())
}

pub fn test_config(database_url: String) -> Config {
    Config {
        database_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        jwt_algorithm: jsonwebtoken::Algorithm::HS256,
        token_ttl_minutes: 60,
        token_refresh_grace_minutes: 0,
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        registration: RegistrationMode::Closed,
        recovery_delivery: RecoveryDelivery::Response,
        max_upload_size: 1_048_576,
        import_default_branch_id: 1,
        trusted_proxies: vec![],
        log_level: "warn".to_string(),
        smtp: None,
    }
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Spawn a test app, letting the caller adjust the configuration first.
pub async fn spawn_app_with(adjust: impl FnOnce(&mut Config)) -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let db_name = format!("stockroom_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url_for(&base_url, "postgres"))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = database_url_for(&base_url, &db_name);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let mut config = test_config(test_url);
    adjust(&mut config);

    let (app, _state) = stockroom::build_app(pool.clone(), config).expect("Failed to build app");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    TestApp {
        addr,
        pool,
        client: Client::new(),
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url_for(&base_url, "postgres"))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
