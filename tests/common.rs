#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use clap::Parser;
use http_body_util::BodyExt;
use nearlink_chat::adapters::database::{self, pg_store::PgChatStore};
use nearlink_chat::adapters::memory::MemoryChatStore;
use nearlink_chat::config::Config;
use nearlink_chat::domain::auth::Claims;
use nearlink_chat::services::chat_store::ChatStore;
use nearlink_chat::{App, api};
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test_secret";

pub fn get_test_config() -> Config {
    get_test_config_with(&[])
}

pub fn get_test_config_with(extra: &[&str]) -> Config {
    let mut args = vec!["nearlink-chat", "--store", "memory", "--jwt-secret", JWT_SECRET];
    args.extend_from_slice(extra);
    Config::try_parse_from(args).expect("test config should parse")
}

pub struct TestApp {
    pub config: Config,
    pub store: Arc<MemoryChatStore>,
    pub app: App,
    pub router: Router,
    pub mgmt_router: Router,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::spawn_with_config(get_test_config())
    }

    pub fn spawn_with_config(config: Config) -> Self {
        let memory = Arc::new(MemoryChatStore::new(config.conversations.read_rule));
        let store = Arc::clone(&memory);
        Self::spawn_with_store(config, store, memory)
    }

    /// Wires the services over `store` while keeping `memory` for direct inspection.
    pub fn spawn_with_store(config: Config, store: Arc<dyn ChatStore>, memory: Arc<MemoryChatStore>) -> Self {
        nearlink_chat::telemetry::init_test_telemetry();

        let app = App::new(&config, store);
        let router = api::app_router(app.app_state(config.clone()));
        let mgmt_router = api::mgmt_router(app.mgmt_state());
        Self { config, store: memory, app, router, mgmt_router }
    }

    pub fn token_for(user_id: Uuid) -> String {
        Claims::new(user_id, 3600).encode(JWT_SECRET).expect("token should encode")
    }

    pub async fn call(&self, method: Method, uri: &str, user: Option<Uuid>, body: Option<Value>) -> (StatusCode, Value) {
        send(&self.router, method, uri, user.map(Self::token_for), body).await
    }

    pub async fn call_with_token(&self, method: Method, uri: &str, token: &str) -> (StatusCode, Value) {
        send(&self.router, method, uri, Some(token.to_string()), None).await
    }

    pub async fn mgmt_call(&self, uri: &str) -> (StatusCode, Value) {
        send(&self.mgmt_router, Method::GET, uri, None, None).await
    }
}

/// Connects to `DATABASE_URL` and applies migrations. Returns `None` when the
/// variable is unset so Postgres tests can be skipped locally.
pub async fn get_test_pool() -> Option<PgPool> {
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let config = get_test_config();

    let pool =
        database::init_pool(&config.database, &database_url).await.expect("Failed to connect to DB. Is Postgres running?");
    database::run_migrations(&pool).await.expect("Failed to run migrations");

    Some(pool)
}

pub struct PgTestApp {
    pub pool: PgPool,
    pub store: Arc<PgChatStore>,
    pub app: App,
}

impl PgTestApp {
    pub async fn spawn() -> Option<Self> {
        Self::spawn_with_config(get_test_config()).await
    }

    pub async fn spawn_with_config(config: Config) -> Option<Self> {
        let pool = get_test_pool().await?;
        nearlink_chat::telemetry::init_test_telemetry();

        let store = Arc::new(PgChatStore::new(pool.clone(), config.conversations.read_rule));
        let handle = Arc::clone(&store);
        let app = App::new(&config, handle);
        Some(Self { pool, store, app })
    }

    /// Inserts a fresh row into the platform `users` table.
    pub async fn seed_user(&self) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO users (id) VALUES ($1)").bind(id).execute(&self.pool).await.unwrap();
        id
    }

    pub async fn seed_listing(&self) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO listings (id) VALUES ($1)").bind(id).execute(&self.pool).await.unwrap();
        id
    }

    pub async fn seed_request(&self) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO requests (id) VALUES ($1)").bind(id).execute(&self.pool).await.unwrap();
        id
    }

    /// Opens a transaction under the same role and caller setting the store uses,
    /// for issuing statements the store never would.
    pub async fn as_caller(&self, caller: Uuid) -> Transaction<'static, Postgres> {
        let mut tx = self.pool.begin().await.unwrap();
        sqlx::query("SET LOCAL ROLE nearlink_app").execute(&mut *tx).await.unwrap();
        sqlx::query("SELECT set_config('nearlink.caller_id', $1, true)")
            .bind(caller.to_string())
            .execute(&mut *tx)
            .await
            .unwrap();
        tx
    }
}

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<String>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
