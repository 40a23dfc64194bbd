#![allow(dead_code)]

use instrevi::config::Config;
use instrevi::db;
use instrevi::routes;
use instrevi::state::{AppState, DbPool};
use tempfile::TempDir;

pub const TEST_SECRET: &str = "integration-test-secret";

/// A server bound to an ephemeral port with its own database.
pub struct TestServer {
    pub base_url: String,
    pub pool: DbPool,
    pub dir: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn spawn_server() -> TestServer {
    let dir = TempDir::new().unwrap();
    let pool = db::create_pool(&dir.path().join("test.db"), 4).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");

    let mut config = Config::default();
    config.auth.jwt_secret = Some(TEST_SECRET.to_string());
    config.auth.bcrypt_cost = 4;

    let app = routes::app(AppState::new(pool.clone(), config));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{}", addr),
        pool,
        dir,
    }
}
