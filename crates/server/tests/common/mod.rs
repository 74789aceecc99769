//! Common test utilities for driving the API in-process.
//!
//! The fixture builds the full router against an on-disk SQLite store in a
//! temp directory, so tests exercise the real persistence path without a
//! running server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use leadflow_core::{
    ActivityTracker, Config, CsvImporter, DatabaseConfig, ImportConfig, LeadStore,
    SqliteLeadStore,
};
use leadflow_server::api::create_router;
use leadflow_server::state::AppState;

/// Test fixture with an in-process router and direct store access.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Direct handle to the lead store, for seeding and assertions
    pub store: Arc<SqliteLeadStore>,
    /// Shared activity tracker, for seeding agent activity
    pub activity: ActivityTracker,
    /// Temporary directory holding the database and import directory
    pub temp_dir: TempDir,
    /// CSV import directory the server sweeps
    pub import_dir: PathBuf,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let import_dir = temp_dir.path().join("import");
        std::fs::create_dir_all(&import_dir).expect("Failed to create import dir");

        let config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            import: ImportConfig {
                directory: import_dir.clone(),
            },
            ..Config::default()
        };

        let store = Arc::new(SqliteLeadStore::new(&db_path).expect("Failed to create lead store"));
        let store_dyn: Arc<dyn LeadStore> = store.clone();
        let importer = Arc::new(CsvImporter::new(store_dyn.clone(), &config.import));
        let activity = ActivityTracker::new();

        let state = Arc::new(AppState::new(
            config,
            store_dyn,
            importer,
            activity.clone(),
        ));
        let router = create_router(state);

        Self {
            router,
            store,
            activity,
            temp_dir,
            import_dir,
        }
    }

    /// Write a CSV file into the import directory.
    pub fn write_import_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.import_dir.join(name);
        std::fs::write(&path, content).expect("Failed to write import file");
        path
    }

    pub fn import_dir(&self) -> &Path {
        &self.import_dir
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with no body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let request = match body {
            Some(json) => {
                request_builder = request_builder.header("Content-Type", "application/json");
                request_builder
                    .body(Body::from(json.to_string()))
                    .unwrap()
            }
            None => request_builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
