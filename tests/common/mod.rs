//! Common test utilities and helpers
//!
//! This module starts the real router on a random port, backed by local
//! files in a temporary directory, and provides request helpers.

use asset_tagger_api::build_api_server;
use asset_tagger_service::ServiceRegistry;
use asset_tagger_store::{
    GitHubBackend, GitHubConfig, LocalFileBackend, RecordStore, RecordStoreConfig,
};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use url::Url;

/// Test application state
pub struct TestApp {
    pub address: String,
    pub data_dir: TempDir,
}

impl TestApp {
    /// Start an application storing its documents in a fresh temporary directory
    pub async fn new() -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create data directory");
        let store = local_store(data_dir.path());
        Self::serve(store, data_dir).await
    }

    /// Start an application whose remote store refuses every connection
    pub async fn with_unreachable_remote() -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create data directory");

        // Nothing listens on a port we just released
        let closed = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let closed_addr = closed.local_addr().expect("Failed to get local address");
        drop(closed);

        let config = GitHubConfig::new("acme/assets", SecretString::new("ghp_test".to_string()))
            .expect("Failed to create remote config")
            .api_url(Url::parse(&format!("http://{}", closed_addr)).expect("Invalid URL"))
            .timeout(Duration::from_secs(2));
        let remote = GitHubBackend::new(config).expect("Failed to create remote backend");

        let store = local_store(data_dir.path()).with_remote(Arc::new(remote));
        Self::serve(store, data_dir).await
    }

    async fn serve(store: RecordStore, data_dir: TempDir) -> Self {
        let app = build_api_server(ServiceRegistry::new(store));

        // Start server on random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let address = listener.local_addr().expect("Failed to get local address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to start test server");
        });

        Self {
            address: format!("http://{}", address),
            data_dir,
        }
    }

    /// Get base URL
    pub fn url(&self) -> &str {
        &self.address
    }

    /// Create HTTP client
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build client")
    }

    /// GET a path relative to the base URL
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client()
            .get(format!("{}{}", self.url(), path))
            .send()
            .await
            .expect("Failed to send request")
    }

    /// POST a JSON body to a path relative to the base URL
    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client()
            .post(format!("{}{}", self.url(), path))
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }

    /// PATCH a JSON body to a path relative to the base URL
    pub async fn patch(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client()
            .patch(format!("{}{}", self.url(), path))
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }

    /// DELETE a path relative to the base URL
    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client()
            .delete(format!("{}{}", self.url(), path))
            .send()
            .await
            .expect("Failed to send request")
    }

    /// Read a persisted document from the data directory
    pub fn read_document(&self, file_name: &str) -> Value {
        let bytes = std::fs::read(self.data_dir.path().join(file_name))
            .expect("Failed to read document");
        serde_json::from_slice(&bytes).expect("Document is not JSON")
    }
}

fn local_store(data_dir: &Path) -> RecordStore {
    RecordStore::new(Arc::new(LocalFileBackend::new(data_dir)))
        .with_config(RecordStoreConfig::new().seed_defaults(true))
}

/// Parse JSON response
pub async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> T {
    response
        .json::<T>()
        .await
        .expect("Failed to parse JSON response")
}

/// Assert response status
pub fn assert_status(response: &reqwest::Response, expected: reqwest::StatusCode) {
    assert_eq!(
        response.status(),
        expected,
        "Expected status {}, got {}",
        expected,
        response.status()
    );
}

/// Assert response is successful (2xx)
pub fn assert_success(response: &reqwest::Response) {
    assert!(
        response.status().is_success(),
        "Expected success status, got {}",
        response.status()
    );
}
