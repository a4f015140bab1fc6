//! Record store behavior with a GitHub remote and a local data directory

use asset_tagger_core::{encode_collection, Asset, AssetTag};
use asset_tagger_store::{
    DocumentBackend, GitHubBackend, GitHubConfig, LocalFileBackend, RecordStore,
    RecordStoreConfig, StorageMode,
};
use secrecy::SecretString;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn remote(server: &MockServer) -> Arc<GitHubBackend> {
    let config = GitHubConfig::new("acme/inventory", SecretString::new("test-token".to_string()))
        .unwrap()
        .api_url(Url::parse(&server.uri()).unwrap());
    Arc::new(GitHubBackend::new(config).unwrap())
}

fn asset(tag: &str) -> Asset {
    Asset::new(&AssetTag::parse(tag).unwrap(), "Scanner").unwrap()
}

#[tokio::test]
async fn unreachable_remote_uses_local_files() {
    let dir = TempDir::new().unwrap();
    let local = Arc::new(LocalFileBackend::new(dir.path()));
    local
        .put(
            "assets.json",
            &encode_collection(&[asset("EGY-ZE-00007")]).unwrap(),
            None,
            "seed",
        )
        .await
        .unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let store = RecordStore::new(local.clone()).with_remote(remote(&server));
    assert_eq!(store.mode(), StorageMode::Remote);

    let mut session = store.open().await.unwrap();
    assert_eq!(session.assets().len(), 1);
    assert_eq!(session.warnings().len(), 1);
    assert!(session.warnings()[0].contains("Remote store unavailable"));

    session.assets_mut().push(asset("EGY-ZE-00008"));
    session.save_assets().await.unwrap();
    drop(session);

    let written = std::fs::read_to_string(dir.path().join("assets.json")).unwrap();
    assert!(written.contains("EGY-ZE-00008"));

    // Only GET requests were attempted against the remote
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() == "GET"));
}

#[tokio::test]
async fn remote_write_commits_and_mirrors_locally() {
    let dir = TempDir::new().unwrap();
    let local = Arc::new(LocalFileBackend::new(dir.path()));

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/repos/acme/inventory/contents/records/assets.json"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": {"sha": "new-sha"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = RecordStore::new(local)
        .with_remote(remote(&server))
        .with_config(RecordStoreConfig::new().remote_path_prefix("records"));

    let mut session = store.open().await.unwrap();
    assert!(session.warnings().is_empty());
    session.assets_mut().push(asset("KSA-DE-00001"));
    session.save_assets().await.unwrap();
    assert!(session.warnings().is_empty());

    let written = std::fs::read_to_string(dir.path().join("assets.json")).unwrap();
    assert!(written.contains("KSA-DE-00001"));
}

#[tokio::test]
async fn local_status_reports_healthy_directory() {
    let dir = TempDir::new().unwrap();
    let store = RecordStore::new(Arc::new(LocalFileBackend::new(dir.path().join("data"))));

    let status = store.status().await;
    assert_eq!(status.mode, StorageMode::LocalOnly);
    assert!(status.remote.is_none());
    assert!(status.local.healthy);
}
