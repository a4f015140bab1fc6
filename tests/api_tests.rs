//! API Integration Tests
//!
//! Tests for the HTTP API: health and version, tag generation, manual entry,
//! import, listing, QR rendering and catalog maintenance.

mod common;

use common::{assert_status, assert_success, parse_json, TestApp};
use reqwest::StatusCode;
use serde_json::{json, Value};

fn generate_body(country: &str, manufacturer: &str, name: &str, count: u32) -> Value {
    json!({
        "country_code": country,
        "manufacturer_code": manufacturer,
        "name": name,
        "count": count,
    })
}

fn tags_of(assets: &Value) -> Vec<String> {
    assets
        .as_array()
        .expect("Expected an array of assets")
        .iter()
        .map(|asset| asset["tag"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new().await;

    let response = app.get("/health").await;
    assert_success(&response);
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = parse_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage_mode"], "local_only");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_version_endpoint() {
    let app = TestApp::new().await;

    let response = app.get("/version").await;
    assert_success(&response);

    let body: Value = parse_json(response).await;
    assert_eq!(body["data"]["api_version"], "v1");
    assert!(body["data"]["version"].is_string());
}

#[tokio::test]
async fn test_not_found_endpoint() {
    let app = TestApp::new().await;
    let response = app.get("/nonexistent").await;
    assert_status(&response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_first_tag_for_new_pair() {
    let app = TestApp::new().await;

    let response = app.get("/v1/tags/next?country_code=egy&manufacturer_code=ze").await;
    assert_success(&response);
    let body: Value = parse_json(response).await;
    assert_eq!(body["data"]["tag"], "EGY-ZE-00001");
    assert_eq!(body["data"]["sequence"], 1);

    let response = app
        .post("/v1/tags/generate", &generate_body("EGY", "ZE", "Zebra Printer", 1))
        .await;
    assert_status(&response, StatusCode::CREATED);
    let body: Value = parse_json(response).await;
    assert_eq!(tags_of(&body["data"]["assets"]), vec!["EGY-ZE-00001"]);
    assert_eq!(body["data"]["assets"][0]["name"], "Zebra Printer");
    assert!(body.get("warnings").is_none());
}

#[tokio::test]
async fn test_batch_generation_is_sequential_and_persisted() {
    let app = TestApp::new().await;

    let response = app
        .post("/v1/tags/generate", &generate_body("KSA", "HP", "Laptop", 3))
        .await;
    assert_status(&response, StatusCode::CREATED);
    let body: Value = parse_json(response).await;
    assert_eq!(
        tags_of(&body["data"]["assets"]),
        vec!["KSA-HP-00001", "KSA-HP-00002", "KSA-HP-00003"]
    );
    assert_eq!(body["data"]["assets"][2]["name"], "Laptop #3");

    let stored = app.read_document("assets.json");
    assert_eq!(tags_of(&stored).len(), 3);

    // Sequences are per pair
    let body: Value = parse_json(app.get("/v1/tags/next?country_code=KSA&manufacturer_code=HP").await).await;
    assert_eq!(body["data"]["tag"], "KSA-HP-00004");
    let body: Value = parse_json(app.get("/v1/tags/next?country_code=EGY&manufacturer_code=HP").await).await;
    assert_eq!(body["data"]["tag"], "EGY-HP-00001");
}

#[tokio::test]
async fn test_dry_run_does_not_consume_tags() {
    let app = TestApp::new().await;

    let mut request = generate_body("EGY", "DE", "Monitor", 2);
    request["dry_run"] = json!(true);

    let response = app.post("/v1/tags/generate", &request).await;
    assert_status(&response, StatusCode::OK);
    let body: Value = parse_json(response).await;
    assert_eq!(body["data"]["dry_run"], true);
    assert_eq!(tags_of(&body["data"]["assets"]), vec!["EGY-DE-00001", "EGY-DE-00002"]);

    let body: Value = parse_json(app.get("/v1/assets").await).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn test_generation_validation_errors() {
    let app = TestApp::new().await;

    let response = app
        .post("/v1/tags/generate", &generate_body("EGY", "XX", "Mystery", 1))
        .await;
    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = parse_json(response).await;
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["status"], 422);
    assert!(body["timestamp"].is_string());

    let response = app
        .post("/v1/tags/generate", &generate_body("EGY", "ZE", "Printer", 0))
        .await;
    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);

    let response = app.post("/v1/tags/generate", &generate_body("EGY", "ZE", " ", 1)).await;
    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);

    let response = app.get("/v1/tags/next?country_code=EGY").await;
    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_manual_entry_rejects_duplicates_ignoring_padding() {
    let app = TestApp::new().await;

    let response = app
        .post("/v1/assets", &json!({"tag": "egy-ze-0007", "name": "Scanner"}))
        .await;
    assert_status(&response, StatusCode::CREATED);
    let body: Value = parse_json(response).await;
    assert_eq!(body["data"]["tag"], "EGY-ZE-0007");
    assert_eq!(body["data"]["country_code"], "EGY");

    let response = app
        .post("/v1/assets", &json!({"tag": "EGY-ZE-00007", "name": "Scanner again"}))
        .await;
    assert_status(&response, StatusCode::CONFLICT);
    let body: Value = parse_json(response).await;
    assert_eq!(body["code"], "ALREADY_EXISTS");

    let response = app
        .post("/v1/assets", &json!({"tag": "EGY-ZE", "name": "Broken"}))
        .await;
    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);

    // Generation continues after the highest existing sequence
    let body: Value = parse_json(app.get("/v1/tags/next?country_code=EGY&manufacturer_code=ZE").await).await;
    assert_eq!(body["data"]["tag"], "EGY-ZE-00008");
}

#[tokio::test]
async fn test_import_reports_each_line() {
    let app = TestApp::new().await;
    app.post("/v1/assets", &json!({"tag": "EGY-LE-00001", "name": "Laptop"}))
        .await;

    let text = "EGY-LE-00001\n\nksa-ap-0042\nnot a tag\nKSA-AP-42\nEGY-LE-00002\n";
    let response = app.post("/v1/tags/import", &json!({ "text": text })).await;
    assert_success(&response);
    let body: Value = parse_json(response).await;

    assert_eq!(tags_of(&body["data"]["imported"]), vec!["KSA-AP-0042", "EGY-LE-00002"]);
    assert_eq!(body["data"]["imported"][0]["name"], "Imported Asset 0042");
    assert_eq!(body["data"]["skipped"], json!(["EGY-LE-00001", "KSA-AP-42"]));
    assert_eq!(body["data"]["rejected"][0]["line"], 4);
    assert_eq!(body["data"]["rejected"][0]["input"], "not a tag");

    let body: Value = parse_json(app.get("/v1/tags/next?country_code=KSA&manufacturer_code=AP").await).await;
    assert_eq!(body["data"]["tag"], "KSA-AP-00043");
}

#[tokio::test]
async fn test_get_and_update_asset() {
    let app = TestApp::new().await;
    app.post("/v1/tags/generate", &generate_body("EGY", "AP", "MacBook", 1))
        .await;

    let response = app.get("/v1/assets/EGY-AP-1").await;
    assert_success(&response);
    let body: Value = parse_json(response).await;
    assert_eq!(body["data"]["tag"], "EGY-AP-00001");

    let response = app
        .patch(
            "/v1/assets/EGY-AP-00001",
            &json!({"name": "MacBook Pro", "description": "Design team"}),
        )
        .await;
    assert_success(&response);
    let body: Value = parse_json(response).await;
    assert_eq!(body["data"]["name"], "MacBook Pro");
    assert_eq!(body["data"]["description"], "Design team");

    let response = app
        .patch("/v1/assets/EGY-AP-00001", &json!({"tag": "EGY-AP-00002"}))
        .await;
    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);

    let response = app.get("/v1/assets/EGY-AP-00099").await;
    assert_status(&response, StatusCode::NOT_FOUND);
    let body: Value = parse_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");

    let response = app.get("/v1/assets/EGY_AP_1").await;
    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_filters_and_pagination() {
    let app = TestApp::new().await;
    app.post("/v1/tags/generate", &generate_body("EGY", "ZE", "Printer", 3))
        .await;
    app.post("/v1/tags/generate", &generate_body("KSA", "ZE", "Label maker", 2))
        .await;

    let body: Value = parse_json(app.get("/v1/assets?country_code=ksa").await).await;
    assert_eq!(body["data"]["total"], 2);

    let body: Value = parse_json(app.get("/v1/assets?text=printer&limit=2").await).await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["assets"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"]["has_more"], true);

    let body: Value = parse_json(app.get("/v1/assets?text=printer&limit=2&offset=2").await).await;
    assert_eq!(body["data"]["assets"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"]["has_more"], false);

    let response = app.get("/v1/assets?limit=lots").await;
    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recent_and_stats() {
    let app = TestApp::new().await;
    app.post("/v1/tags/generate", &generate_body("EGY", "ZE", "Printer", 2))
        .await;
    app.post("/v1/tags/generate", &generate_body("KSA", "HP", "Laptop", 1))
        .await;

    let body: Value = parse_json(app.get("/v1/tags/recent?limit=1").await).await;
    assert_eq!(tags_of(&body["data"]), vec!["KSA-HP-00001"]);

    let body: Value = parse_json(app.get("/v1/stats").await).await;
    assert_eq!(body["data"]["total_assets"], 3);
    assert_eq!(body["data"]["countries_in_use"], 2);
    assert_eq!(body["data"]["manufacturers_in_use"], 2);
    assert_eq!(body["data"]["per_prefix"]["EGY-ZE"], 2);
    assert!(body["data"]["last_created"].is_string());
}

#[tokio::test]
async fn test_qr_codes() {
    let app = TestApp::new().await;
    app.post("/v1/tags/generate", &generate_body("EGY", "ZE", "Printer", 1))
        .await;

    let response = app.get("/v1/assets/EGY-ZE-00001/qr").await;
    assert_success(&response);
    assert_eq!(response.headers()["content-type"], "image/png");
    let bytes = response.bytes().await.expect("Failed to read body");
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

    let response = app.get("/v1/assets/EGY-ZE-00001/qr?format=svg").await;
    assert_success(&response);
    assert_eq!(response.headers()["content-type"], "image/svg+xml");
    let text = response.text().await.expect("Failed to read body");
    assert!(text.contains("<svg"));

    let response = app.get("/v1/assets/EGY-ZE-00001/qr?format=bmp").await;
    assert_status(&response, StatusCode::BAD_REQUEST);

    let response = app.get("/v1/assets/EGY-ZE-00002/qr").await;
    assert_status(&response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_catalog_maintenance() {
    let app = TestApp::new().await;

    let body: Value = parse_json(app.get("/v1/countries").await).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let response = app
        .post("/v1/countries", &json!({"code": "uae", "name": "United Arab Emirates"}))
        .await;
    assert_status(&response, StatusCode::CREATED);
    let body: Value = parse_json(response).await;
    assert_eq!(body["data"]["code"], "UAE");

    let response = app
        .post("/v1/countries", &json!({"code": "UAE", "name": "Emirates"}))
        .await;
    assert_status(&response, StatusCode::CONFLICT);

    let response = app
        .post("/v1/manufacturers", &json!({"code": "TOOLONG", "name": "Nobody"}))
        .await;
    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);

    let stored = app.read_document("countries.json");
    assert_eq!(stored.as_array().map(Vec::len), Some(3));

    let response = app.delete("/v1/countries/XYZ").await;
    assert_status(&response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_removed_manufacturer_keeps_existing_tags() {
    let app = TestApp::new().await;
    app.post("/v1/tags/generate", &generate_body("EGY", "LE", "ThinkPad", 2))
        .await;

    let response = app.delete("/v1/manufacturers/le").await;
    assert_success(&response);
    let body: Value = parse_json(response).await;
    assert_eq!(body["data"]["code"], "LE");

    let body: Value = parse_json(app.get("/v1/assets/EGY-LE-00002").await).await;
    assert_eq!(body["data"]["name"], "ThinkPad #2");

    let response = app
        .post("/v1/tags/generate", &generate_body("EGY", "LE", "ThinkPad", 1))
        .await;
    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);

    // Re-adding the code resumes after the existing tags
    app.post("/v1/manufacturers", &json!({"code": "LE", "name": "Lenovo"}))
        .await;
    let body: Value = parse_json(app.get("/v1/tags/next?country_code=EGY&manufacturer_code=LE").await).await;
    assert_eq!(body["data"]["tag"], "EGY-LE-00003");
}

#[tokio::test]
async fn test_malformed_json_request() {
    let app = TestApp::new().await;

    let response = app
        .client()
        .post(format!("{}/v1/tags/generate", app.url()))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to send request");

    assert_status(&response, StatusCode::BAD_REQUEST);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let body: Value = parse_json(response).await;
    assert_eq!(body["status"], 400);
    assert_eq!(body["code"], "INVALID_INPUT");
    assert!(body["error"].is_string());
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_incomplete_json_body_uses_error_envelope() {
    let app = TestApp::new().await;

    let response = app
        .post("/v1/tags/generate", &json!({"country_code": "EGY"}))
        .await;
    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = parse_json(response).await;
    assert_eq!(body["status"], 422);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert!(body["error"]
        .as_str()
        .unwrap_or_default()
        .contains("manufacturer_code"));
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = TestApp::new().await;

    let response = app
        .client()
        .request(reqwest::Method::OPTIONS, format!("{}/v1/assets", app.url()))
        .header("origin", "https://assets.example.com")
        .header("access-control-request-method", "POST")
        .send()
        .await
        .expect("Failed to send request");

    assert_success(&response);
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}
