//! HTTP surface tests: routes, payload shapes and error mapping.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};

use promptex::pipeline::{
    DirectorySource, ExportSink, KeywordEnhancer, MemorySink, Pipeline, PipelineConfig,
};
use promptex::server::{AppState, build_router};
use promptex::test_utils::fixtures::{FailingSink, SourceFixture};

fn server_with(sink: Arc<dyn ExportSink>, fixture: &SourceFixture) -> TestServer {
    let pipeline = Pipeline::new(PipelineConfig::default(), Arc::new(KeywordEnhancer), sink);
    let state = AppState::new(pipeline, Arc::new(DirectorySource::new(fixture.root())));
    TestServer::new(build_router(state)).expect("Failed to create test server")
}

fn create_test_server(fixture: &SourceFixture) -> TestServer {
    server_with(Arc::new(MemorySink::new()), fixture)
}

mod meta {
    use super::*;

    #[tokio::test]
    async fn health_reports_version() {
        let fixture = SourceFixture::new();
        let server = create_test_server(&fixture);

        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], promptex::VERSION);
    }

    #[tokio::test]
    async fn platforms_lists_every_profile() {
        let fixture = SourceFixture::new();
        let server = create_test_server(&fixture);

        let response = server.get("/api/platforms").await;

        response.assert_status_ok();
        let body: Value = response.json();
        let platforms = body["platforms"].as_array().unwrap();
        assert_eq!(platforms.len(), 6);
        assert_eq!(platforms[0]["id"], "midjourney");
        assert_eq!(platforms[0]["name"], "Midjourney");
        assert_eq!(platforms[0]["maxLength"], 4000);
    }

    #[tokio::test]
    async fn formats_lists_mime_types() {
        let fixture = SourceFixture::new();
        let server = create_test_server(&fixture);

        let response = server.get("/api/formats").await;

        response.assert_status_ok();
        let body: Value = response.json();
        let formats = body["formats"].as_array().unwrap();
        assert_eq!(formats.len(), 4);
        assert!(formats.iter().any(|f| f["id"] == "csv" && f["mimeType"] == "text/csv"));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let fixture = SourceFixture::new();
        let server = create_test_server(&fixture);

        let response = server.get("/api/nope").await;

        response.assert_status(StatusCode::NOT_FOUND);
        response.assert_json(&json!({ "error": "Not found" }));
    }
}

mod export {
    use super::*;

    #[tokio::test]
    async fn cinematic_prompt_is_valid_for_midjourney() {
        let fixture = SourceFixture::new();
        let server = create_test_server(&fixture);

        let response = server
            .post("/api/export")
            .json(&json!({
                "sourceContent": "Cinematic urban scene with dramatic lighting",
                "targetPlatform": "midjourney",
                "exportFormat": "json",
            }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        let prompt = &body["exportedPrompts"][0];
        assert!(prompt["content"].as_str().unwrap().chars().count() < 500);
        assert_eq!(prompt["validation"]["status"], "valid");
        let styles = prompt["metadata"]["styles"].as_array().unwrap();
        assert!(styles.contains(&json!("cinematic")));
        assert_eq!(body["summary"]["totalPrompts"], 1);
        assert!(body["exportUrl"].as_str().unwrap().starts_with("memory://exports/"));
    }

    #[tokio::test]
    async fn forbidden_content_is_reported_not_rejected() {
        let fixture = SourceFixture::new();
        let server = create_test_server(&fixture);

        let response = server
            .post("/api/export")
            .json(&json!({ "sourceContent": "nsfw content here", "targetPlatform": "midjourney" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        let validation = &body["exportedPrompts"][0]["validation"];
        assert_eq!(validation["status"], "error");
        assert!(!validation["errors"].as_array().unwrap().is_empty());
        assert_eq!(body["summary"]["errorPrompts"], 1);
    }

    #[tokio::test]
    async fn unknown_platform_falls_back_to_custom() {
        let fixture = SourceFixture::new();
        let server = create_test_server(&fixture);

        let response = server
            .post("/api/export")
            .json(&json!({ "sourceContent": "a cat", "targetPlatform": "tiktok" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["exportedPrompts"][0]["platform"], "custom");
    }

    #[tokio::test]
    async fn structured_array_exports_each_element() {
        let fixture = SourceFixture::new();
        let server = create_test_server(&fixture);

        let response = server
            .post("/api/export")
            .json(&json!({
                "sourceContent": r#"["a red barn", {"prompt": "a blue lake"}]"#,
                "sourceType": "structured",
                "exportFormat": "csv",
            }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["summary"]["totalPrompts"], 2);
        assert_eq!(body["exportedPrompts"][1]["originalContent"], r#"{"prompt":"a blue lake"}"#);
    }

    #[tokio::test]
    async fn empty_content_is_bad_request() {
        let fixture = SourceFixture::new();
        let server = create_test_server(&fixture);

        let response = server
            .post("/api/export")
            .json(&json!({ "sourceContent": "   " }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn unsupported_format_is_bad_request() {
        let fixture = SourceFixture::new();
        let server = create_test_server(&fixture);

        let response = server
            .post("/api/export")
            .json(&json!({ "sourceContent": "a cat", "exportFormat": "pdf" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("pdf"));
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let fixture = SourceFixture::new();
        let server = create_test_server(&fixture);

        let response = server
            .post("/api/export")
            .text("{not json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn sink_failure_is_internal_error() {
        let fixture = SourceFixture::new();
        let server = server_with(Arc::new(FailingSink), &fixture);

        let response = server
            .post("/api/export")
            .json(&json!({ "sourceContent": "a cat" }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_json(&json!({ "error": "Internal server error" }));
    }
}

mod batch {
    use super::*;

    #[tokio::test]
    async fn folder_documents_are_counted() {
        let fixture = SourceFixture::new();
        fixture.create_file("spring/a.txt", "cherry blossoms");
        fixture.create_file("spring/b.txt", "a rainy meadow");
        fixture.create_file("spring/c.md", "first scene\n\nsecond scene");
        let server = create_test_server(&fixture);

        let response = server
            .post("/api/batch")
            .json(&json!({ "folderId": "spring", "exportFormat": "txt" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        let summary = &body["summary"];
        assert_eq!(summary["totalPrompts"], 4);
        let counted = summary["validPrompts"].as_u64().unwrap()
            + summary["warningPrompts"].as_u64().unwrap()
            + summary["errorPrompts"].as_u64().unwrap();
        assert_eq!(counted, 4);
    }

    #[tokio::test]
    async fn missing_folder_is_not_found() {
        let fixture = SourceFixture::new();
        let server = create_test_server(&fixture);

        let response = server
            .post("/api/batch")
            .json(&json!({ "folderId": "winter" }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("winter"));
    }

    #[tokio::test]
    async fn traversal_folder_id_is_bad_request() {
        let fixture = SourceFixture::new();
        let server = create_test_server(&fixture);

        let response = server
            .post("/api/batch")
            .json(&json!({ "folderId": "../etc" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
