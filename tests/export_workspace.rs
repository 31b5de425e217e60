//! End-to-end export against a mock HTTP API

mod common;

use common::{config_for, files_under};
use screens_dl::{Error, FailurePolicy, ReqwestTransport, ScreenExporter};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_workspace() -> MockServer {
    let server = MockServer::start().await;
    let assets = server.uri();

    Mock::given(method("GET"))
        .and(path("/v1/organizations/ws-1/projects"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "20"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "p1", "name": "Checkout Flow", "status": "active", "number_of_screens": 2},
            {"id": "p2", "name": "Retired", "status": "archived", "number_of_screens": 1}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/p1/screens"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "100"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "s1",
                "name": "Cart / Empty",
                "image": {"original_url": format!("{assets}/assets/s1.png")},
                "number_of_versions": 3
            },
            {
                "id": "s2",
                "name": "Payment",
                "image": {"original_url": format!("{assets}/assets/s2.png")},
                "number_of_versions": 1
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/projects/p1/screens/s1/versions"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "100"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "v1", "created": 1700000300, "image_url": format!("{assets}/assets/v1.png")},
            {"id": "v2", "created": 1700000200, "image_url": format!("{assets}/assets/v2.png")},
            {"id": "v3", "created": 1700000100, "image_url": format!("{assets}/assets/v3.png")}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    for name in ["s1", "s2", "v1", "v3"] {
        Mock::given(method("GET"))
            .and(path(format!("/assets/{name}.png")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(name.as_bytes()))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/assets/v2.png"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn exports_a_workspace_over_http() {
    let server = mock_workspace().await;
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("Output");
    let transport = Arc::new(ReqwestTransport::new().unwrap());

    let exporter =
        ScreenExporter::with_transport(config_for(&server.uri(), &root), transport).unwrap();
    let report = exporter.run().await.unwrap();

    assert_eq!(report.projects, 1);
    assert_eq!(report.screens, 2);
    assert_eq!(report.downloaded, 2);
    assert_eq!(report.versions_saved, 2);
    assert_eq!(report.versions_failed, 1);
    assert!(report.is_complete());

    assert_eq!(
        files_under(&root),
        vec![
            "Checkout_Flow/Cart_-_Empty.png",
            "Checkout_Flow/Cart_-_Empty_1700000100.png",
            "Checkout_Flow/Cart_-_Empty_1700000300.png",
            "Checkout_Flow/Payment.png",
        ]
    );
    assert_eq!(
        std::fs::read(root.join("Checkout_Flow/Payment.png")).unwrap(),
        b"s2"
    );
}

#[tokio::test]
async fn asset_downloads_carry_no_credentials() {
    let server = mock_workspace().await;
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(ReqwestTransport::new().unwrap());

    let exporter =
        ScreenExporter::with_transport(config_for(&server.uri(), dir.path()), transport).unwrap();
    exporter.run().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    for request in &requests {
        let authorized = request.headers.contains_key("authorization");
        let is_asset = request.url.path().starts_with("/assets/");
        assert_eq!(authorized, !is_asset, "{}", request.url);
    }
    // 3 listings, 2 primaries, 3 versions
    assert_eq!(requests.len(), 8);
}

#[tokio::test]
async fn archived_project_is_absent_from_the_output() {
    let server = mock_workspace().await;
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("Output");
    let transport = Arc::new(ReqwestTransport::new().unwrap());

    let exporter =
        ScreenExporter::with_transport(config_for(&server.uri(), &root), transport).unwrap();
    exporter.run().await.unwrap();

    assert!(!root.join("Retired").exists());
    let requests = server.received_requests().await.unwrap();
    assert!(
        requests
            .iter()
            .all(|r| !r.url.path().starts_with("/v1/projects/p2"))
    );
}

#[tokio::test]
async fn rejected_credentials_end_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("Output");
    let transport = Arc::new(ReqwestTransport::new().unwrap());

    let exporter =
        ScreenExporter::with_transport(config_for(&server.uri(), &root), transport).unwrap();
    let err = exporter.run().await.unwrap_err();

    assert!(matches!(err, Error::Status { status: 401, .. }));
    assert!(!root.exists());
}

#[tokio::test]
async fn malformed_listing_is_a_schema_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/organizations/ws-1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"projects": []})))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let transport = Arc::new(ReqwestTransport::new().unwrap());

    let exporter =
        ScreenExporter::with_transport(config_for(&server.uri(), dir.path()), transport).unwrap();
    let err = exporter.plan().await.unwrap_err();

    match err {
        Error::Schema { endpoint, .. } => {
            assert_eq!(endpoint, "/v1/organizations/ws-1/projects");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn fail_fast_surfaces_the_failing_screen() {
    let server = MockServer::start().await;
    let assets = server.uri();
    Mock::given(method("GET"))
        .and(path("/v1/organizations/ws-1/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "p1", "name": "Checkout Flow", "status": "active", "number_of_screens": 1}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/projects/p1/screens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "s1",
            "name": "Payment",
            "image": {"original_url": format!("{assets}/assets/missing.png")},
            "number_of_versions": 1
        }])))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_for(&server.uri(), dir.path());
    config.failure_policy = FailurePolicy::Abort;
    let transport = Arc::new(ReqwestTransport::new().unwrap());

    let exporter = ScreenExporter::with_transport(config, transport).unwrap();
    let err = exporter.run().await.unwrap_err();

    match err {
        Error::ScreenDownload {
            project,
            screen,
            source,
        } => {
            assert_eq!(project, "Checkout Flow");
            assert_eq!(screen, "Payment");
            assert_eq!(source.status(), Some(404));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
