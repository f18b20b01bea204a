use std::time::Duration;

use livescript_engine::{
    ApiSettings, ArtifactKind, ArtifactQuery, FailureKind, ItemInfo, LookupError, ProductLookup,
    QueryOutcome, ReqwestArtifactQuery, ReqwestProductLookup,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/pyinfer_tao_pre/api/v1/inference/stream";

fn settings_for(server: &MockServer) -> ApiSettings {
    ApiSettings {
        base_url: server.uri(),
        query_timeout: Duration::from_secs(5),
        lookup_timeout: Duration::from_secs(5),
        ..ApiSettings::default()
    }
}

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/event-stream")
}

#[tokio::test]
async fn storage_query_finds_artifact() {
    livescript_logging::initialize_for_tests();
    let server = MockServer::start().await;
    let name = "AI生成_山东苹果_20250718_104524.xlsx";
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "appId": 51143,
            "bizCode": "live_script_demo",
            "request": { "service_type": "oss_query", "name": name }
        })))
        .respond_with(sse(concat!(
            "event:data\n",
            "data:{\"success\":true,\"data\":{\"status\":\"progress\",\"progress\":10}}\n",
            "data:{\"success\":true,\"data\":{\"status\":\"success\",\"download_url\":\"https://oss.example.com/x.xlsx\",\"file_path\":\"live/x.xlsx\"}}\n",
            "\n",
            "event:complete\n",
            "data:[done]\n",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let query = ReqwestArtifactQuery::new(settings_for(&server));
    match query.query(name).await.unwrap() {
        QueryOutcome::Found(file) => {
            assert_eq!(file.kind, ArtifactKind::Excel);
            assert_eq!(file.file_name, name);
            assert_eq!(file.url, "https://oss.example.com/x.xlsx");
            assert_eq!(file.path, "live/x.xlsx");
        }
        QueryOutcome::NotFound => panic!("expected artifact"),
    }
}

#[tokio::test]
async fn storage_query_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(sse(
            "data:{\"success\":true,\"data\":{\"status\":\"not_found\",\"message\":\"no such file\"}}\nevent:complete\ndata:[done]\n",
        ))
        .mount(&server)
        .await;

    let query = ReqwestArtifactQuery::new(settings_for(&server));
    assert_eq!(query.query("missing.md").await.unwrap(), QueryOutcome::NotFound);
}

#[tokio::test]
async fn storage_query_http_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let query = ReqwestArtifactQuery::new(settings_for(&server));
    let err = query.query("a.md").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
}

#[tokio::test]
async fn slow_storage_query_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(sse("data:[done]\n").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let settings = ApiSettings {
        query_timeout: Duration::from_millis(200),
        ..settings_for(&server)
    };
    let err = ReqwestArtifactQuery::new(settings)
        .query("a.md")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn item_lookup_returns_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(json!({
            "request": { "service_type": "igraph_query", "item_id": "6523" }
        })))
        .respond_with(sse(concat!(
            "data:{\"success\":true,\"data\":{\"status\":\"progress\"}}\n",
            "data:{\"success\":true,\"data\":{\"status\":\"success\",\"item_name\":\"烟台苹果\",\"discount_price\":\"39.9\",\"brand_ext_info\":\"产地直发\",\"selling_points\":[\"脆甜\",\"现摘\"]}}\n",
            "data:[done]\n",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let lookup = ReqwestProductLookup::new(settings_for(&server));
    let info = lookup.lookup("6523").await.unwrap();
    assert_eq!(
        info,
        ItemInfo {
            name: Some("烟台苹果".into()),
            price: Some("39.9".into()),
            brand_info: Some("产地直发".into()),
            selling_points: Some("脆甜;现摘".into()),
        }
    );
}

#[tokio::test]
async fn item_lookup_reports_missing_item() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(sse(
            "data:{\"success\":false,\"data\":{\"status\":\"error\",\"message\":\"item not indexed\"}}\n",
        ))
        .mount(&server)
        .await;

    let lookup = ReqwestProductLookup::new(settings_for(&server));
    assert_eq!(
        lookup.lookup("1").await,
        Err(LookupError::NotFound("item not indexed".into()))
    );
}

#[tokio::test]
async fn item_lookup_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let lookup = ReqwestProductLookup::new(settings_for(&server));
    match lookup.lookup("1").await {
        Err(LookupError::Transport(err)) => assert_eq!(err.kind, FailureKind::HttpStatus(503)),
        other => panic!("unexpected {other:?}"),
    }
}
