use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use livescript_engine::{
    run_generation, ApiSettings, EngineEvent, GenerationError, GenerationRequest, JobSubmitter,
    PollPolicy, ProgressSink, ReqwestArtifactQuery, ReqwestSubmitter, SubmitAck,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/pyinfer_tao_pre/api/v1/inference/stream";
const FILE: &str = "AI生成_苹果_20250718_104524.md";

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn request() -> GenerationRequest {
    let mut fields = BTreeMap::new();
    fields.insert("product_name".to_string(), "苹果".to_string());
    fields.insert("anchor_name".to_string(), "小王".to_string());
    fields.insert("markdown_file_name".to_string(), FILE.to_string());
    GenerationRequest {
        script_type_label: "单人推品".to_string(),
        file_name: FILE.to_string(),
        fields,
    }
}

fn quick(max_attempts: u32) -> PollPolicy {
    PollPolicy {
        max_attempts,
        interval: Duration::ZERO,
    }
}

async fn mount_found(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(json!({ "request": { "service_type": "oss_query" } })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data:{\"success\":true,\"data\":{\"status\":\"success\",\"download_url\":\"https://oss.example.com/s.md\"}}\ndata:[done]\n",
            "text/event-stream",
        ))
        .mount(server)
        .await;
}

#[tokio::test]
async fn submit_acknowledges_before_the_service_answers() {
    livescript_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("data:[done]\n", "text/event-stream")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let submitter = ReqwestSubmitter::new(ApiSettings {
        base_url: server.uri(),
        ..ApiSettings::default()
    });
    let started = Instant::now();
    let ack = submitter.submit(&request());
    assert!(ack.success);
    assert!(started.elapsed() < Duration::from_secs(1));

    let deadline = Instant::now() + Duration::from_secs(2);
    let received = loop {
        let received = server.received_requests().await.unwrap_or_default();
        if !received.is_empty() || Instant::now() > deadline {
            break received;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    };
    assert_eq!(received.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["appId"], 51143);
    assert_eq!(body["request"]["service_type"], "live_script");
    assert_eq!(body["request"]["script_type"], "单人推品");
    assert_eq!(body["request"]["markdown_file_name"], FILE);
    assert_eq!(body["request"]["anchor_name"], "小王");
}

#[test]
fn submit_without_runtime_is_rejected() {
    let submitter = ReqwestSubmitter::new(ApiSettings::default());
    let ack = submitter.submit(&request());
    assert!(!ack.success);
    assert!(ack.message.contains("runtime"));
}

#[tokio::test]
async fn submit_timeout_does_not_block_polling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_partial_json(json!({ "request": { "service_type": "live_script" } })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("data:[done]\n", "text/event-stream")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;
    mount_found(&server).await;

    let settings = ApiSettings {
        base_url: server.uri(),
        submit_timeout: Duration::from_millis(100),
        ..ApiSettings::default()
    };
    let submitter = ReqwestSubmitter::new(settings.clone());
    let query = ReqwestArtifactQuery::new(settings);
    let sink = TestSink::default();

    let file = run_generation(&submitter, &query, 7, &request(), quick(3), &sink)
        .await
        .unwrap();

    assert_eq!(file.url, "https://oss.example.com/s.md");
    assert_eq!(
        sink.take(),
        vec![
            EngineEvent::Submitted {
                job_id: 7,
                ack: SubmitAck {
                    success: true,
                    message: "generation request dispatched".to_string(),
                },
            },
            EngineEvent::PollProgress {
                job_id: 7,
                attempt: 1,
                max_attempts: 3,
            },
        ]
    );
}

struct RefusingSubmitter;

impl JobSubmitter for RefusingSubmitter {
    fn submit(&self, _request: &GenerationRequest) -> SubmitAck {
        SubmitAck {
            success: false,
            message: "gateway unreachable".to_string(),
        }
    }
}

#[tokio::test]
async fn rejected_submission_skips_polling() {
    let server = MockServer::start().await;
    mount_found(&server).await;
    let query = ReqwestArtifactQuery::new(ApiSettings {
        base_url: server.uri(),
        ..ApiSettings::default()
    });
    let sink = TestSink::default();

    let err = run_generation(&RefusingSubmitter, &query, 1, &request(), quick(3), &sink)
        .await
        .unwrap_err();

    assert_eq!(err, GenerationError::SubmitRejected("gateway unreachable".into()));
    assert_eq!(server.received_requests().await.unwrap_or_default().len(), 0);
    assert_eq!(sink.take().len(), 1);
}
