use livescript_logging::{script_debug, script_warn};
use serde::Deserialize;

use crate::http::{build_client, post_envelope, read_events};
use crate::stream::StreamEvent;
use crate::wire::OssQueryRequest;
use crate::{ApiSettings, ArtifactFile, ArtifactKind, QueryError, QueryOutcome};

const COMPLETE_EVENT: &str = "complete";

/// "Does an artifact with this name exist in storage yet?"
#[async_trait::async_trait]
pub trait ArtifactQuery: Send + Sync {
    async fn query(&self, file_name: &str) -> Result<QueryOutcome, QueryError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestArtifactQuery {
    settings: ApiSettings,
}

impl ReqwestArtifactQuery {
    pub fn new(settings: ApiSettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl ArtifactQuery for ReqwestArtifactQuery {
    async fn query(&self, file_name: &str) -> Result<QueryOutcome, QueryError> {
        let client = build_client(self.settings.connect_timeout, self.settings.query_timeout)?;
        let response = post_envelope(&client, &self.settings, OssQueryRequest::new(file_name)).await?;
        let events = read_events(response).await?;
        Ok(interpret_artifact_events(&events, file_name))
    }
}

/// Gateway result wrapper shared by the storage and item services.
#[derive(Debug, Deserialize)]
pub(crate) struct ServiceReply<T> {
    #[serde(default)]
    pub(crate) success: bool,
    pub(crate) data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct StorageReply {
    #[serde(default)]
    status: String,
    download_url: Option<String>,
    file_name: Option<String>,
    file_path: Option<String>,
    message: Option<String>,
    progress: Option<serde_json::Value>,
}

/// Fold a storage-query stream into a single outcome.
///
/// A found artifact is final; `not_found` and a bare done marker both mean
/// "not there yet", as does a stream that ends without any verdict.
pub fn interpret_artifact_events(events: &[StreamEvent], file_name: &str) -> QueryOutcome {
    let mut found: Option<ArtifactFile> = None;
    for event in events {
        let payload = match event {
            StreamEvent::Done { .. } => break,
            // The closing event only ever carries the done marker.
            StreamEvent::Data { event: Some(name), payload } if name == COMPLETE_EVENT => {
                script_debug!("ignoring {payload:?} under {COMPLETE_EVENT} for {file_name}");
                continue;
            }
            StreamEvent::Data { payload, .. } => payload,
        };
        let reply: ServiceReply<StorageReply> = match serde_json::from_str(payload) {
            Ok(reply) => reply,
            Err(err) => {
                script_warn!("Skipping malformed storage payload {payload:?}: {err}");
                continue;
            }
        };
        if !reply.success {
            continue;
        }
        let Some(data) = reply.data else {
            continue;
        };
        match data.status.as_str() {
            "success" => {
                if let Some(url) = data.download_url.filter(|url| !url.trim().is_empty()) {
                    found = Some(ArtifactFile {
                        kind: ArtifactKind::for_file_name(file_name),
                        file_name: data.file_name.unwrap_or_else(|| file_name.to_string()),
                        url,
                        path: data.file_path.unwrap_or_default(),
                    });
                    break;
                }
            }
            "not_found" => {
                script_debug!(
                    "{file_name} not in storage yet: {}",
                    data.message.unwrap_or_default()
                );
            }
            "progress" => {
                script_debug!("storage search for {file_name} in progress: {:?}", data.progress);
            }
            other => script_debug!("ignoring storage status {other:?} for {file_name}"),
        }
    }
    match found {
        Some(file) => QueryOutcome::Found(file),
        None => QueryOutcome::NotFound,
    }
}
