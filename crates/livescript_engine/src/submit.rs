use livescript_logging::{script_debug, script_info, script_warn};

use crate::http::{build_client, post_envelope, read_events};
use crate::stream::StreamEvent;
use crate::wire::live_script_request;
use crate::{ApiSettings, GenerationRequest, SubmitAck};

/// Fire-and-forget dispatch of a generation request.
///
/// Implementations return as soon as the request is on its way; the remote
/// outcome never reaches the caller.
pub trait JobSubmitter: Send + Sync {
    fn submit(&self, request: &GenerationRequest) -> SubmitAck;
}

#[derive(Debug, Clone)]
pub struct ReqwestSubmitter {
    settings: ApiSettings,
}

impl ReqwestSubmitter {
    pub fn new(settings: ApiSettings) -> Self {
        Self { settings }
    }
}

impl JobSubmitter for ReqwestSubmitter {
    /// Spawns the request on the current tokio runtime. The ack is negative
    /// only when nothing could be dispatched.
    fn submit(&self, request: &GenerationRequest) -> SubmitAck {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(err) => return SubmitAck::rejected(format!("no async runtime: {err}")),
        };
        let client = match build_client(self.settings.connect_timeout, self.settings.submit_timeout) {
            Ok(client) => client,
            Err(err) => return SubmitAck::rejected(err.to_string()),
        };

        let settings = self.settings.clone();
        let file_name = request.file_name.clone();
        let body = live_script_request(&request.script_type_label, &request.fields);
        script_info!("Submitting generation for {file_name}");

        runtime.spawn(async move {
            let outcome = match post_envelope(&client, &settings, body).await {
                Ok(response) => read_events(response).await,
                Err(err) => Err(err),
            };
            match outcome {
                Ok(events) => {
                    for event in &events {
                        if let StreamEvent::Data { payload, .. } = event {
                            script_debug!("generation stream for {file_name}: {payload}");
                        }
                    }
                    script_info!("Generation stream for {file_name} closed after {} events", events.len());
                }
                Err(err) => {
                    script_warn!("Generation request for {file_name} ended with error (polling continues): {err}");
                }
            }
        });

        SubmitAck::dispatched()
    }
}
