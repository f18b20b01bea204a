use std::sync::mpsc;

use livescript_logging::{script_info, script_warn};

use crate::poll::{poll_artifact, PollOutcome, PollPolicy};
use crate::query::ArtifactQuery;
use crate::submit::JobSubmitter;
use crate::{ArtifactFile, EngineEvent, GenerationError, GenerationRequest, JobId};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Submit one generation request, then poll storage for its artifact.
///
/// The submission is fire-and-forget: only a failure to dispatch stops the
/// flow. Everything after that is decided by the poller.
pub async fn run_generation(
    submitter: &dyn JobSubmitter,
    query: &dyn ArtifactQuery,
    job_id: JobId,
    request: &GenerationRequest,
    policy: PollPolicy,
    sink: &dyn ProgressSink,
) -> Result<ArtifactFile, GenerationError> {
    let ack = submitter.submit(request);
    sink.emit(EngineEvent::Submitted {
        job_id,
        ack: ack.clone(),
    });
    if !ack.success {
        script_warn!("Job {job_id}: submission not dispatched: {}", ack.message);
        return Err(GenerationError::SubmitRejected(ack.message));
    }

    let outcome = poll_artifact(query, &request.file_name, policy, |attempt, max_attempts| {
        sink.emit(EngineEvent::PollProgress {
            job_id,
            attempt,
            max_attempts,
        });
    })
    .await?;

    match outcome {
        PollOutcome::Found(file) => {
            script_info!("Job {job_id}: artifact ready at {}", file.url);
            Ok(file)
        }
        PollOutcome::Exhausted { attempts } => Err(GenerationError::Exhausted { attempts }),
    }
}
