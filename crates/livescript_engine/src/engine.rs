use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use livescript_logging::{script_error, script_info};

use crate::download::ArtifactDownloader;
use crate::lookup::{ProductLookup, ReqwestProductLookup};
use crate::poll::PollPolicy;
use crate::query::{ArtifactQuery, ReqwestArtifactQuery};
use crate::submit::{JobSubmitter, ReqwestSubmitter};
use crate::workflow::{run_generation, ChannelProgressSink, ProgressSink};
use crate::{
    ApiSettings, DownloadSettings, EngineEvent, EngineStopped, GenerationRequest, JobId, RequestId,
};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api: ApiSettings,
    pub poll: PollPolicy,
    pub download: DownloadSettings,
}

impl EngineConfig {
    pub fn new(api: ApiSettings, poll: PollPolicy) -> Self {
        Self {
            api,
            poll,
            download: DownloadSettings::default(),
        }
    }
}

enum EngineCommand {
    Generate {
        job_id: JobId,
        request: GenerationRequest,
    },
    Lookup {
        request_id: RequestId,
        item_id: String,
    },
    Download {
        request_id: RequestId,
        url: String,
        dir: PathBuf,
        file_name: String,
    },
    Shutdown,
}

struct Services {
    submitter: Box<dyn JobSubmitter>,
    query: Box<dyn ArtifactQuery>,
    lookup: Box<dyn ProductLookup>,
    downloader: ArtifactDownloader,
    poll: PollPolicy,
}

/// Owns the IO runtime on a background thread; commands go in, events come out.
///
/// Each generation runs as its own task, so flows for different tabs proceed
/// independently and are never cancelled.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Self {
        let services = Services {
            submitter: Box::new(ReqwestSubmitter::new(config.api.clone())),
            query: Box::new(ReqwestArtifactQuery::new(config.api.clone())),
            lookup: Box::new(ReqwestProductLookup::new(config.api)),
            downloader: ArtifactDownloader::new(config.download),
            poll: config.poll,
        };
        Self::with_services(services)
    }

    /// Engine backed by caller-supplied submitter and query implementations.
    pub fn with_backends(
        submitter: Box<dyn JobSubmitter>,
        query: Box<dyn ArtifactQuery>,
        lookup: Box<dyn ProductLookup>,
        poll: PollPolicy,
    ) -> Self {
        Self::with_services(Services {
            submitter,
            query,
            lookup,
            downloader: ArtifactDownloader::default(),
            poll,
        })
    }

    fn with_services(services: Services) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let services = Arc::new(services);

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    script_error!("Failed to start engine runtime: {err}");
                    return;
                }
            };
            while let Ok(command) = cmd_rx.recv() {
                if matches!(command, EngineCommand::Shutdown) {
                    script_info!("Engine shutting down");
                    break;
                }
                let services = services.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(services.as_ref(), command, event_tx).await;
                });
            }
        });

        Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        }
    }

    pub fn generate(&self, job_id: JobId, request: GenerationRequest) -> Result<(), EngineStopped> {
        self.send(EngineCommand::Generate { job_id, request })
    }

    pub fn lookup(&self, request_id: RequestId, item_id: impl Into<String>) -> Result<(), EngineStopped> {
        self.send(EngineCommand::Lookup {
            request_id,
            item_id: item_id.into(),
        })
    }

    pub fn download(
        &self,
        request_id: RequestId,
        url: impl Into<String>,
        dir: PathBuf,
        file_name: impl Into<String>,
    ) -> Result<(), EngineStopped> {
        self.send(EngineCommand::Download {
            request_id,
            url: url.into(),
            dir,
            file_name: file_name.into(),
        })
    }

    /// Stop accepting commands; in-flight work is dropped with the runtime.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
    }

    /// Wait up to `timeout` for the next event. `Ok(None)` means nothing
    /// arrived in time.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineStopped> {
        let receiver = self.event_rx.lock().map_err(|_| EngineStopped)?;
        match receiver.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineStopped),
        }
    }

    fn send(&self, command: EngineCommand) -> Result<(), EngineStopped> {
        self.cmd_tx.send(command).map_err(|_| EngineStopped)
    }
}

async fn handle_command(
    services: &Services,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    match command {
        EngineCommand::Generate { job_id, request } => {
            let sink = ChannelProgressSink::new(event_tx);
            let result = run_generation(
                services.submitter.as_ref(),
                services.query.as_ref(),
                job_id,
                &request,
                services.poll,
                &sink,
            )
            .await;
            sink.emit(EngineEvent::GenerationFinished { job_id, result });
        }
        EngineCommand::Lookup {
            request_id,
            item_id,
        } => {
            let result = services.lookup.lookup(&item_id).await;
            let _ = event_tx.send(EngineEvent::LookupFinished { request_id, result });
        }
        EngineCommand::Download {
            request_id,
            url,
            dir,
            file_name,
        } => {
            let result = services
                .downloader
                .download(&url, &dir, &file_name)
                .await
                .map_err(|err| err.to_string());
            let _ = event_tx.send(EngineEvent::DownloadFinished { request_id, result });
        }
        EngineCommand::Shutdown => {}
    }
}
