use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use livescript_core::{
    Effect, GenerationFailure, GenerationJob, JobId, Msg, ProductInfo, ScriptType, SubmitAck,
};
use livescript_engine::{
    ArtifactFile, EngineEvent, EngineHandle, EngineStopped, GenerationError, GenerationRequest,
    ItemInfo, RequestId,
};
use livescript_logging::{script_error, script_info, script_warn};

use crate::app::Inbound;

/// Where a pending engine request should report back to.
#[derive(Default)]
struct Routes {
    jobs: BTreeSet<JobId>,
    lookups: HashMap<RequestId, (ScriptType, usize)>,
    downloads: HashMap<RequestId, String>,
}

impl Routes {
    /// Failure messages for everything still waiting on the engine.
    fn abandon(&mut self, err: EngineStopped) -> Vec<Inbound> {
        let jobs = std::mem::take(&mut self.jobs).into_iter().map(|job_id| {
            Inbound::Msg(Msg::JobFinished {
                job_id,
                result: Err(GenerationFailure::SubmitRejected(err.to_string())),
            })
        });
        let lookups = self.lookups.drain().map(|(_, (script_type, index))| {
            Inbound::Msg(Msg::LookupDone {
                script_type,
                index,
                result: Err(err.to_string()),
            })
        });
        let downloads = self.downloads.drain().map(|(_, file_name)| Inbound::Downloaded {
            file_name,
            result: Err(err.to_string()),
        });
        jobs.chain(lookups).chain(downloads).collect()
    }
}

/// Turns core effects into engine commands and engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    tx: mpsc::Sender<Inbound>,
    download_dir: Option<PathBuf>,
    routes: Arc<Mutex<Routes>>,
    next_request_id: RequestId,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, download_dir: Option<PathBuf>, tx: mpsc::Sender<Inbound>) -> Self {
        let runner = Self {
            engine,
            tx: tx.clone(),
            download_dir,
            routes: Arc::new(Mutex::new(Routes::default())),
            next_request_id: 1,
        };
        runner.spawn_event_loop(tx);
        runner
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartGeneration(job) => {
                    script_info!(
                        "StartGeneration job_id={} script_type={} file={}",
                        job.job_id,
                        job.script_type,
                        job.file_name
                    );
                    self.track(|routes| {
                        routes.jobs.insert(job.job_id);
                    });
                    let sent = self.engine.generate(job.job_id, generation_request(&job));
                    self.report_if_stopped(sent);
                }
                Effect::LookupProduct {
                    script_type,
                    index,
                    item_id,
                } => {
                    let request_id = self.next_request_id();
                    self.track(|routes| {
                        routes.lookups.insert(request_id, (script_type, index));
                    });
                    let sent = self.engine.lookup(request_id, item_id);
                    self.report_if_stopped(sent);
                }
                Effect::ArtifactReady {
                    script_type,
                    file_name,
                    url,
                } => {
                    let Some(dir) = self.download_dir.clone() else {
                        continue;
                    };
                    script_info!("Downloading {script_type} artifact {file_name} into {dir:?}");
                    let request_id = self.next_request_id();
                    self.track(|routes| {
                        routes.downloads.insert(request_id, file_name.clone());
                    });
                    let sent = self.engine.download(request_id, url, dir, file_name);
                    self.report_if_stopped(sent);
                }
            }
        }
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }

    fn track(&self, record: impl FnOnce(&mut Routes)) {
        if let Ok(mut routes) = self.routes.lock() {
            record(&mut routes);
        }
    }

    /// A refused command fails every tracked request, the refused one included.
    fn report_if_stopped(&self, sent: Result<(), EngineStopped>) {
        let Err(err) = sent else { return };
        script_error!("Engine command refused: {err}");
        let abandoned = match self.routes.lock() {
            Ok(mut routes) => routes.abandon(err),
            Err(_) => return,
        };
        for inbound in abandoned {
            let _ = self.tx.send(inbound);
        }
    }

    fn next_request_id(&mut self) -> RequestId {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    fn spawn_event_loop(&self, tx: mpsc::Sender<Inbound>) {
        let engine = self.engine.clone();
        let routes = self.routes.clone();
        thread::spawn(move || loop {
            let event = match engine.recv_timeout(Duration::from_millis(50)) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(err) => {
                    script_error!("Engine event stream closed: {err}");
                    let abandoned = match routes.lock() {
                        Ok(mut routes) => routes.abandon(err),
                        Err(_) => Vec::new(),
                    };
                    for inbound in abandoned {
                        let _ = tx.send(inbound);
                    }
                    break;
                }
            };
            let Some(inbound) = route_event(event, &routes) else {
                continue;
            };
            if tx.send(inbound).is_err() {
                break;
            }
        });
    }
}

fn route_event(event: EngineEvent, routes: &Mutex<Routes>) -> Option<Inbound> {
    let inbound = match event {
        EngineEvent::Submitted { job_id, ack } => Inbound::Msg(Msg::JobSubmitted {
            job_id,
            ack: SubmitAck {
                success: ack.success,
                message: ack.message,
            },
        }),
        EngineEvent::PollProgress {
            job_id,
            attempt,
            max_attempts,
        } => Inbound::Msg(Msg::PollProgressed {
            job_id,
            attempt,
            max_attempts,
        }),
        EngineEvent::GenerationFinished { job_id, result } => {
            if let Ok(mut routes) = routes.lock() {
                routes.jobs.remove(&job_id);
            }
            if let Err(err) = &result {
                script_warn!("Job {job_id} failed: {err}");
            }
            Inbound::Msg(Msg::JobFinished {
                job_id,
                result: generation_outcome(result),
            })
        }
        EngineEvent::LookupFinished { request_id, result } => {
            let (script_type, index) = routes.lock().ok()?.lookups.remove(&request_id)?;
            Inbound::Msg(Msg::LookupDone {
                script_type,
                index,
                result: result.map(product_info).map_err(|err| err.to_string()),
            })
        }
        EngineEvent::DownloadFinished { request_id, result } => {
            let file_name = routes.lock().ok()?.downloads.remove(&request_id)?;
            Inbound::Downloaded { file_name, result }
        }
    };
    Some(inbound)
}

pub(crate) fn generation_request(job: &GenerationJob) -> GenerationRequest {
    GenerationRequest {
        script_type_label: job.script_type.wire_label().to_string(),
        file_name: job.file_name.clone(),
        fields: job.request_fields(),
    }
}

pub(crate) fn generation_outcome(
    result: Result<ArtifactFile, GenerationError>,
) -> Result<String, GenerationFailure> {
    match result {
        Ok(file) => Ok(file.url),
        Err(GenerationError::SubmitRejected(message)) => {
            Err(GenerationFailure::SubmitRejected(message))
        }
        Err(GenerationError::Exhausted { attempts }) => {
            Err(GenerationFailure::Exhausted { attempts })
        }
        Err(GenerationError::Query(err)) => Err(GenerationFailure::Query(err.to_string())),
    }
}

pub(crate) fn product_info(info: ItemInfo) -> ProductInfo {
    ProductInfo {
        product_name: info.name,
        product_price: info.price,
        brand_info: info.brand_info,
        sellpoint: info.selling_points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livescript_engine::{ArtifactKind, FailureKind, QueryError};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    #[test]
    fn job_becomes_request_with_file_name_field() {
        let mut fields = BTreeMap::new();
        fields.insert("retail_price".to_string(), "99".to_string());
        let job = GenerationJob {
            job_id: 1,
            script_type: ScriptType::SellingPoint,
            fields,
            file_name: "AI生成_梨_20250718_104524.md".to_string(),
        };

        let request = generation_request(&job);
        assert_eq!(request.script_type_label, "商品卖点");
        assert_eq!(request.fields["markdown_file_name"], job.file_name);
        assert_eq!(request.fields["retail_price"], "99");
    }

    #[test]
    fn engine_results_map_to_core_failures() {
        let found = ArtifactFile {
            kind: ArtifactKind::Excel,
            file_name: "a.xlsx".into(),
            url: "https://oss.example.com/a.xlsx".into(),
            path: String::new(),
        };
        assert_eq!(
            generation_outcome(Ok(found)),
            Ok("https://oss.example.com/a.xlsx".to_string())
        );
        assert_eq!(
            generation_outcome(Err(GenerationError::Exhausted { attempts: 20 })),
            Err(GenerationFailure::Exhausted { attempts: 20 })
        );
        let query = QueryError {
            kind: FailureKind::HttpStatus(500),
            message: "500 Internal Server Error".into(),
        };
        assert!(matches!(
            generation_outcome(Err(GenerationError::Query(query))),
            Err(GenerationFailure::Query(message)) if message.contains("500")
        ));
    }

    #[test]
    fn unknown_lookup_answers_are_dropped() {
        let routes = Mutex::new(Routes::default());
        routes.lock().unwrap().lookups.insert(4, (ScriptType::GuestInteraction, 1));

        let stray = EngineEvent::LookupFinished {
            request_id: 9,
            result: Ok(ItemInfo::default()),
        };
        assert!(route_event(stray, &routes).is_none());

        let known = EngineEvent::LookupFinished {
            request_id: 4,
            result: Ok(ItemInfo {
                name: Some("梨".into()),
                ..ItemInfo::default()
            }),
        };
        match route_event(known, &routes) {
            Some(Inbound::Msg(Msg::LookupDone {
                script_type,
                index,
                result,
            })) => {
                assert_eq!(script_type, ScriptType::GuestInteraction);
                assert_eq!(index, 1);
                assert_eq!(result.unwrap().product_name.as_deref(), Some("梨"));
            }
            _ => panic!("expected lookup message"),
        }
    }
}
