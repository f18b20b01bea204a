//! Livescript engine: gateway IO, artifact polling and effect execution.
mod config;
mod download;
mod engine;
mod http;
mod lookup;
mod persist;
mod poll;
mod query;
mod stream;
mod submit;
mod types;
mod wire;
mod workflow;

pub use config::ApiSettings;
pub use download::{ArtifactDownloader, DownloadError, DownloadSettings};
pub use engine::{EngineConfig, EngineHandle};
pub use lookup::{interpret_lookup_events, ProductLookup, ReqwestProductLookup};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use poll::{poll_artifact, PollOutcome, PollPolicy};
pub use query::{interpret_artifact_events, ArtifactQuery, ReqwestArtifactQuery};
pub use stream::{parse_stream, StreamEvent, StreamParser};
pub use submit::{JobSubmitter, ReqwestSubmitter};
pub use types::{
    ArtifactFile, ArtifactKind, EngineEvent, EngineStopped, FailureKind, GenerationError, GenerationRequest,
    ItemInfo, JobId, LookupError, QueryError, QueryOutcome, RequestId, SubmitAck,
};
pub use workflow::{run_generation, ChannelProgressSink, ProgressSink};
