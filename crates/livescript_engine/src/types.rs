use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

pub type JobId = u64;
pub type RequestId = u64;

/// Generation request as handed to the engine: the script-type wire label and
/// every request field, the artifact file-name field included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub script_type_label: String,
    pub file_name: String,
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitAck {
    pub success: bool,
    pub message: String,
}

impl SubmitAck {
    pub(crate) fn dispatched() -> Self {
        Self {
            success: true,
            message: "generation request dispatched".to_string(),
        }
    }

    pub(crate) fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Excel,
    Markdown,
}

impl ArtifactKind {
    pub fn for_file_name(file_name: &str) -> Self {
        if file_name.ends_with(".xlsx") {
            ArtifactKind::Excel
        } else {
            ArtifactKind::Markdown
        }
    }
}

/// A generated file located in object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub kind: ArtifactKind,
    pub file_name: String,
    pub url: String,
    pub path: String,
}

/// Answer to a single "does this artifact exist" query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Found(ArtifactFile),
    NotFound,
}

/// Product details returned by the item lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemInfo {
    pub name: Option<String>,
    pub price: Option<String>,
    pub brand_info: Option<String>,
    pub selling_points: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Submitted {
        job_id: JobId,
        ack: SubmitAck,
    },
    PollProgress {
        job_id: JobId,
        attempt: u32,
        max_attempts: u32,
    },
    GenerationFinished {
        job_id: JobId,
        result: Result<ArtifactFile, GenerationError>,
    },
    LookupFinished {
        request_id: RequestId,
        result: Result<ItemInfo, LookupError>,
    },
    DownloadFinished {
        request_id: RequestId,
        result: Result<std::path::PathBuf, String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct QueryError {
    pub kind: FailureKind,
    pub message: String,
}

impl QueryError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Encode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Encode => write!(f, "request encoding failed"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("submission rejected: {0}")]
    SubmitRejected(String),
    #[error("artifact not found after {attempts} attempts")]
    Exhausted { attempts: u32 },
    #[error("artifact query failed: {0}")]
    Query(#[from] QueryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("item lookup failed: {0}")]
    Transport(#[from] QueryError),
    #[error("item not found: {0}")]
    NotFound(String),
    #[error("lookup stream ended without a result")]
    Empty,
}

/// The engine thread is gone; no further commands run and no events arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("engine thread has stopped")]
pub struct EngineStopped;
