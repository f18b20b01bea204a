use std::collections::BTreeMap;
use std::fmt;

use crate::ScriptType;

pub type JobId = u64;

/// Everything the engine needs to submit one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationJob {
    pub job_id: JobId,
    pub script_type: ScriptType,
    pub fields: BTreeMap<String, String>,
    pub file_name: String,
}

impl GenerationJob {
    /// Form fields plus the script-type specific file-name field.
    pub fn request_fields(&self) -> BTreeMap<String, String> {
        let mut fields = self.fields.clone();
        fields.insert(
            self.script_type.file_name_field().to_string(),
            self.file_name.clone(),
        );
        fields
    }
}

/// Local acknowledgement from the job submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitAck {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    SubmitRejected(String),
    Exhausted { attempts: u32 },
    Query(String),
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationFailure::SubmitRejected(message) => {
                write!(f, "submission rejected: {message}")
            }
            GenerationFailure::Exhausted { attempts } => {
                write!(f, "artifact not found after {attempts} attempts")
            }
            GenerationFailure::Query(message) => write!(f, "artifact query failed: {message}"),
        }
    }
}
