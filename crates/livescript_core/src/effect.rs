use crate::{GenerationJob, ScriptType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartGeneration(GenerationJob),
    LookupProduct {
        script_type: ScriptType,
        index: usize,
        item_id: String,
    },
    /// A tab's artifact is available for download.
    ArtifactReady {
        script_type: ScriptType,
        file_name: String,
        url: String,
    },
}
