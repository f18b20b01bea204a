use chrono::NaiveDateTime;

use crate::{FormDraft, GenerationFailure, JobId, ProductEntry, ProductInfo, ScriptType, SubmitAck};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User switched the visible tab.
    TabSelected(ScriptType),
    /// Replace a tab's whole draft (e.g. loaded from a file).
    DraftChanged {
        script_type: ScriptType,
        draft: FormDraft,
    },
    /// User edited a named form field.
    FieldEdited {
        script_type: ScriptType,
        name: String,
        value: String,
    },
    /// User edited a product row (0-based index).
    ProductEdited {
        script_type: ScriptType,
        index: usize,
        product: ProductEntry,
    },
    ProductAdded(ScriptType),
    ProductRemoved {
        script_type: ScriptType,
        index: usize,
    },
    /// User asked for product details to be filled in from the item id.
    LookupClicked {
        script_type: ScriptType,
        index: usize,
    },
    LookupDone {
        script_type: ScriptType,
        index: usize,
        result: Result<ProductInfo, String>,
    },
    /// User clicked Generate; `requested_at` stamps the artifact name.
    GenerateClicked {
        script_type: ScriptType,
        requested_at: NaiveDateTime,
    },
    /// User clicked Retry on a failed tab.
    RetryClicked {
        script_type: ScriptType,
        requested_at: NaiveDateTime,
    },
    ResetClicked(ScriptType),
    /// Engine acknowledged dispatch of the generation request.
    JobSubmitted { job_id: JobId, ack: SubmitAck },
    /// Engine started poll attempt `attempt` of `max_attempts`.
    PollProgressed {
        job_id: JobId,
        attempt: u32,
        max_attempts: u32,
    },
    /// Engine finished a job; `Ok` carries the download URL.
    JobFinished {
        job_id: JobId,
        result: Result<String, GenerationFailure>,
    },
    /// Render tick.
    Tick,
    NoOp,
}
