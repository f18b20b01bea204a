//! Livescript core: pure wizard state machine, form policy and view-model helpers.
mod effect;
mod filename;
mod form;
mod job;
mod msg;
mod script_type;
mod state;
mod tabs;
mod update;
mod validation;
mod view_model;

pub use effect::Effect;
pub use filename::{sanitize_product_prefix, target_file_name, FILE_NAME_PREFIX, MAX_PRODUCT_PREFIX_CHARS};
pub use form::{
    FormDraft, ProductEntry, ProductInfo, ANCHOR_NAME, GUESTS, LIVE_TIME, RETAIL_PRICE,
    UNKNOWN_PRODUCT,
};
pub use job::{GenerationFailure, GenerationJob, JobId, SubmitAck};
pub use msg::Msg;
pub use script_type::{ScriptType, UnknownScriptType};
pub use state::AppState;
pub use tabs::{
    GenerationStatus, PollProgress, TabGenerationState, TabPatch, TabStates,
    DEFAULT_POLL_MAX_ATTEMPTS,
};
pub use update::update;
pub use validation::{is_valid, required_fields, validate, ValidationError};
pub use view_model::{AppViewModel, TabView, ESTIMATED_DURATION, LINK_VALIDITY};
