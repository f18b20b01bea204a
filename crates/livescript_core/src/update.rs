use chrono::NaiveDateTime;
use livescript_logging::{script_debug, script_info, script_warn};

use crate::tabs::{PollProgress, TabPatch};
use crate::{
    filename, validation, AppState, Effect, GenerationFailure, GenerationJob, GenerationStatus,
    Msg, ProductEntry, ScriptType,
};

const LOOKUP_IN_FLIGHT: &str = "wait for the product lookup to finish before changing rows";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::TabSelected(script_type) => {
            state.select_tab(script_type);
            Vec::new()
        }
        Msg::DraftChanged { script_type, draft } => {
            if state.has_pending_lookup(script_type) {
                script_debug!("Draft replacement for {script_type} ignored: lookup in flight");
                state.set_notice(Some(LOOKUP_IN_FLIGHT.to_string()));
                return (state, Vec::new());
            }
            state.edit_draft(script_type, |current| *current = draft);
            Vec::new()
        }
        Msg::FieldEdited {
            script_type,
            name,
            value,
        } => {
            state.edit_draft(script_type, |draft| draft.set_field(name, value));
            Vec::new()
        }
        Msg::ProductEdited {
            script_type,
            index,
            product,
        } => {
            state.edit_draft(script_type, |draft| {
                if let Some(slot) = draft.products.get_mut(index) {
                    *slot = product;
                }
            });
            Vec::new()
        }
        Msg::ProductAdded(script_type) => {
            state.edit_draft(script_type, |draft| {
                draft.products.push(ProductEntry::default())
            });
            Vec::new()
        }
        Msg::ProductRemoved { script_type, index } => {
            // Pending lookups are keyed by row position.
            if state.has_pending_lookup(script_type) {
                script_debug!("Remove of {script_type} product {index} ignored: lookup in flight");
                state.set_notice(Some(LOOKUP_IN_FLIGHT.to_string()));
                return (state, Vec::new());
            }
            // The product list never drops below one row.
            state.edit_draft(script_type, |draft| {
                if draft.products.len() > 1 && index < draft.products.len() {
                    draft.products.remove(index);
                }
            });
            Vec::new()
        }
        Msg::LookupClicked { script_type, index } => request_lookup(&mut state, script_type, index),
        Msg::LookupDone {
            script_type,
            index,
            result,
        } => {
            if !state.end_lookup(script_type, index) {
                script_debug!("Ignoring lookup result for {script_type} product {index}: not pending");
                return (state, Vec::new());
            }
            match result {
                Ok(info) => {
                    state.edit_draft(script_type, |draft| {
                        if let Some(product) = draft.products.get_mut(index) {
                            product.apply_product_info(&info);
                        }
                    });
                    state.set_notice(None);
                }
                Err(message) => {
                    script_warn!("Product lookup for {script_type} product {index} failed: {message}");
                    state.set_notice(Some(format!("product lookup failed: {message}")));
                }
            }
            Vec::new()
        }
        Msg::GenerateClicked {
            script_type,
            requested_at,
        }
        | Msg::RetryClicked {
            script_type,
            requested_at,
        } => start_generation(&mut state, script_type, requested_at),
        Msg::ResetClicked(script_type) => {
            if state.tabs().get(script_type).is_generating {
                script_debug!("Reset ignored for {script_type}: generation in flight");
            } else {
                state.reset_tab(script_type);
            }
            Vec::new()
        }
        Msg::JobSubmitted { job_id, ack } => {
            let Some(script_type) = state.tab_for_job(job_id) else {
                script_debug!("Dropping submit ack for stale job {job_id}");
                return (state, Vec::new());
            };
            if ack.success {
                let max_attempts = state.tabs().poll_max_attempts();
                state.patch_tab(
                    script_type,
                    TabPatch {
                        status: Some(GenerationStatus::Generating),
                        poll_progress: Some(PollProgress::fresh(max_attempts)),
                        ..TabPatch::default()
                    },
                );
            } else {
                script_warn!("Job {job_id} for {script_type} was not dispatched: {}", ack.message);
                fail_job(&mut state, script_type);
            }
            Vec::new()
        }
        Msg::PollProgressed {
            job_id,
            attempt,
            max_attempts,
        } => {
            if let Some(script_type) = state.tab_for_job(job_id) {
                state.patch_tab(
                    script_type,
                    TabPatch {
                        poll_progress: Some(PollProgress {
                            attempt,
                            max_attempts,
                        }),
                        ..TabPatch::default()
                    },
                );
            }
            Vec::new()
        }
        Msg::JobFinished { job_id, result } => finish_job(&mut state, job_id, result),
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn request_lookup(state: &mut AppState, script_type: ScriptType, index: usize) -> Vec<Effect> {
    if state.tabs().get(script_type).is_generating {
        script_debug!("Lookup ignored for {script_type}: generation in flight");
        return Vec::new();
    }
    let draft = state.draft(script_type);
    let Some(product) = draft.products.get(index) else {
        return Vec::new();
    };
    let item_id = product.product_id.trim().to_string();
    if item_id.is_empty() {
        state.set_notice(Some("enter a product id before looking it up".to_string()));
        return Vec::new();
    }
    if !state.begin_lookup(script_type, index) {
        return Vec::new();
    }
    vec![Effect::LookupProduct {
        script_type,
        index,
        item_id,
    }]
}

fn start_generation(
    state: &mut AppState,
    script_type: ScriptType,
    requested_at: NaiveDateTime,
) -> Vec<Effect> {
    if state.tabs().get(script_type).is_generating {
        script_debug!("Generate ignored for {script_type}: already generating");
        return Vec::new();
    }

    let draft = state.draft(script_type);
    if let Err(err) = validation::validate(script_type, &draft) {
        script_warn!("Generate rejected for {script_type}: {err}");
        state.set_validation_error(script_type, err);
        return Vec::new();
    }
    state.clear_validation_error(script_type);

    let file_name =
        filename::target_file_name(&draft.joined_product_names(), script_type, requested_at);
    let job_id = state.begin_job(script_type);
    script_info!("Job {job_id} for {script_type} targets {file_name}");

    state.patch_tab(
        script_type,
        TabPatch {
            is_generating: Some(true),
            file_name: Some(file_name.clone()),
            ..TabPatch::default()
        },
    );

    vec![Effect::StartGeneration(GenerationJob {
        job_id,
        script_type,
        fields: draft.flatten(),
        file_name,
    })]
}

fn finish_job(
    state: &mut AppState,
    job_id: crate::JobId,
    result: Result<String, GenerationFailure>,
) -> Vec<Effect> {
    let Some(script_type) = state.tab_for_job(job_id) else {
        script_debug!("Dropping result for stale job {job_id}");
        return Vec::new();
    };
    state.end_job(script_type);

    match result {
        Ok(url) if !url.trim().is_empty() => {
            script_info!("Job {job_id} for {script_type} completed: {url}");
            state.patch_tab(
                script_type,
                TabPatch {
                    is_generating: Some(false),
                    status: Some(GenerationStatus::Completed),
                    file_url: Some(url.clone()),
                    ..TabPatch::default()
                },
            );
            vec![Effect::ArtifactReady {
                script_type,
                file_name: state.tabs().get(script_type).file_name,
                url,
            }]
        }
        Ok(_) => {
            script_warn!("Job {job_id} for {script_type} reported an artifact without a URL");
            fail_job(state, script_type);
            Vec::new()
        }
        Err(failure) => {
            script_warn!("Job {job_id} for {script_type} failed: {failure}");
            fail_job(state, script_type);
            Vec::new()
        }
    }
}

fn fail_job(state: &mut AppState, script_type: ScriptType) {
    state.end_job(script_type);
    state.patch_tab(
        script_type,
        TabPatch {
            is_generating: Some(false),
            status: Some(GenerationStatus::Failed),
            ..TabPatch::default()
        },
    );
}
