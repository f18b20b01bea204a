use std::collections::{BTreeMap, BTreeSet};

use crate::tabs::{TabPatch, TabStates, DEFAULT_POLL_MAX_ATTEMPTS};
use crate::view_model::{AppViewModel, TabView};
use crate::{validation, FormDraft, JobId, ScriptType, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    active_tab: ScriptType,
    drafts: BTreeMap<ScriptType, FormDraft>,
    tabs: TabStates,
    validation_errors: BTreeMap<ScriptType, ValidationError>,
    current_jobs: BTreeMap<ScriptType, JobId>,
    pending_lookups: BTreeSet<(ScriptType, usize)>,
    last_notice: Option<String>,
    next_job_id: JobId,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_poll_max(DEFAULT_POLL_MAX_ATTEMPTS)
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State whose tabs report `max_attempts` as the poll budget until the
    /// engine says otherwise.
    pub fn with_poll_max(max_attempts: u32) -> Self {
        Self {
            active_tab: ScriptType::SingleProduct,
            drafts: BTreeMap::new(),
            tabs: TabStates::new(max_attempts),
            validation_errors: BTreeMap::new(),
            current_jobs: BTreeMap::new(),
            pending_lookups: BTreeSet::new(),
            last_notice: None,
            next_job_id: 1,
            dirty: false,
        }
    }

    pub fn active_tab(&self) -> ScriptType {
        self.active_tab
    }

    pub fn tabs(&self) -> &TabStates {
        &self.tabs
    }

    /// Current draft for a tab; an untouched tab has the default draft.
    pub fn draft(&self, script_type: ScriptType) -> FormDraft {
        self.drafts.get(&script_type).cloned().unwrap_or_default()
    }

    pub fn view(&self) -> AppViewModel {
        let tabs = ScriptType::ALL
            .into_iter()
            .map(|script_type| {
                let draft = self.draft(script_type);
                TabView::new(
                    script_type,
                    self.tabs.get(script_type),
                    validation::is_valid(script_type, &draft),
                    self.validation_errors
                        .get(&script_type)
                        .map(ToString::to_string),
                    draft.products.len(),
                    self.has_pending_lookup(script_type),
                )
            })
            .collect();
        AppViewModel {
            active_tab: self.active_tab,
            tabs,
            notice: self.last_notice.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn select_tab(&mut self, script_type: ScriptType) {
        if self.active_tab != script_type {
            self.active_tab = script_type;
            self.mark_dirty();
        }
    }

    /// Apply `edit` to a tab's draft, storing it only if it actually changed.
    pub(crate) fn edit_draft(
        &mut self,
        script_type: ScriptType,
        edit: impl FnOnce(&mut FormDraft),
    ) -> bool {
        let current = self.draft(script_type);
        let mut next = current.clone();
        edit(&mut next);
        if next == current {
            return false;
        }
        self.drafts.insert(script_type, next);
        // Editing the form dismisses a stale validation message.
        self.validation_errors.remove(&script_type);
        self.mark_dirty();
        true
    }

    pub(crate) fn patch_tab(&mut self, script_type: ScriptType, patch: TabPatch) {
        if self.tabs.update(script_type, patch) {
            self.mark_dirty();
        }
    }

    pub(crate) fn reset_tab(&mut self, script_type: ScriptType) {
        self.current_jobs.remove(&script_type);
        self.validation_errors.remove(&script_type);
        if self.tabs.reset(script_type) {
            self.mark_dirty();
        }
    }

    pub(crate) fn set_validation_error(&mut self, script_type: ScriptType, error: ValidationError) {
        if self.validation_errors.get(&script_type) != Some(&error) {
            self.validation_errors.insert(script_type, error);
            self.mark_dirty();
        }
    }

    pub(crate) fn clear_validation_error(&mut self, script_type: ScriptType) {
        if self.validation_errors.remove(&script_type).is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn begin_job(&mut self, script_type: ScriptType) -> JobId {
        let job_id = self.next_job_id;
        self.next_job_id += 1;
        self.current_jobs.insert(script_type, job_id);
        job_id
    }

    /// Script type whose current job is `job_id`, if the job is still current.
    pub(crate) fn tab_for_job(&self, job_id: JobId) -> Option<ScriptType> {
        self.current_jobs
            .iter()
            .find_map(|(script_type, current)| (*current == job_id).then_some(*script_type))
    }

    pub(crate) fn end_job(&mut self, script_type: ScriptType) {
        self.current_jobs.remove(&script_type);
    }

    pub(crate) fn begin_lookup(&mut self, script_type: ScriptType, index: usize) -> bool {
        let inserted = self.pending_lookups.insert((script_type, index));
        if inserted {
            self.mark_dirty();
        }
        inserted
    }

    pub(crate) fn has_pending_lookup(&self, script_type: ScriptType) -> bool {
        self.pending_lookups
            .iter()
            .any(|(pending, _)| *pending == script_type)
    }

    pub(crate) fn end_lookup(&mut self, script_type: ScriptType, index: usize) -> bool {
        let removed = self.pending_lookups.remove(&(script_type, index));
        if removed {
            self.mark_dirty();
        }
        removed
    }

    pub(crate) fn set_notice(&mut self, notice: Option<String>) {
        if self.last_notice != notice {
            self.last_notice = notice;
            self.mark_dirty();
        }
    }
}
