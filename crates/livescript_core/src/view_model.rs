use crate::{GenerationStatus, PollProgress, ScriptType, TabGenerationState};

/// Shown while a tab is generating.
pub const ESTIMATED_DURATION: &str = "3-5 minutes";
/// How long the storage service keeps a download link valid.
pub const LINK_VALIDITY: &str = "24 hours";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub active_tab: ScriptType,
    /// One row per script type, in `ScriptType::ALL` order.
    pub tabs: Vec<TabView>,
    pub notice: Option<String>,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn tab(&self, script_type: ScriptType) -> &TabView {
        self.tabs
            .iter()
            .find(|tab| tab.script_type == script_type)
            .unwrap_or(&self.tabs[0])
    }

    pub fn active(&self) -> &TabView {
        self.tab(self.active_tab)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabView {
    pub script_type: ScriptType,
    pub status: GenerationStatus,
    pub is_generating: bool,
    pub file_name: String,
    pub file_url: String,
    pub poll_progress: PollProgress,
    pub form_valid: bool,
    pub validation_message: Option<String>,
    pub product_count: usize,
    pub lookup_pending: bool,
}

impl TabView {
    pub(crate) fn new(
        script_type: ScriptType,
        state: TabGenerationState,
        form_valid: bool,
        validation_message: Option<String>,
        product_count: usize,
        lookup_pending: bool,
    ) -> Self {
        Self {
            script_type,
            status: state.status,
            is_generating: state.is_generating,
            file_name: state.file_name,
            file_url: state.file_url,
            poll_progress: state.poll_progress,
            form_valid,
            validation_message,
            product_count,
            lookup_pending,
        }
    }

    /// User-facing status line, `None` while idle.
    pub fn status_line(&self) -> Option<String> {
        if self.is_generating && self.status != GenerationStatus::Generating {
            return Some(format!("submitting {}", self.file_name));
        }
        match self.status {
            GenerationStatus::Idle => None,
            GenerationStatus::Generating => Some(format!(
                "generating {} (usually {ESTIMATED_DURATION}), check {}/{}",
                self.file_name, self.poll_progress.attempt, self.poll_progress.max_attempts
            )),
            GenerationStatus::Completed => Some(format!(
                "completed {}: {} (link valid for {LINK_VALIDITY})",
                self.file_name, self.file_url
            )),
            GenerationStatus::Failed => Some(format!(
                "failed to generate {}; retry to submit again",
                self.file_name
            )),
        }
    }
}
