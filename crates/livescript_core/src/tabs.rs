use std::collections::BTreeMap;
use std::fmt;

use crate::ScriptType;

/// Attempt budget shown for a tab before its first poll report.
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationStatus {
    #[default]
    Idle,
    Generating,
    Completed,
    Failed,
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GenerationStatus::Idle => "idle",
            GenerationStatus::Generating => "generating",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollProgress {
    pub attempt: u32,
    pub max_attempts: u32,
}

impl PollProgress {
    pub fn fresh(max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            max_attempts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabGenerationState {
    pub is_generating: bool,
    pub status: GenerationStatus,
    pub file_name: String,
    pub file_url: String,
    pub poll_progress: PollProgress,
}

impl TabGenerationState {
    pub fn with_poll_max(max_attempts: u32) -> Self {
        Self {
            is_generating: false,
            status: GenerationStatus::Idle,
            file_name: String::new(),
            file_url: String::new(),
            poll_progress: PollProgress::fresh(max_attempts),
        }
    }
}

impl Default for TabGenerationState {
    fn default() -> Self {
        Self::with_poll_max(DEFAULT_POLL_MAX_ATTEMPTS)
    }
}

/// Partial update for one tab; `None` fields keep their current value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TabPatch {
    pub is_generating: Option<bool>,
    pub status: Option<GenerationStatus>,
    pub file_name: Option<String>,
    pub file_url: Option<String>,
    pub poll_progress: Option<PollProgress>,
}

impl TabPatch {
    fn apply_to(self, state: &mut TabGenerationState) {
        if let Some(is_generating) = self.is_generating {
            state.is_generating = is_generating;
        }
        if let Some(status) = self.status {
            state.status = status;
        }
        if let Some(file_name) = self.file_name {
            state.file_name = file_name;
        }
        if let Some(file_url) = self.file_url {
            state.file_url = file_url;
        }
        if let Some(poll_progress) = self.poll_progress {
            state.poll_progress = poll_progress;
        }
        // A download URL only exists for a completed artifact.
        if state.status != GenerationStatus::Completed {
            state.file_url.clear();
        }
    }
}

/// Generation state keyed by script type.
///
/// Entries are created lazily by the first update of a key and are only ever
/// overwritten afterwards, never removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabStates {
    states: BTreeMap<ScriptType, TabGenerationState>,
    poll_max_attempts: u32,
}

impl Default for TabStates {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_MAX_ATTEMPTS)
    }
}

impl TabStates {
    pub fn new(poll_max_attempts: u32) -> Self {
        Self {
            states: BTreeMap::new(),
            poll_max_attempts,
        }
    }

    pub fn poll_max_attempts(&self) -> u32 {
        self.poll_max_attempts
    }

    pub fn default_state(&self) -> TabGenerationState {
        TabGenerationState::with_poll_max(self.poll_max_attempts)
    }

    pub fn get(&self, script_type: ScriptType) -> TabGenerationState {
        self.states
            .get(&script_type)
            .cloned()
            .unwrap_or_else(|| self.default_state())
    }

    /// Merge `patch` into one tab. Returns `false` when the merge produced the
    /// state that was already stored, in which case nothing is written.
    pub fn update(&mut self, script_type: ScriptType, patch: TabPatch) -> bool {
        let current = self.get(script_type);
        let mut next = current.clone();
        patch.apply_to(&mut next);
        if next == current && self.states.contains_key(&script_type) {
            return false;
        }
        self.states.insert(script_type, next);
        true
    }

    /// Restore one tab to its default state.
    pub fn reset(&mut self, script_type: ScriptType) -> bool {
        let default = self.default_state();
        if self.states.get(&script_type) == Some(&default) {
            return false;
        }
        self.states.insert(script_type, default);
        true
    }

    /// Tabs that have been touched at least once, in script-type order.
    pub fn iter(&self) -> impl Iterator<Item = (ScriptType, &TabGenerationState)> {
        self.states.iter().map(|(key, state)| (*key, state))
    }
}
