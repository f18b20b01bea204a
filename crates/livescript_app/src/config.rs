//! RON configuration file plus command-line overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use livescript_engine::{ApiSettings, DownloadSettings, PollPolicy};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::logging::LogDestination;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "livescript.ron";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub poll: PollConfig,
    pub logging: LoggingConfig,
    pub download: DownloadConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub endpoint_path: String,
    pub app_id: u64,
    pub biz_code: String,
    pub request_timeout_ms: u64,
    pub connect_timeout_secs: u64,
    pub submit_timeout_secs: u64,
    pub query_timeout_secs: u64,
    pub lookup_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        Self {
            base_url: api.base_url,
            endpoint_path: api.endpoint_path,
            app_id: api.app_id,
            biz_code: api.biz_code,
            request_timeout_ms: millis(api.service_timeout),
            connect_timeout_secs: api.connect_timeout.as_secs(),
            submit_timeout_secs: api.submit_timeout.as_secs(),
            query_timeout_secs: api.query_timeout.as_secs(),
            lookup_timeout_secs: api.lookup_timeout.as_secs(),
        }
    }
}

/// Named attempt budgets; explicit values in `PollConfig` win over either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PollProfile {
    /// 20 checks, 30 s apart.
    #[default]
    Standard,
    /// 60 checks, 30 s apart.
    Extended,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub profile: PollProfile,
    pub max_attempts: Option<u32>,
    pub interval_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub destination: LogDestination,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            destination: LogDestination::File,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Finished artifacts are saved here when set.
    pub dir: Option<PathBuf>,
    pub max_bytes: u64,
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        let settings = DownloadSettings::default();
        Self {
            dir: None,
            max_bytes: settings.max_bytes,
            timeout_secs: settings.request_timeout.as_secs(),
        }
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub max_attempts: Option<u32>,
    pub interval_secs: Option<u64>,
    pub download_dir: Option<PathBuf>,
    pub extended_polling: bool,
    pub verbose: bool,
}

impl AppConfig {
    /// Load `path`, or `./livescript.ron` if present, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(base_url) = &overrides.base_url {
            self.api.base_url = base_url.clone();
        }
        if overrides.extended_polling {
            self.poll.profile = PollProfile::Extended;
        }
        if let Some(max_attempts) = overrides.max_attempts {
            self.poll.max_attempts = Some(max_attempts);
        }
        if let Some(interval_secs) = overrides.interval_secs {
            self.poll.interval_secs = Some(interval_secs);
        }
        if let Some(dir) = &overrides.download_dir {
            self.download.dir = Some(dir.clone());
        }
        if overrides.verbose {
            self.logging.level = "debug".to_string();
        }
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api.base_url.clone(),
            endpoint_path: self.api.endpoint_path.clone(),
            app_id: self.api.app_id,
            biz_code: self.api.biz_code.clone(),
            service_timeout: Duration::from_millis(self.api.request_timeout_ms),
            connect_timeout: Duration::from_secs(self.api.connect_timeout_secs),
            submit_timeout: Duration::from_secs(self.api.submit_timeout_secs),
            query_timeout: Duration::from_secs(self.api.query_timeout_secs),
            lookup_timeout: Duration::from_secs(self.api.lookup_timeout_secs),
        }
    }

    /// A zero attempt budget would never query, so it is raised to one.
    pub fn poll_policy(&self) -> PollPolicy {
        let base = match self.poll.profile {
            PollProfile::Standard => PollPolicy::default(),
            PollProfile::Extended => PollPolicy::extended(),
        };
        PollPolicy {
            max_attempts: self.poll.max_attempts.unwrap_or(base.max_attempts).max(1),
            interval: self
                .poll
                .interval_secs
                .map(Duration::from_secs)
                .unwrap_or(base.interval),
        }
    }

    pub fn download_settings(&self) -> DownloadSettings {
        DownloadSettings {
            max_bytes: self.download.max_bytes,
            request_timeout: Duration::from_secs(self.download.timeout_secs),
            ..DownloadSettings::default()
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        livescript_logging::parse_level(&self.logging.level)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
