use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use livescript_logging::script_info;
use thiserror::Error;

use crate::http::{build_client, map_reqwest_error};
use crate::persist::{AtomicFileWriter, PersistError};
use crate::{FailureKind, QueryError};

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            max_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download failed: {0}")]
    Transport(#[from] QueryError),
    #[error("artifact too large (max {max_bytes}, actual {actual})")]
    TooLarge { max_bytes: u64, actual: u64 },
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Fetches a finished artifact from its storage URL into a local directory.
#[derive(Debug, Clone, Default)]
pub struct ArtifactDownloader {
    settings: DownloadSettings,
}

impl ArtifactDownloader {
    pub fn new(settings: DownloadSettings) -> Self {
        Self { settings }
    }

    pub async fn download(
        &self,
        url: &str,
        dir: &Path,
        file_name: &str,
    ) -> Result<PathBuf, DownloadError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| QueryError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = build_client(self.settings.connect_timeout, self.settings.request_timeout)?;
        let response = client.get(parsed).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::new(FailureKind::HttpStatus(status.as_u16()), status.to_string()).into());
        }
        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(DownloadError::TooLarge {
                    max_bytes: self.settings.max_bytes,
                    actual: content_len,
                });
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(DownloadError::TooLarge {
                    max_bytes: self.settings.max_bytes,
                    actual: next_len,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        let path = AtomicFileWriter::new(dir.to_path_buf()).write(file_name, &bytes)?;
        script_info!("Saved {} bytes to {:?}", bytes.len(), path);
        Ok(path)
    }
}
