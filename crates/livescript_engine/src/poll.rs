use std::time::Duration;

use livescript_logging::{script_debug, script_info, script_warn};

use crate::query::ArtifactQuery;
use crate::{ArtifactFile, FailureKind, QueryError, QueryOutcome};

/// Attempt budget and fixed spacing for artifact polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    /// 20 attempts, 30 s apart.
    fn default() -> Self {
        Self {
            max_attempts: 20,
            interval: Duration::from_secs(30),
        }
    }
}

impl PollPolicy {
    /// Budget for slow generations: 60 attempts, 30 s apart.
    pub fn extended() -> Self {
        Self {
            max_attempts: 60,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Found(ArtifactFile),
    Exhausted { attempts: u32 },
}

/// Query for `file_name` until it exists or the attempt budget runs out.
///
/// `on_progress(attempt, max_attempts)` fires before every query, starting at
/// attempt 1. Timeouts count as "not found yet". Other query errors are
/// retried, except on the final attempt where the error is returned.
pub async fn poll_artifact<F>(
    query: &dyn ArtifactQuery,
    file_name: &str,
    policy: PollPolicy,
    mut on_progress: F,
) -> Result<PollOutcome, QueryError>
where
    F: FnMut(u32, u32) + Send,
{
    let max_attempts = policy.max_attempts;
    for attempt in 1..=max_attempts {
        on_progress(attempt, max_attempts);
        match query.query(file_name).await {
            Ok(QueryOutcome::Found(file)) => {
                script_info!("{file_name} found on attempt {attempt}/{max_attempts}");
                return Ok(PollOutcome::Found(file));
            }
            Ok(QueryOutcome::NotFound) => {
                script_debug!("{file_name} not found on attempt {attempt}/{max_attempts}");
            }
            Err(err) if err.kind == FailureKind::Timeout => {
                script_debug!("{file_name} query timed out on attempt {attempt}; treating as not found");
            }
            Err(err) if attempt == max_attempts => {
                script_warn!("{file_name} query failed on final attempt: {err}");
                return Err(err);
            }
            Err(err) => {
                script_warn!("{file_name} query failed on attempt {attempt}/{max_attempts}, retrying: {err}");
            }
        }
        if attempt < max_attempts && !policy.interval.is_zero() {
            tokio::time::sleep(policy.interval).await;
        }
    }
    script_warn!("{file_name} still missing after {max_attempts} attempts");
    Ok(PollOutcome::Exhausted {
        attempts: max_attempts,
    })
}
