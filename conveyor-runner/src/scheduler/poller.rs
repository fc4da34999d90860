//! Push job poller
//!
//! Dispatches a command to a node set and polls the push jobs server until
//! the job reaches a verdict. Classification is delegated to
//! [`RemoteJob::classify`]; this loop is the only part that sleeps or talks
//! to the network.

use chrono::Utc;
use conveyor_core::domain::push_job::{JobState, RemoteJob};
use conveyor_core::dto::push_job::CreatePushJob;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::time::{self, Duration};
use tracing::{debug, error, info};

use crate::error::{FailureReason, PushJobError};
use crate::repository::PushJobApi;

/// Dispatches push jobs and waits for them to finish
pub struct JobPoller {
    api: Arc<dyn PushJobApi>,
    poll_interval: Duration,
}

impl JobPoller {
    /// Creates a new job poller
    pub fn new(api: Arc<dyn PushJobApi>, poll_interval: Duration) -> Self {
        Self { api, poll_interval }
    }

    /// Dispatches `command` to `nodes` and waits for the outcome
    pub async fn run(
        &self,
        command: &str,
        nodes: BTreeSet<String>,
        timeout: Duration,
    ) -> Result<RemoteJob, PushJobError> {
        let mut job = self.dispatch(command, nodes, timeout).await?;
        self.wait(&mut job).await?;
        Ok(job)
    }

    /// Starts a job and fetches its first status
    pub async fn dispatch(
        &self,
        command: &str,
        nodes: BTreeSet<String>,
        timeout: Duration,
    ) -> Result<RemoteJob, PushJobError> {
        if nodes.is_empty() {
            return Err(PushJobError::NoNodes {
                command: command.to_string(),
            });
        }

        let req = CreatePushJob {
            command: command.to_string(),
            nodes: nodes.iter().cloned().collect(),
            run_timeout: timeout.as_secs(),
        };

        info!("Dispatching '{}' to {} node(s)", command, nodes.len());

        let uri = self
            .api
            .start(&req)
            .await
            .map_err(|source| PushJobError::Dispatch {
                command: command.to_string(),
                source,
            })?;

        let record = self
            .api
            .fetch(&uri)
            .await
            .map_err(|source| PushJobError::Refresh {
                uri: uri.clone(),
                source,
            })?;

        info!("Push job {} started at {}", record.id, uri);

        Ok(RemoteJob {
            uri,
            command: command.to_string(),
            nodes,
            timeout,
            record,
        })
    }

    /// Fetches the job's current status and node results
    pub async fn refresh(&self, job: &mut RemoteJob) -> Result<(), PushJobError> {
        job.record = self
            .api
            .fetch(&job.uri)
            .await
            .map_err(|source| PushJobError::Refresh {
                uri: job.uri.clone(),
                source,
            })?;
        Ok(())
    }

    /// Polls until the job succeeds, fails or times out
    ///
    /// Returns `Ok(())` only when every dispatched node succeeded.
    pub async fn wait(&self, job: &mut RemoteJob) -> Result<(), PushJobError> {
        loop {
            self.refresh(job).await?;
            debug!(
                "Push job {} is {} (updated {})",
                job.id(),
                job.status(),
                job.updated_at()
            );

            let state = job.classify(Utc::now()).map_err(|terminal| {
                error!("Push job {} ended with status {}", job.id(), terminal.status);
                PushJobError::Terminal {
                    command: job.command.clone(),
                    status: terminal.status,
                    nodes: job.node_summary(),
                }
            })?;

            match state {
                JobState::Succeeded => {
                    info!("Push job {} succeeded on {} node(s)", job.id(), job.nodes.len());
                    return Ok(());
                }
                JobState::Failed => return Err(failed(job, FailureReason::Unsuccessful)),
                JobState::TimedOut => return Err(failed(job, FailureReason::TimedOut)),
                JobState::Pending => time::sleep(self.poll_interval).await,
            }
        }
    }
}

fn failed(job: &RemoteJob, reason: FailureReason) -> PushJobError {
    error!("Push job {} failed: {} ({})", job.id(), reason, job.node_summary());
    PushJobError::Failed {
        command: job.command.clone(),
        reason,
        nodes: job.node_summary(),
    }
}
