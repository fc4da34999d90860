//! Error types for promotions and push jobs

use conveyor_client::ClientError;
use conveyor_core::domain::change::Stage;
use conveyor_core::domain::push_job::PushJobStatus;
use std::fmt;
use thiserror::Error;

/// Errors that abort a promotion stage
#[derive(Debug, Error)]
pub enum PromotionError {
    /// Loading, creating or saving an environment failed
    #[error("{stage}: environment store failed on '{environment}': {source}")]
    Store {
        stage: Stage,
        environment: String,
        #[source]
        source: ClientError,
    },

    /// The blocked projects query failed
    #[error("{stage}: could not read blocked projects: {source}")]
    BlockGate {
        stage: Stage,
        #[source]
        source: ClientError,
    },
}

/// Why a completed or abandoned job counts as failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The job completed but not every node succeeded
    Unsuccessful,
    /// The server or the client-side deadline timed the job out
    TimedOut,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Unsuccessful => write!(f, "not all nodes succeeded"),
            FailureReason::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Errors surfaced by the push job poller
#[derive(Debug, Error)]
pub enum PushJobError {
    /// Nothing to dispatch to
    #[error("no nodes to run '{command}' on")]
    NoNodes { command: String },

    /// The server did not accept the job or returned no job locator
    #[error("failed to dispatch '{command}': {source}")]
    Dispatch {
        command: String,
        #[source]
        source: ClientError,
    },

    /// Fetching the job status failed
    #[error("failed to refresh push job at {uri}: {source}")]
    Refresh {
        uri: String,
        #[source]
        source: ClientError,
    },

    /// The job completed without every node succeeding, or timed out
    #[error("push job '{command}' failed ({reason}): {nodes}")]
    Failed {
        command: String,
        reason: FailureReason,
        nodes: String,
    },

    /// The server ended the job with quorum_failed, crashed, timed_out or aborted
    #[error("push job '{command}' ended with status {status}: {nodes}")]
    Terminal {
        command: String,
        status: PushJobStatus,
        nodes: String,
    },
}

/// Errors from a deploy run
#[derive(Debug, Error)]
pub enum DeployError {
    /// Node search failed
    #[error("node search '{query}' failed: {source}")]
    Search {
        query: String,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    PushJob(#[from] PushJobError),
}
