//! Push job domain types
//!
//! A push job is a command the Chef server fans out to a set of nodes. The
//! server reports a single job status plus a per-node result bucket. The
//! classification here is pure: the runner feeds it fresh snapshots and a
//! clock, and decides whether to keep polling.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Node bucket holding nodes that ran the command successfully
pub const SUCCEEDED_BUCKET: &str = "succeeded";

/// Job status as reported by the push jobs server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushJobStatus {
    New,
    Voting,
    Running,
    Complete,
    QuorumFailed,
    Crashed,
    TimedOut,
    Aborted,
    /// Any status this client does not know; treated as still pending
    #[serde(other)]
    Unknown,
}

impl PushJobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PushJobStatus::New => "new",
            PushJobStatus::Voting => "voting",
            PushJobStatus::Running => "running",
            PushJobStatus::Complete => "complete",
            PushJobStatus::QuorumFailed => "quorum_failed",
            PushJobStatus::Crashed => "crashed",
            PushJobStatus::TimedOut => "timed_out",
            PushJobStatus::Aborted => "aborted",
            PushJobStatus::Unknown => "unknown",
        }
    }

    /// Terminal statuses that mean the job itself broke, not that nodes failed
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            PushJobStatus::QuorumFailed
                | PushJobStatus::Crashed
                | PushJobStatus::TimedOut
                | PushJobStatus::Aborted
        )
    }
}

impl fmt::Display for PushJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Job record returned by `GET <job uri>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushJobRecord {
    pub id: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub run_timeout: u64,
    pub status: PushJobStatus,
    #[serde(with = "rfc2822")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "rfc2822")]
    pub updated_at: DateTime<Utc>,
    /// Node names keyed by result bucket (succeeded, failed, unavailable, ...)
    #[serde(default)]
    pub nodes: BTreeMap<String, Vec<String>>,
}

/// The server reported a status that ends the job without a usable result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("push job {job_id} ended with status {status}")]
pub struct TerminalStatus {
    pub job_id: String,
    pub status: PushJobStatus,
}

/// Where a job stands after one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Still new, voting or running
    Pending,
    /// Complete and every dispatched node succeeded
    Succeeded,
    /// Complete but at least one dispatched node did not succeed
    Failed,
    /// The server timed the job out or the client-side deadline passed
    TimedOut,
}

/// A command dispatched to a node set, with the latest server snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteJob {
    /// Locator returned by the server on dispatch
    pub uri: String,
    pub command: String,
    pub nodes: BTreeSet<String>,
    pub timeout: Duration,
    pub record: PushJobRecord,
}

impl RemoteJob {
    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn status(&self) -> PushJobStatus {
        self.record.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.record.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.record.updated_at
    }

    /// Node names the server placed in `bucket`
    pub fn nodes_in(&self, bucket: &str) -> &[String] {
        self.record
            .nodes
            .get(bucket)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `Ok(true)` only for `complete`; error statuses are returned as errors
    /// so a crashed job can never be mistaken for one still in flight.
    pub fn is_complete(&self) -> Result<bool, TerminalStatus> {
        match self.record.status {
            PushJobStatus::Complete => Ok(true),
            status if status.is_error() => Err(TerminalStatus {
                job_id: self.record.id.clone(),
                status,
            }),
            _ => Ok(false),
        }
    }

    /// Complete, and every dispatched node is in the succeeded bucket
    pub fn is_successful(&self) -> Result<bool, TerminalStatus> {
        Ok(self.is_complete()? && self.nodes_in(SUCCEEDED_BUCKET).len() == self.nodes.len())
    }

    /// Complete, but not every dispatched node succeeded
    pub fn is_failed(&self) -> Result<bool, TerminalStatus> {
        Ok(self.is_complete()? && !self.is_successful()?)
    }

    /// Server-side timeout, or `created_at + timeout` already behind `now`
    pub fn is_timed_out_at(&self, now: DateTime<Utc>) -> bool {
        if self.record.status == PushJobStatus::TimedOut {
            return true;
        }

        let timeout = TimeDelta::from_std(self.timeout).unwrap_or(TimeDelta::MAX);
        match self.record.created_at.checked_add_signed(timeout) {
            Some(deadline) => deadline < now,
            None => false,
        }
    }

    /// Classifies the current snapshot
    ///
    /// Timeout is checked first, then failure, then success, matching the
    /// order the poll loop acts on them.
    pub fn classify(&self, now: DateTime<Utc>) -> Result<JobState, TerminalStatus> {
        if self.is_timed_out_at(now) {
            return Ok(JobState::TimedOut);
        }
        if self.is_failed()? {
            return Ok(JobState::Failed);
        }
        if self.is_successful()? {
            return Ok(JobState::Succeeded);
        }
        Ok(JobState::Pending)
    }

    /// Per-bucket node listing, e.g. `failed: n2; succeeded: n1`
    pub fn node_summary(&self) -> String {
        let buckets: Vec<String> = self
            .record
            .nodes
            .iter()
            .filter(|(_, nodes)| !nodes.is_empty())
            .map(|(bucket, nodes)| format!("{}: {}", bucket, nodes.join(", ")))
            .collect();

        if buckets.is_empty() {
            "no node results".to_string()
        } else {
            buckets.join("; ")
        }
    }
}

/// Serde adapter for the RFC 2822 timestamps the push jobs server emits
mod rfc2822 {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc2822())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc2822(&raw)
            .or_else(|_| DateTime::parse_from_rfc3339(&raw))
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn job(status: PushJobStatus, buckets: &[(&str, &[&str])]) -> RemoteJob {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        RemoteJob {
            uri: "https://chef.example.com/organizations/acme/pushy/jobs/1".to_string(),
            command: "chef-client".to_string(),
            nodes: ["n1", "n2"].iter().map(|n| n.to_string()).collect(),
            timeout: Duration::from_secs(60),
            record: PushJobRecord {
                id: "1".to_string(),
                command: "chef-client".to_string(),
                run_timeout: 60,
                status,
                created_at,
                updated_at: created_at,
                nodes: buckets
                    .iter()
                    .map(|(bucket, nodes)| {
                        (
                            bucket.to_string(),
                            nodes.iter().map(|n| n.to_string()).collect(),
                        )
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn test_pending_statuses_are_not_complete() {
        for status in [PushJobStatus::New, PushJobStatus::Voting, PushJobStatus::Running] {
            let job = job(status, &[]);
            assert_eq!(job.is_complete(), Ok(false), "{}", status);
            assert_eq!(job.is_successful(), Ok(false));
            assert_eq!(job.is_failed(), Ok(false));
        }
    }

    #[test]
    fn test_complete_with_all_nodes_succeeded() {
        let job = job(PushJobStatus::Complete, &[("succeeded", &["n1", "n2"])]);
        assert_eq!(job.is_complete(), Ok(true));
        assert_eq!(job.is_successful(), Ok(true));
        assert_eq!(job.is_failed(), Ok(false));
    }

    #[test]
    fn test_complete_with_partial_success_is_failed() {
        let job = job(
            PushJobStatus::Complete,
            &[("succeeded", &["n1"]), ("failed", &["n2"])],
        );
        assert_eq!(job.is_successful(), Ok(false));
        assert_eq!(job.is_failed(), Ok(true));
    }

    #[test]
    fn test_error_statuses_raise_on_complete() {
        for status in [
            PushJobStatus::QuorumFailed,
            PushJobStatus::Crashed,
            PushJobStatus::TimedOut,
            PushJobStatus::Aborted,
        ] {
            let job = job(status, &[]);
            let err = job.is_complete().unwrap_err();
            assert_eq!(err.status, status);
            assert!(job.is_successful().is_err());
            assert!(job.is_failed().is_err());
        }
    }

    #[test]
    fn test_client_side_timeout_arithmetic() {
        let job = job(PushJobStatus::Running, &[]);
        let created = job.created_at();

        assert!(job.is_timed_out_at(created + TimeDelta::seconds(90)));
        assert!(!job.is_timed_out_at(created + TimeDelta::seconds(45)));
    }

    #[test]
    fn test_server_timeout_counts_as_timed_out() {
        let job = job(PushJobStatus::TimedOut, &[]);
        assert!(job.is_timed_out_at(job.created_at()));
        assert_eq!(job.classify(job.created_at()), Ok(JobState::TimedOut));
    }

    #[test]
    fn test_classify() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 30).unwrap();

        assert_eq!(job(PushJobStatus::Voting, &[]).classify(now), Ok(JobState::Pending));
        assert_eq!(
            job(PushJobStatus::Complete, &[("succeeded", &["n1", "n2"])]).classify(now),
            Ok(JobState::Succeeded)
        );
        assert_eq!(
            job(PushJobStatus::Complete, &[("unavailable", &["n1", "n2"])]).classify(now),
            Ok(JobState::Failed)
        );
        assert!(job(PushJobStatus::Crashed, &[]).classify(now).is_err());
    }

    #[test]
    fn test_node_summary() {
        let finished = job(
            PushJobStatus::Complete,
            &[("succeeded", &["n1"]), ("failed", &["n2"]), ("unavailable", &[])],
        );
        assert_eq!(finished.node_summary(), "failed: n2; succeeded: n1");

        let running = job(PushJobStatus::Running, &[]);
        assert_eq!(running.node_summary(), "no node results");
    }

    #[test]
    fn test_deserialize_job_record() {
        let record: PushJobRecord = serde_json::from_value(json!({
            "id": "aaaaaaaaaaaa25fd67fa8715fd547d3d",
            "command": "chef-client",
            "run_timeout": 300,
            "status": "running",
            "created_at": "Tue, 04 Sep 2012 23:01:02 GMT",
            "updated_at": "Tue, 04 Sep 2012 23:17:56 GMT",
            "nodes": {"running": ["DONKEY"], "succeeded": ["FIONA"]}
        }))
        .unwrap();

        assert_eq!(record.status, PushJobStatus::Running);
        assert_eq!(
            record.created_at,
            Utc.with_ymd_and_hms(2012, 9, 4, 23, 1, 2).unwrap()
        );
        assert_eq!(record.nodes["succeeded"], vec!["FIONA".to_string()]);
    }

    #[test]
    fn test_unknown_status_is_pending() {
        let status: PushJobStatus = serde_json::from_value(json!("paused")).unwrap();
        assert_eq!(status, PushJobStatus::Unknown);
        assert!(!status.is_error());
    }
}
