// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a job.
///
/// ```text
/// SCHEDULED -> RUNNING          -> COMPLETED | FAILED
///           -> SCHEDULED_PARENT -> COMPLETED | FAILED
///           -> FAILED
/// ```
///
/// `SCHEDULED_PARENT` replaces `RUNNING` for jobs whose operation submits
/// further jobs of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Scheduled,
    Running,
    /// Running state of a job whose operation submits nested jobs. The parent
    /// completes once its own operation returns; it does not wait for its
    /// children, which are tracked as separate jobs linked by `parent_job_id`.
    ScheduledParent,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn can_transition_to(&self, target: &JobStatus) -> bool {
        use JobStatus::*;

        matches!(
            (self, target),
            (Scheduled, Running)
                | (Scheduled, ScheduledParent)
                | (Scheduled, Failed)
                | (Running, Completed)
                | (Running, Failed)
                | (ScheduledParent, Completed)
                | (ScheduledParent, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Scheduled => "SCHEDULED",
            JobStatus::Running => "RUNNING",
            JobStatus::ScheduledParent => "SCHEDULED_PARENT",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
