// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::JobStatus;
use crate::errors::{OperationError, OperationResult};
use crate::operation::Operation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle record of one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_job_id: Option<String>,
    pub user_id: String,
    /// The submitted operation in wire format.
    pub operation: String,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobDetail {
    pub fn scheduled(
        job_id: impl Into<String>,
        parent_job_id: Option<String>,
        user_id: impl Into<String>,
        operation: &Operation,
    ) -> OperationResult<Self> {
        let now = Utc::now();
        Ok(Self {
            job_id: job_id.into(),
            parent_job_id,
            user_id: user_id.into(),
            operation: serde_json::to_string(operation)?,
            status: JobStatus::Scheduled,
            description: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Moves to `status`, refusing anything the state machine does not allow.
    pub fn transition(&mut self, status: JobStatus, description: Option<String>) -> OperationResult<()> {
        if !self.status.can_transition_to(&status) {
            return Err(OperationError::JobTransition {
                job_id: self.job_id.clone(),
                from: self.status.to_string(),
                to: status.to_string(),
            });
        }
        self.status = status;
        if description.is_some() {
            self.description = description;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn decode_operation(&self) -> OperationResult<Operation> {
        Ok(serde_json::from_str(&self.operation)?)
    }
}
