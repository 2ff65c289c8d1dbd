// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{JobDetail, JobStatus};
use crate::cache::CacheService;
use crate::errors::{OperationError, OperationResult};
use crate::observability::messages::job::{JobStatusChanged, JobTransitionRejected};
use crate::observability::messages::StructuredLog;
use parking_lot::Mutex;
use std::sync::Arc;

/// Job state table stored in the cache service.
///
/// Every write goes through one lock, so a read-modify-write of a job detail
/// is never interleaved with another write to the same job.
pub struct JobTracker {
    cache: Arc<dyn CacheService>,
    write_lock: Mutex<()>,
}

impl JobTracker {
    pub const NAMESPACE: &'static str = "JobTracker";

    pub fn new(cache: Arc<dyn CacheService>) -> Self {
        Self {
            cache,
            write_lock: Mutex::new(()),
        }
    }

    pub fn add_or_update_job(&self, detail: &JobDetail) -> OperationResult<()> {
        let value = serde_json::to_value(detail)?;
        let _guard = self.write_lock.lock();
        self.cache.put(Self::NAMESPACE, &detail.job_id, value)
    }

    pub fn get_job(&self, job_id: &str) -> OperationResult<Option<JobDetail>> {
        match self.cache.get(Self::NAMESPACE, job_id)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// All tracked jobs, oldest first.
    pub fn get_all_jobs(&self) -> OperationResult<Vec<JobDetail>> {
        let mut jobs = Vec::new();
        for key in self.cache.keys(Self::NAMESPACE)? {
            if let Some(detail) = self.get_job(&key)? {
                jobs.push(detail);
            }
        }
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.job_id.cmp(&b.job_id)));
        Ok(jobs)
    }

    /// Applies a checked status change and stores the result.
    pub fn transition(
        &self,
        job_id: &str,
        status: JobStatus,
        description: Option<String>,
    ) -> OperationResult<JobDetail> {
        let _guard = self.write_lock.lock();

        let mut detail = match self.cache.get(Self::NAMESPACE, job_id)? {
            Some(value) => serde_json::from_value::<JobDetail>(value)?,
            None => {
                return Err(OperationError::Cache(format!(
                    "Job '{}' is not tracked",
                    job_id
                )))
            }
        };

        let from = detail.status;
        if let Err(e) = detail.transition(status, description) {
            JobTransitionRejected {
                job_id,
                from,
                to: status,
            }
            .log();
            return Err(e);
        }

        self.cache
            .put(Self::NAMESPACE, job_id, serde_json::to_value(&detail)?)?;
        JobStatusChanged {
            job_id,
            from,
            to: status,
        }
        .log();
        Ok(detail)
    }
}

impl std::fmt::Debug for JobTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobTracker")
            .field("cache", &self.cache.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::HashMapCacheService;
    use crate::operation::Operation;

    fn tracker() -> JobTracker {
        JobTracker::new(Arc::new(HashMapCacheService::new()))
    }

    #[test]
    fn stores_and_reads_back_job_details() {
        let tracker = tracker();
        let detail = JobDetail::scheduled("job-1", None, "alice", &Operation::to_list()).unwrap();
        tracker.add_or_update_job(&detail).unwrap();

        assert_eq!(tracker.get_job("job-1").unwrap(), Some(detail));
        assert_eq!(tracker.get_job("missing").unwrap(), None);
    }

    #[test]
    fn transition_updates_stored_status() {
        let tracker = tracker();
        let detail = JobDetail::scheduled("job-1", None, "alice", &Operation::to_list()).unwrap();
        tracker.add_or_update_job(&detail).unwrap();

        tracker.transition("job-1", JobStatus::Running, None).unwrap();
        let done = tracker.transition("job-1", JobStatus::Completed, None).unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(tracker.get_job("job-1").unwrap().unwrap().status, JobStatus::Completed);
    }

    #[test]
    fn rejected_transition_is_not_stored() {
        let tracker = tracker();
        let detail = JobDetail::scheduled("job-1", None, "alice", &Operation::to_list()).unwrap();
        tracker.add_or_update_job(&detail).unwrap();

        assert!(tracker.transition("job-1", JobStatus::Completed, None).is_err());
        assert_eq!(tracker.get_job("job-1").unwrap().unwrap().status, JobStatus::Scheduled);
    }

    #[test]
    fn transition_of_unknown_job_fails() {
        assert!(matches!(
            tracker().transition("nope", JobStatus::Running, None),
            Err(OperationError::Cache(_))
        ));
    }

    #[test]
    fn all_jobs_are_listed() {
        let tracker = tracker();
        for id in ["a", "b", "c"] {
            let detail = JobDetail::scheduled(id, None, "alice", &Operation::to_list()).unwrap();
            tracker.add_or_update_job(&detail).unwrap();
        }
        let ids: Vec<_> = tracker
            .get_all_jobs()
            .unwrap()
            .into_iter()
            .map(|d| d.job_id)
            .collect();
        assert_eq!(ids.len(), 3);
        for id in ["a", "b", "c"] {
            assert!(ids.iter().any(|j| j == id));
        }
    }
}
