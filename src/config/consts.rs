// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Enables the job tracker (bool)
pub const JOB_TRACKER_ENABLED: &str = "maestro.executor.job.tracker.enabled";
/// Number of job workers (int)
pub const JOB_EXECUTOR_THREADS: &str = "maestro.executor.job.executor.threads";
/// Comma separated paths of operation declaration files
pub const OPERATION_DECLARATIONS: &str = "maestro.executor.operation.declarations";
/// Auth that grants access to every user's jobs and named operations
pub const ADMIN_AUTH: &str = "maestro.executor.admin.auth";
/// Path of the operation auths file loaded into the authoriser hook
pub const AUTHORISER_PATH: &str = "maestro.executor.authoriser.path";
/// Comma separated names of hooks appended after the authoriser
pub const HOOKS: &str = "maestro.executor.hooks";
/// `json` or `yaml`
pub const SERIALISER_FORMAT: &str = "maestro.serialiser.format";
/// Reject unknown operation fields (bool)
pub const SERIALISER_STRICT: &str = "maestro.serialiser.strict";
/// Cache backend name
pub const CACHE_SERVICE_CLASS: &str = "maestro.cache.service.class";

/// Default number of job workers
pub const DEFAULT_JOB_EXECUTOR_THREADS: usize = 50;
/// Default cache backend
pub const DEFAULT_CACHE_SERVICE: &str = "hash_map";
