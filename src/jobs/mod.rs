// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Detached, tracked execution of `Job` operations.
//!
//! * [`JobStatus`] - the lifecycle state machine
//! * [`JobDetail`] - the lifecycle record stored per job
//! * [`JobTracker`] - the job state table, kept in the cache service
//! * [`WorkerPool`] - FIFO queue drained by a fixed number of workers

mod detail;
mod pool;
mod status;
mod tracker;

pub use detail::JobDetail;
pub use pool::{JobTask, WorkerPool};
pub use status::JobStatus;
pub use tracker::JobTracker;
