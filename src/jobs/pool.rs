// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::{OperationError, OperationResult};
use crate::observability::messages::job::{JobTaskPanicked, WorkerPoolStarted};
use crate::observability::messages::StructuredLog;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A detached job run.
pub type JobTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

type TaskReceiver = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<JobTask>>>;

/// FIFO job queue drained by a fixed number of worker tasks.
///
/// Workers are spawned on the first submission, on the runtime of the
/// submitting task. At most `threads` jobs run at the same time; the rest
/// wait in the queue in submission order. There is no timeout: a job that
/// never finishes holds its worker forever.
pub struct WorkerPool {
    threads: usize,
    sender: Mutex<Option<mpsc::UnboundedSender<JobTask>>>,
}

impl WorkerPool {
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
            sender: Mutex::new(None),
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn is_started(&self) -> bool {
        self.sender.lock().is_some()
    }

    pub fn submit(&self, task: JobTask) -> OperationResult<()> {
        let mut sender = self.sender.lock();
        let tx = sender.get_or_insert_with(|| self.start_workers());
        tx.send(task)
            .map_err(|_| OperationError::configuration("job worker pool has shut down"))
    }

    fn start_workers(&self) -> mpsc::UnboundedSender<JobTask> {
        let (tx, rx) = mpsc::unbounded_channel::<JobTask>();
        let rx: TaskReceiver = Arc::new(tokio::sync::Mutex::new(rx));

        for worker in 0..self.threads {
            let rx = rx.clone();
            tokio::spawn(async move {
                loop {
                    let next = { rx.lock().await.recv().await };
                    let Some(task) = next else { break };
                    if let Err(e) = tokio::spawn(task).await {
                        JobTaskPanicked {
                            worker,
                            error: &e.to_string(),
                        }
                        .log();
                    }
                }
            });
        }

        WorkerPoolStarted {
            threads: self.threads,
        }
        .log();
        tx
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .field("started", &self.is_started())
            .finish()
    }
}
