use std::collections::HashMap;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::{Error, Result};

/// Tracks the long-running refresh loops and the streaming feed.
///
/// A loop only returns once shutdown is signalled, so a finished task seen by
/// [`TaskSupervisor::check_health`] before then means it panicked or exited early.
/// One-shot tasks are expected to finish and are only held so shutdown can stop them.
pub struct TaskSupervisor {
    tasks: HashMap<String, JoinHandle<()>>,
    oneshots: Vec<(String, JoinHandle<()>)>,
}

impl TaskSupervisor {
    pub fn new() -> Self {
        TaskSupervisor {
            tasks: HashMap::new(),
            oneshots: Vec::new(),
        }
    }

    /// Spawn a new background task and register it for monitoring
    pub fn spawn<F>(&mut self, name: impl Into<String>, future: F) -> &mut Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let handle = tokio::spawn(future);

        info!("Spawned background task: {}", name);
        self.tasks.insert(name, handle);
        self
    }

    /// Spawn a task that is allowed to finish on its own.
    pub fn spawn_oneshot<F>(&mut self, name: impl Into<String>, future: F) -> &mut Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        info!("Spawned one-shot task: {}", name);
        self.oneshots.push((name, tokio::spawn(future)));
        self
    }

    /// Returns an error naming every task that has terminated, and stops tracking them.
    pub fn check_health(&mut self) -> Result<()> {
        self.oneshots.retain(|(_, handle)| !handle.is_finished());

        let failed_tasks: Vec<String> = self
            .tasks
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(name, _)| name.clone())
            .collect();

        if failed_tasks.is_empty() {
            return Ok(());
        }

        let error_msg = format!("Tasks terminated unexpectedly: {:?}", failed_tasks);
        error!("{}", error_msg);
        for name in &failed_tasks {
            self.tasks.remove(name);
        }
        Err(Error::TaskFailed(error_msg))
    }

    pub fn active_task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for every loop to return on its own after shutdown was signalled.
    /// One-shot tasks do not watch the signal and are aborted.
    pub async fn join_all(&mut self) {
        self.abort_oneshots();
        for (name, handle) in self.tasks.drain() {
            match handle.await {
                Ok(()) => info!("Task {} stopped", name),
                Err(e) => error!("Task {} failed: {}", name, e),
            }
        }
    }

    /// Abort whatever is still running.
    pub fn shutdown_all(&mut self) {
        info!("Aborting {} background tasks", self.tasks.len());

        for (name, handle) in self.tasks.drain() {
            handle.abort();
            info!("Aborted task: {}", name);
        }
        self.abort_oneshots();
    }

    fn abort_oneshots(&mut self) {
        for (name, handle) in self.oneshots.drain(..) {
            if !handle.is_finished() {
                handle.abort();
                info!("Aborted one-shot task: {}", name);
            }
        }
    }
}

impl Default for TaskSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
