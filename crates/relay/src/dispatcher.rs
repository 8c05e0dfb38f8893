//! Serialized command dispatch against the single controlled target.
//!
//! Every [`Dispatcher::enqueue`] is one send on an unbounded channel, which is
//! an indivisible append: the channel order is the execution order. A single
//! worker task drains the channel and runs each command to completion (or
//! failure) before receiving the next, so at most one primitive action is in
//! flight at any instant.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::{domain::InputCommand, protocol::DispatchStats};
use target_control::{TargetController, TargetError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error("primitive action timed out after {0:?}")]
    TimedOut(Duration),
    #[error("primitive action aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Upper bound on resolving the target plus one primitive action.
    /// `None` waits indefinitely.
    pub action_timeout: Option<Duration>,
}

enum DispatchJob {
    Execute(InputCommand),
    Barrier(oneshot::Sender<()>),
}

#[derive(Default)]
struct Counters {
    enqueued: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Cloneable handle onto the dispatch worker.
#[derive(Clone)]
pub struct Dispatcher {
    jobs: mpsc::UnboundedSender<DispatchJob>,
    counters: Arc<Counters>,
}

impl Dispatcher {
    /// Starts the worker task. Must be called from within a Tokio runtime.
    /// The worker exits once every handle has been dropped and the queue
    /// has drained.
    pub fn spawn(target: Arc<dyn TargetController>, policy: DispatchPolicy) -> Self {
        let (jobs, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        tokio::spawn(run_worker(target, policy, Arc::clone(&counters), rx));
        Self { jobs, counters }
    }

    /// Appends a command to the queue. Never waits on the target.
    pub fn enqueue(&self, command: InputCommand) {
        let input = command.input;
        // Counted before the send so the worker can never finish a command
        // that `stats` does not yet show as enqueued.
        self.counters.enqueued.fetch_add(1, Ordering::Release);
        if self.jobs.send(DispatchJob::Execute(command)).is_err() {
            self.counters.enqueued.fetch_sub(1, Ordering::Release);
            warn!(%input, "dispatch worker stopped; command dropped");
        }
    }

    /// Resolves once every command enqueued before this call has finished.
    pub async fn idle(&self) {
        let (reply, done) = oneshot::channel();
        if self.jobs.send(DispatchJob::Barrier(reply)).is_ok() {
            let _ = done.await;
        }
    }

    /// `completed + failed` never exceeds `enqueued` in a snapshot.
    pub fn stats(&self) -> DispatchStats {
        // Outcomes are read first: any outcome seen implies its enqueue.
        let completed = self.counters.completed.load(Ordering::Acquire);
        let failed = self.counters.failed.load(Ordering::Acquire);
        DispatchStats {
            enqueued: self.counters.enqueued.load(Ordering::Acquire),
            completed,
            failed,
        }
    }
}

async fn run_worker(
    target: Arc<dyn TargetController>,
    policy: DispatchPolicy,
    counters: Arc<Counters>,
    mut rx: mpsc::UnboundedReceiver<DispatchJob>,
) {
    let mut seq: u64 = 0;
    while let Some(job) = rx.recv().await {
        match job {
            DispatchJob::Execute(command) => {
                seq += 1;
                let input = command.input;
                debug!(seq, %input, key = %command.target_key, "executing command");
                match execute(Arc::clone(&target), policy, command).await {
                    Ok(()) => {
                        counters.completed.fetch_add(1, Ordering::Release);
                        debug!(seq, %input, "command completed");
                    }
                    Err(error) => {
                        counters.failed.fetch_add(1, Ordering::Release);
                        warn!(seq, %input, %error, "command failed; continuing with next");
                    }
                }
            }
            DispatchJob::Barrier(reply) => {
                let _ = reply.send(());
            }
        }
    }
    debug!("dispatch worker stopped");
}

/// Runs one command against the target: resolve the handle, then issue the
/// primitive action and wait for it to finish.
///
/// The attempt runs in its own task so a panicking controller fails only this
/// command. On timeout the task is aborted before returning, which drops any
/// child process the controller spawned.
pub async fn execute(
    target: Arc<dyn TargetController>,
    policy: DispatchPolicy,
    command: InputCommand,
) -> Result<(), DispatchError> {
    let mut attempt = tokio::spawn(async move {
        let handle = target.resolve_target_handle().await?;
        target
            .invoke_primitive_action(&handle, &command.target_key)
            .await
    });

    let joined = match policy.action_timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut attempt).await {
            Ok(joined) => joined,
            Err(_) => {
                attempt.abort();
                let _ = attempt.await;
                return Err(DispatchError::TimedOut(limit));
            }
        },
        None => attempt.await,
    };

    match joined {
        Ok(result) => result.map_err(DispatchError::from),
        Err(join_error) => Err(DispatchError::Aborted(join_error.to_string())),
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
