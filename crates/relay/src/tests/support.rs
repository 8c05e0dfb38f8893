use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use target_control::{TargetController, TargetError, TargetHandle};
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub(crate) struct Invocation {
    pub key: String,
    pub started: Instant,
    pub finished: Instant,
}

/// Fake target that records every primitive action it is asked to perform.
#[derive(Default)]
pub(crate) struct RecordingTarget {
    action_time: Duration,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    panicking: HashSet<String>,
    missing: bool,
    resolves: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    started: Mutex<Vec<String>>,
    finished: Mutex<Vec<Invocation>>,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RecordingTarget {
    pub(crate) fn new(action_time: Duration) -> Self {
        Self {
            action_time,
            ..Self::default()
        }
    }

    pub(crate) fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    pub(crate) fn hanging(mut self, key: &str) -> Self {
        self.hanging.insert(key.to_string());
        self
    }

    pub(crate) fn panicking(mut self, key: &str) -> Self {
        self.panicking.insert(key.to_string());
        self
    }

    pub(crate) fn missing(mut self) -> Self {
        self.missing = true;
        self
    }

    pub(crate) fn started(&self) -> Vec<String> {
        self.started.lock().expect("started lock").clone()
    }

    pub(crate) fn finished(&self) -> Vec<Invocation> {
        self.finished.lock().expect("finished lock").clone()
    }

    pub(crate) fn finished_keys(&self) -> Vec<String> {
        self.finished().into_iter().map(|i| i.key).collect()
    }

    pub(crate) fn resolves(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TargetController for RecordingTarget {
    async fn resolve_target_handle(&self) -> Result<TargetHandle, TargetError> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        if self.missing {
            return Err(TargetError::NotFound("no window with class 'test'".into()));
        }
        Ok(TargetHandle("4242".into()))
    }

    async fn invoke_primitive_action(
        &self,
        handle: &TargetHandle,
        target_key: &str,
    ) -> Result<(), TargetError> {
        assert_eq!(handle.0, "4242");
        let started = Instant::now();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.started
            .lock()
            .expect("started lock")
            .push(target_key.to_string());

        if self.hanging.contains(target_key) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.panicking.contains(target_key) {
            panic!("controller crashed on {target_key}");
        }
        tokio::time::sleep(self.action_time).await;

        self.finished.lock().expect("finished lock").push(Invocation {
            key: target_key.to_string(),
            started,
            finished: Instant::now(),
        });

        if self.failing.contains(target_key) {
            return Err(TargetError::ActionFailed(format!("key {target_key} rejected")));
        }
        Ok(())
    }
}
