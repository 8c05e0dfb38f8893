use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use shared::protocol::ObserverFrame;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Sending half of one observer's outbound frame queue.
///
/// The transport owns the receiving half and forwards frames to the socket.
#[derive(Debug, Clone)]
pub struct ObserverConnection {
    frames: mpsc::UnboundedSender<String>,
}

impl ObserverConnection {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (frames, rx) = mpsc::unbounded_channel();
        (Self { frames }, rx)
    }

    fn send(&self, frame: String) -> bool {
        self.frames.send(frame).is_ok()
    }
}

#[derive(Default)]
struct RegistryInner {
    next_id: AtomicU64,
    live: Mutex<HashMap<ObserverId, ObserverConnection>>,
}

/// Live set of observer connections plus best-effort fan-out to them.
#[derive(Clone, Default)]
pub struct ObserverRegistry {
    inner: Arc<RegistryInner>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, conn: ObserverConnection) -> ObserverId {
        let id = ObserverId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.live().insert(id, conn);
        id
    }

    /// Removes `id` from the live set. Unknown or already removed ids are
    /// ignored; returns whether an entry was removed.
    pub fn unregister(&self, id: ObserverId) -> bool {
        self.live().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.live().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sends `frame` to every connection registered at the moment of the call
    /// and returns how many accepted it. Failed sends are skipped; the
    /// connection stays registered until its own close unregisters it.
    pub fn broadcast(&self, frame: &ObserverFrame) -> usize {
        let text = match serde_json::to_string(frame) {
            Ok(text) => text,
            Err(error) => {
                debug!(%error, "failed to encode observer frame");
                return 0;
            }
        };

        let snapshot: Vec<(ObserverId, ObserverConnection)> = self
            .live()
            .iter()
            .map(|(id, conn)| (*id, conn.clone()))
            .collect();

        let mut delivered = 0;
        for (id, conn) in snapshot {
            if conn.send(text.clone()) {
                delivered += 1;
            } else {
                debug!(observer = %id, "observer send failed");
            }
        }
        delivered
    }

    fn live(&self) -> std::sync::MutexGuard<'_, HashMap<ObserverId, ObserverConnection>> {
        self.inner
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/observers_tests.rs"]
mod tests;
