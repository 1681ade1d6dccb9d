// ── In-process transport ──
//
// Sessions live in a map behind a mutex; sent messages are recorded per
// session so callers can inspect what would have gone on the wire.
// Closing a session here does NOT notify the registry: the caller decides
// when (or whether) to deliver the matching `on_connection_closed`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use super::{ServerToAgent, SessionId, Transport, TransportError};

#[derive(Debug, Default)]
struct SessionSlot {
    open: bool,
    outbox: Vec<ServerToAgent>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: AtomicU64,
    sessions: Mutex<HashMap<SessionId, SessionSlot>>,
}

/// Cheaply cloneable in-memory [`Transport`].
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<MemoryInner>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh open session.
    pub fn open_session(&self) -> SessionId {
        let id = SessionId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.sessions().insert(
            id,
            SessionSlot {
                open: true,
                outbox: Vec::new(),
            },
        );
        id
    }

    /// Mark a session closed. Returns `false` if it was unknown or already closed.
    pub fn close_session(&self, session: SessionId) -> bool {
        self.sessions()
            .get_mut(&session)
            .is_some_and(|slot| std::mem::replace(&mut slot.open, false))
    }

    pub fn is_open(&self, session: SessionId) -> bool {
        self.sessions().get(&session).is_some_and(|slot| slot.open)
    }

    /// Messages delivered on `session`, oldest first.
    pub fn sent(&self, session: SessionId) -> Vec<ServerToAgent> {
        self.sessions()
            .get(&session)
            .map(|slot| slot.outbox.clone())
            .unwrap_or_default()
    }

    /// Drain the recorded messages for `session`.
    pub fn take_sent(&self, session: SessionId) -> Vec<ServerToAgent> {
        self.sessions()
            .get_mut(&session)
            .map(|slot| std::mem::take(&mut slot.outbox))
            .unwrap_or_default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, SessionSlot>> {
        self.inner
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for MemoryTransport {
    async fn send(&self, session: SessionId, message: ServerToAgent) -> Result<(), TransportError> {
        let mut sessions = self.sessions();
        match sessions.get_mut(&session) {
            Some(slot) if slot.open => {
                trace!(%session, "recorded outbound message");
                slot.outbox.push(message);
                Ok(())
            }
            _ => Err(TransportError::SessionClosed { session }),
        }
    }
}
