// ── Transport contract ──
//
// The registry never owns sockets. A transport collaborator accepts
// connections, decodes frames, and calls into the event adapter; in the
// other direction it only has to honour `Transport::send`.

mod memory;
pub mod protocol;

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryTransport;
pub use protocol::{
    AgentConfigFile, AgentDescription, AgentRemoteConfig, AgentToServer, AnyValue,
    EffectiveConfig, KeyValue, ServerToAgent,
};

/// Opaque handle to one physical transport session.
///
/// Assigned by the transport; the registry only compares handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for SessionId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Failure reported by the transport when a message cannot be sent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("session {session} is closed")]
    SessionClosed { session: SessionId },

    #[error("send on session {session} failed: {reason}")]
    Send { session: SessionId, reason: String },
}

/// Outbound half of the transport collaborator.
pub trait Transport: Send + Sync + 'static {
    /// Deliver `message` on `session`.
    fn send(
        &self,
        session: SessionId,
        message: ServerToAgent,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
