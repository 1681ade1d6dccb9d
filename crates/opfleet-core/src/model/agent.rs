// ── Agent domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConnectionState, FleetId};
use crate::transport::SessionId;

/// Display name given to agents that never reported a `service.name`.
pub const UNKNOWN_AGENT_NAME: &str = "Unknown";

/// Reported service name that marks an agent as a supervisor.
pub const SUPERVISOR_NAME: &str = "supervisor";

/// A controller process connected (now or previously) to the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: FleetId,
    pub name: String,
    pub state: ConnectionState,
    /// Fixed at first sight; later reports never re-derive it.
    pub is_supervisor: bool,
    /// Last configuration this agent reported as running for itself.
    pub reported_config: Option<String>,
    /// Device identities this agent claimed in its latest report.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<FleetId>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,

    #[serde(skip)]
    pub(crate) session: Option<SessionId>,
}

impl Agent {
    pub(crate) fn first_sight(id: FleetId, name: Option<String>, session: SessionId) -> Self {
        let name = name.unwrap_or_else(|| UNKNOWN_AGENT_NAME.to_owned());
        let now = Utc::now();
        Self {
            is_supervisor: name == SUPERVISOR_NAME,
            id,
            name,
            state: ConnectionState::Connected,
            reported_config: None,
            devices: Vec::new(),
            first_seen: now,
            last_seen: now,
            session: Some(session),
        }
    }

    /// Transport session currently bound to this agent, if connected.
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }
}
