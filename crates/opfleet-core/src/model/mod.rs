// ── Domain model ──
//
// Canonical fleet types. Everything here is plain data: the registry
// hands out clones, never references into its maps.

pub mod agent;
pub mod device;
pub mod identity;
pub mod report;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

pub use agent::{Agent, SUPERVISOR_NAME, UNKNOWN_AGENT_NAME};
pub use device::{ConfigOrigin, Device};
pub use identity::FleetId;
pub use report::StatusReport;

/// Whether an agent or device is currently reachable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}
