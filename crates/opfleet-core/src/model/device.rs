// ── Device domain type ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use super::{ConnectionState, FleetId};

/// Where a device's current `config` text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConfigOrigin {
    /// Baseline from the default-config catalog at first sight.
    Catalog,
    /// Effective config reported by the supervisor.
    Reported,
    /// Written by a push, whether or not the send went through.
    Pushed,
}

/// A leaf unit reachable only through its supervising agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: FleetId,
    pub name: String,
    pub state: ConnectionState,
    pub supervisor_id: FleetId,
    pub config: String,
    pub config_origin: ConfigOrigin,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    pub(crate) fn first_sight(id: FleetId, supervisor_id: FleetId, config: String) -> Self {
        Self {
            name: id.to_string(),
            id,
            state: ConnectionState::Connected,
            supervisor_id,
            config,
            config_origin: ConfigOrigin::Catalog,
            updated_at: Utc::now(),
        }
    }

    pub(crate) fn set_config(&mut self, config: String, origin: ConfigOrigin) {
        self.config = config;
        self.config_origin = origin;
        self.updated_at = Utc::now();
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }
}
