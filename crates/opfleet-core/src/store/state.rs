// ── Registry state ──
//
// The two entity maps and the synchronous operations over them. Nothing
// here locks: `FleetRegistry` owns the single lock that covers both maps
// and calls into these methods while holding it.

use chrono::Utc;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::model::report::EffectiveEntry;
use crate::model::{Agent, ConfigOrigin, ConnectionState, Device, FleetId};
use crate::transport::SessionId;

#[derive(Debug, Default)]
pub(crate) struct FleetState {
    pub(crate) agents: IndexMap<FleetId, Agent>,
    pub(crate) devices: IndexMap<FleetId, Device>,
}

impl FleetState {
    /// Create the agent on first sight, otherwise rebind it to `session`.
    ///
    /// Returns `true` when the agent was new. Name and supervisor flag are
    /// only ever set here, on first sight.
    pub(crate) fn register_or_update(
        &mut self,
        id: &FleetId,
        reported_name: Option<&str>,
        session: SessionId,
    ) -> bool {
        if let Some(agent) = self.agents.get_mut(id) {
            agent.state = ConnectionState::Connected;
            agent.session = Some(session);
            agent.last_seen = Utc::now();
            return false;
        }

        let agent = Agent::first_sight(id.clone(), reported_name.map(str::to_owned), session);
        info!(
            agent = %agent.id,
            name = %agent.name,
            supervisor = agent.is_supervisor,
            %session,
            "registered new agent"
        );
        self.agents.insert(id.clone(), agent);
        true
    }

    /// Overwrite the config of every known device named in `entries`.
    /// Entries naming unknown devices are skipped. Returns how many applied.
    pub(crate) fn apply_effective_config(&mut self, entries: &[EffectiveEntry]) -> usize {
        let mut applied = 0;
        for entry in entries {
            if let Some(device) = self.devices.get_mut(&entry.target) {
                device.set_config(entry.text(), ConfigOrigin::Reported);
                debug!(
                    device = %entry.target,
                    bytes = entry.body.len(),
                    "updated effective config"
                );
                applied += 1;
            }
        }
        applied
    }

    /// Record the config a plain (non-supervisor) agent reports for itself:
    /// the entry keyed by the empty identity or by the agent's own identity.
    ///
    /// Returns `true` if the agent's `reported_config` changed.
    pub(crate) fn record_self_config(&mut self, id: &FleetId, entries: &[EffectiveEntry]) -> bool {
        let own = entries
            .iter()
            .filter(|e| !self.devices.contains_key(&e.target))
            .find(|e| e.target.is_empty() || id.matches_key(&e.target));

        match (self.agents.get_mut(id), own) {
            (Some(agent), Some(entry)) if !agent.is_supervisor => {
                agent.reported_config = Some(entry.text());
                true
            }
            _ => false,
        }
    }

    /// Flip the agent bound to `session` to disconnected and unbind it.
    ///
    /// Devices are left as they are; only a later reconciliation changes
    /// their connectivity.
    pub(crate) fn mark_disconnected(&mut self, session: SessionId) -> Option<FleetId> {
        let agent = self
            .agents
            .values_mut()
            .find(|a| a.session == Some(session))?;
        agent.state = ConnectionState::Disconnected;
        agent.session = None;
        Some(agent.id.clone())
    }
}
