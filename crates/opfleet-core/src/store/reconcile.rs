// ── Supervisor reconciliation ──
//
// Re-converges recorded device ownership and connectivity with the device
// list a supervisor just reported. Last reporter wins ownership; a report
// can only disconnect devices its own supervisor currently owns.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info};

use super::state::FleetState;
use crate::catalog::DefaultConfigCatalog;
use crate::model::{ConnectionState, Device, FleetId};

/// What a single reconciliation pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Devices seen for the first time, created from the catalog.
    pub registered: Vec<FleetId>,
    /// Known devices that moved here from a different supervisor.
    pub transferred: Vec<FleetId>,
    /// Devices this supervisor owned that were missing from the report.
    pub disconnected: Vec<FleetId>,
}

impl FleetState {
    /// Apply `reported` as the complete device list of `supervisor`.
    ///
    /// The caller checks that `supervisor` is a registered supervisor.
    pub(crate) fn reconcile(
        &mut self,
        supervisor: &FleetId,
        reported: &[FleetId],
        catalog: &DefaultConfigCatalog,
    ) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();
        let now = Utc::now();

        for id in reported {
            match self.devices.get_mut(id) {
                Some(device) => {
                    if device.supervisor_id != *supervisor {
                        info!(
                            device = %id,
                            from = %device.supervisor_id,
                            to = %supervisor,
                            "device ownership transferred"
                        );
                        outcome.transferred.push(id.clone());
                    }
                    device.state = ConnectionState::Connected;
                    device.supervisor_id = supervisor.clone();
                    device.updated_at = now;
                }
                None => {
                    let device = Device::first_sight(
                        id.clone(),
                        supervisor.clone(),
                        catalog.lookup(id),
                    );
                    info!(device = %id, %supervisor, "registered new device with default config");
                    self.devices.insert(id.clone(), device);
                    outcome.registered.push(id.clone());
                }
            }
        }

        let listed: HashSet<&FleetId> = reported.iter().collect();
        for device in self.devices.values_mut() {
            if device.supervisor_id == *supervisor
                && !listed.contains(&device.id)
                && device.state.is_connected()
            {
                device.state = ConnectionState::Disconnected;
                device.updated_at = now;
                info!(device = %device.id, %supervisor, "device disconnected from supervisor");
                outcome.disconnected.push(device.id.clone());
            }
        }

        if let Some(agent) = self.agents.get_mut(supervisor) {
            agent.devices = reported.to_vec();
        }

        debug!(
            %supervisor,
            reported = reported.len(),
            registered = outcome.registered.len(),
            transferred = outcome.transferred.len(),
            disconnected = outcome.disconnected.len(),
            "reconciled supervised devices"
        );
        outcome
    }
}
