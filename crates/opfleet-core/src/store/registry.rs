// ── Fleet registry ──
//
// The authoritative in-memory store of agents and devices. One RwLock
// covers both maps: every mutation takes it exclusively, readers share
// it. Each mutation republishes the affected snapshot on a watch channel.

use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use tracing::debug;

use super::reconcile::ReconcileOutcome;
use super::state::FleetState;
use crate::catalog::DefaultConfigCatalog;
use crate::error::CoreError;
use crate::model::report::EffectiveEntry;
use crate::model::{Agent, ConfigOrigin, Device, FleetId, StatusReport};
use crate::stream::{EntityStream, Snapshot};
use crate::transport::SessionId;

/// Which snapshots a mutation touched.
#[derive(Debug, Clone, Copy, Default)]
struct Touched {
    agents: bool,
    devices: bool,
}

/// Everything the delivery path needs once validation has passed and the
/// config has been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StagedPush {
    pub supervisor: FleetId,
    pub session: SessionId,
    pub instance_uid: [u8; 16],
}

/// Result of applying one status report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOutcome {
    /// The reporting agent after the report was applied.
    pub agent: Agent,
    pub newly_registered: bool,
    /// Device configs overwritten from effective-config entries.
    pub effective_applied: usize,
    /// Present when the report triggered a reconciliation.
    pub reconciled: Option<ReconcileOutcome>,
}

/// Authoritative store of agents and devices.
///
/// Entries are never removed: absence is `ConnectionState::Disconnected`.
pub struct FleetRegistry {
    state: RwLock<FleetState>,
    catalog: DefaultConfigCatalog,
    agents_tx: watch::Sender<Snapshot<Agent>>,
    devices_tx: watch::Sender<Snapshot<Device>>,
}

impl FleetRegistry {
    pub fn new(catalog: DefaultConfigCatalog) -> Self {
        let (agents_tx, _) = watch::channel(Arc::new(Vec::new()));
        let (devices_tx, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            state: RwLock::new(FleetState::default()),
            catalog,
            agents_tx,
            devices_tx,
        }
    }

    pub fn catalog(&self) -> &DefaultConfigCatalog {
        &self.catalog
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Create the agent on first sight or rebind it to `session`.
    pub async fn register_or_update(
        &self,
        id: &FleetId,
        reported_name: Option<&str>,
        session: SessionId,
    ) -> Agent {
        let mut state = self.state.write().await;
        state.register_or_update(id, reported_name, session);
        self.publish(&state, Touched { agents: true, devices: false });
        state.agents[id].clone()
    }

    /// Overwrite configs of known devices; unknown targets are ignored.
    pub async fn apply_effective_config(&self, entries: &[EffectiveEntry]) -> usize {
        let mut state = self.state.write().await;
        let applied = state.apply_effective_config(entries);
        if applied > 0 {
            self.publish(&state, Touched { agents: false, devices: true });
        }
        applied
    }

    /// Reconcile `supervisor`'s device list against the registry.
    ///
    /// Returns `None` without touching anything when `supervisor` is not a
    /// registered supervisor.
    pub async fn reconcile_supervised_devices(
        &self,
        supervisor: &FleetId,
        reported: &[FleetId],
    ) -> Option<ReconcileOutcome> {
        let mut state = self.state.write().await;
        let outcome = self.reconcile_locked(&mut state, supervisor, reported)?;
        self.publish(&state, Touched { agents: true, devices: true });
        Some(outcome)
    }

    /// Apply a whole status report under one exclusive lock: register,
    /// effective config, then reconciliation for supervisors.
    pub async fn apply_report(&self, session: SessionId, report: &StatusReport) -> ReportOutcome {
        let id = &report.agent_id;
        let mut state = self.state.write().await;

        let newly_registered =
            state.register_or_update(id, report.service_name.as_deref(), session);

        let effective_applied = state.apply_effective_config(&report.effective_config);
        state.record_self_config(id, &report.effective_config);

        let reconciled = match &report.devices {
            Some(devices) => self.reconcile_locked(&mut state, id, devices),
            None => None,
        };

        if let Some(count) = report.device_count {
            let listed = report.devices.as_ref().map_or(0, Vec::len);
            if usize::try_from(count).ok() != Some(listed) && reconciled.is_some() {
                debug!(agent = %id, advertised = count, listed, "device.count disagrees with listed devices");
            }
        }

        self.publish(
            &state,
            Touched {
                agents: true,
                devices: effective_applied > 0 || reconciled.is_some(),
            },
        );

        ReportOutcome {
            agent: state.agents[id].clone(),
            newly_registered,
            effective_applied,
            reconciled,
        }
    }

    /// Disconnect whichever agent is bound to `session`. Devices are untouched.
    pub async fn mark_disconnected(&self, session: SessionId) -> Option<FleetId> {
        let mut state = self.state.write().await;
        let id = state.mark_disconnected(session)?;
        self.publish(&state, Touched { agents: true, devices: false });
        Some(id)
    }

    /// Validate the delivery chain for `device` and, if it holds, write
    /// `config` before any send is attempted.
    pub(crate) async fn stage_push(
        &self,
        device: &FleetId,
        config: String,
    ) -> Result<StagedPush, CoreError> {
        let mut state = self.state.write().await;
        let staged = crate::delivery::validate_chain(&state, device)?;

        if let Some(d) = state.devices.get_mut(device) {
            d.set_config(config, ConfigOrigin::Pushed);
        }
        self.publish(&state, Touched { agents: false, devices: true });
        Ok(staged)
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub async fn list_agents(&self) -> Vec<Agent> {
        self.state.read().await.agents.values().cloned().collect()
    }

    pub async fn list_devices(&self) -> Vec<Device> {
        self.state.read().await.devices.values().cloned().collect()
    }

    pub async fn get_agent(&self, id: &FleetId) -> Option<Agent> {
        self.state.read().await.agents.get(id).cloned()
    }

    pub async fn get_device(&self, id: &FleetId) -> Option<Device> {
        self.state.read().await.devices.get(id).cloned()
    }

    pub async fn agent_count(&self) -> usize {
        self.state.read().await.agents.len()
    }

    pub async fn device_count(&self) -> usize {
        self.state.read().await.devices.len()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_agents(&self) -> EntityStream<Agent> {
        EntityStream::new(self.agents_tx.subscribe())
    }

    pub fn subscribe_devices(&self) -> EntityStream<Device> {
        EntityStream::new(self.devices_tx.subscribe())
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn reconcile_locked(
        &self,
        state: &mut FleetState,
        supervisor: &FleetId,
        reported: &[FleetId],
    ) -> Option<ReconcileOutcome> {
        let is_supervisor = state.agents.get(supervisor).is_some_and(|a| a.is_supervisor);
        if !is_supervisor {
            debug!(agent = %supervisor, "device list from non-supervisor ignored");
            return None;
        }
        Some(state.reconcile(supervisor, reported, &self.catalog))
    }

    fn publish(&self, state: &FleetState, touched: Touched) {
        if touched.agents {
            let snap: Vec<Arc<Agent>> = state.agents.values().cloned().map(Arc::new).collect();
            // `send_modify` updates unconditionally, even with zero receivers.
            self.agents_tx.send_modify(|s| *s = Arc::new(snap));
        }
        if touched.devices {
            let snap: Vec<Arc<Device>> = state.devices.values().cloned().map(Arc::new).collect();
            self.devices_tx.send_modify(|s| *s = Arc::new(snap));
        }
    }
}

impl Default for FleetRegistry {
    fn default() -> Self {
        Self::new(DefaultConfigCatalog::builtin())
    }
}
