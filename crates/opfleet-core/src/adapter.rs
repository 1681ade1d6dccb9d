// ── Connection event adapter ──
//
// Entry points the transport collaborator calls on its own tasks. They
// translate connection events into registry operations and never fail:
// the worst a malformed report can do is be acknowledged and dropped.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::model::StatusReport;
use crate::store::{FleetRegistry, ReportOutcome};
use crate::transport::{AgentToServer, ServerToAgent, SessionId};

/// Translates transport events into registry mutations.
#[derive(Clone)]
pub struct ConnectionEventAdapter {
    registry: Arc<FleetRegistry>,
}

impl ConnectionEventAdapter {
    pub fn new(registry: Arc<FleetRegistry>) -> Self {
        Self { registry }
    }

    /// A new physical connection. Observational only.
    pub fn on_connected(&self, session: SessionId) {
        info!(%session, "new connection established");
    }

    /// An inbound status report. Always answers with an acknowledgement
    /// echoing the report's instance uid.
    pub async fn on_report_received(
        &self,
        session: SessionId,
        report: &AgentToServer,
    ) -> ServerToAgent {
        let ack = ServerToAgent::ack(report.instance_uid.clone().unwrap_or_else(Bytes::new));

        let report = match StatusReport::decode(report) {
            Ok(report) => report,
            Err(e) => {
                warn!(%session, error = %e, "dropping report with a malformed instance uid");
                return ack;
            }
        };

        debug!(%session, agent = %report.agent_id, "received status report");
        let ReportOutcome {
            agent,
            newly_registered,
            reconciled,
            ..
        } = self.registry.apply_report(session, &report).await;

        if let Some(outcome) = reconciled {
            info!(
                supervisor = %agent.id,
                advertised = ?report.device_count,
                devices = agent.devices.len(),
                new = outcome.registered.len(),
                disconnected = outcome.disconnected.len(),
                "supervisor reported devices"
            );
        } else if !newly_registered {
            debug!(agent = %agent.id, "refreshed agent");
        }

        ack
    }

    /// The physical connection went away.
    pub async fn on_connection_closed(&self, session: SessionId) {
        match self.registry.mark_disconnected(session).await {
            Some(agent) => info!(%session, %agent, "agent disconnected"),
            None => debug!(%session, "connection closed before any report"),
        }
    }
}
