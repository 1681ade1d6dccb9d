// ── Fleet facade ──
//
// One handle over registry, event adapter, and config delivery. The
// transport collaborator drives the `on_*` entry points; operator-facing
// callers list, look up, and push.

use std::sync::Arc;

use crate::adapter::ConnectionEventAdapter;
use crate::config::FleetConfig;
use crate::delivery::ConfigDelivery;
use crate::error::CoreError;
use crate::model::{Agent, Device, FleetId};
use crate::store::FleetRegistry;
use crate::stream::EntityStream;
use crate::transport::{AgentToServer, ServerToAgent, SessionId, Transport};

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<FleetInner>`; every clone shares one registry.
pub struct Fleet<T: Transport> {
    inner: Arc<FleetInner<T>>,
}

struct FleetInner<T: Transport> {
    registry: Arc<FleetRegistry>,
    adapter: ConnectionEventAdapter,
    delivery: ConfigDelivery<T>,
}

impl<T: Transport> Fleet<T> {
    pub fn new(config: FleetConfig, transport: T) -> Self {
        let registry = Arc::new(FleetRegistry::new(config.catalog));
        let adapter = ConnectionEventAdapter::new(Arc::clone(&registry));
        let delivery = ConfigDelivery::with_content_type(
            Arc::clone(&registry),
            Arc::new(transport),
            config.content_type,
        );

        Self {
            inner: Arc::new(FleetInner {
                registry,
                adapter,
                delivery,
            }),
        }
    }

    pub fn registry(&self) -> &Arc<FleetRegistry> {
        &self.inner.registry
    }

    // ── Transport entry points ───────────────────────────────────────

    pub fn on_connected(&self, session: SessionId) {
        self.inner.adapter.on_connected(session);
    }

    pub async fn on_report_received(
        &self,
        session: SessionId,
        report: &AgentToServer,
    ) -> ServerToAgent {
        self.inner.adapter.on_report_received(session, report).await
    }

    pub async fn on_connection_closed(&self, session: SessionId) {
        self.inner.adapter.on_connection_closed(session).await;
    }

    // ── Operator operations ──────────────────────────────────────────

    pub async fn list_agents(&self) -> Vec<Agent> {
        self.inner.registry.list_agents().await
    }

    pub async fn list_devices(&self) -> Vec<Device> {
        self.inner.registry.list_devices().await
    }

    pub async fn get_agent(&self, id: &FleetId) -> Option<Agent> {
        self.inner.registry.get_agent(id).await
    }

    pub async fn get_device(&self, id: &FleetId) -> Option<Device> {
        self.inner.registry.get_device(id).await
    }

    pub async fn push_config(
        &self,
        device: &FleetId,
        config: impl Into<String>,
    ) -> Result<(), CoreError> {
        self.inner.delivery.push_config(device, config).await
    }

    pub fn subscribe_agents(&self) -> EntityStream<Agent> {
        self.inner.registry.subscribe_agents()
    }

    pub fn subscribe_devices(&self) -> EntityStream<Device> {
        self.inner.registry.subscribe_devices()
    }
}

impl<T: Transport> Clone for Fleet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
