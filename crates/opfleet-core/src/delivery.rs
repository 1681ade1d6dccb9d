// ── Config delivery ──
//
// Validates device -> supervisor -> session, writes the new config under
// the registry lock, then sends the remote-config message after the lock
// is released. A failed send does not roll the write back.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::model::FleetId;
use crate::store::FleetRegistry;
use crate::store::registry::StagedPush;
use crate::store::state::FleetState;
use crate::transport::{AgentConfigFile, AgentRemoteConfig, ServerToAgent, Transport};

/// Content type attached to pushed documents unless configured otherwise.
pub const DEFAULT_CONTENT_TYPE: &str = "text/yaml";

/// Walk the delivery chain for `device`, stopping at the first broken link.
pub(crate) fn validate_chain(state: &FleetState, device: &FleetId) -> Result<StagedPush, CoreError> {
    let dev = state
        .devices
        .get(device)
        .ok_or_else(|| CoreError::DeviceNotFound {
            device: device.clone(),
        })?;

    if !dev.is_connected() {
        return Err(CoreError::DeviceUnreachable {
            device: device.clone(),
        });
    }

    let supervisor = state
        .agents
        .get(&dev.supervisor_id)
        .ok_or_else(|| CoreError::SupervisorNotFound {
            supervisor: dev.supervisor_id.clone(),
            device: device.clone(),
        })?;

    let session = match (supervisor.is_connected(), supervisor.session()) {
        (true, Some(session)) => session,
        _ => {
            return Err(CoreError::SupervisorUnreachable {
                supervisor: supervisor.id.clone(),
            });
        }
    };

    let instance_uid = supervisor.id.to_instance_uid()?;

    Ok(StagedPush {
        supervisor: supervisor.id.clone(),
        session,
        instance_uid,
    })
}

/// Pushes configuration documents to devices through their supervisor.
pub struct ConfigDelivery<T: Transport> {
    registry: Arc<FleetRegistry>,
    transport: Arc<T>,
    content_type: String,
}

impl<T: Transport> ConfigDelivery<T> {
    pub fn new(registry: Arc<FleetRegistry>, transport: Arc<T>) -> Self {
        Self::with_content_type(registry, transport, DEFAULT_CONTENT_TYPE)
    }

    pub fn with_content_type(
        registry: Arc<FleetRegistry>,
        transport: Arc<T>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            transport,
            content_type: content_type.into(),
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Push `config` to `device`.
    ///
    /// On success of the validation chain the device's config is
    /// overwritten immediately, independent of whether the send succeeds.
    pub async fn push_config(
        &self,
        device: &FleetId,
        config: impl Into<String>,
    ) -> Result<(), CoreError> {
        let config = config.into();
        let body = Bytes::from(config.clone());

        let staged = self.registry.stage_push(device, config).await?;

        let message = ServerToAgent {
            instance_uid: Bytes::copy_from_slice(&staged.instance_uid),
            remote_config: Some(AgentRemoteConfig {
                config_map: BTreeMap::from([(
                    device.to_string(),
                    AgentConfigFile::new(body, self.content_type.clone()),
                )]),
            }),
        };

        match self.transport.send(staged.session, message).await {
            Ok(()) => {
                info!(%device, supervisor = %staged.supervisor, "pushed config");
                Ok(())
            }
            Err(source) => {
                warn!(
                    %device,
                    supervisor = %staged.supervisor,
                    error = %source,
                    "failed to send config"
                );
                Err(CoreError::DeliveryFailed {
                    device: device.clone(),
                    supervisor: staged.supervisor,
                    source,
                })
            }
        }
    }
}

impl<T: Transport> Clone for ConfigDelivery<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            transport: Arc::clone(&self.transport),
            content_type: self.content_type.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::catalog::DefaultConfigCatalog;
    use crate::model::{ConfigOrigin, ConnectionState, Device, SUPERVISOR_NAME};
    use crate::transport::{SessionId, TransportError};

    /// Every send fails as if the connection had been reset mid-write.
    struct ResetTransport;

    impl Transport for ResetTransport {
        async fn send(&self, session: SessionId, _: ServerToAgent) -> Result<(), TransportError> {
            Err(TransportError::Send {
                session,
                reason: "connection reset by peer".into(),
            })
        }
    }

    fn supervised_state(supervisor: &FleetId) -> FleetState {
        let mut state = FleetState::default();
        state.register_or_update(supervisor, Some(SUPERVISOR_NAME), SessionId::new(1));
        state.reconcile(
            supervisor,
            &[FleetId::from("device-1")],
            &DefaultConfigCatalog::builtin(),
        );
        state
    }

    #[test]
    fn chain_passes_for_connected_pair() {
        let sup = FleetId::from(Uuid::from_u128(7));
        let state = supervised_state(&sup);

        let staged = validate_chain(&state, &FleetId::from("device-1")).unwrap();
        assert_eq!(staged.supervisor, sup);
        assert_eq!(staged.session, SessionId::new(1));
        assert_eq!(staged.instance_uid, *Uuid::from_u128(7).as_bytes());
    }

    #[test]
    fn chain_reports_missing_device_first() {
        let state = FleetState::default();
        let err = validate_chain(&state, &FleetId::from("device-1")).unwrap_err();
        assert!(matches!(err, CoreError::DeviceNotFound { .. }));
    }

    #[test]
    fn chain_reports_orphaned_device() {
        let mut state = FleetState::default();
        let device = Device::first_sight(
            FleetId::from("device-1"),
            FleetId::from("ghost"),
            String::new(),
        );
        state.devices.insert(device.id.clone(), device);

        let err = validate_chain(&state, &FleetId::from("device-1")).unwrap_err();
        assert!(
            matches!(err, CoreError::SupervisorNotFound { ref supervisor, .. } if *supervisor == FleetId::from("ghost"))
        );
    }

    #[test]
    fn chain_checks_device_before_supervisor() {
        let sup = FleetId::from(Uuid::from_u128(7));
        let mut state = supervised_state(&sup);
        state.mark_disconnected(SessionId::new(1));
        state.devices[0].state = ConnectionState::Disconnected;

        let err = validate_chain(&state, &FleetId::from("device-1")).unwrap_err();
        assert!(matches!(err, CoreError::DeviceUnreachable { .. }));
    }

    #[test]
    fn chain_rejects_supervisor_without_binary_identity() {
        let sup = FleetId::from("named-supervisor");
        let state = supervised_state(&sup);

        let err = validate_chain(&state, &FleetId::from("device-1")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidIdentity { .. }));
    }

    #[tokio::test]
    async fn send_failure_surfaces_transport_cause() {
        let registry = Arc::new(FleetRegistry::default());
        let sup = FleetId::from(Uuid::from_u128(7));
        registry
            .register_or_update(&sup, Some(SUPERVISOR_NAME), SessionId::new(3))
            .await;
        registry
            .reconcile_supervised_devices(&sup, &[FleetId::from("device-1")])
            .await
            .unwrap();
        let delivery = ConfigDelivery::new(Arc::clone(&registry), Arc::new(ResetTransport));

        let err = delivery
            .push_config(&FleetId::from("device-1"), "x: 1")
            .await
            .unwrap_err();

        match err {
            CoreError::DeliveryFailed {
                device,
                supervisor,
                source,
            } => {
                assert_eq!(device, FleetId::from("device-1"));
                assert_eq!(supervisor, sup);
                assert_eq!(
                    source,
                    TransportError::Send {
                        session: SessionId::new(3),
                        reason: "connection reset by peer".into(),
                    }
                );
            }
            other => panic!("expected DeliveryFailed, got {other:?}"),
        }

        let device = registry.get_device(&FleetId::from("device-1")).await.unwrap();
        assert_eq!(device.config, "x: 1");
        assert_eq!(device.config_origin, ConfigOrigin::Pushed);
    }
}
