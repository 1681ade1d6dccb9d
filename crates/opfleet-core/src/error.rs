// ── Core error types ──
//
// Everything the core hands back to an operator-facing caller. None of
// these are fatal to the registry: a failed push or an undecodable
// identity leaves previously known state intact.

use thiserror::Error;

use crate::model::FleetId;
use crate::transport::TransportError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Delivery chain ───────────────────────────────────────────────
    #[error("device {device} not found")]
    DeviceNotFound { device: FleetId },

    #[error("device {device} is not connected")]
    DeviceUnreachable { device: FleetId },

    /// A device points at an owner the registry has never seen.
    #[error("supervisor {supervisor} not found for device {device}")]
    SupervisorNotFound { supervisor: FleetId, device: FleetId },

    #[error("supervisor {supervisor} is not connected")]
    SupervisorUnreachable { supervisor: FleetId },

    #[error("invalid identity {identity}: {reason}")]
    InvalidIdentity { identity: String, reason: String },

    #[error("failed to send config for device {device} via supervisor {supervisor}")]
    DeliveryFailed {
        device: FleetId,
        supervisor: FleetId,
        #[source]
        source: TransportError,
    },
}

impl CoreError {
    /// Short machine-readable kind, stable across message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DeviceNotFound { .. } => "device_not_found",
            Self::DeviceUnreachable { .. } => "device_unreachable",
            Self::SupervisorNotFound { .. } => "supervisor_not_found",
            Self::SupervisorUnreachable { .. } => "supervisor_unreachable",
            Self::InvalidIdentity { .. } => "invalid_identity",
            Self::DeliveryFailed { .. } => "delivery_failed",
        }
    }
}
