//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use opfleet_config::ConfigError;
use opfleet_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Fleet ────────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(opfleet::not_found),
        help("Run: opfleet {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{resource_type} '{identifier}' is not connected")]
    #[diagnostic(
        code(opfleet::unreachable),
        help("Only connected devices behind a connected supervisor accept pushes.")
    )]
    Unreachable {
        resource_type: String,
        identifier: String,
    },

    #[error("failed to deliver config to device '{device}'")]
    #[diagnostic(
        code(opfleet::delivery_failed),
        help("The registry already holds the new config; the supervisor never received it.")
    )]
    DeliveryFailed {
        device: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Scenario ─────────────────────────────────────────────────────

    #[error("invalid scenario {path}: {reason}")]
    #[diagnostic(
        code(opfleet::scenario),
        help("A scenario is a `steps:` list of connect, report, push, drop, and disconnect steps.")
    )]
    Scenario { path: String, reason: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(opfleet::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration file not found")]
    #[diagnostic(
        code(opfleet::no_config),
        help(
            "Check the --config path, or omit it to use the default location.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(opfleet::config))]
    Config(#[from] ConfigError),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to render {format} output: {reason}")]
    #[diagnostic(code(opfleet::render))]
    Render { format: &'static str, reason: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Unreachable { .. } | Self::DeliveryFailed { .. } => exit_code::CONNECTION,
            Self::Validation { .. } | Self::Scenario { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DeviceNotFound { device } => CliError::NotFound {
                resource_type: "device".into(),
                identifier: device.to_string(),
                list_command: "replay --show devices".into(),
            },

            CoreError::SupervisorNotFound { supervisor, .. } => CliError::NotFound {
                resource_type: "supervisor".into(),
                identifier: supervisor.to_string(),
                list_command: "replay --show agents".into(),
            },

            CoreError::DeviceUnreachable { device } => CliError::Unreachable {
                resource_type: "device".into(),
                identifier: device.to_string(),
            },

            CoreError::SupervisorUnreachable { supervisor } => CliError::Unreachable {
                resource_type: "supervisor".into(),
                identifier: supervisor.to_string(),
            },

            CoreError::InvalidIdentity { identity, reason } => CliError::Validation {
                field: format!("identity '{identity}'"),
                reason,
            },

            CoreError::DeliveryFailed { device, source, .. } => CliError::DeliveryFailed {
                device: device.to_string(),
                source: Box::new(source),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use opfleet_core::{FleetId, SessionId, TransportError};

    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (
                CoreError::DeviceNotFound {
                    device: FleetId::from("device-1"),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::SupervisorUnreachable {
                    supervisor: FleetId::from("sup"),
                },
                exit_code::CONNECTION,
            ),
            (
                CoreError::InvalidIdentity {
                    identity: "sup".into(),
                    reason: "not a uuid".into(),
                },
                exit_code::USAGE,
            ),
            (
                CoreError::DeliveryFailed {
                    device: FleetId::from("device-1"),
                    supervisor: FleetId::from("sup"),
                    source: TransportError::SessionClosed {
                        session: SessionId::new(3),
                    },
                },
                exit_code::CONNECTION,
            ),
        ];

        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn not_found_names_the_device() {
        let err = CliError::from(CoreError::DeviceNotFound {
            device: FleetId::from("device-9"),
        });
        insta::assert_snapshot!(err.to_string(), @"device 'device-9' not found");
    }
}
