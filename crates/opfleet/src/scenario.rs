//! Replay scenarios: a scripted sequence of transport events.
//!
//! Sessions are referred to by label; the player opens a fresh
//! `MemoryTransport` session the first time a label is used.

use std::collections::BTreeMap;
use std::path::Path;

use bytes::Bytes;
use serde::Deserialize;
use uuid::Uuid;

use opfleet_core::transport::protocol::{DEVICE_COUNT_KEY, DEVICE_KEY_PREFIX, SERVICE_NAME_KEY};
use opfleet_core::transport::{
    AgentConfigFile, AgentDescription, AgentToServer, EffectiveConfig, KeyValue,
};

use crate::error::CliError;

/// A parsed scenario file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    /// A new physical connection.
    Connect { session: String },

    /// A status report on `session`.
    Report(ReportSpec),

    /// Push a config document to a device.
    Push { device: String, config: String },

    /// The link dies without the close event reaching the registry yet.
    Drop { session: String },

    /// The link closes and the registry is told.
    Disconnect { session: String },
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Report(_) => "report",
            Self::Push { .. } => "push",
            Self::Drop { .. } => "drop",
            Self::Disconnect { .. } => "disconnect",
        }
    }
}

/// The fields of one agent status report.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReportSpec {
    /// Session the report arrives on.
    pub session: String,

    /// Instance uid. Omit to report under the empty identity.
    #[serde(default)]
    pub agent: Option<Uuid>,

    /// `service.name`; `supervisor` marks a supervisor.
    #[serde(default)]
    pub name: Option<String>,

    /// Devices listed in the non-identifying attributes.
    #[serde(default)]
    pub devices: Option<Vec<String>>,

    /// Overrides the advertised `device.count` (defaults to the list length).
    #[serde(default)]
    pub device_count: Option<i64>,

    /// Effective config keyed by device identity.
    #[serde(default)]
    pub effective_config: BTreeMap<String, String>,
}

impl ReportSpec {
    /// Build the wire-level report.
    pub fn to_message(&self, content_type: &str) -> AgentToServer {
        let identifying = self
            .name
            .as_ref()
            .map(|name| vec![KeyValue::new(SERVICE_NAME_KEY, name.as_str())]);

        let non_identifying = self.devices.as_ref().map(|devices| {
            let count = self
                .device_count
                .unwrap_or_else(|| i64::try_from(devices.len()).unwrap_or(i64::MAX));
            let mut attrs = vec![KeyValue::new(DEVICE_COUNT_KEY, count)];
            attrs.extend(devices.iter().enumerate().map(|(i, id)| {
                KeyValue::new(format!("{DEVICE_KEY_PREFIX}{}", i + 1), id.as_str())
            }));
            attrs
        });

        let agent_description = (identifying.is_some() || non_identifying.is_some()).then(|| {
            AgentDescription {
                identifying_attributes: identifying,
                non_identifying_attributes: non_identifying,
            }
        });

        let effective_config = (!self.effective_config.is_empty()).then(|| EffectiveConfig {
            config_map: self
                .effective_config
                .iter()
                .map(|(id, doc)| {
                    (
                        id.clone(),
                        AgentConfigFile::new(Bytes::from(doc.clone()), content_type),
                    )
                })
                .collect(),
        });

        AgentToServer {
            instance_uid: self
                .agent
                .map(|uid| Bytes::copy_from_slice(uid.as_bytes())),
            agent_description,
            effective_config,
        }
    }
}

/// Read and parse a scenario. `.json` files use JSON, anything else YAML.
pub fn load(path: &Path) -> Result<Scenario, CliError> {
    let scenario_err = |reason: String| CliError::Scenario {
        path: path.display().to_string(),
        reason,
    };

    let text = std::fs::read_to_string(path).map_err(|e| scenario_err(e.to_string()))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let scenario: Scenario = if is_json {
        serde_json::from_str(&text).map_err(|e| scenario_err(e.to_string()))?
    } else {
        serde_yaml::from_str(&text).map_err(|e| scenario_err(e.to_string()))?
    };

    if scenario.steps.is_empty() {
        return Err(scenario_err("no steps".into()));
    }
    Ok(scenario)
}
