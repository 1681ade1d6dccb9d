// ── Decoded protocol messages ──
//
// Shapes of the messages exchanged with agents after the transport has
// done its framing and decoding. Attribute arrays are kept raw here;
// `model::report` turns them into typed values before the registry sees
// anything.

use std::collections::BTreeMap;

use bytes::Bytes;

/// Attribute key carrying the agent's service name.
pub const SERVICE_NAME_KEY: &str = "service.name";
/// Attribute key carrying the number of devices a supervisor fronts.
pub const DEVICE_COUNT_KEY: &str = "device.count";
/// Prefix of attribute keys whose string values name managed devices.
pub const DEVICE_KEY_PREFIX: &str = "device.";

/// Status report sent by an agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentToServer {
    pub instance_uid: Option<Bytes>,
    pub agent_description: Option<AgentDescription>,
    pub effective_config: Option<EffectiveConfig>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentDescription {
    pub identifying_attributes: Option<Vec<KeyValue>>,
    pub non_identifying_attributes: Option<Vec<KeyValue>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: AnyValue,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<AnyValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnyValue {
    String(String),
    Int(i64),
    Bool(bool),
    Double(f64),
    Bytes(Bytes),
}

impl AnyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for AnyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for AnyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for AnyValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for AnyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Configuration an agent reports as currently running, keyed by the
/// identity it applies to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectiveConfig {
    pub config_map: BTreeMap<String, AgentConfigFile>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfigFile {
    pub body: Bytes,
    pub content_type: String,
}

impl AgentConfigFile {
    pub fn new(body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: content_type.into(),
        }
    }
}

/// Message sent to an agent: either a bare acknowledgement or a remote
/// configuration update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerToAgent {
    pub instance_uid: Bytes,
    pub remote_config: Option<AgentRemoteConfig>,
}

impl ServerToAgent {
    /// Acknowledgement echoing the reporting agent's instance uid.
    pub fn ack(instance_uid: Bytes) -> Self {
        Self {
            instance_uid,
            remote_config: None,
        }
    }

    pub fn is_ack(&self) -> bool {
        self.remote_config.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentRemoteConfig {
    pub config_map: BTreeMap<String, AgentConfigFile>,
}
