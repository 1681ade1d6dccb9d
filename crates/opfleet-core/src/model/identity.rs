// ── Fleet identity codec ──
//
// Agents are addressed on the wire by a 16-byte instance uid; devices are
// named by whatever string their supervisor reports. Both live in one
// namespace, so a single identity type covers them and knows how to get
// back to the binary form when a message has to be addressed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Canonical identity of an agent or device.
///
/// Instance identities wrap the UUID decoded from a transport instance uid
/// and render as the lowercase hyphenated form. Strings (device names,
/// config-map keys, catalog keys) are always kept verbatim as named
/// identities, even when they happen to look like a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FleetId {
    Instance(Uuid),
    Named(String),
}

impl FleetId {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// The identity a report without an instance uid is filed under.
    pub fn unnamed() -> Self {
        Self::Named(String::new())
    }

    /// Decode a binary instance uid as delivered by the transport.
    pub fn from_instance_uid(bytes: &[u8]) -> Result<Self, CoreError> {
        Uuid::from_slice(bytes)
            .map(Self::Instance)
            .map_err(|e| CoreError::InvalidIdentity {
                identity: format!("0x{}", hex(bytes)),
                reason: e.to_string(),
            })
    }

    /// Convert back to the binary instance uid used to address a session.
    ///
    /// Fails for named identities, which have no binary form.
    pub fn to_instance_uid(&self) -> Result<[u8; 16], CoreError> {
        match self {
            Self::Instance(u) => Ok(*u.as_bytes()),
            Self::Named(s) => Err(CoreError::InvalidIdentity {
                identity: s.clone(),
                reason: "not a 16-byte instance identifier".into(),
            }),
        }
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Self::Instance(u) => Some(u),
            Self::Named(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Named(s) if s.is_empty())
    }

    /// Whether a reported string key addresses this identity. An instance
    /// matches its own rendered form.
    pub fn matches_key(&self, key: &FleetId) -> bool {
        match (self, key) {
            (Self::Instance(u), Self::Named(k)) => *k == u.to_string(),
            _ => self == key,
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

impl fmt::Display for FleetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(u) => write!(f, "{u}"),
            Self::Named(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for FleetId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<Uuid> for FleetId {
    fn from(u: Uuid) -> Self {
        Self::Instance(u)
    }
}

impl From<String> for FleetId {
    fn from(s: String) -> Self {
        Self::Named(s)
    }
}

impl From<&str> for FleetId {
    fn from(s: &str) -> Self {
        Self::named(s)
    }
}
