// ── Typed status reports ──
//
// The single place where attribute keys are matched. The registry only
// ever sees a `StatusReport`.

use bytes::Bytes;

use super::FleetId;
use crate::error::CoreError;
use crate::transport::protocol::{
    AgentToServer, DEVICE_COUNT_KEY, DEVICE_KEY_PREFIX, KeyValue, SERVICE_NAME_KEY,
};

/// One effective-config entry, keyed by the identity it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveEntry {
    pub target: FleetId,
    pub body: Bytes,
    pub content_type: String,
}

impl EffectiveEntry {
    /// Body as text. Invalid UTF-8 is replaced rather than rejected.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A status report with every field the registry consumes already typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Raw uid, echoed back in the acknowledgement.
    pub instance_uid: Bytes,
    pub agent_id: FleetId,
    /// `service.name`, if present and non-empty.
    pub service_name: Option<String>,
    /// `device.count`, informational only.
    pub device_count: Option<i64>,
    /// Devices listed in the non-identifying attributes.
    ///
    /// `None` when the report carries no non-identifying attributes at all,
    /// which is different from an explicit empty list.
    pub devices: Option<Vec<FleetId>>,
    pub effective_config: Vec<EffectiveEntry>,
}

impl StatusReport {
    /// Decode a raw report. Every field degrades to "absent" when missing or
    /// of the wrong type; a missing instance uid becomes the empty identity.
    ///
    /// Only a uid that is present but not 16 bytes long is rejected.
    pub fn decode(raw: &AgentToServer) -> Result<Self, CoreError> {
        let (instance_uid, agent_id) = match &raw.instance_uid {
            Some(uid) => (uid.clone(), FleetId::from_instance_uid(uid)?),
            None => (Bytes::new(), FleetId::unnamed()),
        };

        let description = raw.agent_description.as_ref();

        let service_name = description
            .and_then(|d| d.identifying_attributes.as_deref())
            .and_then(service_name);

        let (device_count, devices) = match description
            .and_then(|d| d.non_identifying_attributes.as_deref())
        {
            Some(attrs) => {
                let (count, devices) = device_list(attrs);
                (count, Some(devices))
            }
            None => (None, None),
        };

        let effective_config = raw
            .effective_config
            .as_ref()
            .map(|ec| {
                ec.config_map
                    .iter()
                    .map(|(key, file)| EffectiveEntry {
                        target: FleetId::named(key.as_str()),
                        body: file.body.clone(),
                        content_type: file.content_type.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            instance_uid,
            agent_id,
            service_name,
            device_count,
            devices,
            effective_config,
        })
    }
}

fn service_name(attrs: &[KeyValue]) -> Option<String> {
    attrs
        .iter()
        .find(|kv| kv.key == SERVICE_NAME_KEY)
        .and_then(|kv| kv.value.as_str())
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
}

/// Split supervisor attributes into the advertised count and the ordered
/// device list. `device.count` is never itself a device.
fn device_list(attrs: &[KeyValue]) -> (Option<i64>, Vec<FleetId>) {
    let mut count = None;
    let mut devices = Vec::new();

    for kv in attrs {
        if kv.key == DEVICE_COUNT_KEY {
            count = kv.value.as_int();
            continue;
        }
        let is_device_key = kv
            .key
            .strip_prefix(DEVICE_KEY_PREFIX)
            .is_some_and(|suffix| !suffix.is_empty());
        if !is_device_key {
            continue;
        }
        if let Some(id) = kv.value.as_str().filter(|s| !s.is_empty()) {
            devices.push(FleetId::named(id));
        }
    }

    (count, devices)
}
