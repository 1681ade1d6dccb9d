// ── Default-config catalog ──
//
// Baseline documents handed to a device the first time a supervisor
// lists it. Consulted only at first sight; later reports and pushes own
// the device's config from then on.

use indexmap::IndexMap;

use crate::model::FleetId;

/// Text given to a first-seen device that has no catalog entry.
pub const NO_DEFAULT_CONFIG: &str = "# No default configuration available";

const BUILTIN: [(&str, &str); 3] = [
    ("device-1", include_str!("defaults/device-1.yaml")),
    ("device-2", include_str!("defaults/device-2.yaml")),
    ("device-3", include_str!("defaults/device-3.yaml")),
];

/// Static lookup from device identity to its baseline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultConfigCatalog {
    entries: IndexMap<FleetId, String>,
}

impl DefaultConfigCatalog {
    /// An empty catalog: every lookup yields [`NO_DEFAULT_CONFIG`].
    pub fn empty() -> Self {
        Self::default()
    }

    /// The shipped baselines for `device-1` (logs), `device-2` (metrics)
    /// and `device-3` (traces).
    pub fn builtin() -> Self {
        BUILTIN
            .into_iter()
            .map(|(id, text)| (FleetId::from(id), text.to_owned()))
            .collect()
    }

    /// Add or replace an entry. Returns the previous document, if any.
    pub fn insert(&mut self, id: impl Into<FleetId>, config: impl Into<String>) -> Option<String> {
        self.entries.insert(id.into(), config.into())
    }

    pub fn get(&self, id: &FleetId) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    /// Baseline for `id`, or the sentinel document on a miss. Never fails.
    pub fn lookup(&self, id: &FleetId) -> String {
        self.get(id).unwrap_or(NO_DEFAULT_CONFIG).to_owned()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FleetId, &str)> {
        self.entries.iter().map(|(id, text)| (id, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(FleetId, String)> for DefaultConfigCatalog {
    fn from_iter<I: IntoIterator<Item = (FleetId, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<(FleetId, String)> for DefaultConfigCatalog {
    fn extend<I: IntoIterator<Item = (FleetId, String)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_three_pipelines() {
        let catalog = DefaultConfigCatalog::builtin();
        assert_eq!(catalog.len(), 3);

        let expectations = [
            ("device-1", "    logs:"),
            ("device-2", "    metrics:"),
            ("device-3", "    traces:"),
        ];
        for (id, pipeline) in expectations {
            let text = catalog.lookup(&FleetId::from(id));
            assert!(text.contains(pipeline), "{id} should define {pipeline}");
            assert!(text.contains("endpoint: 0.0.0.0:4317"));
            assert!(text.contains("send_batch_size: 1024"));
        }
    }

    #[test]
    fn miss_yields_sentinel() {
        let catalog = DefaultConfigCatalog::builtin();
        assert_eq!(catalog.lookup(&FleetId::from("device-9")), NO_DEFAULT_CONFIG);
        assert_eq!(
            DefaultConfigCatalog::empty().lookup(&FleetId::from("device-1")),
            NO_DEFAULT_CONFIG
        );
    }

    #[test]
    fn insert_overrides_builtin() {
        let mut catalog = DefaultConfigCatalog::builtin();
        let previous = catalog.insert("device-1", "exporters: {}");
        assert!(previous.is_some());
        assert_eq!(catalog.get(&FleetId::from("device-1")), Some("exporters: {}"));
        assert_eq!(catalog.len(), 3);
    }
}
