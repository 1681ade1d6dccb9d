// ── Runtime fleet configuration ──
//
// What the core needs to run, already resolved. The config crate builds
// one of these from files and environment; the core never reads disk.

use crate::catalog::DefaultConfigCatalog;
use crate::delivery::DEFAULT_CONTENT_TYPE;

/// Configuration for a [`Fleet`](crate::Fleet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetConfig {
    /// Baselines for first-seen devices.
    pub catalog: DefaultConfigCatalog,
    /// Content type attached to pushed configuration documents.
    pub content_type: String,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            catalog: DefaultConfigCatalog::builtin(),
            content_type: DEFAULT_CONTENT_TYPE.into(),
        }
    }
}
