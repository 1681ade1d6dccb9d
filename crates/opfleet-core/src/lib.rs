//! State-reconciliation and config-delivery core for an agent fleet.
//!
//! Tracks remote agents, some of which are supervisors fronting several
//! managed devices, and pushes configuration documents to individual
//! devices through their supervisor:
//!
//! - **[`Fleet`]**: facade over everything below, cheaply cloneable. The
//!   transport collaborator calls its `on_*` entry points; operator-facing
//!   callers list entities and [`push_config`](Fleet::push_config).
//!
//! - **[`FleetRegistry`]**: the authoritative in-memory store. One lock
//!   covers agents and devices; reconciliation of a supervisor's device
//!   list happens atomically under it. Snapshots are value copies and are
//!   also published through [`EntityStream`] subscriptions.
//!
//! - **[`ConfigDelivery`]**: walks device -> supervisor -> session, writes
//!   the new config, then sends a remote-config message outside the lock.
//!
//! - **[`ConnectionEventAdapter`]**: decodes raw reports into typed
//!   [`StatusReport`]s and applies them.
//!
//! - **[`Transport`]**: the one capability the core needs from the
//!   network side. [`MemoryTransport`] implements it in-process.

pub mod adapter;
pub mod catalog;
pub mod config;
pub mod delivery;
pub mod error;
pub mod fleet;
pub mod model;
pub mod store;
pub mod stream;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use adapter::ConnectionEventAdapter;
pub use catalog::{DefaultConfigCatalog, NO_DEFAULT_CONFIG};
pub use config::FleetConfig;
pub use delivery::{ConfigDelivery, DEFAULT_CONTENT_TYPE};
pub use error::CoreError;
pub use fleet::Fleet;
pub use store::{FleetRegistry, ReconcileOutcome, ReportOutcome};
pub use stream::EntityStream;
pub use transport::{MemoryTransport, SessionId, Transport, TransportError};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Agent, ConfigOrigin, ConnectionState, Device, FleetId, StatusReport, SUPERVISOR_NAME,
    UNKNOWN_AGENT_NAME,
};
