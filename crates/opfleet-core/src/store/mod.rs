// ── Fleet registry ──
//
// Single-lock storage for agents and devices with snapshot broadcasting.

mod reconcile;
pub(crate) mod registry;
pub(crate) mod state;

pub use reconcile::ReconcileOutcome;
pub use registry::{FleetRegistry, ReportOutcome};
