//! Replay command: drive a scenario through a `Fleet` over `MemoryTransport`.

use std::collections::HashMap;

use serde::Serialize;
use tabled::Tabled;
use tracing::{debug, info};

use opfleet_config::Config;
use opfleet_core::{Agent, CoreError, Device, Fleet, FleetId, MemoryTransport, SessionId};

use crate::cli::{OutputFormat, ReplayArgs};
use crate::error::CliError;
use crate::output;
use crate::scenario::{self, Step};

use super::OutputOpts;

// ── Result model ────────────────────────────────────────────────────

/// Outcome of one `push` step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushRecord {
    pub step: usize,
    pub device: String,
    /// `delivered`, or the error kind.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PushRecord {
    fn new(step: usize, device: &str, result: &Result<(), CoreError>) -> Self {
        let (outcome, error) = match result {
            Ok(()) => ("delivered".to_owned(), None),
            Err(e) => (e.kind().to_owned(), Some(e.to_string())),
        };
        Self {
            step,
            device: device.to_owned(),
            outcome,
            error,
        }
    }
}

/// Everything a replay prints.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub pushes: Vec<PushRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agents: Option<Vec<Agent>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<Device>>,
}

// ── Player ──────────────────────────────────────────────────────────

/// Plays scenario steps against one fleet, mapping session labels to
/// transport sessions.
pub struct Player {
    fleet: Fleet<MemoryTransport>,
    transport: MemoryTransport,
    content_type: String,
    sessions: HashMap<String, SessionId>,
}

impl Player {
    pub fn new(cfg: &Config) -> Result<Self, CliError> {
        let fleet_config = opfleet_config::to_fleet_config(cfg)?;
        let content_type = fleet_config.content_type.clone();
        let transport = MemoryTransport::new();

        Ok(Self {
            fleet: Fleet::new(fleet_config, transport.clone()),
            transport,
            content_type,
            sessions: HashMap::new(),
        })
    }

    pub fn fleet(&self) -> &Fleet<MemoryTransport> {
        &self.fleet
    }

    /// Apply one step. Returns the push outcome for `push` steps.
    pub async fn play(
        &mut self,
        index: usize,
        step: &Step,
    ) -> Result<Option<Result<(), CoreError>>, CliError> {
        debug!(step = index, kind = step.kind(), "replaying step");

        match step {
            Step::Connect { session } => {
                let id = self.transport.open_session();
                self.fleet.on_connected(id);
                if let Some(previous) = self.sessions.insert(session.clone(), id) {
                    debug!(label = %session, %previous, "label rebound to a new session");
                }
            }
            Step::Report(report) => {
                let id = self.session_or_connect(&report.session);
                let message = report.to_message(&self.content_type);
                let ack = self.fleet.on_report_received(id, &message).await;
                debug!(session = %id, acked = ack.is_ack(), "report acknowledged");
            }
            Step::Push { device, config } => {
                let result = self
                    .fleet
                    .push_config(&FleetId::from(device.as_str()), config.as_str())
                    .await;
                return Ok(Some(result));
            }
            Step::Drop { session } => {
                let id = self.known_session(index, session)?;
                self.transport.close_session(id);
            }
            Step::Disconnect { session } => {
                let id = self.known_session(index, session)?;
                self.transport.close_session(id);
                self.fleet.on_connection_closed(id).await;
                self.sessions.remove(session);
            }
        }
        Ok(None)
    }

    fn session_or_connect(&mut self, label: &str) -> SessionId {
        if let Some(&id) = self.sessions.get(label) {
            return id;
        }
        let id = self.transport.open_session();
        self.fleet.on_connected(id);
        self.sessions.insert(label.to_owned(), id);
        id
    }

    fn known_session(&self, index: usize, label: &str) -> Result<SessionId, CliError> {
        self.sessions
            .get(label)
            .copied()
            .ok_or_else(|| CliError::Validation {
                field: format!("step {index}"),
                reason: format!("session '{label}' is not connected"),
            })
    }
}

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PushRow {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Error")]
    error: String,
}

#[derive(Tabled)]
struct AgentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Supervisor")]
    supervisor: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Devices")]
    devices: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Supervisor")]
    supervisor: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Origin")]
    origin: String,
    #[tabled(rename = "Config")]
    config: String,
}

fn push_row(p: &PushRecord) -> PushRow {
    PushRow {
        step: p.step,
        device: p.device.clone(),
        outcome: p.outcome.clone(),
        error: p.error.clone().unwrap_or_default(),
    }
}

fn agent_row(a: &Agent, color: bool) -> AgentRow {
    AgentRow {
        id: a.id.to_string(),
        name: a.name.clone(),
        supervisor: if a.is_supervisor { "yes" } else { "" }.into(),
        state: output::state_label(a.state, color),
        devices: a
            .devices
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        last_seen: a.last_seen.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

fn device_row(d: &Device, color: bool) -> DeviceRow {
    DeviceRow {
        id: d.id.to_string(),
        supervisor: d.supervisor_id.to_string(),
        state: output::state_label(d.state, color),
        origin: d.config_origin.to_string(),
        config: output::preview(&d.config, 40),
    }
}

// ── Rendering ───────────────────────────────────────────────────────

fn render(report: &ReplayReport, out: &OutputOpts) -> Result<String, CliError> {
    match out.format {
        OutputFormat::Table => Ok(render_tables(report, out.color)),
        OutputFormat::Plain => Ok(render_plain(report)),
        structured => output::render_structured(structured, report),
    }
}

fn render_tables(report: &ReplayReport, color: bool) -> String {
    let mut sections = Vec::new();

    if !report.pushes.is_empty() {
        let rows: Vec<_> = report.pushes.iter().map(push_row).collect();
        sections.push(format!(
            "{}\n{}",
            output::heading("Pushes", color),
            output::render_table(&rows)
        ));
    }
    if let Some(ref agents) = report.agents {
        let rows: Vec<_> = agents.iter().map(|a| agent_row(a, color)).collect();
        sections.push(format!(
            "{}\n{}",
            output::heading("Agents", color),
            output::render_table(&rows)
        ));
    }
    if let Some(ref devices) = report.devices {
        let rows: Vec<_> = devices.iter().map(|d| device_row(d, color)).collect();
        sections.push(format!(
            "{}\n{}",
            output::heading("Devices", color),
            output::render_table(&rows)
        ));
    }

    sections.join("\n\n")
}

fn render_plain(report: &ReplayReport) -> String {
    let pushes = report
        .pushes
        .iter()
        .map(|p| format!("{}\t{}", p.device, p.outcome));
    let agents = report.agents.iter().flatten().map(|a| a.id.to_string());
    let devices = report
        .devices
        .iter()
        .flatten()
        .map(|d| format!("{}\t{}", d.id, d.state));

    pushes.chain(agents).chain(devices).collect::<Vec<_>>().join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ReplayArgs, cfg: &Config, out: &OutputOpts) -> Result<(), CliError> {
    let scenario = scenario::load(&args.file)?;
    let mut player = Player::new(cfg)?;
    let mut pushes = Vec::new();

    for (i, step) in scenario.steps.iter().enumerate() {
        let index = i + 1;
        let Some(result) = player.play(index, step).await? else {
            continue;
        };
        if let Step::Push { device, .. } = step {
            let record = PushRecord::new(index, device, &result);
            info!(step = index, %device, outcome = %record.outcome, "push finished");
            pushes.push(record);
        }
        if args.strict {
            result?;
        }
    }

    let report = ReplayReport {
        pushes,
        agents: if args.show.agents() {
            Some(player.fleet().list_agents().await)
        } else {
            None
        },
        devices: if args.show.devices() {
            Some(player.fleet().list_devices().await)
        } else {
            None
        },
    };

    output::print_output(&render(&report, out)?, out.quiet);
    Ok(())
}
