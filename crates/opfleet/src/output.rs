//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use opfleet_core::ConnectionState;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Connection state label, green/red when color is on.
pub fn state_label(state: ConnectionState, color: bool) -> String {
    let label = state.to_string();
    match (color, state) {
        (false, _) => label,
        (true, ConnectionState::Connected) => label.green().to_string(),
        (true, ConnectionState::Disconnected) => label.red().to_string(),
    }
}

/// Section heading for multi-table output.
pub fn heading(text: &str, color: bool) -> String {
    if color {
        text.bold().to_string()
    } else {
        text.to_owned()
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the items via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Plain => Ok(data.iter().map(&id_fn).collect::<Vec<_>>().join("\n")),
        structured => render_structured(structured, data),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted
/// string, since single-item views don't use the `Tabled` derive.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Plain => Ok(id_fn(data)),
        structured => render_structured(structured, data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// JSON (pretty or compact) or YAML. Table and plain have no serde form.
pub fn render_structured<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(data).map_err(|e| render_err("json", e)),
        OutputFormat::JsonCompact => serde_json::to_string(data).map_err(|e| render_err("json", e)),
        OutputFormat::Yaml => serde_yaml::to_string(data).map_err(|e| render_err("yaml", e)),
        OutputFormat::Table | OutputFormat::Plain => {
            return Err(CliError::Render {
                format: "structured",
                reason: format!("{format:?} is not a structured format"),
            });
        }
    }?;
    Ok(rendered.trim_end().to_owned())
}

fn render_err(format: &'static str, e: impl std::fmt::Display) -> CliError {
    CliError::Render {
        format,
        reason: e.to_string(),
    }
}

/// First line of a document, shortened for table cells.
pub fn preview(doc: &str, width: usize) -> String {
    let first = doc.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    if first.chars().count() <= width {
        first.to_owned()
    } else {
        let cut: String = first.chars().take(width.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
