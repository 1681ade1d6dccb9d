//! Shared configuration for the opfleet CLI.
//!
//! TOML file + `OPFLEET_*` environment, layered with figment, and
//! translation to `opfleet_core::FleetConfig`. The core never touches
//! disk; everything file-shaped is resolved here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use opfleet_core::{DEFAULT_CONTENT_TYPE, DefaultConfigCatalog, FleetConfig, FleetId};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Output defaults for the CLI.
    #[serde(default)]
    pub defaults: Defaults,

    /// Remote-config delivery settings.
    #[serde(default)]
    pub delivery: Delivery,

    /// Baseline documents for first-seen devices.
    #[serde(default)]
    pub catalog: CatalogSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Delivery {
    /// Content type attached to pushed documents.
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

impl Default for Delivery {
    fn default() -> Self {
        Self {
            content_type: default_content_type(),
        }
    }
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogSection {
    /// Start from the shipped device-1/2/3 documents.
    #[serde(default = "default_true")]
    pub builtin: bool,

    /// Directory of `<device-id>.yaml` files, applied over the built-ins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Inline documents keyed by device id. Applied last.
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            builtin: true,
            dir: None,
            entries: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "opfleet", "opfleet").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("opfleet");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// A missing file is not an error; defaults and environment still apply.
/// Nested keys use a double underscore: `OPFLEET_DELIVERY__CONTENT_TYPE`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("OPFLEET_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Render a Config back to TOML.
pub fn to_toml(cfg: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(cfg)?)
}

// ── Translation to the core ─────────────────────────────────────────

/// Build the catalog: built-ins (if enabled), then `dir`, then inline entries.
pub fn build_catalog(section: &CatalogSection) -> Result<DefaultConfigCatalog, ConfigError> {
    let mut catalog = if section.builtin {
        DefaultConfigCatalog::builtin()
    } else {
        DefaultConfigCatalog::empty()
    };

    if let Some(ref dir) = section.dir {
        catalog.extend(read_catalog_dir(dir)?);
    }

    catalog.extend(
        section
            .entries
            .iter()
            .map(|(id, doc)| (FleetId::from(id.as_str()), doc.clone())),
    );

    Ok(catalog)
}

/// Read every `*.yaml` / `*.yml` file in `dir`, keyed by file stem, in
/// file-name order.
fn read_catalog_dir(dir: &Path) -> Result<Vec<(FleetId, String)>, ConfigError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ConfigError::Io { path, source }
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err(dir))? {
        let path = entry.map_err(io_err(dir))?.path();
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "yaml" || e == "yml");
        if is_yaml && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let doc = std::fs::read_to_string(&path).map_err(io_err(&path))?;
        docs.push((FleetId::from(id), doc));
    }
    Ok(docs)
}

/// Build the core's runtime `FleetConfig`.
pub fn to_fleet_config(cfg: &Config) -> Result<FleetConfig, ConfigError> {
    let content_type = cfg.delivery.content_type.trim();
    if content_type.is_empty() {
        return Err(ConfigError::Validation {
            field: "delivery.content_type".into(),
            reason: "must not be empty".into(),
        });
    }

    Ok(FleetConfig {
        catalog: build_catalog(&cfg.catalog)?,
        content_type: content_type.to_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use opfleet_core::NO_DEFAULT_CONFIG;

    use super::*;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.delivery.content_type, "text/yaml");
        assert!(config.catalog.builtin);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "config.toml",
            r#"
[defaults]
output = "json"

[delivery]
content_type = "application/yaml"

[catalog]
builtin = false

[catalog.entries]
edge-7 = "receivers: {}\n"
"#,
        );

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.defaults.output, "json");
        assert_eq!(config.defaults.color, "auto");
        assert_eq!(config.delivery.content_type, "application/yaml");
        assert!(!config.catalog.builtin);
        assert_eq!(config.catalog.entries["edge-7"], "receivers: {}\n");
    }

    #[test]
    fn environment_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[delivery]\ncontent_type = \"text/plain\"\n")?;
            jail.set_env("OPFLEET_DELIVERY__CONTENT_TYPE", "application/x-yaml");
            jail.set_env("OPFLEET_DEFAULTS__COLOR", "never");

            let config = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.delivery.content_type, "application/x-yaml");
            assert_eq!(config.defaults.color, "never");
            Ok(())
        });
    }

    #[test]
    fn catalog_layers_builtin_dir_and_entries() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "device-1.yaml", "from: dir\n");
        write(dir.path(), "edge-9.yml", "edge: true\n");
        write(dir.path(), "README.md", "ignored");

        let section = CatalogSection {
            builtin: true,
            dir: Some(dir.path().to_path_buf()),
            entries: BTreeMap::from([("edge-9".to_owned(), "inline: true\n".to_owned())]),
        };
        let catalog = build_catalog(&section).unwrap();

        assert_eq!(catalog.get(&FleetId::from("device-1")), Some("from: dir\n"));
        assert_eq!(catalog.get(&FleetId::from("edge-9")), Some("inline: true\n"));
        assert!(catalog.get(&FleetId::from("device-2")).is_some());
        assert!(catalog.get(&FleetId::from("README")).is_none());
    }

    #[test]
    fn builtin_can_be_disabled() {
        let section = CatalogSection {
            builtin: false,
            ..CatalogSection::default()
        };
        let catalog = build_catalog(&section).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.lookup(&FleetId::from("device-1")), NO_DEFAULT_CONFIG);
    }

    #[test]
    fn missing_catalog_dir_is_an_io_error() {
        let section = CatalogSection {
            dir: Some(PathBuf::from("/nonexistent/opfleet/catalog")),
            ..CatalogSection::default()
        };
        let err = build_catalog(&section).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn empty_content_type_is_rejected() {
        let mut config = Config::default();
        config.delivery.content_type = "  ".into();

        let err = to_fleet_config(&config).unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation { ref field, .. } if field == "delivery.content_type")
        );
    }

    #[test]
    fn defaults_translate_to_core_defaults() {
        let fleet = to_fleet_config(&Config::default()).unwrap();
        assert_eq!(fleet, FleetConfig::default());
    }

    #[test]
    fn config_renders_as_toml() {
        let rendered = to_toml(&Config::default()).unwrap();
        assert!(rendered.contains("[delivery]"));
        assert!(rendered.contains("content_type = \"text/yaml\""));
    }
}
