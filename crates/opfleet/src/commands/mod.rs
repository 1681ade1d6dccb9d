//! Command dispatch: bridges CLI args -> fleet operations -> output formatting.

pub mod catalog;
pub mod config_cmd;
pub mod replay;

use clap::ValueEnum;

use opfleet_config::Config;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Output settings after merging flags over the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOpts {
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
}

impl OutputOpts {
    /// Flags win; otherwise `[defaults]` from the config applies.
    pub fn resolve(global: &GlobalOpts, cfg: &Config) -> Result<Self, CliError> {
        let format = match global.output {
            Some(format) => format,
            None => parse_setting::<OutputFormat>("defaults.output", &cfg.defaults.output)?,
        };
        let color = match global.color {
            Some(mode) => mode,
            None => parse_setting::<ColorMode>("defaults.color", &cfg.defaults.color)?,
        };

        Ok(Self {
            format,
            color: output::should_color(color),
            quiet: global.quiet,
        })
    }
}

fn parse_setting<T: ValueEnum>(field: &str, raw: &str) -> Result<T, CliError> {
    T::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}
