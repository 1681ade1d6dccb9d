//! Config subcommand handlers.

use std::path::Path;

use opfleet_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::OutputOpts;

pub fn handle(
    args: ConfigArgs,
    cfg: &Config,
    path: &Path,
    out: &OutputOpts,
) -> Result<(), CliError> {
    let rendered = match args.command {
        ConfigCommand::Show => match out.format {
            OutputFormat::Table | OutputFormat::Plain => {
                opfleet_config::to_toml(cfg)?.trim_end().to_owned()
            }
            structured => output::render_structured(structured, cfg)?,
        },
        ConfigCommand::Path => path.display().to_string(),
    };

    output::print_output(&rendered, out.quiet);
    Ok(())
}
