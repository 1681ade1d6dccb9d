//! Catalog command handlers.

use serde::Serialize;
use tabled::Tabled;

use opfleet_config::Config;
use opfleet_core::{DefaultConfigCatalog, FleetId};

use crate::cli::{CatalogArgs, CatalogCommand};
use crate::error::CliError;
use crate::output;

use super::OutputOpts;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct CatalogEntry {
    device: String,
    config: String,
}

#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Lines")]
    lines: usize,
    #[tabled(rename = "Bytes")]
    bytes: usize,
    #[tabled(rename = "First Line")]
    preview: String,
}

fn catalog_row(e: &CatalogEntry) -> CatalogRow {
    CatalogRow {
        device: e.device.clone(),
        lines: e.config.lines().count(),
        bytes: e.config.len(),
        preview: output::preview(&e.config, 40),
    }
}

fn entries(catalog: &DefaultConfigCatalog) -> Vec<CatalogEntry> {
    catalog
        .iter()
        .map(|(id, doc)| CatalogEntry {
            device: id.to_string(),
            config: doc.to_owned(),
        })
        .collect()
}

pub fn handle(args: CatalogArgs, cfg: &Config, out: &OutputOpts) -> Result<(), CliError> {
    let catalog = opfleet_config::build_catalog(&cfg.catalog)?;

    let rendered = match args.command {
        CatalogCommand::List => output::render_list(
            out.format,
            &entries(&catalog),
            catalog_row,
            |e| e.device.clone(),
        )?,

        CatalogCommand::Show { device } => {
            let config = catalog
                .get(&FleetId::from(device.as_str()))
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "catalog entry".into(),
                    identifier: device.clone(),
                    list_command: "catalog list".into(),
                })?;
            let entry = CatalogEntry {
                device,
                config: config.to_owned(),
            };
            output::render_single(
                out.format,
                &entry,
                |e| e.config.trim_end().to_owned(),
                |e| e.config.trim_end().to_owned(),
            )?
        }
    };

    output::print_output(&rendered, out.quiet);
    Ok(())
}
