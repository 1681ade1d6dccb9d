mod cli;
mod commands;
mod error;
mod output;
mod scenario;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::commands::OutputOpts;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // Shell completions need no configuration
    if let Command::Completions(ref args) = cli.command {
        use clap::CommandFactory;
        use clap_complete::generate;

        let mut cmd = Cli::command();
        generate(args.shell, &mut cmd, "opfleet", &mut std::io::stdout());
        return Ok(());
    }

    let path = match cli.global.config {
        Some(ref explicit) if !explicit.exists() => {
            return Err(CliError::NoConfig {
                path: explicit.display().to_string(),
            });
        }
        Some(ref explicit) => explicit.clone(),
        None => opfleet_config::config_path(),
    };
    let cfg = opfleet_config::load_config_from(&path)?;
    let out = OutputOpts::resolve(&cli.global, &cfg)?;

    tracing::debug!(config = %path.display(), format = ?out.format, "resolved settings");

    match cli.command {
        Command::Replay(args) => commands::replay::handle(args, &cfg, &out).await,
        Command::Catalog(args) => commands::catalog::handle(args, &cfg, &out),
        Command::Config(args) => commands::config_cmd::handle(args, &cfg, &path, &out),
        Command::Completions(_) => Ok(()),
    }
}
