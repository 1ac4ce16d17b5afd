use anyhow::{Context, Result};
use dumpscope_runtime::{Config, resolve_config_path};

use super::args::{Cli, Commands};
use super::handlers;
use crate::logging;
use crate::presentation::ConsoleRenderer;
use crate::types::OutputFormat;

pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.log_level);

    let renderer = ConsoleRenderer::new(cli.format == OutputFormat::Json);

    match cli.command {
        Commands::Tabs => handlers::tabs::handle(&renderer),

        Commands::View(args) => {
            let config = load_config(cli.config.as_deref())?;
            handlers::view::handle(&renderer, &config, args)
        }

        Commands::Validate { paths, kind } => {
            handlers::validate::handle(&renderer, &paths, kind.map(Into::into))
        }
    }
}

fn load_config(explicit: Option<&str>) -> Result<Config> {
    let path = match resolve_config_path(explicit) {
        Ok(path) => path,
        Err(e) if explicit.is_none() => {
            tracing::debug!("{}; using defaults", e);
            return Ok(Config::default());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::debug!(path = %path.display(), "loading config");
    Config::load_from(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
