use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::{Cli, ConfigCommand};
use crate::config::{Config, Settings};

/// `init` writes defaults without reading the existing file, so it can
/// replace one that no longer parses.
pub fn run(cli: &Cli, cmd: &ConfigCommand) -> Result<()> {
	match cmd {
		ConfigCommand::Show => {
			show(&super::resolve_settings(cli)?);
			Ok(())
		}
		ConfigCommand::Init { force } => init(cli.config.as_deref(), *force),
	}
}

fn show(settings: &Settings) {
	println!("Settings");
	println!("  Write URI: {}", settings.write_uri);
	println!("  Read URI:  {}", settings.read_uri);
	println!("  Chain:     {}", settings.chain_id);
	println!("  Contract:  {} ({})", settings.contract, settings.contract_name);
	println!("  Owner:     {}", settings.owner);
	println!("  Timeout:   {}s", settings.timeout.as_secs());
}

fn init(path: Option<&Path>, force: bool) -> Result<()> {
	let path = match path {
		Some(p) => p.to_owned(),
		None => Config::default_path().context("could not determine home directory")?,
	};
	if path.exists() && !force {
		anyhow::bail!("{} already exists. Use --force to overwrite.", path.display());
	}
	Config::default().save(&path)?;
	println!("Wrote default config to {}", path.display());
	Ok(())
}
