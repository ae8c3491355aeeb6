pub mod account;
pub mod config;
pub mod keygen;
pub mod state;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{Cli, Command};
use crate::config::{Config, Settings};
use crate::contract::Contract;
use crate::keys;
use crate::rpc::HttpTransport;
use crate::signer::Ed25519Signer;

/// Load the config file named on the command line (or the default one)
/// and layer the command-line overrides on top.
pub fn resolve_settings(cli: &Cli) -> Result<Settings> {
	let config = Config::load(cli.config.as_deref())?;
	Ok(Settings::resolve(config, cli.overrides()))
}

/// Resolve the contract named in `settings` and wire it to the HTTP
/// endpoints.  A bad contract address fails here, before any command
/// runs.
pub fn connect(settings: &Settings) -> Result<Contract> {
	let transport = HttpTransport::new(&settings.write_uri, &settings.read_uri, settings.timeout)
		.context("failed to set up HTTP transport")?;
	Contract::new(
		Arc::new(transport),
		&settings.chain_id,
		&settings.contract,
		&settings.contract_name,
	)
	.context("failed to resolve contract address")
}

/// Load the private key at `path` and wrap it in a signer.
pub fn load_signer(path: &Path) -> Result<Ed25519Signer> {
	let key = keys::load(path)
		.with_context(|| format!("failed to load private key from {}", path.display()))?;
	Ok(Ed25519Signer::new(key))
}

/// Settings plus the resolved contract, ready for a network command.
fn prepare(cli: &Cli) -> Result<(Settings, Contract)> {
	let settings = resolve_settings(cli)?;
	let contract = connect(&settings)?;
	Ok((settings, contract))
}

/// Dispatch a parsed command.  `config` subcommands never touch the
/// network; every other command resolves settings and the contract
/// before it does anything else.
pub async fn run(cli: &Cli) -> Result<()> {
	match &cli.command {
		Command::Config { command } => config::run(cli, command),
		Command::CreateAcct { key, data } => {
			let (settings, contract) = &prepare(cli)?;
			let created = account::create(settings, contract, key.as_deref(), data).await?;
			println!("Account created.");
			println!("  Caller: {}", created.caller);
			println!("  TX:     {} (height {})", created.receipt.hash, created.receipt.height);
			Ok(())
		}
		Command::Set { key, value } => {
			let (settings, contract) = &prepare(cli)?;
			let receipt = state::set(settings, contract, key, *value).await?;
			println!("State saved: {value}");
			println!("  TX:     {} (height {})", receipt.hash, receipt.height);
			if let Some(data) = &receipt.data {
				println!("  Result: {}", String::from_utf8_lossy(data));
			}
			Ok(())
		}
		Command::Get { key } => {
			let (settings, contract) = &prepare(cli)?;
			let state = state::get(settings, contract, key).await?;
			println!("State of {}: {}", settings.owner, state.value);
			Ok(())
		}
		Command::Genkey { key } => {
			let (_, contract) = &prepare(cli)?;
			let generated = keygen::run(contract, key)?;
			println!("Generated private key file '{}'", key.display());
			println!("  Public key: {}", generated.public.to_hex());
			println!("  Address:    {}", generated.address);
			Ok(())
		}
	}
}
