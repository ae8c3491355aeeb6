use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::payload::APP_OWNER;

pub const DEFAULT_WRITE_URI: &str = "http://localhost:46657";
pub const DEFAULT_READ_URI: &str = "http://localhost:9999";
pub const DEFAULT_CONTRACT: &str = "0x005B17864f3adbF53b1384F2E6f2120c6652F779";
pub const DEFAULT_CHAIN_ID: &str = "default";
pub const DEFAULT_CONTRACT_NAME: &str = "blueprint";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	pub network: NetworkConfig,
	pub contract: ContractConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
	pub write_uri: String,
	pub read_uri: String,
	pub chain_id: String,
	pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
	pub address: String,
	pub name: String,
	pub owner: String,
}

impl Default for NetworkConfig {
	fn default() -> Self {
		Self {
			write_uri: DEFAULT_WRITE_URI.into(),
			read_uri: DEFAULT_READ_URI.into(),
			chain_id: DEFAULT_CHAIN_ID.into(),
			timeout_secs: DEFAULT_TIMEOUT_SECS,
		}
	}
}

impl Default for ContractConfig {
	fn default() -> Self {
		Self {
			address: DEFAULT_CONTRACT.into(),
			name: DEFAULT_CONTRACT_NAME.into(),
			owner: APP_OWNER.into(),
		}
	}
}

impl Config {
	/// Directory where CLI state is stored (~/.blueprint/).
	pub fn dir() -> Option<PathBuf> {
		dirs::home_dir().map(|home| home.join(".blueprint"))
	}

	/// Default path of the config file.
	pub fn default_path() -> Option<PathBuf> {
		Self::dir().map(|d| d.join("config.toml"))
	}

	/// Load config from `path`, or from the default location when `path`
	/// is `None`.  A missing file yields the defaults.
	pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
		let path = match path.map(Path::to_owned).or_else(Self::default_path) {
			Some(p) => p,
			None => return Ok(Self::default()),
		};
		if !path.exists() {
			return Ok(Self::default());
		}
		let content = std::fs::read_to_string(&path)
			.with_context(|| format!("reading config {}", path.display()))?;
		let config: Self =
			toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
		config
			.validate()
			.with_context(|| format!("invalid config {}", path.display()))?;
		Ok(config)
	}

	/// Reject values that parse but cannot work.
	pub fn validate(&self) -> anyhow::Result<()> {
		anyhow::ensure!(
			self.network.timeout_secs > 0,
			"network.timeout_secs must be greater than 0"
		);
		Ok(())
	}

	/// Persist the config to `path`, creating the directory if needed.
	pub fn save(&self, path: &Path) -> anyhow::Result<()> {
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, toml::to_string_pretty(self)?)?;
		Ok(())
	}
}

/// Per-invocation values taken from the command line.  `None` means
/// "use the config file".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
	pub write_uri: Option<String>,
	pub read_uri: Option<String>,
	pub contract: Option<String>,
	pub chain_id: Option<String>,
}

/// Fully resolved settings handed to every command.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
	pub write_uri: String,
	pub read_uri: String,
	pub contract: String,
	pub chain_id: String,
	pub contract_name: String,
	pub owner: String,
	pub timeout: Duration,
}

impl Settings {
	/// Command-line values win over the config file.
	pub fn resolve(config: Config, overrides: Overrides) -> Self {
		Self {
			write_uri: overrides.write_uri.unwrap_or(config.network.write_uri),
			read_uri: overrides.read_uri.unwrap_or(config.network.read_uri),
			contract: overrides.contract.unwrap_or(config.contract.address),
			chain_id: overrides.chain_id.unwrap_or(config.network.chain_id),
			contract_name: config.contract.name,
			owner: config.contract.owner,
			timeout: Duration::from_secs(config.network.timeout_secs),
		}
	}
}
