use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Overrides;
use crate::keys::DEFAULT_KEY_FILE;
use crate::payload::DEFAULT_ACCOUNT_DATA;

#[derive(Parser)]
#[command(
	name = "blueprint",
	about = "Signed contract calls and state queries against a ledger contract.",
	version
)]
pub struct Cli {
	/// URI for sending transactions.
	#[arg(short, long = "write", global = true)]
	pub write: Option<String>,

	/// URI for querying contract state.
	#[arg(short, long = "read", global = true)]
	pub read: Option<String>,

	/// Contract address (20 bytes, hex).
	#[arg(long, global = true)]
	pub contract: Option<String>,

	/// Chain ID of the target network.
	#[arg(long = "chain", global = true)]
	pub chain: Option<String>,

	/// Config file to use instead of ~/.blueprint/config.toml.
	#[arg(long, global = true)]
	pub config: Option<PathBuf>,

	/// Log request framing and dispatch to stderr.
	#[arg(long, global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

impl Cli {
	pub fn overrides(&self) -> Overrides {
		Overrides {
			write_uri: self.write.clone(),
			read_uri: self.read.clone(),
			contract: self.contract.clone(),
			chain_id: self.chain.clone(),
		}
	}
}

#[derive(Subcommand)]
pub enum Command {
	/// Create an account used to store data.
	#[command(name = "create-acct")]
	CreateAcct {
		/// Private key file. A throwaway key is used when omitted.
		#[arg(short, long)]
		key: Option<PathBuf>,

		/// Profile data stored with the account.
		#[arg(long, default_value = DEFAULT_ACCOUNT_DATA)]
		data: String,
	},

	/// Set the state.
	Set {
		/// Private key file.
		#[arg(short, long, default_value = DEFAULT_KEY_FILE)]
		key: PathBuf,

		/// Integer value.
		#[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
		value: i64,
	},

	/// Get the state.
	Get {
		/// Private key file.
		#[arg(short, long, default_value = DEFAULT_KEY_FILE)]
		key: PathBuf,
	},

	/// Generate a public and private key pair.
	Genkey {
		/// Private key file to write.
		#[arg(short, long, default_value = DEFAULT_KEY_FILE)]
		key: PathBuf,
	},

	/// Inspect or initialise the config file.
	Config {
		#[command(subcommand)]
		command: ConfigCommand,
	},
}

// -- Config subcommands --

#[derive(Subcommand)]
pub enum ConfigCommand {
	/// Show the settings this invocation would use.
	Show,

	/// Write a config file with default values.
	Init {
		/// Overwrite an existing file.
		#[arg(long)]
		force: bool,
	},
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn cli_definition_is_valid() {
		Cli::command().debug_assert();
	}

	#[test]
	fn set_parses_key_and_negative_value() {
		let cli = Cli::parse_from(["blueprint", "set", "-k", "my_key", "--value", "-42"]);
		match cli.command {
			Command::Set { key, value } => {
				assert_eq!(key, PathBuf::from("my_key"));
				assert_eq!(value, -42);
			}
			_ => panic!("expected set"),
		}
	}

	#[test]
	fn short_v_is_value_and_verbose_is_long_only() {
		let cli = Cli::parse_from(["blueprint", "--verbose", "set", "-v", "7"]);
		assert!(cli.verbose);
		assert!(matches!(cli.command, Command::Set { value: 7, .. }));

		assert!(Cli::try_parse_from(["blueprint", "-v", "get"]).is_err());
	}

	#[test]
	fn key_defaults_to_priv_key() {
		let cli = Cli::parse_from(["blueprint", "get"]);
		match cli.command {
			Command::Get { key } => assert_eq!(key, PathBuf::from("priv_key")),
			_ => panic!("expected get"),
		}
	}

	#[test]
	fn global_flags_become_overrides() {
		let cli = Cli::parse_from([
			"blueprint", "genkey", "-w", "http://w:1", "--read", "http://r:2", "--chain", "c1",
			"--contract", "0xabc",
		]);
		let o = cli.overrides();
		assert_eq!(o.write_uri.as_deref(), Some("http://w:1"));
		assert_eq!(o.read_uri.as_deref(), Some("http://r:2"));
		assert_eq!(o.chain_id.as_deref(), Some("c1"));
		assert_eq!(o.contract.as_deref(), Some("0xabc"));
	}

	#[test]
	fn create_acct_uses_default_profile() {
		let cli = Cli::parse_from(["blueprint", "create-acct"]);
		match cli.command {
			Command::CreateAcct { key, data } => {
				assert!(key.is_none());
				assert_eq!(data, "my awesome profile");
			}
			_ => panic!("expected create-acct"),
		}
	}
}
