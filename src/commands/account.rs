use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::commands::load_signer;
use crate::config::Settings;
use crate::contract::{Contract, CreateAccountRequest, TxReceipt};
use crate::keys;
use crate::signer::Ed25519Signer;
use crate::tx_builder::Address;

#[derive(Debug)]
pub struct CreatedAccount {
	pub caller: Address,
	pub receipt: TxReceipt,
}

/// Register an account holding `data`.  Without a key file the call is
/// signed by a throwaway key that is dropped afterwards.
pub async fn create(
	settings: &Settings,
	contract: &Contract,
	key: Option<&Path>,
	data: &str,
) -> Result<CreatedAccount> {
	let signer = match key {
		Some(path) => load_signer(path)?,
		None => {
			debug!("no key file given, signing with a one-off key");
			let kp = keys::generate().context("failed to generate one-off key")?;
			Ed25519Signer::new(kp.private)
		}
	};

	let request = CreateAccountRequest::new(&settings.owner, data.as_bytes());
	let receipt = contract
		.call(&request, &signer)
		.await
		.context("CreateAccount call failed")?;

	Ok(CreatedAccount {
		caller: contract.caller_address(&signer),
		receipt,
	})
}
