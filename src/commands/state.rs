use std::path::Path;

use anyhow::{Context, Result};

use crate::commands::load_signer;
use crate::config::Settings;
use crate::contract::{Contract, GetStateRequest, SaveStateRequest, StateResponse, TxReceipt};

/// Store `value` as the owner's state.
pub async fn set(settings: &Settings, contract: &Contract, key: &Path, value: i64) -> Result<TxReceipt> {
	let signer = load_signer(key)?;
	let request = SaveStateRequest::new(&settings.owner, value)
		.context("value could not be encoded as a state document")?;
	contract
		.call(&request, &signer)
		.await
		.context("SaveState call failed")
}

/// Read the owner's current state.  The query is signed with the same
/// key used for writes.
pub async fn get(settings: &Settings, contract: &Contract, key: &Path) -> Result<StateResponse> {
	let signer = load_signer(key)?;
	let request = GetStateRequest::new(&settings.owner);
	contract
		.call(&request, &signer)
		.await
		.context("GetState query failed")
}
