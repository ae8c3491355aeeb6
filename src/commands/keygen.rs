use std::path::Path;

use anyhow::{Context, Result};

use crate::contract::Contract;
use crate::keys::{self, PublicKey};
use crate::tx_builder::{Address, LocalAddress};

pub struct GeneratedKey {
	pub public: PublicKey,
	pub address: Address,
}

/// Generate a keypair and write the private half to `path`.
pub fn run(contract: &Contract, path: &Path) -> Result<GeneratedKey> {
	let kp = keys::generate().context("error generating key pair")?;
	keys::save(&kp.private, path).context("unable to write private key file")?;

	Ok(GeneratedKey {
		address: Address {
			chain_id: contract.chain_id().to_owned(),
			local: LocalAddress::from_public_key(&kp.public),
		},
		public: kp.public,
	})
}
