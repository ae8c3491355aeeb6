use std::fmt;
use std::str::FromStr;

use ripemd::Ripemd160;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::{ClientError, Result};
use crate::keys::PublicKey;
use crate::payload::{base64_bytes, to_canonical_bytes};
use crate::signer::Signer;

// -- Addresses --

/// Length of a local (chain-relative) address.
pub const LOCAL_ADDRESS_LENGTH: usize = 20;

/// A 20-byte account or contract address, written as `0x`-prefixed hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalAddress([u8; LOCAL_ADDRESS_LENGTH]);

impl LocalAddress {
	/// The address the ledger assigns to a public key: RIPEMD-160 of the
	/// raw key bytes.
	pub fn from_public_key(key: &PublicKey) -> Self {
		Self(Ripemd160::digest(key.to_bytes()).into())
	}

	pub fn as_bytes(&self) -> &[u8; LOCAL_ADDRESS_LENGTH] {
		&self.0
	}
}

impl FromStr for LocalAddress {
	type Err = ClientError;

	fn from_str(s: &str) -> Result<Self> {
		let invalid = |reason: String| ClientError::InvalidAddress {
			input: s.to_owned(),
			reason,
		};
		let clean = s
			.strip_prefix("0x")
			.or_else(|| s.strip_prefix("0X"))
			.unwrap_or(s);
		let bytes = hex::decode(clean).map_err(|e| invalid(e.to_string()))?;
		let raw: [u8; LOCAL_ADDRESS_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
			invalid(format!("expected {LOCAL_ADDRESS_LENGTH} bytes, got {}", b.len()))
		})?;
		Ok(Self(raw))
	}
}

impl fmt::Display for LocalAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(self.0))
	}
}

impl fmt::Debug for LocalAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "LocalAddress({self})")
	}
}

impl Serialize for LocalAddress {
	fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
		s.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for LocalAddress {
	fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
		let s = String::deserialize(d)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

/// A local address qualified by the chain it lives on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
	pub chain_id: String,
	pub local: LocalAddress,
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.chain_id, self.local)
	}
}

// -- Transaction layers --

/// A named contract method plus its canonical argument bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
	pub method: String,
	#[serde(with = "base64_bytes")]
	pub args: Vec<u8>,
}

/// A call addressed from the caller to a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTx {
	pub from: Address,
	pub to: Address,
	#[serde(with = "base64_bytes")]
	pub data: Vec<u8>,
}

/// Replay protection for writes: `sequence` must be one past the
/// caller's current nonce on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceTx {
	#[serde(with = "base64_bytes")]
	pub inner: Vec<u8>,
	pub sequence: u64,
}

/// What actually goes over the wire.  `inner` is exactly the byte
/// sequence that `signature` covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
	#[serde(with = "base64_bytes")]
	pub inner: Vec<u8>,
	#[serde(with = "base64_bytes")]
	pub signature: Vec<u8>,
	#[serde(with = "base64_bytes")]
	pub public_key: Vec<u8>,
}

// -- Builders --

/// Frame a contract method call as canonical `MessageTx` bytes.
pub fn build_message<A: Serialize>(
	from: &Address,
	to: &Address,
	method: &str,
	args: &A,
) -> Result<Vec<u8>> {
	let call = ContractCall {
		method: method.to_owned(),
		args: to_canonical_bytes(args)?,
	};
	let msg = MessageTx {
		from: from.clone(),
		to: to.clone(),
		data: to_canonical_bytes(&call)?,
	};
	to_canonical_bytes(&msg)
}

/// Wrap message bytes with the next sequence number for the caller.
/// Returns the framed bytes and the sequence they carry.
pub fn build_nonce_tx(message: Vec<u8>, current_nonce: u64) -> Result<(Vec<u8>, u64)> {
	let sequence = current_nonce
		.checked_add(1)
		.ok_or_else(|| ClientError::MalformedResponse {
			method: "nonce".into(),
			reason: format!("nonce {current_nonce} has no successor"),
		})?;
	let bytes = to_canonical_bytes(&NonceTx {
		inner: message,
		sequence,
	})?;
	Ok((bytes, sequence))
}

/// Sign `inner` and return the canonical bytes of the signed envelope.
/// The signature is computed over the same buffer that is moved into
/// the envelope, so the two can never disagree.
pub fn sign_tx(inner: Vec<u8>, signer: &dyn Signer) -> Result<Vec<u8>> {
	let signature = signer.sign(&inner);
	to_canonical_bytes(&SignedTx {
		inner,
		signature: signature.to_bytes().to_vec(),
		public_key: signer.public_key().to_bytes().to_vec(),
	})
}

/// Hex SHA-256 of the transmitted bytes, the hash the node reports.
pub fn tx_hash(signed: &[u8]) -> String {
	hex::encode(Sha256::digest(signed))
}
