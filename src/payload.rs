use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::Result;

/// Envelope format version understood by the contract.
pub const ENVELOPE_VERSION: u32 = 1;

/// Owner tag used when the configuration does not name one.
pub const APP_OWNER: &str = "blueprint";

/// Profile blob sent by `create-acct` when none is given.
pub const DEFAULT_ACCOUNT_DATA: &str = "my awesome profile";

// -- Envelopes --

/// Versioned, owner-tagged wrapper around opaque request data.  Built
/// fresh for every call and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
	version: u32,
	owner: String,
	#[serde(with = "base64_bytes")]
	data: Vec<u8>,
}

impl RequestEnvelope {
	pub fn version(&self) -> u32 {
		self.version
	}

	pub fn owner(&self) -> &str {
		&self.owner
	}

	pub fn data(&self) -> &[u8] {
		&self.data
	}
}

/// Identifies whose state a read should return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
	owner: String,
}

impl QueryParams {
	pub fn owner(&self) -> &str {
		&self.owner
	}
}

/// The structured document stored by `SaveState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDocument {
	#[serde(rename = "Value")]
	pub value: i64,
}

// -- Builders --

pub fn build_create_account_request(owner: &str, data: &[u8]) -> RequestEnvelope {
	RequestEnvelope {
		version: ENVELOPE_VERSION,
		owner: owner.to_owned(),
		data: data.to_vec(),
	}
}

/// Build a state update whose data field is `{"Value": value}`.
pub fn build_state_request(owner: &str, value: i64) -> Result<RequestEnvelope> {
	let data = to_canonical_bytes(&StateDocument { value })?;
	Ok(RequestEnvelope {
		version: ENVELOPE_VERSION,
		owner: owner.to_owned(),
		data,
	})
}

pub fn build_query_params(owner: &str) -> QueryParams {
	QueryParams { owner: owner.to_owned() }
}

/// Decode the data field of a state envelope (or a state query result).
pub fn decode_state(data: &[u8]) -> Result<StateDocument> {
	from_canonical_bytes(data)
}

// -- Canonical form --

/// The one serialization used for anything that gets signed.  Whatever
/// this returns is both the signed input and the transmitted bytes.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>> {
	Ok(serde_json::to_vec(value)?)
}

pub fn from_canonical_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
	Ok(serde_json::from_slice(bytes)?)
}

/// Serde adapter for byte fields: standard base64 strings on the wire.
pub(crate) mod base64_bytes {
	use base64::{engine::general_purpose::STANDARD, Engine as _};
	use serde::{de::Error, Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
		s.serialize_str(&STANDARD.encode(bytes))
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
		let encoded = String::deserialize(d)?;
		STANDARD.decode(encoded).map_err(D::Error::custom)
	}
}
