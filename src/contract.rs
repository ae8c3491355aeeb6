use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::payload::{self, base64_bytes, QueryParams, RequestEnvelope};
use crate::rpc::Transport;
use crate::signer::Signer;
use crate::tx_builder::{self, Address, LocalAddress};

/// Which of the two remote endpoints a method goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
	/// State-changing transactions, committed to the ledger.
	Write,
	/// Read-only queries against current state.
	Read,
}

mod sealed {
	pub trait Sealed {}
}

/// A contract method the client knows how to route and whose answer it
/// knows how to decode.  The set is closed: only the request types in
/// this module implement it.
pub trait ContractMethod: sealed::Sealed + Serialize {
	const NAME: &'static str;
	const CHANNEL: Channel;
	type Response;

	fn decode(raw: Value) -> Result<Self::Response>;
}

// -- Requests --

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CreateAccountRequest(RequestEnvelope);

impl CreateAccountRequest {
	pub fn new(owner: &str, data: &[u8]) -> Self {
		Self(payload::build_create_account_request(owner, data))
	}

	pub fn envelope(&self) -> &RequestEnvelope {
		&self.0
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SaveStateRequest(RequestEnvelope);

impl SaveStateRequest {
	pub fn new(owner: &str, value: i64) -> Result<Self> {
		payload::build_state_request(owner, value).map(Self)
	}

	pub fn envelope(&self) -> &RequestEnvelope {
		&self.0
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GetStateRequest(QueryParams);

impl GetStateRequest {
	pub fn new(owner: &str) -> Self {
		Self(payload::build_query_params(owner))
	}

	pub fn params(&self) -> &QueryParams {
		&self.0
	}
}

impl sealed::Sealed for CreateAccountRequest {}
impl sealed::Sealed for SaveStateRequest {}
impl sealed::Sealed for GetStateRequest {}

impl ContractMethod for CreateAccountRequest {
	const NAME: &'static str = "CreateAccount";
	const CHANNEL: Channel = Channel::Write;
	type Response = TxReceipt;

	fn decode(raw: Value) -> Result<TxReceipt> {
		TxReceipt::decode(Self::NAME, &raw)
	}
}

impl ContractMethod for SaveStateRequest {
	const NAME: &'static str = "SaveState";
	const CHANNEL: Channel = Channel::Write;
	type Response = TxReceipt;

	fn decode(raw: Value) -> Result<TxReceipt> {
		TxReceipt::decode(Self::NAME, &raw)
	}
}

impl ContractMethod for GetStateRequest {
	const NAME: &'static str = "GetState";
	const CHANNEL: Channel = Channel::Read;
	type Response = StateResponse;

	fn decode(raw: Value) -> Result<StateResponse> {
		StateResponse::decode(Self::NAME, &raw)
	}
}

// -- Responses --

/// Outcome of a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
	pub hash: String,
	pub height: u64,
	/// Raw `data` returned by the contract, if any.
	pub data: Option<Vec<u8>>,
}

impl TxReceipt {
	/// Decode a `broadcast_tx_commit` result.  A non-zero code in either
	/// the check or the deliver phase is a rejection; the phase object is
	/// handed back as-is.
	fn decode(method: &str, raw: &Value) -> Result<Self> {
		let malformed = |reason: &str| ClientError::MalformedResponse {
			method: method.to_owned(),
			reason: reason.to_owned(),
		};

		for phase in ["check_tx", "deliver_tx"] {
			if let Some(res) = raw.get(phase) {
				// An absent code means success; anything present must be a
				// non-negative integer.
				let code = match res.get("code") {
					None | Some(Value::Null) => 0,
					Some(v) => v
						.as_u64()
						.ok_or_else(|| malformed(&format!("{phase}.code is not an unsigned integer: {v}")))?,
				};
				if code != 0 {
					return Err(ClientError::RemoteRejection {
						method: method.to_owned(),
						payload: res.clone(),
					});
				}
			}
		}

		let hash = raw
			.get("hash")
			.and_then(Value::as_str)
			.ok_or_else(|| malformed("missing transaction hash"))?
			.to_owned();

		let height = match raw.get("height") {
			Some(Value::Number(n)) => n.as_u64(),
			Some(Value::String(s)) => s.parse().ok(),
			_ => None,
		}
		.ok_or_else(|| malformed("missing or invalid block height"))?;

		let data = match raw.pointer("/deliver_tx/data").and_then(Value::as_str) {
			Some(s) if !s.is_empty() => Some(
				STANDARD
					.decode(s)
					.map_err(|e| malformed(&format!("deliver_tx.data is not base64: {e}")))?,
			),
			_ => None,
		};

		Ok(Self { hash, height, data })
	}
}

/// The stored state for an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateResponse {
	pub value: i64,
}

/// Body of a `GetState` answer: the stored state document, base64.
#[derive(Debug, Serialize, Deserialize)]
pub struct StateQueryResult {
	#[serde(with = "base64_bytes")]
	pub state: Vec<u8>,
}

impl StateResponse {
	/// The read endpoint returns base64 of the contract's answer, which
	/// is a [`StateQueryResult`].
	fn decode(method: &str, raw: &Value) -> Result<Self> {
		let malformed = |reason: String| ClientError::MalformedResponse {
			method: method.to_owned(),
			reason,
		};

		let encoded = raw
			.as_str()
			.ok_or_else(|| malformed(format!("expected base64 string, got {raw}")))?;
		let bytes = STANDARD
			.decode(encoded)
			.map_err(|e| malformed(format!("result is not base64: {e}")))?;
		let result: StateQueryResult = payload::from_canonical_bytes(&bytes)
			.map_err(|e| malformed(format!("unexpected query result: {e}")))?;
		let doc = payload::decode_state(&result.state)
			.map_err(|e| malformed(format!("unexpected state document: {e}")))?;

		Ok(Self { value: doc.value })
	}
}

// -- Contract handle --

/// A resolved contract on a specific chain, plus the transport used to
/// reach it.  Address and chain never change after construction.
#[derive(Clone)]
pub struct Contract {
	transport: Arc<dyn Transport>,
	address: Address,
	name: String,
}

impl Contract {
	/// Resolve `contract_hex` on `chain_id`.  Fails here, never later in
	/// [`Contract::call`], if the address does not decode to 20 bytes.
	pub fn new(
		transport: Arc<dyn Transport>,
		chain_id: &str,
		contract_hex: &str,
		name: &str,
	) -> Result<Self> {
		let local: LocalAddress = contract_hex.parse()?;
		Ok(Self {
			transport,
			address: Address {
				chain_id: chain_id.to_owned(),
				local,
			},
			name: name.to_owned(),
		})
	}

	pub fn address(&self) -> &Address {
		&self.address
	}

	pub fn chain_id(&self) -> &str {
		&self.address.chain_id
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// The caller address a signer acts as on this contract's chain.
	pub fn caller_address(&self, signer: &dyn Signer) -> Address {
		Address {
			chain_id: self.address.chain_id.clone(),
			local: LocalAddress::from_public_key(&signer.public_key()),
		}
	}

	/// Sign `request` and send it to the channel its method belongs to.
	///
	/// Writes are wrapped with the caller's next nonce and committed on
	/// the write channel.  Reads are signed too and sent as a query on
	/// the read channel.  Nothing is retried: a failed write may or may
	/// not have executed, and resubmitting it could execute it twice.
	pub async fn call<M: ContractMethod>(&self, request: &M, signer: &dyn Signer) -> Result<M::Response> {
		let caller = self.caller_address(signer);
		let message = tx_builder::build_message(&caller, &self.address, M::NAME, request)?;
		debug!(method = M::NAME, %caller, contract = %self.address, "framed contract call");

		let raw = match M::CHANNEL {
			Channel::Write => {
				let nonce = self
					.transport
					.nonce(&signer.public_key().to_hex())
					.await
					.map_err(|e| retag(e, M::NAME))?;
				let (framed, sequence) = tx_builder::build_nonce_tx(message, nonce)?;
				let signed = tx_builder::sign_tx(framed, signer)?;
				info!(
					method = M::NAME,
					contract = %self.address,
					sequence,
					tx_hash = %tx_builder::tx_hash(&signed),
					"broadcasting transaction"
				);
				self.transport.broadcast_tx(&signed).await
			}
			Channel::Read => {
				let signed = tx_builder::sign_tx(message, signer)?;
				info!(method = M::NAME, contract = %self.address, "querying contract state");
				self.transport
					.query(&caller.to_string(), &self.address.local, &signed)
					.await
			}
		}
		.map_err(|e| retag(e, M::NAME))?;

		M::decode(raw)
	}
}

impl std::fmt::Debug for Contract {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Contract")
			.field("address", &self.address)
			.field("name", &self.name)
			.finish_non_exhaustive()
	}
}

/// Report remote rejections under the contract method name rather than
/// the RPC method that carried them.  The payload is left untouched.
fn retag(e: ClientError, method: &str) -> ClientError {
	match e {
		ClientError::RemoteRejection { payload, .. } => ClientError::RemoteRejection {
			method: method.to_owned(),
			payload,
		},
		other => other,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn methods_route_to_expected_channels() {
		assert_eq!(CreateAccountRequest::CHANNEL, Channel::Write);
		assert_eq!(SaveStateRequest::CHANNEL, Channel::Write);
		assert_eq!(GetStateRequest::CHANNEL, Channel::Read);
		assert_eq!(CreateAccountRequest::NAME, "CreateAccount");
		assert_eq!(SaveStateRequest::NAME, "SaveState");
		assert_eq!(GetStateRequest::NAME, "GetState");
	}

	#[test]
	fn requests_serialize_as_their_envelope() {
		let req = SaveStateRequest::new("blueprint", 3).unwrap();
		assert_eq!(
			payload::to_canonical_bytes(&req).unwrap(),
			payload::to_canonical_bytes(req.envelope()).unwrap()
		);
	}

	#[test]
	fn receipt_decodes_commit_result() {
		let raw = json!({
			"check_tx": { "code": 0 },
			"deliver_tx": { "code": 0, "data": "b2s=" },
			"hash": "ABCDEF",
			"height": "17"
		});
		let r = SaveStateRequest::decode(raw).unwrap();
		assert_eq!(r.hash, "ABCDEF");
		assert_eq!(r.height, 17);
		assert_eq!(r.data.as_deref(), Some(&b"ok"[..]));
	}

	#[test]
	fn receipt_with_failed_check_is_rejection() {
		let raw = json!({
			"check_tx": { "code": 3, "log": "sequence number does not match" },
			"deliver_tx": { "code": 0 },
			"hash": "AB",
			"height": 0
		});
		match CreateAccountRequest::decode(raw).unwrap_err() {
			ClientError::RemoteRejection { method, payload } => {
				assert_eq!(method, "CreateAccount");
				assert_eq!(payload["log"], "sequence number does not match");
			}
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn receipt_with_non_integer_code_is_malformed() {
		for code in [json!(-1), json!("0"), json!(1.5), json!(true)] {
			for phase in ["check_tx", "deliver_tx"] {
				let mut raw = json!({
					"check_tx": { "code": 0 },
					"deliver_tx": { "code": 0 },
					"hash": "AB",
					"height": 1
				});
				raw[phase]["code"] = code.clone();
				let err = SaveStateRequest::decode(raw).unwrap_err();
				assert!(matches!(err, ClientError::MalformedResponse { .. }), "{phase} {code}");
			}
		}
	}

	#[test]
	fn receipt_without_code_is_success() {
		let raw = json!({
			"check_tx": {},
			"deliver_tx": { "code": null },
			"hash": "AB",
			"height": 2
		});
		assert_eq!(SaveStateRequest::decode(raw).unwrap().height, 2);
	}

	#[test]
	fn receipt_without_hash_is_malformed() {
		let err = SaveStateRequest::decode(json!({ "height": 1 })).unwrap_err();
		assert!(matches!(err, ClientError::MalformedResponse { .. }));
	}

	#[test]
	fn state_response_decodes_nested_document() {
		let inner = payload::to_canonical_bytes(&StateQueryResult {
			state: br#"{"Value":-5}"#.to_vec(),
		})
		.unwrap();
		let raw = json!(STANDARD.encode(inner));
		assert_eq!(GetStateRequest::decode(raw).unwrap(), StateResponse { value: -5 });
	}

	#[test]
	fn state_response_rejects_unexpected_shapes() {
		for raw in [json!(5), json!("%%%"), json!(STANDARD.encode(b"[1,2]"))] {
			let err = GetStateRequest::decode(raw).unwrap_err();
			assert!(matches!(err, ClientError::MalformedResponse { .. }));
		}
	}
}
