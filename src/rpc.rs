use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::error::{ClientError, Result};
use crate::tx_builder::LocalAddress;

/// The network side of a contract call.  The core only ever submits
/// finished byte payloads and gets JSON back; how they travel is up to
/// the implementation.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
	/// Submit a signed transaction on the write channel and wait for it
	/// to be committed.
	async fn broadcast_tx(&self, signed_tx: &[u8]) -> Result<Value>;

	/// Run a query against current state on the read channel.
	async fn query(&self, caller: &str, contract: &LocalAddress, query: &[u8]) -> Result<Value>;

	/// Current nonce of the account owning `public_key_hex`.
	async fn nonce(&self, public_key_hex: &str) -> Result<u64>;
}

/// JSON-RPC 2.0 over HTTP to a pair of endpoints: one accepting
/// transactions, one answering queries.
pub struct HttpTransport {
	write_uri: String,
	read_uri: String,
	http: reqwest::Client,
}

impl HttpTransport {
	pub fn new(write_uri: &str, read_uri: &str, timeout: Duration) -> Result<Self> {
		let http = reqwest::Client::builder().timeout(timeout).build()?;
		Ok(Self {
			write_uri: write_uri.to_owned(),
			read_uri: read_uri.to_owned(),
			http,
		})
	}

	async fn call(&self, url: &str, method: &str, params: Value) -> Result<Value> {
		let body = json!({
			"id": 1,
			"jsonrpc": "2.0",
			"method": method,
			"params": params,
		});
		debug!(%url, method, "sending JSON-RPC request");

		let resp = self.http.post(url).json(&body).send().await?;
		let status = resp.status();
		let text = resp.text().await?;
		trace!(%status, body = %text, "JSON-RPC response");

		parse_response(method, status.is_success(), &text)
			.map_err(|e| match e {
				ClientError::Transport(reason) => {
					ClientError::Transport(format!("{url}: HTTP {status}: {reason}"))
				}
				other => other,
			})
	}
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
	async fn broadcast_tx(&self, signed_tx: &[u8]) -> Result<Value> {
		let params = json!({ "tx": STANDARD.encode(signed_tx) });
		self.call(&self.write_uri, "broadcast_tx_commit", params).await
	}

	async fn query(&self, caller: &str, contract: &LocalAddress, query: &[u8]) -> Result<Value> {
		let params = json!({
			"caller": caller,
			"contract": contract.to_string(),
			"query": STANDARD.encode(query),
		});
		self.call(&self.read_uri, "query", params).await
	}

	async fn nonce(&self, public_key_hex: &str) -> Result<u64> {
		let result = self
			.call(&self.read_uri, "nonce", json!({ "key": public_key_hex }))
			.await?;
		parse_nonce(&result)
	}
}

// -- Response parsing --

/// Split a JSON-RPC reply into its result, a remote rejection, or a
/// transport failure.
fn parse_response(method: &str, http_ok: bool, body: &str) -> Result<Value> {
	let resp: Value = match serde_json::from_str(body) {
		Ok(v) => v,
		Err(e) if http_ok => {
			return Err(ClientError::MalformedResponse {
				method: method.to_owned(),
				reason: format!("body is not JSON: {e}"),
			})
		}
		Err(_) => return Err(ClientError::Transport(truncate(body))),
	};

	if let Some(err) = resp.get("error").filter(|e| !e.is_null()) {
		return Err(ClientError::RemoteRejection {
			method: method.to_owned(),
			payload: err.clone(),
		});
	}

	match resp.get("result") {
		Some(result) => Ok(result.clone()),
		None if !http_ok => Err(ClientError::Transport(truncate(body))),
		None => Err(ClientError::MalformedResponse {
			method: method.to_owned(),
			reason: "missing `result`".into(),
		}),
	}
}

/// Nonces come back as a number or, from some nodes, a decimal string.
fn parse_nonce(result: &Value) -> Result<u64> {
	result
		.as_u64()
		.or_else(|| result.as_str().and_then(|s| s.parse().ok()))
		.ok_or_else(|| ClientError::MalformedResponse {
			method: "nonce".into(),
			reason: format!("expected unsigned integer, got {result}"),
		})
}

fn truncate(body: &str) -> String {
	const MAX: usize = 200;
	match body.char_indices().nth(MAX) {
		Some((i, _)) => format!("{}...", &body[..i]),
		None => body.to_owned(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn result_is_extracted() {
		let v = parse_response("query", true, r#"{"jsonrpc":"2.0","id":1,"result":"abc"}"#).unwrap();
		assert_eq!(v, json!("abc"));
	}

	#[test]
	fn error_object_is_passed_through_unmodified() {
		let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32603,"message":"bad nonce","data":"seq 3"}}"#;
		match parse_response("broadcast_tx_commit", true, body).unwrap_err() {
			ClientError::RemoteRejection { method, payload } => {
				assert_eq!(method, "broadcast_tx_commit");
				assert_eq!(payload["message"], "bad nonce");
				assert_eq!(payload["data"], "seq 3");
			}
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn rejection_wins_over_http_status() {
		let body = r#"{"error":{"message":"nope"}}"#;
		assert!(matches!(
			parse_response("query", false, body).unwrap_err(),
			ClientError::RemoteRejection { .. }
		));
	}

	#[test]
	fn non_json_error_page_is_transport_failure() {
		let err = parse_response("query", false, "<html>502 Bad Gateway</html>").unwrap_err();
		assert!(matches!(err, ClientError::Transport(_)));
	}

	#[test]
	fn non_json_success_is_malformed() {
		let err = parse_response("query", true, "hello").unwrap_err();
		assert!(matches!(err, ClientError::MalformedResponse { .. }));
	}

	#[test]
	fn missing_result_is_malformed() {
		let err = parse_response("query", true, r#"{"id":1}"#).unwrap_err();
		assert!(matches!(err, ClientError::MalformedResponse { .. }));
	}

	#[test]
	fn nonce_accepts_number_or_string() {
		assert_eq!(parse_nonce(&json!(7)).unwrap(), 7);
		assert_eq!(parse_nonce(&json!("12")).unwrap(), 12);
		assert!(parse_nonce(&json!(-1)).is_err());
		assert!(parse_nonce(&json!("x")).is_err());
	}

	#[test]
	fn long_bodies_are_truncated() {
		let long = "x".repeat(500);
		assert_eq!(truncate(&long).len(), 203);
		assert_eq!(truncate("short"), "short");
	}

	#[tokio::test]
	async fn unreachable_endpoint_is_transport_error() {
		let t = HttpTransport::new("http://127.0.0.1:1", "http://127.0.0.1:1", Duration::from_secs(2))
			.unwrap();
		let err = t.broadcast_tx(b"{}").await.unwrap_err();
		assert!(matches!(err, ClientError::Transport(_)));
	}
}
