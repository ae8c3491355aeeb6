use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between loading a key and decoding the
/// remote endpoint's answer.  Command handlers wrap these with context
/// naming the step that failed.
#[derive(Debug, Error)]
pub enum ClientError {
	#[error("failed to generate keypair: {0}")]
	KeyGeneration(String),

	#[error("failed to write key file {path}: {source}")]
	Persistence {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("key file {path} not found or unreadable: {source}")]
	KeyNotFound {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("malformed key: {0}")]
	MalformedKey(String),

	#[error("invalid signing key: {0}")]
	InvalidKey(String),

	#[error("failed to encode payload: {0}")]
	Encoding(#[from] serde_json::Error),

	#[error("invalid contract address {input:?}: {reason}")]
	InvalidAddress { input: String, reason: String },

	#[error("transport error: {0}")]
	Transport(String),

	/// The endpoint answered but refused the call.  `payload` is the
	/// remote error exactly as received.
	#[error("remote endpoint rejected {method}: {payload}")]
	RemoteRejection { method: String, payload: serde_json::Value },

	#[error("malformed response to {method}: {reason}")]
	MalformedResponse { method: String, reason: String },
}

impl From<reqwest::Error> for ClientError {
	fn from(e: reqwest::Error) -> Self {
		Self::Transport(e.to_string())
	}
}

pub type Result<T> = std::result::Result<T, ClientError>;
