use ed25519_dalek::Signer as _;

use crate::error::{ClientError, Result};
use crate::keys::{PrivateKey, PublicKey};

/// Signs payloads with a locally held ed25519 key.  Signatures are
/// deterministic (RFC 8032), so the same key and bytes always produce
/// the same signature.
#[derive(Debug, Clone)]
pub struct Ed25519Signer {
	key: PrivateKey,
}

impl Ed25519Signer {
	pub fn new(key: PrivateKey) -> Self {
		Self { key }
	}

	/// Build a signer straight from raw key bytes.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
		PrivateKey::from_bytes(bytes)
			.map(Self::new)
			.map_err(|e| ClientError::InvalidKey(e.to_string()))
	}
}

impl super::Signer for Ed25519Signer {
	fn public_key(&self) -> PublicKey {
		self.key.public_key()
	}

	fn sign(&self, payload: &[u8]) -> super::Signature {
		super::Signature(self.key.signing_key().sign(payload).to_bytes())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::keys;
	use crate::signer::{verify, Signer};

	fn signer() -> Ed25519Signer {
		Ed25519Signer::new(keys::generate().unwrap().private)
	}

	#[test]
	fn signature_verifies() {
		let s = signer();
		let msg = b"{\"Value\":42}";
		let sig = s.sign(msg);
		assert!(verify(&s.public_key(), msg, &sig));
	}

	#[test]
	fn any_flipped_message_bit_fails() {
		let s = signer();
		let msg = b"save state".to_vec();
		let sig = s.sign(&msg);
		for i in 0..msg.len() * 8 {
			let mut m = msg.clone();
			m[i / 8] ^= 1 << (i % 8);
			assert!(!verify(&s.public_key(), &m, &sig), "bit {i} flipped");
		}
	}

	#[test]
	fn any_flipped_signature_bit_fails() {
		let s = signer();
		let msg = b"create account";
		let sig = s.sign(msg);
		for i in 0..SIGNATURE_BITS {
			let mut bad = sig;
			bad.0[i / 8] ^= 1 << (i % 8);
			assert!(!verify(&s.public_key(), msg, &bad), "bit {i} flipped");
		}
	}

	const SIGNATURE_BITS: usize = crate::signer::SIGNATURE_LENGTH * 8;

	#[test]
	fn other_key_does_not_verify() {
		let msg = b"payload";
		let sig = signer().sign(msg);
		assert!(!verify(&signer().public_key(), msg, &sig));
	}

	#[test]
	fn signing_is_deterministic() {
		let s = signer();
		assert_eq!(s.sign(b"abc"), s.sign(b"abc"));
		assert_ne!(s.sign(b"abc"), s.sign(b"abd"));
	}

	#[test]
	fn wrong_length_key_is_invalid() {
		let err = Ed25519Signer::from_bytes(&[7u8; 10]).unwrap_err();
		assert!(matches!(err, ClientError::InvalidKey(_)));
	}

	#[test]
	fn from_bytes_matches_original_key() {
		let kp = keys::generate().unwrap();
		let s = Ed25519Signer::from_bytes(&kp.private.to_bytes()).unwrap();
		assert_eq!(s.public_key(), kp.public);
	}
}
