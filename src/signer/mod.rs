pub mod ed25519;

pub use ed25519::Ed25519Signer;

use ed25519_dalek::Verifier;

use crate::keys::PublicKey;

/// Length of a detached signature in bytes.
pub const SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// A detached signature over an arbitrary byte payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_LENGTH]);

impl Signature {
	pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
		self.0
	}
}

/// Anything that can produce signatures the remote endpoint will accept
/// for its public key.  Implementations hold no mutable state, so a
/// signer can be shared across tasks.
pub trait Signer: Send + Sync {
	/// The public key the endpoint will verify against.
	fn public_key(&self) -> PublicKey;

	/// Sign exactly `payload`.
	fn sign(&self, payload: &[u8]) -> Signature;
}

/// Check `signature` over `payload` against `public_key`.
pub fn verify(public_key: &PublicKey, payload: &[u8], signature: &Signature) -> bool {
	let sig = ed25519_dalek::Signature::from_bytes(&signature.0);
	public_key.verifying_key().verify(payload, &sig).is_ok()
}
