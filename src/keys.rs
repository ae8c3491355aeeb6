use std::fs;
use std::io::Write;
use std::path::Path;

use ed25519_dalek::{SigningKey, VerifyingKey, KEYPAIR_LENGTH, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

use crate::error::{ClientError, Result};

/// Default key file name, relative to the working directory.
pub const DEFAULT_KEY_FILE: &str = "priv_key";

/// Size of the on-disk private key: 32-byte seed followed by the
/// 32-byte public key.
pub const PRIVATE_KEY_LENGTH: usize = KEYPAIR_LENGTH;

/// An ed25519 private key.  The secret is zeroized on drop and never
/// shows up in `Debug` output.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
	/// Parse the 64-byte `seed || public key` layout.  The public half
	/// must match the key derived from the seed.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
		let raw: &[u8; PRIVATE_KEY_LENGTH] = bytes.try_into().map_err(|_| {
			ClientError::MalformedKey(format!(
				"expected {PRIVATE_KEY_LENGTH} bytes, got {}",
				bytes.len()
			))
		})?;
		SigningKey::from_keypair_bytes(raw)
			.map(Self)
			.map_err(|_| ClientError::MalformedKey("public key does not match seed".into()))
	}

	pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_LENGTH] {
		self.0.to_keypair_bytes()
	}

	pub fn public_key(&self) -> PublicKey {
		PublicKey(self.0.verifying_key())
	}

	pub(crate) fn signing_key(&self) -> &SigningKey {
		&self.0
	}
}

impl std::fmt::Debug for PrivateKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("PrivateKey").field(&"<redacted>").finish()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
	pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
		VerifyingKey::from_bytes(bytes)
			.map(Self)
			.map_err(|e| ClientError::MalformedKey(format!("invalid public key: {e}")))
	}

	pub fn to_bytes(&self) -> [u8; 32] {
		self.0.to_bytes()
	}

	pub fn to_hex(&self) -> String {
		hex::encode(self.0.as_bytes())
	}

	pub(crate) fn verifying_key(&self) -> &VerifyingKey {
		&self.0
	}
}

#[derive(Debug, Clone)]
pub struct Keypair {
	pub public: PublicKey,
	pub private: PrivateKey,
}

/// Generate a fresh keypair from the operating system's CSPRNG.
pub fn generate() -> Result<Keypair> {
	let mut seed = [0u8; SECRET_KEY_LENGTH];
	OsRng
		.try_fill_bytes(&mut seed)
		.map_err(|e| ClientError::KeyGeneration(e.to_string()))?;
	let signing = SigningKey::from_bytes(&seed);
	seed.fill(0);

	let private = PrivateKey(signing);
	Ok(Keypair { public: private.public_key(), private })
}

/// Write the raw private key to `path`, creating or truncating it.  On
/// Unix the file is owner-only before any key byte is written, including
/// when an existing file with wider permissions is reused.
pub fn save(key: &PrivateKey, path: &Path) -> Result<()> {
	let persist = |source| ClientError::Persistence { path: path.to_owned(), source };

	let mut file = open_owner_only(path).map_err(persist)?;
	file.write_all(&key.to_bytes()).map_err(persist)?;
	file.sync_all().map_err(persist)?;

	debug!(path = %path.display(), "private key written");
	Ok(())
}

#[cfg(unix)]
fn open_owner_only(path: &Path) -> std::io::Result<fs::File> {
	use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

	let file = fs::OpenOptions::new()
		.write(true)
		.create(true)
		.truncate(true)
		.mode(0o600)
		.open(path)?;
	// `mode` only applies on creation
	file.set_permissions(fs::Permissions::from_mode(0o600))?;
	Ok(file)
}

#[cfg(not(unix))]
fn open_owner_only(path: &Path) -> std::io::Result<fs::File> {
	fs::File::create(path)
}

/// Read a private key written by [`save`].
pub fn load(path: &Path) -> Result<PrivateKey> {
	let bytes = fs::read(path).map_err(|source| ClientError::KeyNotFound {
		path: path.to_owned(),
		source,
	})?;
	debug!(path = %path.display(), "private key loaded");
	PrivateKey::from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn generated_public_key_matches_private() {
		let kp = generate().unwrap();
		assert_eq!(kp.public, kp.private.public_key());
	}

	#[test]
	fn two_keys_differ() {
		let a = generate().unwrap();
		let b = generate().unwrap();
		assert_ne!(a.public, b.public);
	}

	#[test]
	fn save_then_load_is_bit_identical() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(DEFAULT_KEY_FILE);
		let kp = generate().unwrap();

		save(&kp.private, &path).unwrap();
		let loaded = load(&path).unwrap();
		assert_eq!(loaded.to_bytes(), kp.private.to_bytes());
		assert_eq!(fs::read(&path).unwrap().len(), PRIVATE_KEY_LENGTH);
	}

	#[test]
	fn save_truncates_existing_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("key");
		fs::write(&path, vec![0xAA; 200]).unwrap();

		let kp = generate().unwrap();
		save(&kp.private, &path).unwrap();
		assert_eq!(load(&path).unwrap().to_bytes(), kp.private.to_bytes());
	}

	#[cfg(unix)]
	#[test]
	fn saved_key_is_owner_only() {
		use std::os::unix::fs::PermissionsExt;

		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("key");
		save(&generate().unwrap().private, &path).unwrap();

		let mode = fs::metadata(&path).unwrap().permissions().mode();
		assert_eq!(mode & 0o777, 0o600);
	}

	#[cfg(unix)]
	#[test]
	fn save_over_world_readable_file_tightens_mode() {
		use std::os::unix::fs::PermissionsExt;

		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("key");
		fs::write(&path, b"old").unwrap();
		fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

		let kp = generate().unwrap();
		save(&kp.private, &path).unwrap();

		let mode = fs::metadata(&path).unwrap().permissions().mode();
		assert_eq!(mode & 0o777, 0o600);
		assert_eq!(load(&path).unwrap().to_bytes(), kp.private.to_bytes());
	}

	#[test]
	fn save_into_missing_directory_fails() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nope").join("key");
		let err = save(&generate().unwrap().private, &path).unwrap_err();
		assert!(matches!(err, ClientError::Persistence { .. }));
	}

	#[test]
	fn load_missing_file_is_key_not_found() {
		let dir = tempfile::tempdir().unwrap();
		let err = load(&dir.path().join("absent")).unwrap_err();
		assert!(matches!(err, ClientError::KeyNotFound { .. }));
	}

	#[test]
	fn load_wrong_length_is_malformed() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("short");
		fs::write(&path, [1u8; 32]).unwrap();
		assert!(matches!(load(&path).unwrap_err(), ClientError::MalformedKey(_)));
	}

	#[test]
	fn load_mismatched_public_half_is_malformed() {
		let mut bytes = generate().unwrap().private.to_bytes();
		bytes[40] ^= 0xFF;
		assert!(matches!(
			PrivateKey::from_bytes(&bytes).unwrap_err(),
			ClientError::MalformedKey(_)
		));
	}

	#[test]
	fn debug_output_hides_secret() {
		let kp = generate().unwrap();
		let shown = format!("{:?}", kp.private);
		assert!(shown.contains("redacted"));
		assert!(!shown.contains(&hex::encode(&kp.private.to_bytes()[..8])));
	}
}
