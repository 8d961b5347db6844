//!
//! Strkey keypair handling for ledger accounts.
//!
//! Ledger account identifiers use the strkey encoding: a version byte, the raw
//! 32-byte ed25519 key, and a CRC16-XModem checksum, base32-encoded without
//! padding. Public keys carry the `G` version byte, secret seeds the `S`
//! version byte. This module wraps `ed25519-dalek` keypairs behind that
//! encoding and is the only place raw key bytes are handled.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::Rng;
use thiserror::Error;

/// Strkey version byte for ed25519 public keys (`G...`).
const VERSION_PUBLIC: u8 = 6 << 3;
/// Strkey version byte for ed25519 secret seeds (`S...`).
const VERSION_SECRET: u8 = 18 << 3;

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
	#[error("strkey has invalid length")]
	InvalidLength,

	#[error("strkey contains an invalid character")]
	InvalidCharacter,

	#[error("strkey checksum mismatch")]
	InvalidChecksum,

	#[error("strkey has unexpected version byte: {0:#04x}")]
	InvalidVersion(u8),
}

fn crc16_xmodem(data: &[u8]) -> u16 {
	let mut crc: u16 = 0;
	for &byte in data {
		crc ^= (byte as u16) << 8;
		for _ in 0..8 {
			if crc & 0x8000 != 0 {
				crc = (crc << 1) ^ 0x1021;
			} else {
				crc <<= 1;
			}
		}
	}
	crc
}

fn base32_encode(data: &[u8]) -> String {
	let mut out = String::with_capacity(data.len() * 8 / 5 + 1);
	let mut buffer: u32 = 0;
	let mut bits = 0u32;
	for &byte in data {
		buffer = (buffer << 8) | byte as u32;
		bits += 8;
		while bits >= 5 {
			bits -= 5;
			out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
		}
	}
	if bits > 0 {
		out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
	}
	out
}

fn base32_decode(encoded: &str) -> Result<Vec<u8>, KeyError> {
	let mut out = Vec::with_capacity(encoded.len() * 5 / 8);
	let mut buffer: u32 = 0;
	let mut bits = 0u32;
	for c in encoded.bytes() {
		let value = BASE32_ALPHABET
			.iter()
			.position(|&a| a == c)
			.ok_or(KeyError::InvalidCharacter)? as u32;
		buffer = (buffer << 5) | value;
		bits += 5;
		if bits >= 8 {
			bits -= 8;
			out.push(((buffer >> bits) & 0xff) as u8);
		}
	}
	Ok(out)
}

fn strkey_encode(version: u8, key: &[u8; 32]) -> String {
	let mut payload = Vec::with_capacity(35);
	payload.push(version);
	payload.extend_from_slice(key);
	let checksum = crc16_xmodem(&payload);
	payload.extend_from_slice(&checksum.to_le_bytes());
	base32_encode(&payload)
}

fn strkey_decode(version: u8, encoded: &str) -> Result<[u8; 32], KeyError> {
	if encoded.len() != 56 {
		return Err(KeyError::InvalidLength);
	}
	let decoded = base32_decode(encoded)?;
	if decoded.len() != 35 {
		return Err(KeyError::InvalidLength);
	}
	let (payload, checksum_bytes) = decoded.split_at(33);
	let expected = crc16_xmodem(payload).to_le_bytes();
	if checksum_bytes != expected {
		return Err(KeyError::InvalidChecksum);
	}
	if payload[0] != version {
		return Err(KeyError::InvalidVersion(payload[0]));
	}
	let mut key = [0u8; 32];
	key.copy_from_slice(&payload[1..33]);
	Ok(key)
}

/// Validates that a string is a well-formed strkey public key (`G...`).
pub fn decode_public_key(encoded: &str) -> Result<[u8; 32], KeyError> {
	strkey_decode(VERSION_PUBLIC, encoded)
}

/// An ed25519 keypair addressed by its strkey encodings.
///
/// The secret seed is only reachable through [`Keypair::secret`]; it is never
/// logged by this crate.
pub struct Keypair {
	signing_key: SigningKey,
}

impl Keypair {
	/// Generates a fresh random keypair.
	pub fn random() -> Self {
		let mut seed = [0u8; 32];
		rand::rng().fill(&mut seed);
		Self {
			signing_key: SigningKey::from_bytes(&seed),
		}
	}

	/// Derives the keypair from a strkey-encoded secret seed (`S...`).
	pub fn from_secret(secret: &str) -> Result<Self, KeyError> {
		let seed = strkey_decode(VERSION_SECRET, secret)?;
		Ok(Self {
			signing_key: SigningKey::from_bytes(&seed),
		})
	}

	/// The strkey-encoded public key (`G...`).
	pub fn public_key(&self) -> String {
		strkey_encode(VERSION_PUBLIC, self.signing_key.verifying_key().as_bytes())
	}

	/// The strkey-encoded secret seed (`S...`).
	pub fn secret(&self) -> String {
		strkey_encode(VERSION_SECRET, &self.signing_key.to_bytes())
	}

	/// Signs an arbitrary message with the secret key.
	pub fn sign(&self, message: &[u8]) -> Signature {
		self.signing_key.sign(message)
	}

	/// The raw verifying key, used in tests to check signatures.
	pub fn verifying_key(&self) -> VerifyingKey {
		self.signing_key.verifying_key()
	}
}

impl std::fmt::Debug for Keypair {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		// The seed stays out of Debug output.
		f.debug_struct("Keypair")
			.field("public_key", &self.public_key())
			.finish()
	}
}

/// Verifies a detached signature against a strkey public key.
pub fn verify_signature(
	public_key: &str,
	message: &[u8],
	signature: &Signature,
) -> Result<bool, KeyError> {
	let key_bytes = decode_public_key(public_key)?;
	let verifying_key =
		VerifyingKey::from_bytes(&key_bytes).map_err(|_| KeyError::InvalidCharacter)?;
	Ok(verifying_key.verify(message, signature).is_ok())
}
