//! Fixed-size ed25519 key material with strong types.
//!
//! The arithmetic is delegated to ed25519-dalek. A private key is the 64-byte
//! keypair encoding `seed || public_key`, the same bytes a native signing
//! library expects in a packed slot.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;
use crate::layout::{PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE, SEED_SIZE, SIGNATURE_SIZE};

/// Decode a hex string into a fixed-size array.
fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], CoreError> {
    let bytes = hex::decode(s)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| CoreError::InvalidLength {
        expected: N,
        got: bytes.len(),
    })
}

/// 32 bytes of randomness from which a key pair is derived.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Seed(pub [u8; SEED_SIZE]);

impl Seed {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; SEED_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; SEED_SIZE] {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(..)")
    }
}

impl From<[u8; SEED_SIZE]> for Seed {
    fn from(bytes: [u8; SEED_SIZE]) -> Self {
        Self(bytes)
    }
}

/// A 32-byte ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        decode_fixed(s).map(Self)
    }

    /// Verify a signature over a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CoreError> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.0).map_err(|_| CoreError::InvalidPublicKey)?;
        let sig = DalekSignature::from_bytes(&signature.0);

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CoreError::InvalidSignature)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; PUBLIC_KEY_SIZE]> for PublicKey {
    fn from(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }
}

/// A 64-byte ed25519 private key: `seed || public_key`.
///
/// `Debug` never prints the key bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(pub [u8; PRIVATE_KEY_SIZE]);

impl PrivateKey {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; PRIVATE_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; PRIVATE_KEY_SIZE] {
        &self.0
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        decode_fixed(s).map(Self)
    }

    /// Sign a message.
    ///
    /// Fails with [`CoreError::KeyMismatch`] when the key bytes are not a
    /// consistent keypair encoding or do not belong to `public_key`.
    pub fn sign(&self, message: &[u8], public_key: &PublicKey) -> Result<Signature, CoreError> {
        let signing_key =
            SigningKey::from_keypair_bytes(&self.0).map_err(|_| CoreError::KeyMismatch)?;
        if signing_key.verifying_key().as_bytes() != public_key.as_bytes() {
            return Err(CoreError::KeyMismatch);
        }

        Ok(Signature(signing_key.sign(message).to_bytes()))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// A 64-byte ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; SIGNATURE_SIZE]);

impl Signature {
    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        decode_fixed(s).map(Self)
    }

    /// The zero signature (never valid).
    pub const ZERO: Self = Self([0u8; SIGNATURE_SIZE]);
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; SIGNATURE_SIZE]> for Signature {
    fn from(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }
}

/// An ed25519 key pair.
///
/// Immutable once derived; the private key is the only signing capability.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    public_key: PublicKey,
    private_key: PrivateKey,
}

impl KeyPair {
    /// Derive a key pair from a seed. Deterministic.
    pub fn from_seed(seed: &Seed) -> Self {
        let signing_key = SigningKey::from_bytes(&seed.0);
        Self {
            public_key: PublicKey(signing_key.verifying_key().to_bytes()),
            private_key: PrivateKey(signing_key.to_keypair_bytes()),
        }
    }

    /// Rebuild a key pair from its parts, checking they belong together.
    pub fn from_parts(public_key: PublicKey, private_key: PrivateKey) -> Result<Self, CoreError> {
        let signing_key =
            SigningKey::from_keypair_bytes(&private_key.0).map_err(|_| CoreError::KeyMismatch)?;
        if signing_key.verifying_key().as_bytes() != public_key.as_bytes() {
            return Err(CoreError::KeyMismatch);
        }
        Ok(Self {
            public_key,
            private_key,
        })
    }

    /// Get the public key.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Get the private key.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Sign a message.
    pub fn sign(&self, message: &[u8]) -> Signature {
        // from_seed and from_parts both guarantee a consistent pair.
        let mut seed = [0u8; SEED_SIZE];
        seed.copy_from_slice(&self.private_key.0[..SEED_SIZE]);
        let signing_key = SigningKey::from_bytes(&seed);
        Signature(signing_key.sign(message).to_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair({:?})", self.public_key)
    }
}
