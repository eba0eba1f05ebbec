//! Golden test vectors for deterministic verification.
//!
//! These are the RFC 8032 section 7.1 ed25519 vectors. Every signing path,
//! single or batched, must reproduce them byte for byte.

use serde::{Deserialize, Serialize};

use sigbatch::{Backend, Engine};
use sigbatch_core::{KeyPair, PublicKey, Seed, SignRecord, Signature, VerifyRecord};

/// A golden test vector. All fields are hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: String,
    /// 32-byte seed (the RFC's secret key).
    pub seed: String,
    /// Expected 32-byte public key.
    pub public_key: String,
    /// Message bytes.
    pub message: String,
    /// Expected 64-byte signature.
    pub signature: String,
}

impl GoldenVector {
    fn new(name: &str, seed: &str, public_key: &str, message: &str, signature: &str) -> Self {
        Self {
            name: name.to_string(),
            seed: seed.to_string(),
            public_key: public_key.to_string(),
            message: message.to_string(),
            signature: signature.to_string(),
        }
    }

    /// Decode the seed and derive the key pair.
    pub fn key_pair(&self) -> Result<KeyPair, hex::FromHexError> {
        let bytes = hex::decode(&self.seed)?;
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(KeyPair::from_seed(&Seed(seed)))
    }

    pub fn message_bytes(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(&self.message)
    }
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector::new(
            "TEST 1 (empty message)",
            "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60",
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a",
            "",
            "e5564300c360ac729086e2cc806e828a84877f1eb8e5d974d873e065224901555fb8821590a33bacc61e39701cf9b46bd25bf5f0595bbe24655141438e7a100b",
        ),
        GoldenVector::new(
            "TEST 2 (one byte)",
            "4ccd089b28ff96da9db6c346ec114e0f5b8a319f35aba624da8cf6ed4fb8a6fb",
            "3d4017c3e843895a92b70aa74d1b7ebc9c982ccf2ec4968cc0cd55f12af4660c",
            "72",
            "92a009a9f0d4cab8720e820b5f642540a2b27b5416503f8fb3762223ebdb69da085ac1e43e15996e458f3613d0f11d8c387b2eaeb4302aeeb00d291612bb0c00",
        ),
        GoldenVector::new(
            "TEST 3 (two bytes)",
            "c5aa8df43f9f837bedb7442f31dcb7b166d38535076f094b85ce3a2e0b4458f7",
            "fc51cd8e6218a1a38da47ed00230f0580816ed13ba3303ac5deb911548908025",
            "af82",
            "6291d657deec24024827e69c3abe01a30ce548a284743a445e3680d7db5ac3ac18ff9b538d16f290ae67f760984dc6594a7c15e9716ed28dc027beceea1ec40a",
        ),
    ]
}

/// Check one vector through the engine's single and batched paths.
///
/// Returns a description of the first mismatch.
pub fn check_vector<B: Backend>(engine: &Engine<B>, vector: &GoldenVector) -> Result<(), String> {
    let key_pair = vector.key_pair().map_err(|e| format!("{}: seed: {e}", vector.name))?;
    let message = vector
        .message_bytes()
        .map_err(|e| format!("{}: message: {e}", vector.name))?;
    let expected_pk =
        PublicKey::from_hex(&vector.public_key).map_err(|e| format!("{}: {e}", vector.name))?;
    let expected_sig =
        Signature::from_hex(&vector.signature).map_err(|e| format!("{}: {e}", vector.name))?;

    if *key_pair.public_key() != expected_pk {
        return Err(format!("{}: public key mismatch", vector.name));
    }

    let single = engine
        .sign(&message, &key_pair)
        .map_err(|e| format!("{}: {e}", vector.name))?;
    if single != expected_sig {
        return Err(format!("{}: single signature mismatch", vector.name));
    }

    let batched = engine
        .sign_batch(&[SignRecord::new(&key_pair, message.clone())])
        .map_err(|e| format!("{}: {e}", vector.name))?;
    if batched.first() != Some(&expected_sig) {
        return Err(format!("{}: batched signature mismatch", vector.name));
    }

    let verdicts = engine
        .verify_batch(&[VerifyRecord::new(expected_sig, expected_pk, message)])
        .map_err(|e| format!("{}: {e}", vector.name))?;
    if verdicts != [true] {
        return Err(format!("{}: batched verify rejected", vector.name));
    }

    Ok(())
}

/// Check every vector. Returns the number checked.
pub fn verify_all_vectors<B: Backend>(engine: &Engine<B>) -> Result<usize, String> {
    let vectors = all_vectors();
    for vector in &vectors {
        check_vector(engine, vector)?;
    }
    Ok(vectors.len())
}

/// Export all vectors as pretty JSON.
pub fn vectors_json() -> serde_json::Result<String> {
    serde_json::to_string_pretty(&all_vectors())
}
