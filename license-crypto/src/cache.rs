//! AES-256-GCM encryption for the agent's offline license cache.
//!
//! Key derivation: SHA-256 of a caller-supplied string (in practice the
//! authority's public key PEM text), which gives every agent instance that
//! trusts the same authority an independently-derivable cache key without
//! shipping a separate secret. Wire layout is `IV || ciphertext || tag`,
//! base64-encoded (standard alphabet, with padding).

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64_STD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

use license_types::{FabricError, FabricResult};

const IV_LEN: usize = 12;

fn derive_key(passphrase: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(passphrase.as_bytes());
    hasher.finalize().into()
}

/// Encrypts `plaintext` under a key derived from `passphrase` and returns a
/// base64 blob suitable for writing straight to the cache file.
pub fn seal(plaintext: &[u8], passphrase: &str) -> FabricResult<String> {
    let key = derive_key(passphrase);
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| FabricError::Internal(format!("bad cache key: {e}")))?;

    let mut iv_bytes = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv_bytes);
    let iv = Nonce::from_slice(&iv_bytes);

    let ciphertext = cipher
        .encrypt(iv, plaintext)
        .map_err(|e| FabricError::Internal(format!("cache seal failed: {e}")))?;

    let mut wire = Vec::with_capacity(IV_LEN + ciphertext.len());
    wire.extend_from_slice(&iv_bytes);
    wire.extend_from_slice(&ciphertext);

    Ok(BASE64_STD.encode(wire))
}

/// Decrypts a blob produced by [`seal`]. Any corruption, truncation, or key
/// mismatch surfaces as [`FabricError::Tampered`] since a cache file the
/// agent cannot decrypt is, from the degraded-mode logic's point of view,
/// indistinguishable from a tampered one.
pub fn open(blob: &str, passphrase: &str) -> FabricResult<Vec<u8>> {
    let key = derive_key(passphrase);
    let cipher = Aes256Gcm::new_from_slice(&key)
        .map_err(|e| FabricError::Internal(format!("bad cache key: {e}")))?;

    let wire = BASE64_STD
        .decode(blob)
        .map_err(|e| FabricError::Tampered(format!("cache blob is not valid base64: {e}")))?;

    if wire.len() < IV_LEN {
        return Err(FabricError::Tampered("cache blob shorter than an IV".into()));
    }
    let (iv_bytes, ciphertext) = wire.split_at(IV_LEN);
    let iv = Nonce::from_slice(iv_bytes);

    cipher
        .decrypt(iv, ciphertext)
        .map_err(|_| FabricError::Tampered("cache blob failed authentication".into()))
}
