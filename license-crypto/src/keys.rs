//! RSA key loading.
//!
//! Keys arrive as PEM bytes or a file path; this module never generates a
//! keypair. PKCS#1 and PKCS#8 encodings are both accepted since operators
//! tend to have whichever their CA tooling produced.

use std::path::Path;

use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use license_types::{FabricError, FabricResult};

/// A loaded RSA private key, used to mint tokens.
#[derive(Clone)]
pub struct PrivateKey(pub(crate) RsaPrivateKey);

/// A loaded RSA public key, used to verify tokens and to derive the cache
/// encryption key.
#[derive(Clone)]
pub struct PublicKey {
    pub(crate) key: RsaPublicKey,
    /// The exact PEM text this key was parsed from, kept around because the
    /// cache crypto derives its key from the PEM text itself, not from the
    /// parsed key material.
    pub(crate) pem: String,
}

impl PrivateKey {
    /// Parses a private key from PEM text (PKCS#1 or PKCS#8).
    pub fn from_pem(pem: &str) -> FabricResult<Self> {
        RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map(Self)
            .map_err(|e| FabricError::Config(format!("invalid private key PEM: {e}")))
    }

    /// Loads a private key from a PEM file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> FabricResult<Self> {
        let pem = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            FabricError::Config(format!(
                "could not read private key at {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_pem(&pem)
    }
}

impl PublicKey {
    /// Parses a public key from PEM text (PKCS#1 or SubjectPublicKeyInfo).
    pub fn from_pem(pem: &str) -> FabricResult<Self> {
        let key = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| FabricError::Config(format!("invalid public key PEM: {e}")))?;
        Ok(Self {
            key,
            pem: pem.to_string(),
        })
    }

    /// Loads a public key from a PEM file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> FabricResult<Self> {
        let pem = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            FabricError::Config(format!(
                "could not read public key at {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_pem(&pem)
    }

    /// The PEM text this key was loaded from, used as the cache encryption
    /// passphrase.
    #[must_use]
    pub fn pem_text(&self) -> &str {
        &self.pem
    }
}
