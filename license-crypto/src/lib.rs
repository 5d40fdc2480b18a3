//! Token signing/verification and offline-cache encryption.
//!
//! Two independent concerns live here:
//! - [`codec`]: RSA-SHA256 mint/verify of license tokens.
//! - [`cache`]: AES-256-GCM authenticated encryption of the agent's offline
//!   cache file.
//!
//! Neither module generates keys or does its own ASN.1 parsing, both rely
//! on `rsa`'s PKCS#1/PKCS#8 PEM decoders for key material that arrives as
//! bytes or a file path.

mod cache;
mod codec;
mod keys;

pub use cache::{open as cache_open, seal as cache_seal};
pub use codec::{mint, verify};
pub use keys::{PrivateKey, PublicKey};
