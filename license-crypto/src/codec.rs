//! RSA-SHA256 mint/verify of license tokens.
//!
//! Wire encoding: `base64url(payloadJson) "." base64url(signature)`, no
//! padding, exactly one separator. The codec never inspects `issuedTime` or
//! `expiryTime`, that is the registration protocol's job.

use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL;
use base64::Engine;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{Signer, Verifier};
use sha2::Sha256;

use license_types::{FabricError, FabricResult, TokenPayload};

use crate::keys::{PrivateKey, PublicKey};

/// Signs `payload` and returns the encoded license token.
///
/// If `payload.issued_time_ms` is absent it is defaulted to `now_ms` before
/// signing. Fails with [`FabricError::Config`] if `private_key` is `None`.
pub fn mint(
    payload: &TokenPayload,
    private_key: Option<&PrivateKey>,
    now_ms: i64,
) -> FabricResult<String> {
    payload.validate()?;

    let private_key = private_key
        .ok_or_else(|| FabricError::Config("no private key configured for minting".into()))?;

    let mut payload = payload.clone();
    if payload.issued_time_ms.is_none() {
        payload.issued_time_ms = Some(now_ms);
    }

    let payload_bytes = serde_json::to_vec(&payload)?;
    let signing_key = SigningKey::<Sha256>::new(private_key.0.clone());
    let signature = signing_key.sign(&payload_bytes);

    let payload_b64 = BASE64_URL.encode(&payload_bytes);
    let signature_b64 = BASE64_URL.encode(signature.to_bytes());

    Ok(format!("{payload_b64}.{signature_b64}"))
}

/// Verifies an encoded license token and returns its payload.
///
/// Does not check `issuedTime`/`expiryTime` against the current time;
/// callers apply that policy themselves.
pub fn verify(token: &str, public_key: &PublicKey) -> FabricResult<TokenPayload> {
    let mut parts = token.splitn(2, '.');
    let payload_b64 = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| FabricError::Format("token missing payload segment".into()))?;
    let signature_b64 = parts
        .next()
        .ok_or_else(|| FabricError::Format("token has no '.' separator".into()))?;
    if signature_b64.is_empty() {
        return Err(FabricError::Format("token missing signature segment".into()));
    }

    let payload_bytes = BASE64_URL
        .decode(payload_b64)
        .map_err(|e| FabricError::Format(format!("invalid payload base64: {e}")))?;
    let signature_bytes = BASE64_URL
        .decode(signature_b64)
        .map_err(|e| FabricError::Format(format!("invalid signature base64: {e}")))?;

    let signature = Signature::try_from(signature_bytes.as_slice())
        .map_err(|_| FabricError::Format("malformed signature bytes".into()))?;

    let verifying_key = VerifyingKey::<Sha256>::new(public_key.key.clone());
    verifying_key
        .verify(&payload_bytes, &signature)
        .map_err(|_| FabricError::Tampered("license token signature mismatch".into()))?;

    let payload: TokenPayload = serde_json::from_slice(&payload_bytes)
        .map_err(|e| FabricError::Format(format!("invalid payload JSON: {e}")))?;

    Ok(payload)
}
