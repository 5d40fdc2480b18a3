//! License records, the authority's durable log of every token it has
//! minted.

use serde::{Deserialize, Serialize};

use crate::payload::TokenPayload;

/// A minted license, as tracked by the authority.
///
/// Created on mint, destroyed on delete, never mutated in place, listing
/// and lookups always reflect the payload exactly as it was minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Server-generated opaque id (32 lowercase hex chars).
    pub id: String,
    /// Copied from `payload.subject` for quick listing without decoding.
    pub subject: String,
    /// The encoded license token (`base64url(payload).base64url(sig)`).
    #[serde(rename = "licenseCode")]
    pub license_code: String,
    /// The payload that was signed into `license_code`.
    pub payload: TokenPayload,
    /// Milliseconds since epoch when this record was created.
    #[serde(rename = "createTime")]
    pub create_time_ms: i64,
}
