//! The token payload, the data a license token carries, independent of how
//! it is signed or encoded.

use serde::{Deserialize, Serialize};

use crate::error::{FabricError, FabricResult};

/// The signed contents of a license token.
///
/// Field names on the wire are exactly: `subject`,
/// `issuedTime`, `expiryTime`, `maxMachineCount`, `modules`, `description`.
/// Immutable once minted, nothing in this crate mutates a `TokenPayload`
/// after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Non-empty human-readable subject (customer/org name).
    pub subject: String,
    /// Milliseconds since epoch when the token was minted. Defaulted to the
    /// mint time by the codec if not supplied.
    #[serde(rename = "issuedTime", skip_serializing_if = "Option::is_none")]
    pub issued_time_ms: Option<i64>,
    /// Milliseconds since epoch after which the token is no longer valid.
    #[serde(rename = "expiryTime")]
    pub expiry_time_ms: i64,
    /// Maximum number of concurrently registered machines.
    #[serde(rename = "maxMachineCount")]
    pub max_machine_count: u32,
    /// Ordered, possibly empty, list of licensed module names.
    #[serde(default)]
    pub modules: Vec<String>,
    /// Optional free-text description shown to operators.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TokenPayload {
    /// Validates the structural invariants a payload must satisfy before it
    /// can be minted: non-empty subject, positive machine count.
    pub fn validate(&self) -> FabricResult<()> {
        if self.subject.trim().is_empty() {
            return Err(FabricError::Format("subject must not be empty".into()));
        }
        if self.max_machine_count == 0 {
            return Err(FabricError::Format(
                "maxMachineCount must be positive".into(),
            ));
        }
        Ok(())
    }

    /// True if `now` is at or before the expiry time.
    #[must_use]
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.expiry_time_ms
    }

    /// True if `now` is before the issued time (clock skew / not-yet-valid).
    #[must_use]
    pub fn is_not_yet_valid_at(&self, now_ms: i64) -> bool {
        match self.issued_time_ms {
            Some(issued) => now_ms < issued,
            None => false,
        }
    }
}
