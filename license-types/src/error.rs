//! The error taxonomy shared by the token codec, the authority, and the
//! agent.

use thiserror::Error;

/// Result type alias using the fabric's shared error type.
pub type FabricResult<T> = Result<T, FabricError>;

/// Why a registration attempt was rejected as unauthorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedReason {
    /// The signature did not verify against the configured public key.
    BadSignature,
    /// The token was structurally malformed.
    Format,
    /// `now > expiryTime`.
    Expired,
    /// `now < issuedTime`.
    NotYetValid,
}

impl std::fmt::Display for UnauthorizedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::BadSignature => "BAD_SIGNATURE",
            Self::Format => "FORMAT",
            Self::Expired => "EXPIRED",
            Self::NotYetValid => "NOT_YET_VALID",
        };
        f.write_str(s)
    }
}

/// The shared error taxonomy used by the codec, the authority, and the agent.
#[derive(Debug, Error)]
pub enum FabricError {
    /// Structural, base64, or JSON malformation.
    #[error("malformed input: {0}")]
    Format(String),

    /// Signature or AEAD tag mismatch, the data was tampered with.
    #[error("tampered or unverifiable data: {0}")]
    Tampered(String),

    /// A token's `expiryTime` has passed.
    #[error("token expired")]
    Expired,

    /// A token's `issuedTime` is in the future.
    #[error("token not yet valid")]
    NotYetValid,

    /// `maxMachineCount` reached for a license code.
    #[error("capacity reached: {current}/{max} machines registered")]
    Capacity { max: u32, current: u32 },

    /// Admin or token authorization failure.
    #[error("unauthorized: {0}")]
    Unauthorized(UnauthorizedReason),

    /// A referenced nodeId or record id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Missing or invalid configuration (e.g. no private key loaded).
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/RPC I/O failure talking to the authority.
    #[error("transport error: {0}")]
    Transport(String),

    /// Anything else, should be rare and always logged.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FabricError {
    /// The HTTP status code this error maps to at the authority's HTTP
    /// boundary. Library code never depends on this; only the axum
    /// handlers in `license-authority` call it.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Format(_) => 400,
            Self::Tampered(_) => 400,
            Self::Expired | Self::NotYetValid | Self::Unauthorized(_) => 401,
            Self::Capacity { .. } => 403,
            Self::NotFound(_) => 404,
            Self::Config(_) => 500,
            Self::Transport(_) => 502,
            Self::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for FabricError {
    fn from(err: serde_json::Error) -> Self {
        Self::Format(err.to_string())
    }
}
