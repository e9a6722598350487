use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::address::Address;

/// The two infrastructure failure kinds a caller has to distinguish
///
/// - `ValidationFailure` - the input breaks a structural or semantic rule.
///   Retrying with the same input will fail the same way.
/// - `NetworkUnavailable` - an on-chain read could not be completed.
///   The caller may retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ValidationFailure,
    NetworkUnavailable,
}

/// Infrastructure error returned by message construction and verification
///
/// A failed login (bad signature, wrong owner) is *not* an `AuthError`; it
/// comes back as a [`VerificationError`] inside a successful
/// [`VerificationOutcome`](crate::auth::VerificationOutcome).
///
/// # Example
/// ```rust
/// use farcaster_siwe::{AuthError, ErrorKind, Result};
///
/// fn handle(result: Result<u64>) {
///     match result {
///         Ok(fid) => println!("fid {fid}"),
///         Err(e) if e.kind == ErrorKind::NetworkUnavailable => println!("retry later: {e}"),
///         Err(e) => println!("rejected: {e}"),
///     }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AuthError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AuthError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ValidationFailure,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NetworkUnavailable,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::NetworkUnavailable
    }
}

/// Why a structurally valid login attempt was rejected
///
/// Carried as data in a successful outcome so callers handle both cases
/// exhaustively.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VerificationError {
    /// The recovered signer is not the address named in the message
    ///
    /// `resolved_address` is `None` when no signer could be recovered at
    /// all (malformed signature bytes, invalid recovery id).
    #[error("Signature does not match address of the message: expected {expected_address}")]
    InvalidSignature {
        expected_address: Address,
        resolved_address: Option<Address>,
    },

    /// The signer does not own the fid claimed in the message resources
    #[error("Invalid resource: signer {claimed_owner} does not own fid {fid}")]
    OwnershipMismatch {
        fid: u64,
        claimed_owner: Address,
        actual_owner: Address,
    },
}

/// Malformed input found while building or parsing a login message
///
/// The `Display` text of each variant is what callers see in the
/// resulting `ValidationFailure`, so it must stay stable.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("invalid address")]
    InvalidAddress,

    #[error("Invalid statement")]
    InvalidStatement,

    #[error("Chain ID must be {0}")]
    InvalidChainId(u64),

    #[error("No fid resource found")]
    MissingFidResource,

    #[error("Multiple fid resources")]
    MultipleFidResources,

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Missing {0}")]
    MissingField(&'static str),

    #[error("Invalid message header")]
    InvalidHeader,
}

/// Failure reported by a read-only chain client
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Decode(String),
}

/// Why no signer could be recovered from a raw signature
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RecoveryError {
    #[error("expected 65 signature bytes, got {0}")]
    InvalidLength(usize),

    #[error("invalid recovery id {0}")]
    InvalidRecoveryId(u8),

    #[error("invalid signature encoding: {0}")]
    Encoding(String),

    #[error("public key recovery failed: {0}")]
    Recovery(String),
}

/// Structured failure from a signature verification backend
///
/// Mismatched or malformed signatures are not reported here; they resolve
/// to [`SignerOutcome::Invalid`](crate::signature::SignerOutcome).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("{0}")]
    Message(#[from] MessageError),

    #[error("{0}")]
    Provider(#[from] ChainError),
}

pub type Result<T> = std::result::Result<T, AuthError>;
