//! Mapping of collaborator failures onto the two infrastructure error kinds
//!
//! Malformed input becomes `ValidationFailure`; anything the chain client
//! or a signature provider failed to answer becomes `NetworkUnavailable`.
//! The original message text is kept verbatim in both cases.

use crate::error::{AuthError, ChainError, ErrorKind, MessageError, SignatureError};

/// Kind a collaborator failure is reported as
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

impl Classify for MessageError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::ValidationFailure
    }
}

impl Classify for ChainError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NetworkUnavailable
    }
}

impl Classify for SignatureError {
    fn kind(&self) -> ErrorKind {
        match self {
            SignatureError::Message(e) => e.kind(),
            SignatureError::Provider(e) => e.kind(),
        }
    }
}

/// Convert any classified failure into an [`AuthError`]
pub fn classify<E: Classify + ToString>(error: E) -> AuthError {
    AuthError {
        kind: error.kind(),
        message: error.to_string(),
    }
}

impl From<MessageError> for AuthError {
    fn from(error: MessageError) -> Self {
        classify(error)
    }
}

impl From<ChainError> for AuthError {
    fn from(error: ChainError) -> Self {
        classify(error)
    }
}

impl From<SignatureError> for AuthError {
    fn from(error: SignatureError) -> Self {
        classify(error)
    }
}
