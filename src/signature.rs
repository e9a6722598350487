use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::B256;
use async_trait::async_trait;
use tracing::debug;

use crate::crypto::address::Address;
use crate::crypto::ecdsa::{hash_personal_message, recover_address};
use crate::error::{ChainError, SignatureError};
use crate::message::Message;

/// Result of checking a signature against a message's address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignerOutcome {
    /// `signer` produced the signature and equals the message address
    Valid { signer: Address },
    /// The signature does not belong to `expected`
    ///
    /// `resolved` is the recovered address, if recovery got that far.
    Invalid {
        expected: Address,
        resolved: Option<Address>,
    },
}

/// On-chain signature validation for smart-contract wallets (EIP-1271)
#[async_trait]
pub trait Eip1271Provider: Send + Sync {
    /// Ask `contract` whether `signature` is valid for `digest`
    async fn is_valid_signature(
        &self,
        contract: Address,
        digest: B256,
        signature: &[u8],
    ) -> Result<bool, ChainError>;
}

/// Chain id to EIP-1271 provider mapping
pub type Providers = HashMap<u64, Arc<dyn Eip1271Provider>>;

/// Signature verification backend used by the login pipeline
///
/// A mismatched or malformed signature is an [`SignerOutcome::Invalid`],
/// not an error. Errors are reserved for failures to evaluate the
/// signature at all.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    async fn verify_signature(
        &self,
        message: &Message,
        signature: &[u8],
        providers: &Providers,
    ) -> Result<SignerOutcome, SignatureError>;
}

/// EIP-191 `personal_sign` verification with an EIP-1271 fallback
///
/// The signer is recovered from the signature over the message's canonical
/// text. If it is not the message address and a provider is registered for
/// the message's chain, the address is asked to validate the signature as
/// a contract wallet.
#[derive(Clone, Copy, Debug, Default)]
pub struct Eip191Verifier;

#[async_trait]
impl SignatureVerifier for Eip191Verifier {
    async fn verify_signature(
        &self,
        message: &Message,
        signature: &[u8],
        providers: &Providers,
    ) -> Result<SignerOutcome, SignatureError> {
        let expected = message.address();
        let digest = hash_personal_message(message.prepare().as_bytes());

        let resolved = match recover_address(&digest, signature) {
            Ok(address) => Some(address),
            Err(e) => {
                debug!(error = %e, "signer recovery failed");
                None
            }
        };
        if resolved == Some(expected) {
            return Ok(SignerOutcome::Valid { signer: expected });
        }

        if let Some(provider) = providers.get(&message.chain_id()) {
            if provider
                .is_valid_signature(expected, digest, signature)
                .await?
            {
                debug!(contract = %expected, "signature accepted by contract wallet");
                return Ok(SignerOutcome::Valid { signer: expected });
            }
        }

        Ok(SignerOutcome::Invalid { expected, resolved })
    }
}
