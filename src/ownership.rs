use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::crypto::address::Address;
use crate::crypto::ecdsa::keccak256;
use crate::error::ChainError;

/// Solidity signature of the registry read that returns a fid's owner
pub const CUSTODY_OF_SIGNATURE: &str = "custodyOf(uint256)";

/// Read-only access to the identity registry contract
///
/// Implementations wrap whatever RPC transport the host application uses.
/// Every failure, including reverted calls, comes back as a [`ChainError`].
#[async_trait]
pub trait IdRegistryReader: Send + Sync {
    /// Current owner (custody address) of `fid` in the `registry` contract
    async fn owner_of(&self, registry: Address, fid: u64) -> Result<Address, ChainError>;
}

/// Resolves fid ownership against one registry on one chain
///
/// Performs a single read per call. No retries, no caching.
#[derive(Clone)]
pub struct OwnershipChecker {
    reader: Arc<dyn IdRegistryReader>,
    registry: Address,
}

impl OwnershipChecker {
    pub fn new(reader: Arc<dyn IdRegistryReader>, config: &AuthConfig) -> Self {
        Self {
            reader,
            registry: config.id_registry_address,
        }
    }

    pub fn registry(&self) -> Address {
        self.registry
    }

    pub async fn owner_of(&self, fid: u64) -> Result<Address, ChainError> {
        debug!(fid, registry = %self.registry, "reading fid owner");
        match self.reader.owner_of(self.registry, fid).await {
            Ok(owner) => {
                debug!(fid, owner = %owner, "resolved fid owner");
                Ok(owner)
            }
            Err(e) => {
                warn!(fid, error = %e, "fid owner lookup failed");
                Err(e)
            }
        }
    }
}

/// ABI-encoded call data for `custodyOf(fid)`
///
/// Four-byte selector followed by the fid as a big-endian 32-byte word.
pub fn custody_of_calldata(fid: u64) -> Vec<u8> {
    let selector = keccak256(CUSTODY_OF_SIGNATURE.as_bytes());
    let mut data = Vec::with_capacity(36);
    data.extend_from_slice(&selector[..4]);
    data.extend_from_slice(&[0u8; 24]);
    data.extend_from_slice(&fid.to_be_bytes());
    data
}

/// Decode an ABI `address` return value
///
/// Expects exactly one 32-byte word whose top 12 bytes are zero.
pub fn decode_address_word(data: &[u8]) -> Result<Address, ChainError> {
    if data.len() != 32 {
        return Err(ChainError::Decode(format!(
            "expected 32 bytes of return data, got {}",
            data.len()
        )));
    }
    if data[..12].iter().any(|b| *b != 0) {
        return Err(ChainError::Decode(
            "return value is not an address".to_string(),
        ));
    }

    Ok(Address::from_slice(&data[12..]))
}
