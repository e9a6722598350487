use alloy_primitives::address;
use serde::Deserialize;

use crate::crypto::address::Address;

/// Farcaster IdRegistry on OP Mainnet
pub const ID_REGISTRY_ADDRESS: Address = address!("00000000fc6c5f01fc30151999387bb99a9f489b");

/// Default length of generated login nonces
pub const DEFAULT_NONCE_LENGTH: usize = 17;

/// Configuration for login verification
///
/// Every field has a default, so an empty document deserializes to
/// [`AuthConfig::default`].
///
/// # Example
/// ```rust
/// use farcaster_siwe::AuthConfig;
///
/// let config: AuthConfig = serde_json::from_str(r#"{ "nonce_length": 24 }"#).unwrap();
/// assert_eq!(config.nonce_length, 24);
/// assert_eq!(config.id_registry_address, farcaster_siwe::config::ID_REGISTRY_ADDRESS);
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct AuthConfig {
    /// Identity registry contract ownership is read from
    ///
    /// Lives on the chain fixed by
    /// [`REQUIRED_CHAIN_ID`](crate::message::REQUIRED_CHAIN_ID).
    #[serde(default = "default_id_registry")]
    pub id_registry_address: Address,
    /// Length of nonces produced by
    /// [`AuthService::generate_nonce`](crate::auth::AuthService::generate_nonce)
    #[serde(default = "default_nonce_length")]
    pub nonce_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            id_registry_address: ID_REGISTRY_ADDRESS,
            nonce_length: DEFAULT_NONCE_LENGTH,
        }
    }
}

fn default_id_registry() -> Address {
    ID_REGISTRY_ADDRESS
}

fn default_nonce_length() -> usize {
    DEFAULT_NONCE_LENGTH
}
