//! # farcaster-siwe
//!
//! Verification of **Sign-In-With-Ethereum** logins bound to a **Farcaster fid**.
//! A caller proves control of an Ethereum address by signing an EIP-4361
//! message, and ownership of a fid by that address being the fid's current
//! owner in the on-chain identity registry.
//!
//! ## Features
//!
//! - **Message Validation** - Login messages must carry the Farcaster statement,
//!   chain id 10 and exactly one `farcaster://fids/<fid>` resource
//! - **EIP-191 Signature Recovery** - secp256k1 signer recovery, with an
//!   EIP-1271 fallback for contract wallets
//! - **Ownership Check** - The signer is compared to the fid owner read from
//!   the identity registry through a pluggable client
//! - **Typed Outcomes** - A rejected login is data, infrastructure failures
//!   are `ValidationFailure` or `NetworkUnavailable`
//! - **Stateless Design** - No nonce storage, caching or retries
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use farcaster_siwe::{AuthConfig, AuthService, IdRegistryReader, LoginParams};
//!
//! # async fn run(registry: Arc<dyn IdRegistryReader>, params: LoginParams, signature: Vec<u8>) {
//! let auth_service = AuthService::new(AuthConfig::default(), registry);
//!
//! // Validate the login message and hand its text to the wallet
//! let message = auth_service.build_message(params).unwrap();
//! println!("sign this:\n{}", message.prepare());
//!
//! // Verify the returned signature
//! match auth_service.verify(&message, &signature).await {
//!     Ok(outcome) if outcome.success => println!("authenticated as fid {}", outcome.fid),
//!     Ok(outcome) => println!("login rejected: {:?}", outcome.error),
//!     Err(e) => println!("verification unavailable: {}", e),
//! }
//! # }
//! ```

pub mod auth;
pub mod classify;
pub mod config;
pub mod crypto;
pub mod error;
pub mod message;
pub mod ownership;
pub mod signature;

// Re-export main types for easier access
pub use auth::{AuthService, VerificationOutcome};
pub use config::AuthConfig;
pub use crypto::address::Address;
pub use error::{AuthError, ErrorKind, Result, VerificationError};
pub use message::{build_message, parse_fid, LoginParams, Message};
pub use ownership::{IdRegistryReader, OwnershipChecker};
pub use signature::{Eip1271Provider, Eip191Verifier, SignatureVerifier, SignerOutcome};
