use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    config::AuthConfig,
    crypto::nonce::generate_nonce,
    error::{AuthError, Result, VerificationError},
    message::{build_message, parse_fid, LoginParams, Message},
    ownership::{IdRegistryReader, OwnershipChecker},
    signature::{Eip1271Provider, Eip191Verifier, Providers, SignatureVerifier, SignerOutcome},
};

/// Login service that verifies Farcaster sign-in attempts
///
/// This service provides stateless operations:
/// - Nonce generation for login messages
/// - Login message construction and validation
/// - Signature verification followed by an on-chain fid ownership check
///
/// The service keeps no per-login state. Nonce storage, replay protection,
/// retries and sessions belong to the caller.
#[derive(Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    ownership: OwnershipChecker,
    verifier: Arc<dyn SignatureVerifier>,
    providers: Providers,
}

/// Result of a login verification that could be evaluated
///
/// `success` is true only when the signature is valid and the signer owns
/// `fid`. Otherwise `error` says which check failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerificationOutcome {
    pub data: Message,
    pub success: bool,
    pub fid: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<VerificationError>,
}

impl AuthService {
    /// Create a service reading fid ownership through `registry`
    ///
    /// Signatures are checked with [`Eip191Verifier`] and no EIP-1271
    /// providers are registered.
    ///
    /// # Arguments
    /// * `config` - Registry contract address and nonce length
    /// * `registry` - Read-only client for the identity registry
    pub fn new(config: AuthConfig, registry: Arc<dyn IdRegistryReader>) -> Self {
        let ownership = OwnershipChecker::new(registry, &config);
        Self {
            config,
            ownership,
            verifier: Arc::new(Eip191Verifier),
            providers: Providers::new(),
        }
    }

    /// Replace the signature verification backend
    pub fn with_signature_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Register an EIP-1271 provider for contract wallets on `chain_id`
    pub fn with_provider(mut self, chain_id: u64, provider: Arc<dyn Eip1271Provider>) -> Self {
        self.providers.insert(chain_id, provider);
        self
    }

    /// Generate a nonce of the configured length
    pub fn generate_nonce(&self) -> String {
        generate_nonce(self.config.nonce_length)
    }

    /// See [`build_message`]
    pub fn build_message(&self, params: LoginParams) -> Result<Message> {
        build_message(params)
    }

    /// See [`parse_fid`]
    pub fn parse_fid(&self, message: &Message) -> Result<u64> {
        parse_fid(message)
    }

    /// Verify a signed login message
    ///
    /// 1. Checks `signature` against the message address
    /// 2. Re-derives the fid from the message resources
    /// 3. If the signature is valid, reads the fid's owner and compares it
    ///    to the signer
    ///
    /// # Returns
    /// * `Ok(VerificationOutcome)` - the attempt was evaluated; check
    ///   `success` and `error`
    /// * `Err(AuthError)` - `ValidationFailure` when the message carries no
    ///   fid, `NetworkUnavailable` when the ownership read (or a contract
    ///   wallet check) failed. The transport's message is passed through.
    ///
    /// # Example
    /// ```rust,no_run
    /// # async fn run(service: farcaster_siwe::AuthService, message: farcaster_siwe::Message, signature: Vec<u8>) {
    /// match service.verify(&message, &signature).await {
    ///     Ok(outcome) if outcome.success => println!("logged in as fid {}", outcome.fid),
    ///     Ok(outcome) => println!("rejected: {:?}", outcome.error),
    ///     Err(e) => println!("could not verify: {e}"),
    /// }
    /// # }
    /// ```
    pub async fn verify(&self, message: &Message, signature: &[u8]) -> Result<VerificationOutcome> {
        let signer = self
            .verifier
            .verify_signature(message, signature, &self.providers)
            .await?;
        let fid = parse_fid(message)?;

        let signer = match signer {
            SignerOutcome::Valid { signer } => signer,
            SignerOutcome::Invalid { expected, resolved } => {
                debug!(fid, expected = %expected, "invalid login signature");
                return Ok(rejected(
                    message,
                    fid,
                    VerificationError::InvalidSignature {
                        expected_address: expected,
                        resolved_address: resolved,
                    },
                ));
            }
        };

        let owner = self
            .ownership
            .owner_of(fid)
            .await
            .map_err(AuthError::from)?;

        if owner != signer {
            warn!(fid, signer = %signer, owner = %owner, "signer does not own fid");
            return Ok(rejected(
                message,
                fid,
                VerificationError::OwnershipMismatch {
                    fid,
                    claimed_owner: signer,
                    actual_owner: owner,
                },
            ));
        }

        debug!(fid, signer = %signer, "login verified");
        Ok(VerificationOutcome {
            data: message.clone(),
            success: true,
            fid,
            error: None,
        })
    }
}

fn rejected(message: &Message, fid: u64, error: VerificationError) -> VerificationOutcome {
    VerificationOutcome {
        data: message.clone(),
        success: false,
        fid,
        error: Some(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::address::Address;
    use alloy_primitives::B256;
    use crate::crypto::ecdsa::sign_personal_message;
    use crate::error::{ChainError, ErrorKind, SignatureError};
    use async_trait::async_trait;
    use k256::ecdsa::SigningKey;
    use rand::rngs::OsRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Programmable registry stub that counts reads
    struct StubRegistry {
        answer: std::result::Result<Address, ChainError>,
        calls: AtomicUsize,
    }

    impl StubRegistry {
        fn owner(owner: Address) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(owner),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(error: ChainError) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(error),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IdRegistryReader for StubRegistry {
        async fn owner_of(
            &self,
            _registry: Address,
            _fid: u64,
        ) -> std::result::Result<Address, ChainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    /// Signature backend with a fixed answer
    struct FixedSignature(std::result::Result<SignerOutcome, SignatureError>);

    #[async_trait]
    impl SignatureVerifier for FixedSignature {
        async fn verify_signature(
            &self,
            _message: &Message,
            _signature: &[u8],
            _providers: &Providers,
        ) -> std::result::Result<SignerOutcome, SignatureError> {
            self.0.clone()
        }
    }

    struct Account {
        key: SigningKey,
        address: Address,
    }

    fn account() -> Account {
        let key = SigningKey::random(&mut OsRng);
        let address = Address::from_public_key(key.verifying_key());
        Account { key, address }
    }

    fn login_params(address: Address, fid: u64) -> LoginParams {
        LoginParams {
            domain: "example.com".to_string(),
            statement: "Log in With Farcaster".to_string(),
            address: address.to_checksum(None),
            uri: "https://example.com/login".to_string(),
            version: "1".to_string(),
            nonce: "12345678abcd".to_string(),
            issued_at: "2023-10-01T00:00:00.000Z".to_string(),
            chain_id: 10,
            resources: vec![format!("farcaster://fids/{fid}")],
            expiration_time: None,
            not_before: None,
            request_id: None,
        }
    }

    fn create_test_auth_service(registry: Arc<StubRegistry>) -> AuthService {
        AuthService::new(AuthConfig::default(), registry)
    }

    fn sign(message: &Message, account: &Account) -> Vec<u8> {
        sign_personal_message(message.prepare().as_bytes(), &account.key)
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_verify_success() {
        let alice = account();
        let registry = StubRegistry::owner(alice.address);
        let service = create_test_auth_service(registry.clone());

        let message = service.build_message(login_params(alice.address, 42)).unwrap();
        let signature = sign(&message, &alice);

        let outcome = service.verify(&message, &signature).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.fid, 42);
        assert_eq!(outcome.error, None);
        assert_eq!(outcome.data, message);
        assert_eq!(registry.calls(), 1);
    }

    #[tokio::test]
    async fn test_verify_ownership_mismatch() {
        let alice = account();
        let bob = account();
        let registry = StubRegistry::owner(bob.address);
        let service = create_test_auth_service(registry.clone());

        let message = service
            .build_message(login_params(alice.address, 1234))
            .unwrap();
        let signature = sign(&message, &alice);

        let outcome = service.verify(&message, &signature).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.fid, 1234);
        assert_eq!(
            outcome.error,
            Some(VerificationError::OwnershipMismatch {
                fid: 1234,
                claimed_owner: alice.address,
                actual_owner: bob.address,
            })
        );
        assert_eq!(registry.calls(), 1);
    }

    #[tokio::test]
    async fn test_verify_invalid_signature_skips_ownership() {
        let alice = account();
        let mallory = account();
        let registry = StubRegistry::owner(alice.address);
        let service = create_test_auth_service(registry.clone());

        let message = service
            .build_message(login_params(alice.address, 1234))
            .unwrap();
        let signature = sign(&message, &mallory);

        let outcome = service.verify(&message, &signature).await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.fid, 1234);
        assert_eq!(
            outcome.error,
            Some(VerificationError::InvalidSignature {
                expected_address: alice.address,
                resolved_address: Some(mallory.address),
            })
        );
        assert_eq!(registry.calls(), 0);
    }

    #[tokio::test]
    async fn test_verify_garbage_signature() {
        let alice = account();
        let registry = StubRegistry::owner(alice.address);
        let service = create_test_auth_service(registry.clone());
        let message = service.build_message(login_params(alice.address, 7)).unwrap();

        let outcome = service.verify(&message, b"not a signature").await.unwrap();
        assert!(!outcome.success);
        assert!(matches!(
            outcome.error,
            Some(VerificationError::InvalidSignature {
                resolved_address: None,
                ..
            })
        ));
        assert_eq!(registry.calls(), 0);
    }

    #[tokio::test]
    async fn test_verify_network_unavailable() {
        let alice = account();
        let registry = StubRegistry::failing(ChainError::Transport(
            "HTTP request failed. Status: 503".to_string(),
        ));
        let service = create_test_auth_service(registry.clone());

        let message = service.build_message(login_params(alice.address, 42)).unwrap();
        let signature = sign(&message, &alice);

        let err = service.verify(&message, &signature).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NetworkUnavailable);
        assert_eq!(err.message, "HTTP request failed. Status: 503");
        assert_eq!(registry.calls(), 1);
    }

    #[tokio::test]
    async fn test_verify_missing_fid_is_validation_failure() {
        let alice = account();
        let registry = StubRegistry::owner(alice.address);
        let service = create_test_auth_service(registry.clone());

        let message = service.build_message(login_params(alice.address, 42)).unwrap();
        let signature = sign(&message, &alice);
        let message = message.with_resources(vec!["https://example.com".to_string()]);

        let err = service.verify(&message, &signature).await.unwrap_err();
        assert_eq!(err, AuthError::validation("No fid resource found"));
        assert_eq!(registry.calls(), 0);
    }

    #[tokio::test]
    async fn test_verify_with_fixed_signature_backend() {
        let alice = account();
        let registry = StubRegistry::owner(alice.address);
        let service = create_test_auth_service(registry.clone()).with_signature_verifier(
            Arc::new(FixedSignature(Ok(SignerOutcome::Valid {
                signer: alice.address,
            }))),
        );

        let message = service.build_message(login_params(alice.address, 9)).unwrap();
        let outcome = service.verify(&message, &[]).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.fid, 9);
    }

    #[tokio::test]
    async fn test_signature_backend_failure_is_classified() {
        let alice = account();
        let registry = StubRegistry::owner(alice.address);
        let service = create_test_auth_service(registry.clone()).with_signature_verifier(
            Arc::new(FixedSignature(Err(SignatureError::Provider(
                ChainError::Transport("provider timeout".to_string()),
            )))),
        );

        let message = service.build_message(login_params(alice.address, 9)).unwrap();
        let err = service.verify(&message, &[]).await.unwrap_err();
        assert_eq!(err, AuthError::network("provider timeout"));
        assert_eq!(registry.calls(), 0);
    }

    struct AcceptingWallet;

    #[async_trait]
    impl Eip1271Provider for AcceptingWallet {
        async fn is_valid_signature(
            &self,
            _contract: Address,
            _digest: B256,
            _signature: &[u8],
        ) -> std::result::Result<bool, ChainError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_contract_wallet_login() {
        let wallet = account().address;
        let registry = StubRegistry::owner(wallet);
        let service = create_test_auth_service(registry.clone())
            .with_provider(10, Arc::new(AcceptingWallet));

        let message = service.build_message(login_params(wallet, 77)).unwrap();
        let outcome = service.verify(&message, &[1u8; 128]).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.fid, 77);
        assert_eq!(registry.calls(), 1);
    }

    #[tokio::test]
    async fn test_outcome_serializes() {
        let alice = account();
        let service = create_test_auth_service(StubRegistry::owner(alice.address));
        let message = service.build_message(login_params(alice.address, 42)).unwrap();
        let signature = sign(&message, &alice);

        let outcome = service.verify(&message, &signature).await.unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["fid"], 42);
        assert!(json.get("error").is_none());
        assert_eq!(json["data"]["fid"], 42);
    }

    #[test]
    fn test_generate_nonce() {
        let service = create_test_auth_service(StubRegistry::owner(account().address));
        let nonce = service.generate_nonce();
        assert_eq!(nonce.len(), service.config.nonce_length);
    }
}
