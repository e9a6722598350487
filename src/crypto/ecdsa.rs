use alloy_primitives::B256;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

pub use alloy_primitives::{eip191_hash_message as hash_personal_message, keccak256};

use crate::crypto::address::Address;
use crate::error::RecoveryError;

/// Length of an Ethereum `r || s || v` signature
pub const SIGNATURE_LENGTH: usize = 65;

/// Recover the address that produced a 65-byte signature over a digest
///
/// High-s signatures are accepted the way `ecrecover` accepts them: `s` is
/// folded into the lower half of the curve order and the recovery id's
/// y-parity flipped to match.
///
/// # Arguments
/// * `digest` - 32-byte prehash that was signed
/// * `signature` - `r || s || v`, with `v` either `0/1` or `27/28`
///
/// # Returns
/// * `Ok(Address)` - the signer's address
/// * `Err(RecoveryError)` - wrong length, bad recovery id or otherwise
///   unrecoverable signature
pub fn recover_address(digest: &B256, signature: &[u8]) -> Result<Address, RecoveryError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(RecoveryError::InvalidLength(signature.len()));
    }

    let v = signature[64];
    let recovery_byte = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        other => return Err(RecoveryError::InvalidRecoveryId(other)),
    };
    let recovery_id =
        RecoveryId::from_byte(recovery_byte).ok_or(RecoveryError::InvalidRecoveryId(v))?;

    let sig = Signature::from_slice(&signature[..64])
        .map_err(|e| RecoveryError::Encoding(e.to_string()))?;
    let (sig, recovery_id) = match sig.normalize_s() {
        Some(low) => (
            low,
            RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
        ),
        None => (sig, recovery_id),
    };

    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id)
        .map_err(|e| RecoveryError::Recovery(e.to_string()))?;

    Ok(Address::from_public_key(&key))
}

/// Decode a `0x`-prefixed (or bare) hex signature into raw bytes
pub fn decode_signature(signature_hex: &str) -> Result<Vec<u8>, RecoveryError> {
    let digits = signature_hex.strip_prefix("0x").unwrap_or(signature_hex);
    let bytes = hex::decode(digits).map_err(|e| RecoveryError::Encoding(e.to_string()))?;
    if bytes.len() != SIGNATURE_LENGTH {
        return Err(RecoveryError::InvalidLength(bytes.len()));
    }
    Ok(bytes)
}

/// Sign a message the way a wallet's `personal_sign` does
///
/// Returns `r || s || v` with `v` in `27/28`.
pub fn sign_personal_message(
    message: &[u8],
    signing_key: &SigningKey,
) -> Result<[u8; SIGNATURE_LENGTH], RecoveryError> {
    let digest = hash_personal_message(message);
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(digest.as_slice())
        .map_err(|e| RecoveryError::Encoding(e.to_string()))?;

    let mut out = [0u8; SIGNATURE_LENGTH];
    out[..64].copy_from_slice(&signature.to_bytes());
    out[64] = recovery_id.to_byte() + 27;
    Ok(out)
}
